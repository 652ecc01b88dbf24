//! The `send` command: publish a raw payload on the engine's channel.
//!
//! The payload is forwarded verbatim, so anything the engine understands
//! can be injected from a shell: `result <score>\t<name>\t<config>`,
//! `messageQ <text>`, `saveQ <path>`, `loadQ <path>`.

use anyhow::Result;
use clap::Args;

use crate::adapters::channels::RedisChannel;
use crate::domain::models::Config;
use crate::domain::ports::MessageChannel;

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message words, joined with single spaces before publishing
    #[arg(required = true)]
    pub payload: Vec<String>,
}

pub async fn execute(args: SendArgs, config: &Config, json_mode: bool) -> Result<()> {
    let mut channel = RedisChannel::connect(&config.channel).await?;
    let payload = args.payload.join(" ");
    channel.publish(&payload).await?;

    if json_mode {
        let output = serde_json::json!({
            "channel": config.channel.channel,
            "sent": payload,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Sent on {}: {payload}", config.channel.channel);
    }
    Ok(())
}
