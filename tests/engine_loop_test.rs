//! End-to-end engine runs against the in-memory channel and mock tracker.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use gridforge::adapters::channels::memory::{InMemoryChannel, InMemorySender};
use gridforge::adapters::trackers::MockJobTracker;
use gridforge::domain::queues::Queue;
use gridforge::{
    CommandItem, EngineEvent, EngineSettings, EngineStats, ExplicitQueue, JobEngine, MutatorQueue,
    ResultsLog,
};

struct RunFixture {
    engine: JobEngine<CommandItem>,
    tracker: Arc<MockJobTracker>,
    sender: InMemorySender,
    results_path: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

fn fixture(tracker: MockJobTracker, queue: Box<dyn Queue<CommandItem>>) -> RunFixture {
    let dir = common::temp_dir();
    let results_path = dir.path().join("results.txt");
    let results = ResultsLog::create(&results_path).expect("results log");
    let (channel, sender) = InMemoryChannel::new();
    let tracker = Arc::new(tracker);
    let settings = EngineSettings {
        name: "sweep".to_string(),
        poll_interval: Duration::from_millis(5),
        message_wait: Duration::from_millis(5),
    };
    let engine = JobEngine::new(
        settings,
        tracker.clone(),
        queue,
        Box::new(channel),
        results,
    );
    RunFixture {
        engine,
        tracker,
        sender,
        results_path,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_capacity_one_drains_fifo_in_order() {
    let queue = ExplicitQueue::from_items([
        common::item("a"),
        common::item("b"),
        common::item("c"),
    ]);
    let mut fx = fixture(MockJobTracker::new(Some(1)), Box::new(queue));

    let (event_tx, mut event_rx) = mpsc::channel(64);
    let run = tokio::spawn(async move { fx.engine.run(event_tx).await });

    let mut dispatch_order = Vec::new();
    let mut finished: Option<EngineStats> = None;
    while let Some(event) = event_rx.recv().await {
        match event {
            EngineEvent::JobDispatched { name, .. } => {
                dispatch_order.push(name.to_string());
                let score = 0.1 * dispatch_order.len() as f64;
                fx.sender
                    .send(common::result_message(score, name.as_str(), "auto"))
                    .unwrap();
            }
            EngineEvent::Finished(stats) => finished = Some(stats),
            _ => {}
        }
    }

    let stats = run.await.unwrap().unwrap();
    assert_eq!(stats.dispatched, 3);
    assert_eq!(stats.results, 3);
    assert_eq!(stats.presumed_dead, 0);
    assert_eq!(finished, Some(stats));
    assert_eq!(dispatch_order, ["sweep-0", "sweep-1", "sweep-2"]);

    // Capacity one forces strict submission order a, b, c.
    let spawned = fx.tracker.spawned().await;
    let ids: Vec<String> = spawned
        .iter()
        .map(|(_, command)| {
            let pos = command.iter().position(|t| t == "id").unwrap();
            command[pos + 1].clone()
        })
        .collect();
    assert_eq!(ids, ["a", "b", "c"]);

    let contents = std::fs::read_to_string(&fx.results_path).unwrap();
    assert_eq!(
        contents,
        "0.100000\tsweep-0\tauto\n0.200000\tsweep-1\tauto\n0.300000\tsweep-2\tauto\n"
    );
}

#[tokio::test]
async fn test_silent_death_is_recorded_before_exit() {
    let queue = ExplicitQueue::from_items([common::item("doomed")]);
    let mut fx = fixture(MockJobTracker::vanishing(None), Box::new(queue));

    let (event_tx, mut event_rx) = mpsc::channel(64);
    let run = tokio::spawn(async move { fx.engine.run(event_tx).await });

    let mut deaths = Vec::new();
    while let Some(event) = event_rx.recv().await {
        if let EngineEvent::JobPresumedDead { name } = event {
            deaths.push(name.to_string());
        }
    }

    let stats = run.await.unwrap().unwrap();
    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.results, 0);
    assert_eq!(stats.presumed_dead, 1);
    assert_eq!(deaths, ["sweep-0"]);

    // No result ever arrived, so the log stays empty.
    let contents = std::fs::read_to_string(&fx.results_path).unwrap();
    assert!(contents.is_empty());
}

#[tokio::test]
async fn test_adaptive_run_dispatches_mutations_until_pop_cap() {
    let mut generation = 0u32;
    let mut queue = MutatorQueue::with_seed(
        move |parent: &CommandItem| {
            generation += 1;
            vec![parent.clone().with_param("gen", generation.to_string())]
        },
        0.8,
        11,
    )
    .with_max_pops(3);
    queue.seed(common::item("seed")).unwrap();
    let mut fx = fixture(MockJobTracker::new(None), Box::new(queue));

    let (event_tx, mut event_rx) = mpsc::channel(64);
    let run = tokio::spawn(async move { fx.engine.run(event_tx).await });

    let mut dispatched = 0usize;
    while let Some(event) = event_rx.recv().await {
        if let EngineEvent::JobDispatched { name, .. } = event {
            dispatched += 1;
            let score = 0.5 + 0.1 * dispatched as f64;
            fx.sender
                .send(common::result_message(score, name.as_str(), "auto"))
                .unwrap();
        }
    }

    let stats = run.await.unwrap().unwrap();
    assert_eq!(stats.dispatched, 3);
    assert_eq!(stats.results, 3);
    assert_eq!(stats.presumed_dead, 0);
}
