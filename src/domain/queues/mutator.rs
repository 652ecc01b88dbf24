//! Adaptive score-weighted resampling queue.

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{JobName, Outcome};
use crate::domain::ports::{Item, Mutator};
use crate::domain::queues::{Queue, QueueControl};

/// Observations between logged state summaries.
const SUMMARY_EVERY: usize = 50;
/// Entries shown per state summary.
const SUMMARY_TOP_K: usize = 10;

/// Infinite adaptive queue: resamples promising scored items and mutates
/// them into fresh candidates.
///
/// Selection is temperature-controlled. Observed items are ranked by score
/// descending (rank 0 is best) and weighted
/// `exp(-g * (10 * (best - score) + sqrt(rank) / 10))` where `g` is the
/// greediness in `[0, 1]`; one parent is drawn with probability
/// proportional to its weight. Near `g = 0` the draw approaches uniform,
/// near `g = 1` it sharply favors the best score. Items without a genuine
/// score yet (seeds, presumed-dead runs) inherit the lowest completed score
/// seen so far and rank after every completed item, so they stay pickable
/// without ever outranking a real result.
///
/// Explicitly pushed items drain first, in stack order, ahead of any
/// mutation.
pub struct MutatorQueue<I> {
    mutator: Box<dyn Mutator<I>>,
    greediness: f64,
    max_attempts: u32,
    max_pops: u64,
    scores: HashMap<I, Outcome>,
    waiting: Vec<I>,
    pops: u64,
    stopped: bool,
    rng: ChaCha8Rng,
}

#[derive(Serialize, Deserialize)]
struct MutatorState<I> {
    greediness: f64,
    max_attempts: u32,
    max_pops: u64,
    pops: u64,
    stopped: bool,
    scores: Vec<(I, Outcome)>,
    waiting: Vec<I>,
}

impl<I: Item> MutatorQueue<I> {
    /// Creates a queue around `mutator` with the given greediness.
    pub fn new(mutator: impl Mutator<I> + 'static, greediness: f64) -> Self {
        Self::with_rng(mutator, greediness, ChaCha8Rng::from_entropy())
    }

    /// Creates a queue with a deterministic selection stream, for tests and
    /// benches.
    pub fn with_seed(mutator: impl Mutator<I> + 'static, greediness: f64, seed: u64) -> Self {
        Self::with_rng(mutator, greediness, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(mutator: impl Mutator<I> + 'static, greediness: f64, rng: ChaCha8Rng) -> Self {
        Self {
            mutator: Box::new(mutator),
            greediness: greediness.clamp(0.0, 1.0),
            max_attempts: 100,
            max_pops: 0,
            scores: HashMap::new(),
            waiting: Vec::new(),
            pops: 0,
            stopped: false,
            rng,
        }
    }

    /// Caps mutation retries per pop (minimum 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Caps total pops; 0 means unlimited.
    pub fn with_max_pops(mut self, max_pops: u64) -> Self {
        self.max_pops = max_pops;
        self
    }

    /// Pushes an item to run ahead of any mutation. Pushed items drain in
    /// stack order.
    pub fn push(&mut self, item: I) {
        self.waiting.push(item);
    }

    /// Pushes `item` and records a synthetic failed observation for it, so
    /// mutation has a parent before any real result arrives.
    pub fn seed(&mut self, item: I) -> DomainResult<()> {
        let name = JobName::new(format!("seed{}", self.scores.len()));
        self.waiting.push(item.clone());
        self.observe(Outcome::Failed, &name, &item)
    }

    /// Number of items with a recorded outcome.
    pub fn observed_count(&self) -> usize {
        self.scores.len()
    }

    /// Number of explicitly pushed items not yet popped.
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// The recorded outcome for `item`, if any.
    pub fn outcome_of(&self, item: &I) -> Option<Outcome> {
        self.scores.get(item).copied()
    }

    /// Logs a top-k summary of everything observed so far.
    pub fn log_state(&self) {
        info!(
            observed = self.scores.len(),
            waiting = self.waiting.len(),
            pops = self.pops,
            stopped = self.stopped,
            "mutator queue state"
        );
        for (rank, entry) in self.ranked().into_iter().take(SUMMARY_TOP_K).enumerate() {
            info!(
                rank,
                score = entry.score,
                failed = entry.failed,
                item = ?entry.item,
                "queue entry"
            );
        }
    }

    fn ranked(&self) -> Vec<Ranked<'_, I>> {
        ranked_entries(&self.scores)
    }

    /// Draws one observed item under the given greediness.
    fn pick(&mut self, greediness: f64) -> Option<I> {
        let ranked = ranked_entries(&self.scores);
        let best = ranked.first()?.score;

        let mut total = 0.0;
        let mut weights = Vec::with_capacity(ranked.len());
        for (rank, entry) in ranked.iter().enumerate() {
            let penalty = 10.0 * (best - entry.score) + (rank as f64).sqrt() / 10.0;
            let weight = (-greediness * penalty).exp();
            total += weight;
            weights.push(weight);
        }

        let draw = self.rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (entry, weight) in ranked.iter().zip(&weights) {
            cumulative += weight;
            if draw <= cumulative {
                return Some(entry.item.clone());
            }
        }
        // float rounding can leave the draw a hair past the last bucket
        ranked.last().map(|entry| entry.item.clone())
    }

    /// Picks a parent and mutates it until a non-duplicate child appears,
    /// relaxing greediness linearly over the allowed attempts.
    fn next_mutation(&mut self) -> DomainResult<Option<I>> {
        for attempt in 0..self.max_attempts {
            let relaxed = self.greediness * f64::from(self.max_attempts - attempt)
                / f64::from(self.max_attempts);
            let Some(parent) = self.pick(relaxed) else {
                return Ok(None);
            };

            let mut fresh: Vec<I> = Vec::new();
            for child in self.mutator.mutate(&parent) {
                if self.scores.contains_key(&child)
                    || self.waiting.contains(&child)
                    || fresh.contains(&child)
                {
                    debug!(item = ?child, "pruned duplicate candidate");
                } else {
                    fresh.push(child);
                }
            }
            if fresh.is_empty() {
                continue;
            }

            fresh.shuffle(&mut self.rng);
            if let Some(chosen) = fresh.pop() {
                self.waiting.append(&mut fresh);
                return Ok(Some(chosen));
            }
        }
        info!(
            attempts = self.max_attempts,
            "no undiscovered mutation found this cycle"
        );
        Ok(None)
    }
}

struct Ranked<'a, I> {
    item: &'a I,
    score: f64,
    failed: bool,
}

/// Observed items ranked best first; failed-only items inherit the lowest
/// completed score and sort after every completed item.
fn ranked_entries<I: Item>(scores: &HashMap<I, Outcome>) -> Vec<Ranked<'_, I>> {
    let floor = scores
        .values()
        .filter_map(|outcome| outcome.score())
        .fold(f64::INFINITY, f64::min);
    let floor = if floor.is_finite() { floor } else { 0.0 };

    let mut ranked: Vec<Ranked<'_, I>> = scores
        .iter()
        .map(|(item, outcome)| match outcome {
            Outcome::Completed(score) => Ranked {
                item,
                score: *score,
                failed: false,
            },
            Outcome::Failed => Ranked {
                item,
                score: floor,
                failed: true,
            },
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.failed.cmp(&b.failed))
    });
    ranked
}

impl<I: Item> Queue<I> for MutatorQueue<I> {
    fn pop(&mut self) -> DomainResult<Option<I>> {
        if self.stopped {
            return Ok(None);
        }
        if self.max_pops > 0 && self.pops >= self.max_pops {
            debug!(pops = self.pops, "pop cap reached");
            return Ok(None);
        }
        self.pops += 1;

        if let Some(item) = self.waiting.pop() {
            return Ok(Some(item));
        }
        if self.scores.is_empty() {
            return Err(DomainError::UnseededQueue);
        }
        self.next_mutation()
    }

    fn observe(&mut self, outcome: Outcome, name: &JobName, item: &I) -> DomainResult<()> {
        match self.scores.get(item) {
            None => {
                self.scores.insert(item.clone(), outcome);
            }
            Some(existing) => {
                if outcome.is_failed() {
                    warn!(
                        job = %name,
                        "job presumed dead; overwriting recorded outcome with failure"
                    );
                    self.scores.insert(item.clone(), outcome);
                } else if existing.is_failed() {
                    warn!(
                        job = %name,
                        score = outcome.score(),
                        "result arrived for an item previously presumed dead; keeping new score"
                    );
                    self.scores.insert(item.clone(), outcome);
                } else {
                    return Err(DomainError::DuplicateOutcome {
                        name: name.to_string(),
                    });
                }
            }
        }
        if self.scores.len() % SUMMARY_EVERY == 0 {
            self.log_state();
        }
        Ok(())
    }

    fn control(&mut self) -> Option<&mut dyn QueueControl> {
        Some(self)
    }

    fn snapshot(&self) -> DomainResult<serde_json::Value> {
        Ok(serde_json::to_value(MutatorState {
            greediness: self.greediness,
            max_attempts: self.max_attempts,
            max_pops: self.max_pops,
            pops: self.pops,
            stopped: self.stopped,
            scores: self
                .scores
                .iter()
                .map(|(item, outcome)| (item.clone(), *outcome))
                .collect::<Vec<_>>(),
            waiting: self.waiting.clone(),
        })?)
    }

    fn restore(&mut self, state: serde_json::Value) -> DomainResult<()> {
        let state: MutatorState<I> = serde_json::from_value(state)?;
        self.greediness = state.greediness.clamp(0.0, 1.0);
        self.max_attempts = state.max_attempts.max(1);
        self.max_pops = state.max_pops;
        self.pops = state.pops;
        self.stopped = state.stopped;
        self.scores = state.scores.into_iter().collect();
        self.waiting = state.waiting;
        self.log_state();
        Ok(())
    }
}

impl<I: Item> QueueControl for MutatorQueue<I> {
    fn message(&mut self, text: &str) {
        match text.trim() {
            "stop" => {
                info!("mutator queue stopped; recorded outcomes are preserved");
                self.stopped = true;
            }
            other => warn!(message = other, "ignoring unrecognized queue control message"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CommandItem;

    fn item(tag: &str) -> CommandItem {
        CommandItem::new(["run"]).with_param("tag", tag)
    }

    fn no_mutation(_: &CommandItem) -> Vec<CommandItem> {
        Vec::new()
    }

    #[test]
    fn test_pop_without_seed_or_waiting_is_an_error() {
        let mut queue = MutatorQueue::with_seed(no_mutation, 1.0, 7);
        assert!(matches!(queue.pop(), Err(DomainError::UnseededQueue)));
    }

    #[test]
    fn test_waiting_drains_lifo_before_mutation() {
        let mut queue = MutatorQueue::with_seed(no_mutation, 1.0, 7);
        queue.push(item("a"));
        queue.push(item("b"));

        assert_eq!(queue.pop().unwrap(), Some(item("b")));
        assert_eq!(queue.pop().unwrap(), Some(item("a")));
    }

    #[test]
    fn test_seed_records_failed_outcome_and_pops_first() {
        let mut queue = MutatorQueue::with_seed(no_mutation, 1.0, 7);
        queue.seed(item("x")).unwrap();

        assert_eq!(queue.outcome_of(&item("x")), Some(Outcome::Failed));
        assert_eq!(queue.pop().unwrap(), Some(item("x")));
        // mutator yields nothing, so the next pop exhausts its attempts
        let mut queue = MutatorQueue::with_seed(no_mutation, 1.0, 7).with_max_attempts(3);
        queue.seed(item("x")).unwrap();
        queue.pop().unwrap();
        assert_eq!(queue.pop().unwrap(), None);
    }

    #[test]
    fn test_mutation_after_score_never_revisits_parent() {
        let parent = item("x");
        let children = [item("y"), item("z")];
        let mutate = {
            let parent = parent.clone();
            let children = children.clone();
            move |it: &CommandItem| {
                if *it == parent {
                    children.to_vec()
                } else {
                    Vec::new()
                }
            }
        };
        let mut queue = MutatorQueue::with_seed(mutate, 1.0, 42).with_max_attempts(5);
        queue.seed(parent.clone()).unwrap();

        assert_eq!(queue.pop().unwrap(), Some(parent.clone()));
        queue
            .observe(Outcome::Completed(0.8), &JobName::new("run-0"), &parent)
            .unwrap();

        let first = queue.pop().unwrap().expect("a child should be proposed");
        assert!(children.contains(&first));
        assert_ne!(first, parent);

        let second = queue.pop().unwrap().expect("the other child is waiting");
        assert!(children.contains(&second));
        assert_ne!(second, first);

        // once both children are scored, every mutation is a duplicate
        queue
            .observe(Outcome::Completed(0.6), &JobName::new("run-1"), &first)
            .unwrap();
        queue
            .observe(Outcome::Completed(0.4), &JobName::new("run-2"), &second)
            .unwrap();
        assert_eq!(queue.pop().unwrap(), None);
    }

    #[test]
    fn test_duplicate_score_is_an_error_but_failed_then_real_updates() {
        let mut queue = MutatorQueue::with_seed(no_mutation, 1.0, 7);
        let it = item("x");
        queue.seed(it.clone()).unwrap();

        queue
            .observe(Outcome::Completed(0.8), &JobName::new("run-0"), &it)
            .unwrap();
        assert_eq!(queue.outcome_of(&it), Some(Outcome::Completed(0.8)));

        let err = queue
            .observe(Outcome::Completed(0.9), &JobName::new("run-1"), &it)
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateOutcome { .. }));
        assert_eq!(queue.outcome_of(&it), Some(Outcome::Completed(0.8)));
    }

    #[test]
    fn test_sentinel_overwrites_with_warning() {
        let mut queue = MutatorQueue::with_seed(no_mutation, 1.0, 7);
        let it = item("x");
        queue
            .observe(Outcome::Completed(0.5), &JobName::new("run-0"), &it)
            .unwrap();
        queue
            .observe(Outcome::Failed, &JobName::new("run-0"), &it)
            .unwrap();
        assert_eq!(queue.outcome_of(&it), Some(Outcome::Failed));
    }

    #[test]
    fn test_stop_message_suppresses_pop() {
        let mut queue = MutatorQueue::with_seed(no_mutation, 1.0, 7);
        queue.seed(item("x")).unwrap();

        queue.control().unwrap().message("stop");
        assert_eq!(queue.pop().unwrap(), None);
        assert_eq!(queue.observed_count(), 1);

        // unknown control text is harmless
        queue.control().unwrap().message("reticulate");
        assert_eq!(queue.pop().unwrap(), None);
    }

    #[test]
    fn test_max_pops_caps_total_pops() {
        let mut queue = MutatorQueue::with_seed(no_mutation, 1.0, 7).with_max_pops(2);
        queue.push(item("a"));
        queue.push(item("b"));
        queue.push(item("c"));

        assert!(queue.pop().unwrap().is_some());
        assert!(queue.pop().unwrap().is_some());
        assert_eq!(queue.pop().unwrap(), None);
    }

    #[test]
    fn test_snapshot_restore_keeps_waiting_and_scores() {
        let mut queue = MutatorQueue::with_seed(no_mutation, 0.7, 7);
        queue.seed(item("x")).unwrap();
        queue.push(item("w"));
        let state = queue.snapshot().unwrap();

        let mut restored = MutatorQueue::with_seed(no_mutation, 1.0, 99);
        restored.restore(state).unwrap();

        assert_eq!(restored.observed_count(), 1);
        assert_eq!(restored.outcome_of(&item("x")), Some(Outcome::Failed));
        // waiting stack drains first, LIFO
        assert_eq!(restored.pop().unwrap(), Some(item("w")));
        assert_eq!(restored.pop().unwrap(), Some(item("x")));

        let err = {
            let mut q = MutatorQueue::with_seed(no_mutation, 1.0, 1);
            q.restore(serde_json::json!({"not": "a snapshot"}))
                .unwrap_err()
        };
        assert!(matches!(err, DomainError::SerializationError(_)));
    }

    #[test]
    fn test_failed_items_rank_after_completed_on_equal_score() {
        let mut queue = MutatorQueue::with_seed(no_mutation, 1.0, 7);
        queue
            .observe(Outcome::Completed(0.3), &JobName::new("run-0"), &item("real"))
            .unwrap();
        queue
            .observe(Outcome::Failed, &JobName::new("seed0"), &item("dead"))
            .unwrap();

        let ranked = queue.ranked();
        assert_eq!(ranked[0].item, &item("real"));
        assert!(!ranked[0].failed);
        assert_eq!(ranked[1].item, &item("dead"));
        assert!(ranked[1].failed);
        // failed entries inherit the completed floor
        assert!((ranked[1].score - 0.3).abs() < f64::EPSILON);
    }
}
