//! Property tests for the queue family.

use proptest::prelude::*;

use gridforge::{
    CommandItem, ExplicitQueue, JobName, MultiQueue, MutatorQueue, Outcome, Queue,
};

fn tagged(queue: usize, index: usize) -> CommandItem {
    CommandItem::new(["x"])
        .with_param("q", queue.to_string())
        .with_param("n", index.to_string())
}

proptest! {
    /// Property: an explicit queue yields its items strictly in insertion
    /// order, then reports empty forever.
    #[test]
    fn prop_explicit_queue_is_fifo(count in 0usize..30) {
        let items: Vec<CommandItem> = (0..count).map(|i| tagged(0, i)).collect();
        let mut queue = ExplicitQueue::from_items(items.clone());

        for expected in &items {
            prop_assert_eq!(queue.pop().unwrap().as_ref(), Some(expected));
        }
        prop_assert_eq!(queue.pop().unwrap(), None);
        prop_assert_eq!(queue.pop().unwrap(), None);
    }

    /// Property: a multiplex of k sub-queues yields every item exactly
    /// once and preserves each sub-queue's internal order.
    #[test]
    fn prop_multi_queue_drains_all_preserving_suborder(
        lens in prop::collection::vec(0usize..6, 1..5)
    ) {
        let mut multi = MultiQueue::new();
        for (qi, len) in lens.iter().enumerate() {
            let items: Vec<CommandItem> = (0..*len).map(|i| tagged(qi, i)).collect();
            multi.add_queue(format!("q{qi}"), ExplicitQueue::from_items(items)).unwrap();
        }

        let mut seen: Vec<(usize, usize)> = Vec::new();
        while let Some(item) = multi.pop().unwrap() {
            let q: usize = item.param("q").unwrap().parse().unwrap();
            let n: usize = item.param("n").unwrap().parse().unwrap();
            seen.push((q, n));
        }

        let total: usize = lens.iter().sum();
        prop_assert_eq!(seen.len(), total);
        for (qi, len) in lens.iter().enumerate() {
            let order: Vec<usize> = seen.iter().filter(|(q, _)| *q == qi).map(|(_, n)| *n).collect();
            let expected: Vec<usize> = (0..*len).collect();
            prop_assert_eq!(order, expected);
        }
    }

    /// Property: for any finite score distribution and greediness, a
    /// mutating pop terminates with a fresh item, never a panic and never
    /// a previously observed one.
    #[test]
    fn prop_mutator_pop_yields_fresh_item(
        scores in prop::collection::vec(-1.0e6..1.0e6f64, 1..20),
        greediness in 0.0..=1.0f64,
        seed in any::<u64>(),
    ) {
        let mut generation = 0u64;
        let mut queue = MutatorQueue::with_seed(
            move |parent: &CommandItem| {
                generation += 1;
                vec![parent.clone().with_param("gen", generation.to_string())]
            },
            greediness,
            seed,
        );
        for (i, score) in scores.iter().enumerate() {
            let item = tagged(0, i);
            queue.observe(Outcome::Completed(*score), &JobName::new(format!("run-{i}")), &item).unwrap();
        }

        let popped = queue.pop().unwrap();
        let item = popped.expect("a fresh mutation must be available");
        prop_assert!(item.param("gen").is_some());
        prop_assert!(queue.outcome_of(&item).is_none());
    }

    /// Property: a mutator that only echoes its parent can never place a
    /// duplicate; the pop exhausts its attempts and yields nothing.
    #[test]
    fn prop_mutator_suppresses_duplicates(
        scores in prop::collection::vec(-100.0..100.0f64, 1..10),
        greediness in 0.0..=1.0f64,
        seed in any::<u64>(),
    ) {
        let mut queue = MutatorQueue::with_seed(
            |parent: &CommandItem| vec![parent.clone()],
            greediness,
            seed,
        )
        .with_max_attempts(5);
        for (i, score) in scores.iter().enumerate() {
            let item = tagged(0, i);
            queue.observe(Outcome::Completed(*score), &JobName::new(format!("run-{i}")), &item).unwrap();
        }

        prop_assert_eq!(queue.pop().unwrap(), None);
    }
}
