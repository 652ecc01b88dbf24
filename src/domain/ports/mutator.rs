//! Collaborator contract for expanding the search space.

/// Produces candidate successor configurations from a scored parent.
///
/// The caller discards children that were already seen or are already
/// waiting, so returning duplicates (or nothing at all) is valid.
pub trait Mutator<I>: Send {
    /// Propose zero or more children derived from `parent`.
    fn mutate(&mut self, parent: &I) -> Vec<I>;
}

impl<I, F> Mutator<I> for F
where
    F: FnMut(&I) -> Vec<I> + Send,
{
    fn mutate(&mut self, parent: &I) -> Vec<I> {
        self(parent)
    }
}
