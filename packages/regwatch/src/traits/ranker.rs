//! Generic crawl ranking wrapped by the domain prioritizer.

/// Produces an initial ordered subset of the crawl frontier.
pub trait BaseRanker: Send + Sync {
    /// Rank candidates and return at most `max_count` of them, best first.
    fn rank(&self, candidates: &[String], max_count: usize) -> Vec<String>;
}

impl<R: BaseRanker + ?Sized> BaseRanker for Box<R> {
    fn rank(&self, candidates: &[String], max_count: usize) -> Vec<String> {
        (**self).rank(candidates, max_count)
    }
}
