//! Base diff primitive consumed by the change detector.

use crate::types::change::ContentDiff;

/// Compares two text snapshots.
///
/// Implementations report an overall magnitude and at least an `"Added"`
/// section holding newly introduced text. They must never report
/// `ChangeType::New`, which is reserved for first captures.
pub trait ContentDiffer: Send + Sync {
    fn diff(&self, old_text: &str, new_text: &str) -> ContentDiff;
}

impl<D: ContentDiffer + ?Sized> ContentDiffer for Box<D> {
    fn diff(&self, old_text: &str, new_text: &str) -> ContentDiff {
        (**self).diff(old_text, new_text)
    }
}
