//! Line-level diff used when no external diff primitive is supplied.

use std::collections::HashMap;

use crate::traits::diff::ContentDiffer;
use crate::types::change::{ChangeType, ContentDiff};

/// Changed-line ratio below which a change is `Minor`.
pub const MINOR_RATIO: f64 = 0.10;

/// Changed-line ratio below which a change is `Moderate`.
pub const MODERATE_RATIO: f64 = 0.30;

/// Multiset diff over trimmed, non-blank lines.
///
/// Reordering lines is not a change; whitespace and blank-line edits are
/// invisible. The magnitude is the share of changed lines over both
/// snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDiffer;

impl LineDiffer {
    pub fn new() -> Self {
        Self
    }
}

impl ContentDiffer for LineDiffer {
    fn diff(&self, old_text: &str, new_text: &str) -> ContentDiff {
        let old_lines = lines(old_text);
        let new_lines = lines(new_text);

        let added = subtract(&new_lines, &old_lines);
        let removed = subtract(&old_lines, &new_lines);

        let changed = added.len() + removed.len();
        if changed == 0 {
            return ContentDiff::unchanged();
        }

        let ratio = changed as f64 / (old_lines.len() + new_lines.len()) as f64;
        let change_type = if ratio < MINOR_RATIO {
            ChangeType::Minor
        } else if ratio < MODERATE_RATIO {
            ChangeType::Moderate
        } else {
            ChangeType::Major
        };

        let mut diff = ContentDiff::new(change_type);
        if !added.is_empty() {
            diff = diff.with_added(added.join("\n"));
        }
        if !removed.is_empty() {
            diff = diff.with_removed(removed.join("\n"));
        }
        diff
    }
}

fn lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Lines of `from` not matched by an occurrence in `other`, in `from` order.
fn subtract<'a>(from: &[&'a str], other: &[&str]) -> Vec<&'a str> {
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for line in other {
        *remaining.entry(*line).or_insert(0) += 1;
    }

    from.iter()
        .filter(|line| match remaining.get_mut(**line) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .copied()
        .collect()
}
