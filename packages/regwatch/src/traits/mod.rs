//! Core trait abstractions for the monitoring core.
//!
//! These traits define the seams where applications plug in storage,
//! fetching, diffing and base crawl ranking.

pub mod diff;
pub mod ranker;
pub mod source;
pub mod store;
