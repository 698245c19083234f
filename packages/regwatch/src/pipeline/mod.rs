//! Monitoring pipeline.
//!
//! One cycle runs, per selected URL:
//! prioritize → fetch → classify → load latest snapshot → detect changes → persist.

pub mod monitor;

pub use monitor::{
    assess_importance, CycleReport, CycleSummary, FailedUrl, Monitor, MonitorOutcome, UrlStatus,
    LAST_CYCLE_KEY,
};
