//! Data types shared by the classifier, detector, prioritizer and stores.

pub mod change;
pub mod classification;
pub mod config;
pub mod structure;
pub mod version;
