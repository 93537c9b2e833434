//! Headless front end for the scan workspace: configuration, scan history
//! and plain-text reports used by the `scan` binary.
pub mod config;
pub mod history;
pub mod report;
