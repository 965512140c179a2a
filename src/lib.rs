//! Library crate for uptime-watch: the probing loop, outage detection,
//! per-host statistics, and the daily log / summary files.
pub mod clock;
pub mod error;
pub mod hosts;
pub mod monitor;
pub mod outage;
pub mod persistence;
pub mod prober;
pub mod report;
pub mod session;
pub mod stats;
pub mod types;
