//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per transfer run)
//!     → metrics.rs (counters, histograms)
//! ```

pub mod logging;
pub mod metrics;
