//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging; the request ID appears on every terminal event
//! - Metrics are cheap (atomic increments)
//! - The audit trail is separate: metrics aggregate, audit records itemize

pub mod logging;
pub mod metrics;
