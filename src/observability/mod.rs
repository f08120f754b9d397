//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! wallet / registry / orchestrator
//!     → logging.rs (tracing events with structured fields)
//!     → metrics.rs (counters and gauges via the `metrics` facade)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Recording a metric without an installed exporter is a no-op
//! - Private keys and raw form input never appear in events

pub mod logging;
pub mod metrics;
