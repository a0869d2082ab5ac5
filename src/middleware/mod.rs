//! HTTP middleware: response recorder, Prometheus counters, block-list
//! gate (spec §2, SPEC_FULL.md §4.12).

/// Block-list gate (`dashmap::DashSet`-backed).
pub mod block_list;
/// Prometheus request counter/histogram.
pub mod metrics;
/// Response recorder: structured request log + metrics observation.
pub mod recorder;

pub use block_list::BlockList;
pub use metrics::Metrics;
