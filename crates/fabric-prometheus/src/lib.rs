//! Prometheus backend for the slot fabric metrics.
//!
//! [`PrometheusMetrics`] implements [`fabric_core::MetricsBackend`]; inject it through
//! [`fabric_core::context::ClusterContext`] and scrape [`PrometheusMetrics::gather`] (or
//! [`PrometheusMetrics::encode_text`]) from whatever HTTP surface the host process has.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use fabric_core::context::ClusterContext;
//! use fabric_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let ctx = ClusterContext::default().with_metrics(Arc::new(metrics.clone()));
//! # let _ = ctx;
//! let text = metrics.encode_text()?;
//! # let _ = text;
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `fabric_admissions_total{decision}`
//! - `fabric_rarity_score`: histogram of every computed score
//! - `fabric_allocations_total{region}`
//! - `fabric_slots_granted_total{region, pool}` with pool `general` or `elite`
//! - `fabric_migrations_total{from, to, reason}`
//! - `fabric_capacity_failures_total{region}`
//! - `fabric_generations_total{outcome}`
//! - `fabric_generation_duration_seconds`: histogram

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
