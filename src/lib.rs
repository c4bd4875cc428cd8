//! # netsim - Synthetic Network-Telemetry Dataset Generator
//!
//! Generates realistic, internally-consistent telemetry datasets for
//! testing and development: rows that look like decoded gRPC/gNMI
//! streams, SNMP polls, syslog feeds, optical DDM sensor readings and a
//! lifecycle-prediction model — all keyed to the same simulated device
//! fleet, with a controllable fault ratio and full seed reproducibility.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            netsim                                │
//! │                                                                  │
//! │  ┌───────────┐   ┌─────────────┐   ┌───────────────────────┐    │
//! │  │ Topology  │──▶│  Scheduler  │──▶│  Identity (module_id) │    │
//! │  │ (fleet)   │   │ (key, time) │   │  common field block   │    │
//! │  └───────────┘   └─────────────┘   └──────────┬────────────┘    │
//! │                                               ▼                  │
//! │  ┌───────────────┐              ┌──────────────────────────┐    │
//! │  │ FaultInjector │─────────────▶│  Schema Synthesizers ×5  │    │
//! │  │ (key, bucket) │              │  grpc snmp syslog ddm    │    │
//! │  └───────────────┘              │  lifecycle (← ddm hist)  │    │
//! │                                 └────────────┬─────────────┘    │
//! │                                              ▼                   │
//! │                                 ┌──────────────────────────┐    │
//! │                                 │  RecordSink (batches)    │    │
//! │                                 └──────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **One fleet, five tables** - every row's `module_id` resolves to
//!    the same immutable topology, so the tables join cleanly.
//!
//! 2. **Shared fault decisions** - one verdict per (key, time bucket),
//!    derived from a stable hash of the run seed. When gRPC sees a key
//!    degraded, SNMP/syslog/DDM agree for the same key and window.
//!
//! 3. **Seeded determinism everywhere** - per-run and per-table ChaCha
//!    streams, never a process-wide generator. The same request and
//!    seed reproduce byte-identical datasets.
//!
//! 4. **Bounded memory** - lazy scheduling and batched sinks keep
//!    memory flat regardless of requested volume.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netsim::config::{DateRange, EnvironmentProfile, GenerationRequest, TableNames};
//! use netsim::run::{SinkSet, run};
//! use netsim::sink::MemorySink;
//! use chrono::NaiveDate;
//!
//! let request = GenerationRequest {
//!     range: DateRange::days(
//!         NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
//!     ),
//!     rows_per_table: 100_000,
//!     environment: EnvironmentProfile::Datacenter,
//!     device_count: None,
//!     fault_ratio: 0.01,
//!     seed: Some(42),
//!     outputs: TableNames::default(),
//! };
//!
//! let ddm = MemorySink::new();
//! let sinks = SinkSet {
//!     grpc: Box::new(MemorySink::new()),
//!     snmp: Box::new(MemorySink::new()),
//!     syslog: Box::new(MemorySink::new()),
//!     ddm: Box::new(ddm.clone()),
//!     lifecycle: Box::new(MemorySink::new()),
//! };
//! let summary = run(&request, sinks).unwrap();
//! println!("seed {} produced {} rows", summary.seed, summary.total_rows());
//! ```

// Configuration surface and environment profiles
pub mod config;

// Error taxonomy
pub mod error;

// Fault injection (shared per-bucket decisions)
pub mod fault;

// Common field block / composite key derivation
pub mod identity;

// Per-table generation driver
pub mod run;

// Lazy (key, timestamp) scheduling
pub mod schedule;

// Batch emitter trait and bundled sinks
pub mod sink;

// Schema synthesizers
pub mod tables;

// Virtual fleet model
pub mod topology;

// Re-exports for convenience
pub use config::{DateRange, EnvironmentProfile, GenerationRequest, TableNames};
pub use error::{SimError, SinkWriteError};
pub use fault::{FaultInjector, FaultKind, FaultState};
pub use identity::CommonFields;
pub use run::{RunSummary, SinkSet, TableReport, run};
pub use schedule::SamplePlan;
pub use sink::{JsonlSink, MemorySink, RecordSink};
pub use tables::TableKind;
pub use topology::Topology;

/// Derives an independent seed for a named stream from the run seed.
/// Topology, fault decisions and each table's value stream all branch
/// from here, so adding a table never perturbs the others.
pub(crate) fn stream_seed(seed: u64, tag: &str) -> u64 {
    xxhash_rust::xxh3::xxh3_64(format!("{}:{}", seed, tag).as_bytes())
}
