//! Metrics over the MP Local Area Development Scheme (MPLADS) portal
//! exports: fund allocations, recommended works, expenditures, and completed
//! works.
//!
//! The [`Engine`] is a pure function of a [`RecordStore`] snapshot and a
//! [`ScopeFilter`]; it derives per-MP, per-vendor, and per-category metrics,
//! advisory flags, and monthly trend series. Loading the exports lives in
//! [`loader`], rendering in [`reports`] and [`output`].
pub mod analytics;
pub mod config;
pub mod engine;
pub mod error;
pub mod flags;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod reports;
pub mod rollup;
pub mod store;
pub mod trends;
pub mod types;
pub mod util;

pub use config::{EngineConfig, Thresholds};
pub use engine::Engine;
pub use rollup::ScopeFilter;
pub use store::RecordStore;
