//! wr-bench: Criterion micro-benchmarks for the planner. See `benches/`.

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
