//! Entities Benchmark Suite
//!
//! Criterion benchmarks for the hot paths of `entities-core`.
//!
//! # Benchmark Categories
//!
//! - **Keyify**: primary, secondary and reference keys, collection keys, fingerprints
//! - **Validate**: valid graphs and graphs with one or many violations

pub mod fixtures;

pub use fixtures::{generate_customers, BankSchema, Scale};
