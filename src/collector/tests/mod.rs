//! Tests for collection runs
//!
//! Runs are driven by an in-memory feed and sink so every path can be
//! exercised without the weather service or a database.

pub mod support;
