//! Integration tests for deeprat crates.
//!
//! These tests drive the decoders end to end: YAML descriptions and decode
//! configs written to disk, loaded back, opened and decoded.
