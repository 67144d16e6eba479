//! Integration tests for the sim-* crate ecosystem live in `integration/`.
