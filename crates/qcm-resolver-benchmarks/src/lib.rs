//! Test-only crate: smoke benchmarks for the frame-change hot path.
//!
//! All logic lives in `tests/`; this library is intentionally empty.
