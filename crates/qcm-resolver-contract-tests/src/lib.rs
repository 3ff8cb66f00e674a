//! Test-only crate: validates `contracts/` fixtures against their schemas.
//!
//! All logic lives in `tests/`; this library is intentionally empty.
