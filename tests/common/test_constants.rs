//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// Token substituted for the UUID generator in provisioning tests.
pub const UNIQUE_TOKEN: &str = "1d5e9b04-8f33-4a6e-9c51-7be1f2d40a36";

/// Volume identifier served by the scripted cloud double.
pub const VOLUME_ID: &str = "v-foobar";
