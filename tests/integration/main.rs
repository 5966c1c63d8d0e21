//! Integration test binary -- all integration tests consolidated into a single
//! binary to reduce link time.

// Allow unwrap/expect in test code
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]


mod completion_contract;
mod config_roundtrip;
mod pipeline_e2e;
mod server_api;
