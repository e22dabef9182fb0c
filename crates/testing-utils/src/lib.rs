//! # Scheduler Testing Utils
//!
//! Shared testing utilities for the task scheduler workspace: task and worker
//! builders, a recording event sink, a scripted mock task, and async helpers.
//!
//! ```toml
//! [dev-dependencies]
//! scheduler-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
