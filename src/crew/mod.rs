//! Content crew: role-bound work units executed as a linear pipeline.
//!
//! - `role`: personas (planner, writer, editor) guiding each stage
//! - `task`: stage identifiers and the work units bound to a role
//! - `pipeline`: the ordered plan/write/edit pipeline and its builder
//! - `engine`: executes a pipeline against a chat model
//! - `runner`: single-shot execution boundary producing a typed result

pub mod engine;
pub mod pipeline;
pub mod role;
pub mod runner;
pub mod task;
