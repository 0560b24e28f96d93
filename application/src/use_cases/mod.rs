//! Use cases (application services)

pub mod guard;
pub mod run_conversation;
pub mod throttle;
