//! Output formatting for conversation results

pub mod console;
