//! Common utilities and helpers

pub mod fs;
pub mod time;
