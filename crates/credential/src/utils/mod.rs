//! Utility modules

pub mod fs;
pub mod time;

pub use fs::{atomic_write, ensure_parent_dir};
pub use time::{days, format_timestamp, parse_timestamp};
