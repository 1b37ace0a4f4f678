//! Library side of the `tracker-populate` command.

pub mod driver;
pub mod logging;
pub mod summary;
pub mod trace;
pub mod types;
