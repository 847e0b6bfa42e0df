//! CLI subcommand implementations.

pub mod preview;
pub mod sync;
pub mod util;
