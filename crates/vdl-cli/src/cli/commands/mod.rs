//! CLI command handlers, one file per command.

mod checksum;
mod completions;
mod get;
mod probe;
mod verify;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use get::{run_get, GetArgs};
pub use probe::run_probe;
pub use verify::run_verify;
