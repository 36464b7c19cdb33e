//! Library half of the `evees` binary: configuration and the store-backed
//! application the subcommands drive.

pub mod app;
pub mod config;

pub use app::{App, AppError, NewPerspective, explore_json};
pub use config::{ConfigError, EveesConfig};
