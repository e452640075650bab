#![allow(non_snake_case)]

/// Allow normal error handling from structs
pub use super::{ErrorKind, Result, ResultExt};

/// Plain and secret environment maps
mod env;
pub use self::env::EnvVars;

/// Private registry credentials
mod registry;
pub use self::registry::RegistryCredentials;

/// Container resource limits
pub mod resources;
pub use self::resources::Resources;

/// The job spec and its run modes
pub mod job;
pub use self::job::{generate_name, parse_command, JobSpec, Mode, RunMode};
