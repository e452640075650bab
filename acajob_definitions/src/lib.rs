#![recursion_limit = "1024"]
#![allow(renamed_and_removed_lints)]
#![allow(non_snake_case)]

#[macro_use]
extern crate serde_derive;

#[cfg(test)]
#[macro_use]
extern crate maplit;

#[macro_use]
extern crate log;

#[macro_use]
extern crate error_chain;
error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    links {}
    foreign_links {
        Fmt(::std::fmt::Error);
        Int(::std::num::ParseIntError);
        SerdeJ(serde_json::Error);
    }
    errors {
        MissingInput(name: String) {
            description("required input not specified")
            display("input '{}' is required", &name)
        }
        InvalidInput(name: String, reason: String) {
            description("input has an invalid value")
            display("input '{}' is invalid: {}", &name, &reason)
        }
        InvalidJobName(name: String) {
            description("job name is not a valid resource name")
            display("job name '{}' must be 2-32 lowercase alphanumerics or hyphens, start with a letter and end with an alphanumeric", &name)
        }
    }
}

/// Inputs read from the pipeline and their validation
pub mod config;
pub use config::{EnvInputs, InputSource, Inputs};

/// Structs describing what the user asked for
pub mod structs;
pub use structs::{JobSpec, Mode, RegistryCredentials};

/// Structs describing the resource manager job document
pub mod document;
pub use document::JobDocument;

/// The pure mapping from a `JobSpec` to a `JobDocument`
pub mod assemble;
pub use assemble::{assemble, secret_collisions, Scope};

/// Region name handling
pub mod region;

/// Execution states reported by the control plane
pub mod status;
pub use status::{ExecutionRecord, ExecutionStatus};

/// Lenient string deserialization for json maps
pub mod deserializers;
