#![recursion_limit = "1024"]
#![allow(renamed_and_removed_lints)]
#![allow(non_snake_case)]

#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate log;

#[macro_use]
extern crate error_chain;
error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    links {
        Defs(acajob_definitions::Error, acajob_definitions::ErrorKind);
    }
    foreign_links {
        Fmt(::std::fmt::Error);
        Io(::std::io::Error);
        SerdeJ(serde_json::Error);
        Reqe(reqwest::Error);
        UrlParse(url::ParseError);
    }
    errors {
        MissingCredentials(reason: String) {
            description("no usable azure credentials")
            display("could not acquire an access token: {}", &reason)
        }
        UnexpectedHttpStatus(status: reqwest::StatusCode, msg: String) {
            description("unexpected HTTP status")
            display("unexpected HTTP status {}: {}", &status, &msg)
        }
        Url(url: reqwest::Url) {
            description("could not access URL")
            display("could not access URL '{}'", &url)
        }
        OperationFailed(op: String, status: String, msg: String) {
            description("long running operation did not succeed")
            display("{} operation ended {}: {}", &op, &status, &msg)
        }
        OperationTimeout(op: String, secs: u64) {
            description("long running operation timed out")
            display("{} operation did not finish within {}s", &op, secs)
        }
        JobCreationFailed(job: String, msg: String) {
            description("job creation failed")
            display("job creation failed for {}: {}", &job, &msg)
        }
        ExecutionStartFailed(job: String, msg: String) {
            description("failed to start execution")
            display("failed to start execution of {}: {}", &job, &msg)
        }
        ExecutionTimeout(execution: String, secs: u32) {
            description("execution timed out")
            display("execution {} did not finish within the {}s timeout", &execution, secs)
        }
        ExecutionFailed(execution: String, status: String) {
            description("execution failed")
            display("execution {} ended with status {}", &execution, &status)
        }
        ExecutionExitCode(execution: String, code: i64) {
            description("execution exited non-zero")
            display("execution {} exited with code {}", &execution, code)
        }
    }
}

pub use acajob_definitions::{ExecutionRecord, ExecutionStatus, Inputs, JobDocument, JobSpec};

/// Process level configuration, read once at start-up
pub mod config;
pub use config::{Config, Endpoints, Timing};

/// Access tokens for the resource manager and log analytics
pub mod auth;
pub use auth::Credential;

/// A small resource manager REST client using `reqwest`
pub mod azure;

/// Job lifecycle operations against the control plane
pub mod jobs;
pub use jobs::JobApi;

/// Deadline bounded polling
pub mod track;

/// Best effort log retrieval from log analytics
pub mod logs;

/// Run outputs for the calling pipeline
pub mod outputs;
pub use outputs::Outputs;

/// Failure policies for best effort operations
pub mod policy;

/// The run mode state machine
pub mod run;
pub use run::Outcome;
