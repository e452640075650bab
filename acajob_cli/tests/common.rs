#![allow(dead_code)]

use std::{collections::BTreeMap, time::Duration};

use acajob::{Config, Credential, Endpoints, Inputs, Timing};
use mockito::Matcher;

pub const RG_PATH: &str = "/subscriptions/sub-1/resourceGroups/rg-1";

/// Match a path whatever query string is attached
pub fn path(p: &str) -> Matcher {
    Matcher::Regex(format!(r"^{}(\?.*)?$", regex::escape(p)))
}

pub fn job_path(job: &str) -> String {
    format!("{}/providers/Microsoft.App/jobs/{}", RG_PATH, job)
}

pub fn env_path() -> String {
    format!("{}/providers/Microsoft.App/managedEnvironments/env-1", RG_PATH)
}

/// Inputs for a job in the fake scope plus whatever overrides are given
pub fn inputs(overrides: &[(&str, &str)]) -> Inputs {
    let mut src: BTreeMap<String, String> = BTreeMap::new();
    src.insert("subscription-id".into(), "sub-1".into());
    src.insert("resource-group".into(), "rg-1".into());
    src.insert("environment-name".into(), "env-1".into());
    src.insert("image".into(), "alpine:3".into());
    for (k, v) in overrides {
        src.insert(k.to_string(), v.to_string());
    }
    Inputs::from_source(&src).unwrap()
}

/// A config pointing every endpoint at the mock server
pub fn config(overrides: &[(&str, &str)]) -> Config {
    Config {
        inputs: inputs(overrides),
        endpoints: Endpoints::all_at(&mockito::server_url()).unwrap(),
        credential: Credential::Token("testtoken".into()),
        timing: Timing {
            poll_interval: Duration::from_millis(10),
            operation_interval: Duration::from_millis(10),
            operation_timeout: Duration::from_secs(2),
        },
        output_file: None,
    }
}
