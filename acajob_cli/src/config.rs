use std::{env, path::PathBuf, time::Duration};

use url::Url;

use super::{Credential, Result};
use acajob_definitions::{EnvInputs, Inputs};

/// Cloud endpoints
///
/// Defaults to the public cloud. Sovereign clouds (and tests) override these.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub resource_manager: Url,
    pub login: Url,
    pub log_analytics: Url,
}

impl Endpoints {
    pub fn public() -> Result<Endpoints> {
        Ok(Endpoints {
            resource_manager: Url::parse("https://management.azure.com/")?,
            login: Url::parse("https://login.microsoftonline.com/")?,
            log_analytics: Url::parse("https://api.loganalytics.io/")?,
        })
    }

    /// Every endpoint at the same base url
    pub fn all_at(base: &str) -> Result<Endpoints> {
        let url = Url::parse(base)?;
        Ok(Endpoints {
            resource_manager: url.clone(),
            login: url.clone(),
            log_analytics: url,
        })
    }
}

/// How often (and how long) to poll the control plane
#[derive(Clone, Debug)]
pub struct Timing {
    /// Between execution status checks
    pub poll_interval: Duration,
    /// Between long running operation checks, unless told otherwise
    pub operation_interval: Duration,
    /// Upper bound on any single long running operation
    pub operation_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            poll_interval: Duration::from_secs(10),
            operation_interval: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(1800),
        }
    }
}

/// Everything a run needs, constructed once in main
#[derive(Clone, Debug)]
pub struct Config {
    pub inputs: Inputs,
    pub endpoints: Endpoints,
    pub credential: Credential,
    pub timing: Timing,
    /// File the pipeline reads step outputs from
    pub output_file: Option<PathBuf>,
}

fn evar(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn url_evar(key: &str, default: Url) -> Result<Url> {
    match evar(key) {
        Some(u) => Ok(Url::parse(&u)?),
        None => Ok(default),
    }
}

impl Config {
    /// Read inputs and process settings from the environment
    ///
    /// This is the only place the process environment is consulted.
    pub fn from_env() -> Result<Config> {
        let inputs = Inputs::from_source(&EnvInputs::from_env())?;
        let public = Endpoints::public()?;
        let endpoints = Endpoints {
            resource_manager: url_evar("AZURE_RESOURCE_MANAGER_URL", public.resource_manager)?,
            login: url_evar("AZURE_AUTHORITY_HOST", public.login)?,
            log_analytics: url_evar("AZURE_LOG_ANALYTICS_URL", public.log_analytics)?,
        };
        let credential = Credential::from_lookup(evar);
        debug!("Using {:?} against {}", credential, endpoints.resource_manager);
        Ok(Config {
            inputs,
            endpoints,
            credential,
            timing: Timing::default(),
            output_file: evar("GITHUB_OUTPUT").map(PathBuf::from),
        })
    }
}
