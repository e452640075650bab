use std::collections::BTreeMap;
use std::env;

use super::assemble::Scope;
use super::deserializers::parse_string_map;
use super::structs::job::{generate_name, parse_command, verify_name, DEFAULT_TIMEOUT};
use super::structs::{EnvVars, JobSpec, Mode, RegistryCredentials, Resources};
use super::{ErrorKind, Result};

/// A key-value source of pipeline inputs
///
/// Implementations should return `None` for inputs that were not given.
pub trait InputSource {
    fn get(&self, name: &str) -> Option<String>;
}

impl InputSource for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

/// Inputs passed as `INPUT_<NAME>` environment variables
///
/// This is how pipeline runners hand `with:` parameters to a step.
/// The environment is snapshotted once, on construction.
pub struct EnvInputs {
    vars: BTreeMap<String, String>,
}

impl EnvInputs {
    pub fn from_env() -> EnvInputs {
        EnvInputs {
            vars: env::vars().filter(|(k, _)| k.starts_with("INPUT_")).collect(),
        }
    }

    /// Environment variable name for an input name
    pub fn key(name: &str) -> String {
        format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
    }
}

impl InputSource for EnvInputs {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(&EnvInputs::key(name)).cloned()
    }
}

/// Validated inputs for one run
///
/// Constructed once at start-up. Nothing after this reads the environment for inputs.
#[derive(Clone, Debug)]
pub struct Inputs {
    pub scope: Scope,
    /// Explicit region, skipping the environment lookup
    pub location: Option<String>,
    /// Log analytics workspace to fetch job logs from
    pub log_workspace_id: Option<String>,
    pub spec: JobSpec,
}

/// Non-blank value, untouched
fn raw(src: &dyn InputSource, name: &str) -> Option<String> {
    src.get(name).filter(|v| !v.trim().is_empty())
}

/// Non-blank value, trimmed
fn optional(src: &dyn InputSource, name: &str) -> Option<String> {
    raw(src, name).map(|v| v.trim().to_string())
}

fn required(src: &dyn InputSource, name: &str) -> Result<String> {
    optional(src, name).ok_or_else(|| ErrorKind::MissingInput(name.into()).into())
}

/// Case insensitive "true"; everything else is false
fn flag(src: &dyn InputSource, name: &str) -> bool {
    optional(src, name)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Json object input; absent means empty
fn json_map(src: &dyn InputSource, name: &str) -> Result<EnvVars> {
    match optional(src, name) {
        None => Ok(EnvVars::default()),
        Some(raw) => {
            let map = parse_string_map(&raw)
                .map_err(|e| ErrorKind::InvalidInput(name.into(), format!("expected a json object of strings: {}", e)))?;
            Ok(map.into())
        }
    }
}

fn timeout(src: &dyn InputSource) -> Result<u32> {
    let raw = match optional(src, "timeout") {
        None => return Ok(DEFAULT_TIMEOUT),
        Some(t) => t,
    };
    match raw.parse::<u32>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => bail!(ErrorKind::InvalidInput(
            "timeout".into(),
            format!("'{}' is not a positive number of seconds", raw)
        )),
    }
}

impl Inputs {
    /// Read and validate every input
    pub fn from_source(src: &dyn InputSource) -> Result<Inputs> {
        let scope = Scope {
            subscription_id: required(src, "subscription-id")?,
            resource_group: required(src, "resource-group")?,
            environment_name: required(src, "environment-name")?,
        };

        let mode = Mode {
            manualExecution: flag(src, "manual-execution"),
            deleteOnly: flag(src, "only-delete-job"),
            dryRun: flag(src, "dry-run"),
        };

        let name = match optional(src, "job-name") {
            Some(n) => {
                verify_name(&n)?;
                n
            }
            None if mode.deleteOnly => bail!(ErrorKind::MissingInput("job-name".into())),
            None => {
                let prefix = optional(src, "job-name-prefix").unwrap_or_else(|| "job".into());
                let generated = generate_name(&prefix);
                verify_name(&generated).map_err(|_| {
                    ErrorKind::InvalidInput(
                        "job-name-prefix".into(),
                        format!("'{}' does not produce valid job names", prefix),
                    )
                })?;
                debug!("Generated job name {}", generated);
                generated
            }
        };

        let image = if mode.deleteOnly {
            optional(src, "image").unwrap_or_default()
        } else {
            required(src, "image")?
        };

        let defaults = Resources::default();
        let spec = JobSpec {
            name,
            image,
            command: raw(src, "command").and_then(|c| parse_command(&c)),
            resources: Resources {
                cpu: optional(src, "cpu").unwrap_or(defaults.cpu),
                memory: optional(src, "memory").unwrap_or(defaults.memory),
            },
            identity: optional(src, "user-managed-identity"),
            env: json_map(src, "environment-variables")?,
            secrets: json_map(src, "secrets")?,
            registry: RegistryCredentials::from_parts(
                optional(src, "registry-server"),
                optional(src, "registry-username"),
                raw(src, "registry-password"),
            ),
            schedule: optional(src, "cron-schedule"),
            timeout: timeout(src)?,
            mode,
        };

        Ok(Inputs {
            scope,
            location: optional(src, "location"),
            log_workspace_id: optional(src, "log-analytics-workspace-id"),
            spec,
        })
    }
}
