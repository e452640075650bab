use super::{EnvVars, ErrorKind, RegistryCredentials, Resources, Result};
use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

/// Default poll budget for a standard run, in seconds
pub const DEFAULT_TIMEOUT: u32 = 1800;

/// Mode flags the user can set
///
/// These are not mutually exclusive. `dryRun` composes with everything,
/// `deleteOnly` takes precedence over the rest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mode {
    /// Create the job but leave starting it to someone else
    pub manualExecution: bool,
    /// Only delete an existing job
    pub deleteOnly: bool,
    /// Do everything locally, call nothing remotely
    pub dryRun: bool,
}

/// What a run does with the job resource, in precedence order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunMode {
    /// Delete the named job and stop
    DeleteOnly,
    /// Create a cron triggered job and leave it alive
    Scheduled,
    /// Create a manually triggered job and leave it alive
    ManualExecution,
    /// Create, start, wait, fetch logs, delete
    Standard,
}

/// Everything the user declared about the job for this run
#[derive(Clone, Debug, PartialEq)]
pub struct JobSpec {
    /// Resolved job name (explicit or generated)
    pub name: String,

    /// Container image reference
    ///
    /// Empty only in delete-only mode.
    pub image: String,

    /// Command tokens overriding the image entrypoint
    pub command: Option<Vec<String>>,

    pub resources: Resources,

    /// Resource id of a user assigned managed identity
    pub identity: Option<String>,

    /// Plain environment variables
    pub env: EnvVars,

    /// Environment variables backed by key vault secret urls
    pub secrets: EnvVars,

    pub registry: Option<RegistryCredentials>,

    /// Cron schedule; selects the schedule trigger when present
    pub schedule: Option<String>,

    /// Seconds to wait for an execution to finish
    pub timeout: u32,

    pub mode: Mode,
}

impl JobSpec {
    /// A spec with defaults for everything but name and image
    pub fn new(name: &str, image: &str) -> JobSpec {
        JobSpec {
            name: name.into(),
            image: image.into(),
            command: None,
            resources: Resources::default(),
            identity: None,
            env: EnvVars::default(),
            secrets: EnvVars::default(),
            registry: None,
            schedule: None,
            timeout: DEFAULT_TIMEOUT,
            mode: Mode::default(),
        }
    }

    pub fn run_mode(&self) -> RunMode {
        if self.mode.deleteOnly {
            RunMode::DeleteOnly
        } else if self.schedule.is_some() {
            RunMode::Scheduled
        } else if self.mode.manualExecution {
            RunMode::ManualExecution
        } else {
            RunMode::Standard
        }
    }

    /// Whether the job resource must survive the run, even a failed one
    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }
}

/// Verify a job name is usable as a resource name
pub fn verify_name(name: &str) -> Result<()> {
    let re = Regex::new(r"^[a-z][a-z0-9-]{0,30}[a-z0-9]$").unwrap();
    if !re.is_match(name) || name.contains("--") {
        bail!(ErrorKind::InvalidJobName(name.into()));
    }
    Ok(())
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn random_suffix() -> String {
    let mut n = Uuid::new_v4().as_u128();
    (0..6)
        .map(|_| {
            let c = BASE36[(n % 36) as usize] as char;
            n /= 36;
            c
        })
        .collect()
}

/// Generate `<prefix>-<unix millis>-<6 char base36>`
///
/// Collisions are improbable, not impossible.
pub fn generate_name(prefix: &str) -> String {
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), random_suffix())
}

/// Split a command string on whitespace
///
/// Blank input means "use the image default", not an empty command.
pub fn parse_command(raw: &str) -> Option<Vec<String>> {
    let tokens: Vec<String> = raw.split_whitespace().map(String::from).collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}
