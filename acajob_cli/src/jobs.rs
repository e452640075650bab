use std::time::Duration;

use super::azure::Arm;
use super::policy::OrWarn;
use super::track::{poll_until, Progress};
use super::{Config, Error, ErrorKind, Result, Timing};
use acajob_definitions::{
    assemble,
    region::{normalize_location, DEFAULT_LOCATION},
    ExecutionRecord, JobDocument, JobSpec, Scope,
};

/// Lifecycle operations on the one job a run owns
///
/// Every operation is sequential and blocks until its remote effect is observed.
pub struct JobApi {
    arm: Arm,
    scope: Scope,
    name: String,
    timing: Timing,
}

impl JobApi {
    /// Acquire a resource manager token and build the api for the configured job
    pub async fn connect(conf: &Config) -> Result<JobApi> {
        let resource = conf.endpoints.resource_manager.as_str();
        let token = conf.credential.token(&conf.endpoints.login, resource).await?;
        Ok(JobApi::new(conf, token))
    }

    pub fn new(conf: &Config, token: String) -> JobApi {
        let arm = Arm::new(conf.endpoints.resource_manager.clone(), token, conf.timing.clone());
        JobApi {
            arm,
            scope: conf.inputs.scope.clone(),
            name: conf.inputs.spec.name.clone(),
            timing: conf.timing.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn job_path(&self) -> String {
        format!(
            "{}/providers/Microsoft.App/jobs/{}",
            self.scope.resource_group_path(),
            self.name
        )
    }

    fn execution_path(&self, execution: &str) -> String {
        format!("{}/executions/{}", self.job_path(), execution)
    }

    /// Region of the managed environment, as reported by the provider
    pub async fn environment_location(&self) -> Result<String> {
        let path = format!(
            "{}/providers/Microsoft.App/managedEnvironments/{}",
            self.scope.resource_group_path(),
            self.scope.environment_name
        );
        let env = self.arm.get(&path).await?;
        match env["location"].as_str() {
            Some(loc) => Ok(loc.to_string()),
            None => bail!("managed environment {} has no location", self.scope.environment_name),
        }
    }

    /// Region to create the job in
    ///
    /// An explicit location wins. Otherwise the environment's location is used,
    /// falling back to `DEFAULT_LOCATION` when it cannot be read.
    pub async fn resolve_location(&self, explicit: Option<&str>) -> String {
        if let Some(loc) = explicit {
            return normalize_location(loc);
        }
        let ctx = format!(
            "Could not read location of environment {}",
            self.scope.environment_name
        );
        match self.environment_location().await.or_warn(&ctx) {
            Some(loc) => normalize_location(&loc),
            None => {
                warn!("Falling back to location {}", DEFAULT_LOCATION);
                DEFAULT_LOCATION.to_string()
            }
        }
    }

    /// Create or replace the job and wait for provisioning to finish
    pub async fn create_or_update(&self, spec: &JobSpec, location: Option<&str>) -> Result<JobDocument> {
        let loc = self.resolve_location(location).await;
        let doc = assemble(&self.scope, &loc, spec);
        info!("Creating job {} in {}", self.name, loc);
        let res: Result<()> = async {
            let acc = self.arm.put(&self.job_path(), &doc).await?;
            self.arm.wait_for("create", &acc).await
        }
        .await;
        res.map_err(|e| {
            let msg = e.to_string();
            Error::with_chain(e, ErrorKind::JobCreationFailed(self.name.clone(), msg))
        })?;
        info!("Created job {}", self.name);
        Ok(doc)
    }

    /// Start one execution and return its name
    ///
    /// Returns once the provider has accepted the start, not when the execution finishes.
    pub async fn start(&self) -> Result<String> {
        info!("Starting execution of {}", self.name);
        let res: Result<String> = async {
            let acc = self.arm.post(&format!("{}/start", self.job_path())).await?;
            let execution = match acc.body["name"].as_str() {
                Some(n) => n.to_string(),
                None => bail!("start response did not name an execution"),
            };
            self.arm.wait_for("start", &acc).await?;
            Ok(execution)
        }
        .await;
        let execution = res.map_err(|e| {
            let msg = e.to_string();
            Error::with_chain(e, ErrorKind::ExecutionStartFailed(self.name.clone(), msg))
        })?;
        info!("Started execution {}", execution);
        Ok(execution)
    }

    /// Current state of an execution
    pub async fn execution(&self, execution: &str) -> Result<ExecutionRecord> {
        let v = self.arm.get(&self.execution_path(execution)).await?;
        let props = &v["properties"];
        Ok(ExecutionRecord {
            name: execution.to_string(),
            status: props["status"].as_str().unwrap_or("Unknown").into(),
            exit_code: props["exitCode"].as_i64(),
        })
    }

    /// Wait for an execution to succeed or fail
    ///
    /// Failed status reads are logged and polled through.
    pub async fn poll(&self, execution: &str, timeout_secs: u32) -> Result<ExecutionRecord> {
        let timeout = Duration::from_secs(timeout_secs.into());
        let found = poll_until(self.timing.poll_interval, timeout, move |attempt| async move {
            match self.execution(execution).await {
                Ok(rec) if rec.status.is_terminal() => Ok(Progress::Done(rec)),
                Ok(rec) => {
                    info!("Execution {} is {} (check {})", execution, rec.status, attempt);
                    Ok(Progress::Pending)
                }
                Err(e) => {
                    warn!("Failed to read status of {}: {}", execution, e);
                    Ok(Progress::Pending)
                }
            }
        })
        .await?;
        match found {
            Some(rec) => {
                info!("Execution {} finished with status {}", execution, rec.status);
                Ok(rec)
            }
            None => bail!(ErrorKind::ExecutionTimeout(execution.to_string(), timeout_secs)),
        }
    }

    /// Delete the job and wait for it to go away
    pub async fn delete(&self) -> Result<()> {
        info!("Deleting job {}", self.name);
        match self.arm.delete(&self.job_path()).await? {
            Some(acc) => self.arm.wait_for("delete", &acc).await?,
            None => info!("Job {} was already gone", self.name),
        }
        Ok(())
    }

    /// Delete the job, warning instead of failing
    ///
    /// Returns whether the delete went through.
    pub async fn delete_best_effort(&self) -> bool {
        let ctx = format!("Failed to delete job {}", self.name);
        self.delete().await.or_warn(&ctx).is_some()
    }
}
