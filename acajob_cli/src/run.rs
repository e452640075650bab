use std::fmt;

use super::{jobs::JobApi, logs, Config, ErrorKind, Outputs, Result};
use acajob_definitions::{
    assemble,
    region::{normalize_location, DEFAULT_LOCATION},
    secret_collisions,
    structs::RunMode,
    ExecutionRecord, ExecutionStatus, JobDocument,
};

/// How a successful run ended
#[derive(Debug)]
pub enum Outcome {
    /// Delete-only run
    Deleted,
    /// Nothing was sent; the document is absent for a delete-only dry run
    DryRun(Option<JobDocument>),
    /// Scheduled or manual job left alive
    Created(JobDocument),
    /// Standard run that finished successfully
    Completed(ExecutionRecord),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Deleted => write!(f, "job deleted"),
            Outcome::DryRun(_) => write!(f, "dry run complete"),
            Outcome::Created(_) => write!(f, "job created and left in place"),
            Outcome::Completed(rec) => write!(f, "execution {} {}", rec.name, rec.status),
        }
    }
}

/// Assemble and print the document without any remote call
fn dry_run(conf: &Config, mode: RunMode) -> Result<Outcome> {
    let spec = &conf.inputs.spec;
    if mode == RunMode::DeleteOnly {
        info!("Dry run: would delete job {}", spec.name);
        return Ok(Outcome::DryRun(None));
    }
    let loc = conf
        .inputs
        .location
        .as_ref()
        .map(|l| normalize_location(l))
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    let doc = assemble(&conf.inputs.scope, &loc, spec);
    info!("Dry run: job {} would be created with", spec.name);
    println!("{}", doc.to_pretty()?);
    Ok(Outcome::DryRun(Some(doc)))
}

// Everything covered by cleanup on failure
async fn drive(conf: &Config, api: &JobApi, mode: RunMode, outputs: &mut Outputs) -> Result<Outcome> {
    let spec = &conf.inputs.spec;
    let doc = api.create_or_update(spec, conf.inputs.location.as_deref()).await?;
    if mode != RunMode::Standard {
        info!("Job {} is {:?}; not starting an execution", spec.name, mode);
        return Ok(Outcome::Created(doc));
    }
    let execution = api.start().await?;
    outputs.set("execution-name", &execution)?;
    let rec = api.poll(&execution, spec.timeout).await?;
    logs::fetch_logs(conf, &spec.name).await;
    Ok(Outcome::Completed(rec))
}

/// Run the configured job to completion
///
/// Sets the `job-name` output immediately and `execution-name` once an
/// execution has started. Any failure after creation deletes the job
/// (unless it is scheduled) before the original error is returned.
pub async fn run(conf: &Config, outputs: &mut Outputs) -> Result<Outcome> {
    let spec = &conf.inputs.spec;
    let mode = spec.run_mode();
    outputs.set("job-name", &spec.name)?;

    if mode != RunMode::DeleteOnly {
        for (name, keys) in secret_collisions(spec) {
            warn!("Secrets {} all map to secret name {}", keys.join(", "), name);
        }
    }
    if spec.mode.dryRun {
        return dry_run(conf, mode);
    }

    let api = JobApi::connect(conf).await?;
    if mode == RunMode::DeleteOnly {
        api.delete_best_effort().await;
        return Ok(Outcome::Deleted);
    }

    let outcome = match drive(conf, &api, mode, outputs).await {
        Ok(o) => o,
        Err(e) => {
            if mode == RunMode::Scheduled {
                warn!("Leaving scheduled job {} in place after failure", spec.name);
            } else {
                api.delete_best_effort().await;
            }
            return Err(e);
        }
    };

    if let Outcome::Completed(rec) = &outcome {
        api.delete_best_effort().await;
        if !rec.succeeded() {
            if rec.status != ExecutionStatus::Succeeded {
                bail!(ErrorKind::ExecutionFailed(rec.name.clone(), rec.status.to_string()));
            }
            bail!(ErrorKind::ExecutionExitCode(rec.name.clone(), rec.exit_code.unwrap_or_default()));
        }
    }
    Ok(outcome)
}
