use std::fmt;

/// Status of a job execution
///
/// Only `Succeeded` and `Failed` end polling. Anything the provider
/// adds beyond the known states is kept verbatim.
#[derive(Clone, Debug, PartialEq)]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Failed,
    Other(String),
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        match self {
            ExecutionStatus::Succeeded | ExecutionStatus::Failed => true,
            _ => false,
        }
    }
}

impl From<&str> for ExecutionStatus {
    fn from(s: &str) -> Self {
        match s {
            "Running" => ExecutionStatus::Running,
            "Succeeded" => ExecutionStatus::Succeeded,
            "Failed" => ExecutionStatus::Failed,
            other => ExecutionStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Running => write!(f, "Running"),
            ExecutionStatus::Succeeded => write!(f, "Succeeded"),
            ExecutionStatus::Failed => write!(f, "Failed"),
            ExecutionStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// What we know about one execution of a job
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionRecord {
    pub name: String,
    pub status: ExecutionStatus,
    /// Exit code of the main container, when the provider reports one
    pub exit_code: Option<i64>,
}

impl ExecutionRecord {
    /// Did the execution do what it was meant to?
    ///
    /// A missing exit code counts as zero.
    pub fn succeeded(&self) -> bool {
        self.status == ExecutionStatus::Succeeded && self.exit_code.unwrap_or(0) == 0
    }
}
