//! Resource manager representation of a container apps job
//!
//! Field names follow the `Microsoft.App/jobs` schema verbatim,
//! hence the camelCase struct members.
#![allow(non_snake_case)]

use std::collections::BTreeMap;

/// The document PUT to `Microsoft.App/jobs/{name}`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobDocument {
    /// Canonical region name, e.g. `eastus`
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,

    pub properties: JobProperties,
}

/// Managed identity attached to the job's runtime
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Identity {
    /// Always `UserAssigned` here
    #[serde(rename = "type")]
    pub identityType: String,
    /// Identity resource id -> empty object (filled in by the provider)
    pub userAssignedIdentities: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobProperties {
    /// Resource id of the managed environment
    pub environmentId: String,
    pub configuration: JobConfiguration,
    pub template: JobTemplate,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobConfiguration {
    /// `Manual` or `Schedule`
    pub triggerType: String,

    /// Provider side timeout per replica in seconds
    pub replicaTimeout: u32,
    pub replicaRetryLimit: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manualTriggerConfig: Option<TriggerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduleTriggerConfig: Option<TriggerConfig>,

    #[serde(default)]
    pub secrets: Vec<Secret>,

    #[serde(default)]
    pub registries: Vec<Registry>,
}

/// Shared shape of the manual and schedule trigger blocks
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TriggerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cronExpression: Option<String>,
    pub parallelism: u32,
    pub replicaCompletionCount: u32,
}

/// A secret known to the job
///
/// Either a key vault reference (with an identity to read it) or a literal value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Secret {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyVaultUrl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Registry {
    pub server: String,
    pub username: String,
    /// Name of the secret holding the password
    pub passwordSecretRef: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobTemplate {
    pub containers: Vec<Container>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    pub resources: ContainerResources,
}

/// An environment variable with either a literal value or a secret reference
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secretRef: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContainerResources {
    pub cpu: f64,
    pub memory: String,
}

impl JobDocument {
    /// Pretty json for humans (dry runs)
    pub fn to_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
