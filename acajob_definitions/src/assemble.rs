use std::collections::BTreeMap;

use super::document::{
    Container, ContainerResources, EnvVar, Identity, JobConfiguration, JobDocument, JobProperties,
    JobTemplate, Registry, Secret, TriggerConfig,
};
use super::JobSpec;

/// Provider side replica timeout
///
/// Independent of `JobSpec::timeout`, which is enforced by our own polling.
pub const REPLICA_TIMEOUT: u32 = 1800;
/// Executions are never retried by the provider
pub const REPLICA_RETRY_LIMIT: u32 = 0;
/// Name of the single container in the template
pub const CONTAINER_NAME: &str = "main";
/// Secret synthesized for registry credentials
pub const REGISTRY_SECRET: &str = "registry-password";

/// Where the job lives
#[derive(Clone, Debug, PartialEq)]
pub struct Scope {
    pub subscription_id: String,
    pub resource_group: String,
    /// Name of the managed environment
    pub environment_name: String,
}

impl Scope {
    /// Resource path of the resource group, without a leading slash
    pub fn resource_group_path(&self) -> String {
        format!(
            "subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )
    }

    /// Full resource id of the managed environment
    pub fn environment_id(&self) -> String {
        format!(
            "/{}/providers/Microsoft.App/managedEnvironments/{}",
            self.resource_group_path(),
            self.environment_name
        )
    }
}

/// Provider secret name for an environment variable name
///
/// Secret names only allow lowercase alphanumerics and hyphens.
pub fn normalize_secret_name(key: &str) -> String {
    key.to_lowercase().replace('_', "-")
}

fn trigger(cron: Option<&String>) -> TriggerConfig {
    TriggerConfig {
        cronExpression: cron.cloned(),
        parallelism: 1,
        replicaCompletionCount: 1,
    }
}

/// Map a job spec onto the provider's job document
///
/// Pure and deterministic: the same inputs always give the same document.
pub fn assemble(scope: &Scope, location: &str, spec: &JobSpec) -> JobDocument {
    let mut env: Vec<EnvVar> = spec
        .env
        .iter()
        .map(|(k, v)| EnvVar {
            name: k.clone(),
            value: Some(v.clone()),
            secretRef: None,
        })
        .collect();

    let mut secrets = vec![];
    for (k, url) in spec.secrets.iter().filter(|(_, url)| !url.is_empty()) {
        let name = normalize_secret_name(k);
        secrets.push(Secret {
            name: name.clone(),
            keyVaultUrl: Some(url.clone()),
            identity: spec.identity.clone(),
            value: None,
        });
        env.push(EnvVar {
            name: k.clone(),
            value: None,
            secretRef: Some(name),
        });
    }

    let mut registries = vec![];
    if let Some(reg) = &spec.registry {
        registries.push(Registry {
            server: reg.server.clone(),
            username: reg.username.clone(),
            passwordSecretRef: REGISTRY_SECRET.into(),
        });
        secrets.push(Secret {
            name: REGISTRY_SECRET.into(),
            keyVaultUrl: None,
            identity: None,
            value: Some(reg.password.clone()),
        });
    }

    let (triggerType, manualTriggerConfig, scheduleTriggerConfig) = match &spec.schedule {
        Some(cron) => ("Schedule", None, Some(trigger(Some(cron)))),
        None => ("Manual", Some(trigger(None)), None),
    };

    let identity = spec.identity.as_ref().map(|id| {
        let mut ids = BTreeMap::new();
        ids.insert(id.clone(), serde_json::json!({}));
        Identity {
            identityType: "UserAssigned".into(),
            userAssignedIdentities: ids,
        }
    });

    JobDocument {
        location: location.into(),
        identity,
        properties: JobProperties {
            environmentId: scope.environment_id(),
            configuration: JobConfiguration {
                triggerType: triggerType.into(),
                replicaTimeout: REPLICA_TIMEOUT,
                replicaRetryLimit: REPLICA_RETRY_LIMIT,
                manualTriggerConfig,
                scheduleTriggerConfig,
                secrets,
                registries,
            },
            template: JobTemplate {
                containers: vec![Container {
                    name: CONTAINER_NAME.into(),
                    image: spec.image.clone(),
                    command: spec.command.clone(),
                    env,
                    resources: ContainerResources {
                        cpu: spec.resources.cores(),
                        memory: spec.resources.memory.clone(),
                    },
                }],
            },
        },
    }
}

/// Normalized secret names claimed by more than one input
///
/// `assemble` does not resolve these; the provider will reject or merge them.
/// Returns the normalized name along with every input key mapping onto it.
pub fn secret_collisions(spec: &JobSpec) -> Vec<(String, Vec<String>)> {
    let mut claims: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (k, url) in spec.secrets.iter() {
        if !url.is_empty() {
            claims.entry(normalize_secret_name(k)).or_default().push(k.clone());
        }
    }
    if spec.registry.is_some() {
        claims
            .entry(REGISTRY_SECRET.into())
            .or_default()
            .push("registry-password".into());
    }
    claims.into_iter().filter(|(_, keys)| keys.len() > 1).collect()
}

#[cfg(test)]
mod tests {
    use super::{assemble, normalize_secret_name, secret_collisions, Scope};
    use crate::{JobSpec, RegistryCredentials};
    use serde_json::json;

    fn scope() -> Scope {
        Scope {
            subscription_id: "sub-1".into(),
            resource_group: "rg-1".into(),
            environment_name: "env-1".into(),
        }
    }

    fn registry() -> RegistryCredentials {
        RegistryCredentials {
            server: "myregistry.azurecr.io".into(),
            username: "puller".into(),
            password: "hunter2".into(),
        }
    }

    #[test]
    fn minimal_document() {
        let spec = JobSpec::new("j1", "nginx:1.19");
        let doc = serde_json::to_value(assemble(&scope(), "eastus", &spec)).unwrap();
        assert_eq!(
            doc,
            json!({
                "location": "eastus",
                "properties": {
                    "environmentId": "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.App/managedEnvironments/env-1",
                    "configuration": {
                        "triggerType": "Manual",
                        "replicaTimeout": 1800,
                        "replicaRetryLimit": 0,
                        "manualTriggerConfig": { "parallelism": 1, "replicaCompletionCount": 1 },
                        "secrets": [],
                        "registries": []
                    },
                    "template": {
                        "containers": [{
                            "name": "main",
                            "image": "nginx:1.19",
                            "env": [],
                            "resources": { "cpu": 0.5, "memory": "1Gi" }
                        }]
                    }
                }
            })
        );
    }

    #[test]
    fn assemble_is_deterministic() {
        let mut spec = JobSpec::new("j1", "nginx");
        spec.env = btreemap! {
            "B".to_string() => "2".to_string(),
            "A".to_string() => "1".to_string(),
        }
        .into();
        spec.secrets = btreemap! {
            "DB_URL".to_string() => "https://v.vault.azure.net/secrets/db".to_string(),
            "API_KEY".to_string() => "https://v.vault.azure.net/secrets/api".to_string(),
        }
        .into();
        spec.registry = Some(registry());
        let a = serde_json::to_string(&assemble(&scope(), "eastus", &spec)).unwrap();
        let b = serde_json::to_string(&assemble(&scope(), "eastus", &spec.clone())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn secrets_become_references() {
        let mut spec = JobSpec::new("j1", "nginx");
        spec.identity = Some("/subscriptions/s/resourceGroups/r/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id1".into());
        spec.secrets = btreemap! {
            "DB_URL".to_string() => "https://v.vault.azure.net/secrets/db".to_string(),
            "UNSET".to_string() => "".to_string(),
        }
        .into();
        let doc = assemble(&scope(), "eastus", &spec);
        let cfg = &doc.properties.configuration;
        assert_eq!(cfg.secrets.len(), 1);
        assert_eq!(cfg.secrets[0].name, "db-url");
        assert_eq!(cfg.secrets[0].keyVaultUrl.as_deref(), Some("https://v.vault.azure.net/secrets/db"));
        assert_eq!(cfg.secrets[0].identity, spec.identity);

        let env = &doc.properties.template.containers[0].env;
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].name, "DB_URL");
        assert_eq!(env[0].secretRef.as_deref(), Some("db-url"));
        assert_eq!(env[0].value, None);
        // empty secrets are not wired up anywhere
        assert!(!env.iter().any(|e| e.name == "UNSET"));
        assert!(!cfg.secrets.iter().any(|s| s.name == "unset"));
    }

    #[test]
    fn secrets_without_identity_omit_it() {
        let mut spec = JobSpec::new("j1", "nginx");
        spec.secrets = btreemap! {
            "TOKEN".to_string() => "https://v.vault.azure.net/secrets/t".to_string(),
        }
        .into();
        let doc = assemble(&scope(), "eastus", &spec);
        assert_eq!(doc.identity, None);
        assert_eq!(doc.properties.configuration.secrets[0].identity, None);
        let secret = serde_json::to_value(&doc.properties.configuration.secrets[0]).unwrap();
        assert_eq!(
            secret,
            json!({"name": "token", "keyVaultUrl": "https://v.vault.azure.net/secrets/t"})
        );
    }

    #[test]
    fn plain_env_before_secret_refs() {
        let mut spec = JobSpec::new("j1", "nginx");
        spec.env = btreemap! { "Z_PLAIN".to_string() => "z".to_string() }.into();
        spec.secrets = btreemap! {
            "A_SECRET".to_string() => "https://v.vault.azure.net/secrets/a".to_string(),
        }
        .into();
        let doc = assemble(&scope(), "eastus", &spec);
        let names: Vec<_> = doc.properties.template.containers[0]
            .env
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Z_PLAIN", "A_SECRET"]);
    }

    #[test]
    fn registry_block() {
        let mut spec = JobSpec::new("j1", "myregistry.azurecr.io/app:1");
        spec.registry = Some(registry());
        let doc = serde_json::to_value(assemble(&scope(), "eastus", &spec)).unwrap();
        let cfg = &doc["properties"]["configuration"];
        assert_eq!(
            cfg["registries"],
            json!([{
                "server": "myregistry.azurecr.io",
                "username": "puller",
                "passwordSecretRef": "registry-password"
            }])
        );
        assert_eq!(cfg["secrets"], json!([{ "name": "registry-password", "value": "hunter2" }]));

        spec.registry = None;
        let doc = assemble(&scope(), "eastus", &spec);
        assert!(doc.properties.configuration.registries.is_empty());
        assert!(doc.properties.configuration.secrets.is_empty());
    }

    #[test]
    fn schedule_trigger() {
        let mut spec = JobSpec::new("j1", "nginx");
        spec.schedule = Some("0 3 * * *".into());
        let doc = serde_json::to_value(assemble(&scope(), "eastus", &spec)).unwrap();
        let cfg = &doc["properties"]["configuration"];
        assert_eq!(cfg["triggerType"], "Schedule");
        assert_eq!(
            cfg["scheduleTriggerConfig"],
            json!({ "cronExpression": "0 3 * * *", "parallelism": 1, "replicaCompletionCount": 1 })
        );
        assert!(cfg.get("manualTriggerConfig").is_none());
    }

    #[test]
    fn user_assigned_identity() {
        let mut spec = JobSpec::new("j1", "nginx");
        spec.identity = Some("/id/1".into());
        let doc = serde_json::to_value(assemble(&scope(), "eastus", &spec)).unwrap();
        assert_eq!(
            doc["identity"],
            json!({ "type": "UserAssigned", "userAssignedIdentities": { "/id/1": {} } })
        );
    }

    #[test]
    fn replica_timeout_ignores_poll_timeout() {
        let mut spec = JobSpec::new("j1", "nginx");
        spec.timeout = 7200;
        let doc = assemble(&scope(), "eastus", &spec);
        assert_eq!(doc.properties.configuration.replicaTimeout, 1800);
        assert_eq!(doc.properties.configuration.replicaRetryLimit, 0);
    }

    #[test]
    fn command_and_resources() {
        let mut spec = JobSpec::new("j1", "busybox");
        spec.command = Some(vec!["echo".into(), "hi".into()]);
        spec.resources.cpu = "1.25".into();
        spec.resources.memory = "2.5Gi".into();
        let doc = serde_json::to_value(assemble(&scope(), "eastus", &spec)).unwrap();
        let c = &doc["properties"]["template"]["containers"][0];
        assert_eq!(c["command"], json!(["echo", "hi"]));
        assert_eq!(c["resources"], json!({ "cpu": 1.25, "memory": "2.5Gi" }));
    }

    #[test]
    fn malformed_cpu_is_passed_on() {
        let mut spec = JobSpec::new("j1", "busybox");
        spec.resources.cpu = "lots".into();
        let doc = serde_json::to_value(assemble(&scope(), "eastus", &spec)).unwrap();
        assert_eq!(doc["properties"]["template"]["containers"][0]["resources"]["cpu"], json!(null));
    }

    #[test]
    fn normalized_secret_names() {
        assert_eq!(normalize_secret_name("DATABASE_URL"), "database-url");
        assert_eq!(normalize_secret_name("Api-Key"), "api-key");
    }

    // Known gap: colliding names are carried into the document as-is
    #[test]
    fn colliding_secret_names_are_reported_not_resolved() {
        let mut spec = JobSpec::new("j1", "nginx");
        spec.secrets = btreemap! {
            "FOO-BAR".to_string() => "https://v.vault.azure.net/secrets/one".to_string(),
            "FOO_BAR".to_string() => "https://v.vault.azure.net/secrets/two".to_string(),
        }
        .into();
        let doc = assemble(&scope(), "eastus", &spec);
        let dupes = doc
            .properties
            .configuration
            .secrets
            .iter()
            .filter(|s| s.name == "foo-bar")
            .count();
        assert_eq!(dupes, 2);

        let collisions = secret_collisions(&spec);
        assert_eq!(
            collisions,
            vec![("foo-bar".to_string(), vec!["FOO-BAR".to_string(), "FOO_BAR".to_string()])]
        );
    }

    #[test]
    fn registry_secret_collision() {
        let mut spec = JobSpec::new("j1", "nginx");
        spec.registry = Some(registry());
        spec.secrets = btreemap! {
            "REGISTRY_PASSWORD".to_string() => "https://v.vault.azure.net/secrets/rp".to_string(),
        }
        .into();
        let collisions = secret_collisions(&spec);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].0, "registry-password");
        assert!(secret_collisions(&JobSpec::new("j1", "nginx")).is_empty());
    }
}
