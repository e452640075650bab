use std::collections::BTreeMap;
use std::ops::Deref;

/// Environment variables to inject
///
/// Used for both plain values and secret references:
///
/// ```json
/// {"LOG_LEVEL": "debug", "REGION": "uk"}
/// {"DATABASE_URL": "https://myvault.vault.azure.net/secrets/database-url"}
/// ```
///
/// Backed by a `BTreeMap` so iteration order (and thus the assembled document) is stable.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct EnvVars(BTreeMap<String, String>);

impl EnvVars {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (&String, &String)> + 'a {
        self.0.iter()
    }
}

impl From<BTreeMap<String, String>> for EnvVars {
    fn from(map: BTreeMap<String, String>) -> Self {
        EnvVars(map)
    }
}

impl Deref for EnvVars {
    type Target = BTreeMap<String, String>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
