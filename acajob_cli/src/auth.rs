use std::fmt;

use tokio::process::Command;
use url::Url;

use super::{Error, ErrorKind, Result, ResultExt};

/// Where access tokens come from
///
/// Chosen once at start-up. Tokens are requested per resource
/// (resource manager, log analytics) when a client is built.
#[derive(Clone)]
pub enum Credential {
    /// A pre-minted bearer token, used as-is for every resource
    Token(String),
    /// Service principal with a client secret
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// Whatever `az login` left behind
    AzCli,
}

// Keep secrets out of debug logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Token(_) => write!(f, "static access token"),
            Credential::ClientSecret { tenant_id, client_id, .. } => {
                write!(f, "client secret for {} in tenant {}", client_id, tenant_id)
            }
            Credential::AzCli => write!(f, "az cli credentials"),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzCliToken {
    access_token: String,
}

impl Credential {
    /// Pick a credential from `AZURE_*` variables
    ///
    /// A static token wins over a service principal, which wins over the az cli.
    pub fn from_lookup<F>(get: F) -> Credential
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = get("AZURE_ACCESS_TOKEN") {
            return Credential::Token(token);
        }
        match (
            get("AZURE_TENANT_ID"),
            get("AZURE_CLIENT_ID"),
            get("AZURE_CLIENT_SECRET"),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => Credential::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            },
            _ => Credential::AzCli,
        }
    }

    /// Get a bearer token for `resource`
    pub async fn token(&self, login: &Url, resource: &str) -> Result<String> {
        match self {
            Credential::Token(t) => Ok(t.clone()),
            Credential::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => client_secret_token(login, tenant_id, client_id, client_secret, resource).await,
            Credential::AzCli => az_cli_token(resource).await,
        }
    }
}

/// OAuth2 client credentials grant
async fn client_secret_token(
    login: &Url,
    tenant: &str,
    client_id: &str,
    secret: &str,
    resource: &str,
) -> Result<String> {
    let url = login.join(&format!("{}/oauth2/v2.0/token", tenant))?;
    let scope = format!("{}/.default", resource.trim_end_matches('/'));
    debug!("POST {} for {}", url, scope);
    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", secret),
        ("scope", scope.as_str()),
    ];
    let res = reqwest::Client::new()
        .post(url.clone())
        .form(&form)
        .send()
        .await
        .chain_err(|| ErrorKind::Url(url.clone()))?;

    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        // token endpoint puts the useful bit in error_description
        let reason = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error_description"].as_str().map(String::from))
            .unwrap_or(body);
        let err: Error = ErrorKind::UnexpectedHttpStatus(status, reason).into();
        return Err(err).chain_err(|| ErrorKind::MissingCredentials(format!("token request for {} failed", client_id)));
    }
    let tr: TokenResponse = serde_json::from_str(&body)?;
    Ok(tr.access_token)
}

/// Shell out to `az account get-access-token`
async fn az_cli_token(resource: &str) -> Result<String> {
    let args = vec![
        "account".to_string(),
        "get-access-token".into(),
        "--resource".into(),
        resource.into(),
        "--output".into(),
        "json".into(),
    ];
    debug!("az {}", args.join(" "));
    let s = Command::new("az").args(&args).output().await.map_err(|e| {
        Error::with_chain(e, ErrorKind::MissingCredentials("az cli not found".into()))
    })?;
    if !s.status.success() {
        let err = String::from_utf8_lossy(&s.stderr).trim().to_string();
        bail!(ErrorKind::MissingCredentials(format!("az account get-access-token: {}", err)));
    }
    let tok: AzCliToken = serde_json::from_slice(&s.stdout)?;
    Ok(tok.access_token)
}

#[cfg(test)]
mod tests {
    use super::Credential;
    use std::collections::BTreeMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn credential_precedence() {
        let c = Credential::from_lookup(lookup(&[
            ("AZURE_ACCESS_TOKEN", "tok"),
            ("AZURE_TENANT_ID", "t"),
            ("AZURE_CLIENT_ID", "c"),
            ("AZURE_CLIENT_SECRET", "s"),
        ]));
        assert!(matches!(c, Credential::Token(ref t) if t == "tok"));

        let c = Credential::from_lookup(lookup(&[
            ("AZURE_TENANT_ID", "t"),
            ("AZURE_CLIENT_ID", "c"),
            ("AZURE_CLIENT_SECRET", "s"),
        ]));
        assert!(matches!(c, Credential::ClientSecret { .. }));

        // partial service principals fall through
        let c = Credential::from_lookup(lookup(&[("AZURE_CLIENT_ID", "c")]));
        assert!(matches!(c, Credential::AzCli));
    }

    #[test]
    fn debug_hides_secrets() {
        let c = Credential::ClientSecret {
            tenant_id: "t".into(),
            client_id: "c".into(),
            client_secret: "hunter2".into(),
        };
        assert!(!format!("{:?}", c).contains("hunter2"));
        assert!(!format!("{:?}", Credential::Token("hunter2".into())).contains("hunter2"));
    }
}
