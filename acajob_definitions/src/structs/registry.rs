use std::fmt;

/// Credentials for a private container registry
///
/// Only constructed when all three parts were given.
#[derive(Clone, PartialEq)]
pub struct RegistryCredentials {
    /// Registry host, e.g. `myregistry.azurecr.io`
    pub server: String,
    pub username: String,
    pub password: String,
}

impl RegistryCredentials {
    /// Build from the optional triple, dropping incomplete input
    pub fn from_parts(
        server: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Option<RegistryCredentials> {
        match (server, username, password) {
            (Some(server), Some(username), Some(password))
                if !server.is_empty() && !username.is_empty() && !password.is_empty() =>
            {
                Some(RegistryCredentials {
                    server,
                    username,
                    password,
                })
            }
            (None, None, None) => None,
            _ => {
                warn!("Ignoring incomplete registry credentials (need server, username and password)");
                None
            }
        }
    }
}

// Keep the password out of debug logs
impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
