//! Bound service lookup
//!
//! Session store features only need to know whether a matching service is
//! bound and read a few credential fields. Bindings are read from a JSON
//! array produced by the platform:
//!
//! ```json
//! [{"binding_name": "redis-sessions", "label": "redis",
//!   "credentials": {"host": "10.0.0.4", "port": 6379, "password": "s3cret"}}]
//! ```

use crate::error::{PhpWebError, PhpWebResult};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Credential fields of one binding
pub type Credentials = Map<String, Value>;

/// One bound service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceBinding {
    /// Name the binding was created with
    pub binding_name: String,

    /// Service offering label, e.g. `redis`
    #[serde(default)]
    pub label: String,

    /// Extra tags from the service broker
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub credentials: Credentials,
}

impl ServiceBinding {
    /// True if this binding looks like a `kind` service
    fn provides(&self, kind: &str) -> bool {
        let kind = kind.to_lowercase();
        self.label.to_lowercase() == kind
            || self.tags.iter().any(|t| t.to_lowercase() == kind)
            || self.binding_name.to_lowercase().contains(&kind)
    }
}

/// All services bound to the application
#[derive(Debug, Clone, Default)]
pub struct Services {
    bindings: Vec<ServiceBinding>,
}

impl Services {
    pub fn new(bindings: Vec<ServiceBinding>) -> Self {
        Self { bindings }
    }

    /// Read bindings from a JSON file; a missing file means no bindings
    pub async fn from_file(path: &Path) -> PhpWebResult<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No service bindings at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(PhpWebError::io(
                    format!("reading service bindings {}", path.display()),
                    e,
                ))
            }
        };

        let bindings: Vec<ServiceBinding> = serde_json::from_str(&content)?;
        Ok(Self::new(bindings))
    }

    /// Find credentials for a session store.
    ///
    /// An exact binding name match wins; otherwise any binding providing
    /// `kind` is used.
    pub fn find(&self, binding_name: &str, kind: &str) -> Option<&Credentials> {
        self.bindings
            .iter()
            .find(|b| !binding_name.is_empty() && b.binding_name == binding_name)
            .or_else(|| self.bindings.iter().find(|b| b.provides(kind)))
            .map(|b| &b.credentials)
    }
}

/// Read a string credential
pub fn credential_str<'a>(creds: &'a Credentials, key: &str) -> Option<&'a str> {
    creds.get(key).and_then(Value::as_str)
}

/// Read a port credential, given either as a number or a numeric string
pub fn credential_port(creds: &Credentials, key: &str) -> Option<u16> {
    match creds.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
