//! Remote variables API client
//!
//! Read-only access to the published design file's local variables
//! endpoint, used by the theme resolver when nothing usable exists in the
//! consuming document. Behind a trait so tests can substitute a mock.

use async_trait::async_trait;
use compass_host::HostError;
use serde::Deserialize;
use std::collections::HashMap;

/// One variable collection as reported by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteCollection {
    /// Collection identifier within the source file
    pub id: String,
    /// Collection name
    pub name: String,
}

/// One variable as reported by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteVariable {
    /// Variable identifier within the source file
    pub id: String,
    /// Stable cross-file key (importable)
    pub key: String,
    /// Variable name
    pub name: String,
    /// Owning collection identifier
    #[serde(rename = "variableCollectionId")]
    pub collection_id: String,
}

/// Local variables of a file, keyed by identifier
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteVariables {
    /// Collections by id
    #[serde(rename = "variableCollections")]
    pub collections: HashMap<String, RemoteCollection>,
    /// Variables by id
    pub variables: HashMap<String, RemoteVariable>,
}

impl RemoteVariables {
    /// Variables belonging to a collection whose name matches `predicate`
    pub fn variables_in_collection<'a>(
        &'a self,
        predicate: impl Fn(&str) -> bool + 'a,
    ) -> impl Iterator<Item = &'a RemoteVariable> {
        self.variables.values().filter(move |v| {
            self.collections
                .get(&v.collection_id)
                .is_some_and(|c| predicate(&c.name))
        })
    }
}

#[derive(Debug, Deserialize)]
struct LocalVariablesResponse {
    meta: RemoteVariables,
}

/// Read access to a file's published variables
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VariablesApi: Send + Sync {
    /// Fetch the local variables of `file_key`
    async fn local_variables(&self, file_key: &str) -> Result<RemoteVariables, HostError>;
}

/// HTTP implementation against the design platform's REST API
#[derive(Debug, Clone)]
pub struct HttpVariablesApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpVariablesApi {
    /// Create a client for `base_url` authenticating with `token`
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl VariablesApi for HttpVariablesApi {
    async fn local_variables(&self, file_key: &str) -> Result<RemoteVariables, HostError> {
        let url = format!(
            "{}/files/{}/variables/local",
            self.base_url.trim_end_matches('/'),
            file_key
        );
        tracing::debug!(%url, "fetching remote variables");

        let response = self
            .client
            .get(&url)
            .header("X-Figma-Token", &self.token)
            .send()
            .await
            .map_err(|e| HostError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(HostError::Network(format!(
                "variables endpoint returned {}",
                response.status()
            )));
        }

        let body: LocalVariablesResponse = response
            .json()
            .await
            .map_err(|e| HostError::Network(e.to_string()))?;
        Ok(body.meta)
    }
}

/// No-op client for configurations without remote access
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

#[async_trait]
impl VariablesApi for NoRemote {
    async fn local_variables(&self, _file_key: &str) -> Result<RemoteVariables, HostError> {
        Err(HostError::Unsupported(
            "no remote variables API configured".to_string(),
        ))
    }
}
