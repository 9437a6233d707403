use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::conf::HostConfig;
use crate::error::{MigrationError, Result};

use super::{into_documents, EntityKind, HostApi};

const TOKEN_ENDPOINT: &str = "auth/realms/SHOGun/protocol/openid-connect/token";

/// [HostApi] over HTTP. Requests carry the host's bearer token once one was acquired with
/// [HttpHost::authenticate] and fall back to basic auth otherwise.
pub struct HttpHost {
    config: HostConfig,
    client: Client,
}

impl HttpHost {
    pub fn new(config: HostConfig, accept_invalid_certs: bool) -> Result<Self> {
        if accept_invalid_certs {
            warn!(
                "Certificate validation is disabled for {}",
                config.hostname
            );
        }
        let client = Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Obtains a bearer token through the OpenID Connect password grant. Does nothing for hosts
    /// without a configured client id.
    pub async fn authenticate(&mut self) -> Result<()> {
        let Some(client_id) = self.config.client_id.as_deref() else {
            return Ok(());
        };
        debug!("Fetching token for {}", self.config.hostname);
        let form = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
            ("grant_type", "password"),
            ("client_id", client_id),
        ];
        let response = self
            .client
            .post(self.config.resource_url(TOKEN_ENDPOINT))
            .form(&form)
            .send()
            .await?;
        let body: Value = checked(response).await?.json().await?;
        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                MigrationError::Transport(format!(
                    "Token response of {} has no access_token",
                    self.config.hostname
                ))
            })?;
        self.config.token = Some(token.to_string());
        info!("Acquired token for {}", self.config.hostname);
        Ok(())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request.basic_auth(&self.config.username, Some(&self.config.password)),
        }
    }
}

/// Turns any non-success status into a transport error carrying the response body.
async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(MigrationError::Transport(format!(
        "{url} answered with {status}: {body}"
    )))
}

#[async_trait]
impl HostApi for HttpHost {
    async fn fetch(&self, resource: &str) -> Result<Vec<Value>> {
        let url = self.config.resource_url(resource);
        debug!("Fetching {url}");
        let response = self.authorize(self.client.get(&url)).send().await?;
        let body: Value = checked(response).await?.json().await?;
        Ok(into_documents(body))
    }

    async fn save(&self, kind: EntityKind, document: &Value) -> Result<i64> {
        let url = self.config.resource_url(kind.collection());
        debug!("Saving to {url}");
        let response = self
            .authorize(self.client.post(&url))
            .json(document)
            .send()
            .await?;
        let body: Value = checked(response).await?.json().await?;
        body.get("id").and_then(Value::as_i64).ok_or_else(|| {
            MigrationError::Transport(format!("{url} did not return the id of the saved record"))
        })
    }

    async fn delete(&self, resource: &str) -> Result<()> {
        let url = self.config.resource_url(resource);
        debug!("Deleting {url}");
        let response = self.authorize(self.client.delete(&url)).send().await?;
        checked(response).await?;
        Ok(())
    }

    async fn make_layer_public(&self, id: i64) -> Result<()> {
        let url = self
            .config
            .resource_url(&format!("layers/{id}/permissions/public"));
        let response = self.authorize(self.client.post(&url)).send().await?;
        if !response.status().is_success() {
            warn!(
                "Unable to make layer {id} public, {url} answered with {}",
                response.status()
            );
        }
        Ok(())
    }
}
