//! OpenStack-compatible API client implementing the [`CloudApi`] seam.

mod error;
mod types;

use std::time::Duration;

use tracing::debug;

use crate::api::{ApiFuture, CloudApi, ServerRecord, VolumeParams, VolumeRecord};
use crate::config::CloudConfig;
use types::{CreateVolumeBody, ServerEnvelope, VolumeEnvelope};

pub use error::OpenStackApiError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the volume and compute endpoints of an OpenStack-compatible
/// cloud. Authentication uses a pre-issued token; obtaining and renewing the
/// token belongs to the plugin host.
#[derive(Clone, Debug)]
pub struct OpenStackApi {
    http: reqwest::Client,
    volume_api_url: String,
    compute_api_url: String,
    auth_token: String,
}

impl OpenStackApi {
    /// Constructs a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackApiError::Config`] when the provided configuration
    /// fails validation.
    pub fn new(config: &CloudConfig) -> Result<Self, OpenStackApiError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Ok(Self {
            http,
            volume_api_url: config.volume_api_url.trim_end_matches('/').to_owned(),
            compute_api_url: config.compute_api_url.trim_end_matches('/').to_owned(),
            auth_token: config.auth_token.clone(),
        })
    }

    async fn create_volume_call(
        &self,
        params: &VolumeParams,
    ) -> Result<VolumeRecord, OpenStackApiError> {
        let url = format!("{}/volumes", self.volume_api_url);
        debug!(display_name = %params.display_name, "requesting volume creation");

        let response = self
            .http
            .post(&url)
            .header("X-Auth-Token", &self.auth_token)
            .json(&CreateVolumeBody { volume: params })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            let parsed: VolumeEnvelope =
                serde_json::from_slice(&body).map_err(|err| OpenStackApiError::Provider {
                    message: err.to_string(),
                })?;
            return Ok(parsed.volume.into());
        }

        Err(OpenStackApiError::Api {
            status: status.as_u16(),
            message: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    async fn get_volume_call(
        &self,
        volume_id: &str,
    ) -> Result<Option<VolumeRecord>, OpenStackApiError> {
        let url = format!("{}/volumes/{volume_id}", self.volume_api_url);
        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.auth_token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.bytes().await?;
        if status.is_success() {
            let parsed: VolumeEnvelope =
                serde_json::from_slice(&body).map_err(|err| OpenStackApiError::Provider {
                    message: err.to_string(),
                })?;
            return Ok(Some(parsed.volume.into()));
        }

        Err(OpenStackApiError::Api {
            status: status.as_u16(),
            message: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    async fn delete_volume_call(&self, volume_id: &str) -> Result<(), OpenStackApiError> {
        let url = format!("{}/volumes/{volume_id}", self.volume_api_url);
        debug!(volume_id, "requesting volume deletion");

        let response = self
            .http
            .delete(&url)
            .header("X-Auth-Token", &self.auth_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.bytes().await?;
        Err(OpenStackApiError::Api {
            status: status.as_u16(),
            message: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    async fn get_server_call(&self, server_id: &str) -> Result<ServerRecord, OpenStackApiError> {
        let url = format!("{}/servers/{server_id}", self.compute_api_url);
        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.auth_token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(OpenStackApiError::ServerNotFound {
                server_id: server_id.to_owned(),
            });
        }

        let body = response.bytes().await?;
        if status.is_success() {
            let parsed: ServerEnvelope =
                serde_json::from_slice(&body).map_err(|err| OpenStackApiError::Provider {
                    message: err.to_string(),
                })?;
            return Ok(parsed.server.into());
        }

        Err(OpenStackApiError::Api {
            status: status.as_u16(),
            message: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

impl CloudApi for OpenStackApi {
    type Error = OpenStackApiError;

    fn create_volume<'a>(
        &'a self,
        params: &'a VolumeParams,
    ) -> ApiFuture<'a, VolumeRecord, Self::Error> {
        Box::pin(async move { self.create_volume_call(params).await })
    }

    fn get_volume<'a>(
        &'a self,
        volume_id: &'a str,
    ) -> ApiFuture<'a, Option<VolumeRecord>, Self::Error> {
        Box::pin(async move { self.get_volume_call(volume_id).await })
    }

    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move { self.delete_volume_call(volume_id).await })
    }

    fn get_server<'a>(&'a self, server_id: &'a str) -> ApiFuture<'a, ServerRecord, Self::Error> {
        Box::pin(async move { self.get_server_call(server_id).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CloudConfig;

    fn dummy_config() -> CloudConfig {
        CloudConfig {
            volume_api_url: String::from("https://cloud.example/v1/tenant/"),
            compute_api_url: String::from("https://cloud.example/v2/tenant"),
            auth_token: String::from("token"),
            region: None,
            ignore_server_availability_zone: false,
            state_timeout_secs: 300,
        }
    }

    #[test]
    fn new_trims_trailing_slashes_from_endpoints() {
        let api = OpenStackApi::new(&dummy_config()).expect("valid config");
        assert_eq!(api.volume_api_url, "https://cloud.example/v1/tenant");
        assert_eq!(api.compute_api_url, "https://cloud.example/v2/tenant");
    }

    #[test]
    fn new_rejects_incomplete_configuration() {
        let config = CloudConfig {
            auth_token: String::new(),
            ..dummy_config()
        };
        let error = OpenStackApi::new(&config).expect_err("missing token");
        assert!(matches!(error, OpenStackApiError::Config(_)));
    }
}
