//! HTTP client for the model deployment service (EDI)

use crate::error::ServiceError;
use crate::models::DeploymentDescriptor;
use crate::service::{Mutation, MutationDispatcher, StatusQuery};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

const DEPLOY_PATH: &str = "api/1.0/deploy";
const SCALE_PATH: &str = "api/1.0/scale";
const UNDEPLOY_PATH: &str = "api/1.0/undeploy";
const INSPECT_PATH: &str = "api/1.0/inspect";

/// Client for the deployment service REST API
#[derive(Clone)]
pub struct EdiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl EdiClient {
    /// Create a new client for `base_url`
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        // Paths are joined relative to the base, which needs a trailing slash
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List deployments, optionally narrowed by model id and version
    pub async fn inspect(
        &self,
        model_id: Option<&str>,
        model_version: Option<&str>,
    ) -> Result<Vec<DeploymentDescriptor>, ServiceError> {
        let mut url = self.base_url.join(INSPECT_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(model_id) = model_id {
                query.append_pair("model_id", model_id);
            }
            if let Some(model_version) = model_version {
                query.append_pair("model_version", model_version);
            }
        }
        // An empty query_pairs_mut() still leaves a dangling '?'
        if url.query() == Some("") {
            url.set_query(None);
        }

        self.send(self.client.get(url)).await
    }

    async fn post<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Vec<DeploymentDescriptor>, ServiceError> {
        let url = self.base_url.join(path)?;
        self.send(self.client.post(url).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ServiceError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Service responded");

        let body = response.text().await?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ServiceError::Unauthorized {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            return Err(ServiceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl StatusQuery for EdiClient {
    async fn query(&self) -> Result<Vec<DeploymentDescriptor>, ServiceError> {
        self.inspect(None, None).await
    }
}

#[async_trait]
impl MutationDispatcher for EdiClient {
    async fn dispatch(&self, mutation: &Mutation) -> Result<Vec<DeploymentDescriptor>, ServiceError> {
        match mutation {
            Mutation::Deploy(req) => self.post(DEPLOY_PATH, req).await,
            Mutation::Scale(req) => self.post(SCALE_PATH, req).await,
            Mutation::Undeploy(req) => self.post(UNDEPLOY_PATH, req).await,
        }
    }
}
