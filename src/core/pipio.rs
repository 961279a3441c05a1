use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use super::bridge::{ApiBridge, BridgeError, CallResult, Credential, Method};
use super::endpoints::{Endpoint, EndpointRegistry};
use super::records::{
    Avatar, DubbingRequest, GenerateClipRequest, Job, LipSyncRequest, Page, Voice,
};

/// Typed operations over the avatar, generate and project services.
#[derive(Debug, Clone)]
pub struct PipioClient {
    bridge: ApiBridge,
    endpoints: EndpointRegistry,
    credential: Credential,
}

impl PipioClient {
    pub fn new(bridge: ApiBridge, endpoints: EndpointRegistry, credential: Credential) -> Self {
        Self {
            bridge,
            endpoints,
            credential,
        }
    }

    pub async fn list_avatars(&self) -> Result<Vec<Avatar>, BridgeError> {
        let page: Page<Avatar> = self.fetch(Endpoint::ListAvatars).await?;
        Ok(page.items)
    }

    pub async fn list_voices(&self) -> Result<Vec<Voice>, BridgeError> {
        let page: Page<Voice> = self.fetch(Endpoint::ListVoices).await?;
        Ok(page.items)
    }

    pub async fn list_clips(&self, page_size: u32) -> Result<Vec<Job>, BridgeError> {
        let page: Page<Job> = self.fetch(Endpoint::ListClips { page_size }).await?;
        Ok(page.items)
    }

    pub async fn generate_clip(&self, request: &GenerateClipRequest) -> Result<Job, BridgeError> {
        let job: Job = self.submit(Endpoint::GenerateClip, request).await?;
        info!("Clip queued: {} ({})", job.id, job.status);
        Ok(job)
    }

    pub async fn clip_status(&self, id: &str) -> Result<Job, BridgeError> {
        self.fetch(Endpoint::ClipStatus { id: id.to_string() }).await
    }

    pub async fn start_dubbing(&self, request: &DubbingRequest) -> Result<Value, BridgeError> {
        let ack = self.raw(Endpoint::StartDubbing, Some(to_body(request)?)).await?;
        info!("Dubbing started for {}", request.target_language);
        Ok(ack)
    }

    pub async fn start_lipsync(&self, request: &LipSyncRequest) -> Result<Value, BridgeError> {
        let ack = self.raw(Endpoint::StartLipSync, Some(to_body(request)?)).await?;
        info!("Lip sync started");
        Ok(ack)
    }

    pub async fn project_template(&self, project_id: &str) -> Result<Value, BridgeError> {
        self.raw(
            Endpoint::ProjectTemplate {
                project_id: project_id.to_string(),
            },
            None,
        )
        .await
    }

    async fn fetch<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, BridgeError> {
        let value = self.raw(endpoint.clone(), None).await?;
        decode(&endpoint, value)
    }

    async fn submit<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<T, BridgeError> {
        let value = self.raw(endpoint.clone(), Some(to_body(body)?)).await?;
        decode(&endpoint, value)
    }

    async fn raw(&self, endpoint: Endpoint, body: Option<Value>) -> CallResult {
        let url = self.endpoints.resolve(&endpoint)?;
        let method: Method = endpoint.method();
        self.bridge
            .call(method, &url, &self.credential, body.as_ref())
            .await
    }
}

pub(crate) fn to_body<B: Serialize>(body: &B) -> Result<Value, BridgeError> {
    serde_json::to_value(body)
        .map_err(|e| BridgeError::invalid(format!("unserializable body: {}", e)))
}

pub(crate) fn decode<T: DeserializeOwned>(endpoint: &Endpoint, value: Value) -> Result<T, BridgeError> {
    serde_json::from_value(value)
        .map_err(|e| BridgeError::malformed(format!("unexpected {} payload: {}", endpoint, e)))
}
