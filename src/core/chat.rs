use serde::{Deserialize, Serialize};
use tracing::info;

use super::bridge::{ApiBridge, BridgeError, Credential};
use super::endpoints::{Endpoint, EndpointRegistry};
use super::pipio::{decode, to_body};
use super::records::MAX_SCRIPT_CHARS;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessageOwned,
}

#[derive(Deserialize)]
struct OpenAiMessageOwned {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completion calls used to draft avatar scripts.
#[derive(Debug, Clone)]
pub struct ChatClient {
    bridge: ApiBridge,
    endpoints: EndpointRegistry,
    credential: Credential,
    model: String,
}

impl ChatClient {
    pub fn new(
        bridge: ApiBridge,
        endpoints: EndpointRegistry,
        credential: Credential,
        model: impl Into<String>,
    ) -> Self {
        Self {
            bridge,
            endpoints,
            credential,
            model: model.into(),
        }
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, BridgeError> {
        let req = OpenAiRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| OpenAiMessage {
                    role: &m.role,
                    content: &m.content,
                })
                .collect(),
        };
        let endpoint = Endpoint::ChatCompletion;
        let url = self.endpoints.resolve(&endpoint)?;
        let value = self
            .bridge
            .post(&url, &self.credential, &to_body(&req)?)
            .await?;
        let parsed: OpenAiResponse = decode(&endpoint, value)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BridgeError::malformed("chat completion returned no choices"))
    }

    /// Ask the model for a spoken script for an avatar, from a short brief.
    pub async fn draft_script(&self, brief: &str) -> Result<String, BridgeError> {
        let messages = [
            ChatMessage::system(format!(
                "You write scripts that an AI avatar will speak aloud in a video. \
                 Reply with the script text only, no stage directions or headings, \
                 at most {} characters.",
                MAX_SCRIPT_CHARS
            )),
            ChatMessage::user(brief),
        ];
        let script = self.complete(&messages).await?;
        info!("Drafted script with {} ({} chars)", self.model, script.chars().count());
        Ok(script.trim().to_string())
    }
}
