//! Explicit per-session state: credentials, cached listings and history.
//!
//! A `Session` is built when the user starts the studio and dropped when they
//! leave; nothing in it outlives the process or touches the disk.

use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::bridge::{ApiBridge, BridgeError, Credential};
use super::chat::ChatClient;
use super::config::SessionSettings;
use super::endpoints::EndpointRegistry;
use super::pipio::PipioClient;
use super::records::{
    Avatar, DubbingRequest, GenerateClipRequest, Job, LipSyncRequest, MAX_SCRIPT_CHARS, Voice,
};

pub const ALL_FILTER: &str = "All";
pub const AUTO_LANGUAGE: &str = "auto";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Invalid(String),

    #[error("Missing {0}. Enter it first.")]
    MissingCredential(&'static str),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl SessionError {
    fn invalid(msg: impl Into<String>) -> Self {
        SessionError::Invalid(msg.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub avatars: usize,
    pub voices: usize,
    pub history: usize,
}

/// Which parts of a sync succeeded.
#[derive(Debug)]
pub struct SyncReport {
    pub synced_at: DateTime<Local>,
    pub failures: Vec<(&'static str, BridgeError)>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What happened after a clip was queued.
#[derive(Debug)]
pub struct ClipSubmission {
    pub job: Job,
    /// Set when the follow-up history refresh failed; the clip itself was queued.
    pub refresh_error: Option<BridgeError>,
}

pub struct Session {
    pipio: PipioClient,
    chat: Option<ChatClient>,
    page_size: u32,
    avatars: Vec<Avatar>,
    voices: Vec<Voice>,
    history: Vec<Job>,
    synced_at: Option<DateTime<Local>>,
}

impl Session {
    pub fn start(
        settings: SessionSettings,
        pipio_key: Credential,
        chat_key: Option<Credential>,
    ) -> Result<Self, SessionError> {
        if pipio_key.is_blank() {
            return Err(SessionError::MissingCredential("Pipio API key"));
        }
        let bridge = ApiBridge::new(settings.timeout);
        let endpoints = EndpointRegistry::new(settings.hosts);
        let chat = chat_key.filter(|k| !k.is_blank()).map(|key| {
            ChatClient::new(bridge.clone(), endpoints.clone(), key, settings.chat_model.clone())
        });
        info!(
            "Session started (timeout {:?}, chat {})",
            settings.timeout,
            if chat.is_some() { "enabled" } else { "disabled" }
        );
        Ok(Self {
            pipio: PipioClient::new(bridge, endpoints, pipio_key),
            chat,
            page_size: settings.page_size,
            avatars: Vec::new(),
            voices: Vec::new(),
            history: Vec::new(),
            synced_at: None,
        })
    }

    pub fn avatars(&self) -> &[Avatar] {
        &self.avatars
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn history(&self) -> &[Job] {
        &self.history
    }

    pub fn synced_at(&self) -> Option<DateTime<Local>> {
        self.synced_at
    }

    pub fn has_chat(&self) -> bool {
        self.chat.is_some()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            avatars: self.avatars.len(),
            voices: self.voices.len(),
            history: self.history.len(),
        }
    }

    /// Fetch avatars, voices and history. Each list is replaced only if its own call succeeded.
    pub async fn sync_global_data(&mut self) -> SyncReport {
        let mut failures = Vec::new();
        if let Err(e) = self.refresh_avatars().await {
            failures.push(("avatars", e));
        }
        if let Err(e) = self.refresh_voices().await {
            failures.push(("voices", e));
        }
        if let Err(e) = self.refresh_library().await {
            failures.push(("history", e));
        }

        let synced_at = Local::now();
        self.synced_at = Some(synced_at);
        for (what, err) in &failures {
            warn!("Sync of {} failed: {}", what, err);
        }
        info!(
            "Synced {} avatars, {} voices, {} jobs",
            self.avatars.len(),
            self.voices.len(),
            self.history.len()
        );
        SyncReport {
            synced_at,
            failures,
        }
    }

    pub async fn generate_clip(
        &mut self,
        avatar_id: &str,
        voice_id: &str,
        script: &str,
    ) -> Result<ClipSubmission, SessionError> {
        let request = GenerateClipRequest {
            actor_id: required(avatar_id, "Select an avatar.")?,
            voice_id: required(voice_id, "Select a voice.")?,
            script: validate_script(script)?,
        };
        let job = self.pipio.generate_clip(&request).await?;
        let refresh_error = self.refresh_library().await.err();
        Ok(ClipSubmission { job, refresh_error })
    }

    pub async fn start_dubbing(
        &self,
        source_url: &str,
        target_language: &str,
        source_language: &str,
    ) -> Result<Value, SessionError> {
        let source_url = required(source_url, "URL and Target Language are required.")?;
        let target_language = required(target_language, "URL and Target Language are required.")?;
        let source_language = match source_language.trim() {
            "" => AUTO_LANGUAGE.to_string(),
            lang => lang.to_string(),
        };
        let request = DubbingRequest {
            source_url,
            target_language,
            source_language,
        };
        Ok(self.pipio.start_dubbing(&request).await?)
    }

    pub async fn start_lipsync(&self, video_url: &str, audio_url: &str) -> Result<Value, SessionError> {
        let request = LipSyncRequest {
            source_url: required(video_url, "Both Video and Audio URLs are required.")?,
            target_audio_url: required(audio_url, "Both Video and Audio URLs are required.")?,
        };
        Ok(self.pipio.start_lipsync(&request).await?)
    }

    pub async fn refresh_avatars(&mut self) -> Result<usize, BridgeError> {
        self.avatars = self.pipio.list_avatars().await?;
        Ok(self.avatars.len())
    }

    pub async fn refresh_voices(&mut self) -> Result<usize, BridgeError> {
        self.voices = self.pipio.list_voices().await?;
        Ok(self.voices.len())
    }

    /// Replace the history with the newest page of clips.
    pub async fn refresh_library(&mut self) -> Result<usize, BridgeError> {
        self.history = self.pipio.list_clips(self.page_size).await?;
        Ok(self.history.len())
    }

    /// Fetch one job and replace its cached snapshot.
    pub async fn check_status(&mut self, id: &str) -> Result<Job, SessionError> {
        let id = required(id, "A job id is required.")?;
        let job = self.pipio.clip_status(&id).await?;
        match self.history.iter_mut().find(|j| j.id == job.id) {
            Some(slot) => *slot = job.clone(),
            None => self.history.push(job.clone()),
        }
        Ok(job)
    }

    pub async fn project_template(&self, project_id: &str) -> Result<Value, SessionError> {
        let project_id = required(project_id, "A project id is required.")?;
        Ok(self.pipio.project_template(&project_id).await?)
    }

    pub async fn draft_script(&self, brief: &str) -> Result<String, SessionError> {
        let chat = self
            .chat
            .as_ref()
            .ok_or(SessionError::MissingCredential("chat API key"))?;
        let brief = required(brief, "Describe what the script should say.")?;
        Ok(chat.draft_script(&brief).await?)
    }

    /// `"All"` followed by every ethnicity present, sorted; missing ones count as `Other`.
    pub fn avatar_ethnicities(&self) -> Vec<String> {
        let unique: BTreeSet<&str> = self.avatars.iter().map(|a| a.ethnicity_or_other()).collect();
        std::iter::once(ALL_FILTER.to_string())
            .chain(unique.into_iter().map(str::to_string))
            .collect()
    }

    pub fn avatars_by_ethnicity(&self, ethnicity: &str) -> Vec<&Avatar> {
        self.avatars
            .iter()
            .filter(|a| ethnicity == ALL_FILTER || a.ethnicity_or_other() == ethnicity)
            .collect()
    }

    pub fn voice_languages(&self) -> Vec<String> {
        let unique: BTreeSet<&str> = self
            .voices
            .iter()
            .flat_map(|v| v.languages.iter().map(String::as_str))
            .collect();
        unique.into_iter().map(str::to_string).collect()
    }

    pub fn voices_by_language(&self, language: &str) -> Vec<&Voice> {
        self.voices
            .iter()
            .filter(|v| language == ALL_FILTER || v.speaks(language))
            .collect()
    }

    pub fn find_avatar(&self, id: &str) -> Option<&Avatar> {
        self.avatars.iter().find(|a| a.id == id)
    }

    pub fn find_voice(&self, id: &str) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id == id)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        info!("Session ended");
    }
}

fn required(value: &str, msg: &str) -> Result<String, SessionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SessionError::invalid(msg));
    }
    Ok(value.to_string())
}

/// Non-empty after trimming and at most 5000 characters. The script is sent as typed.
pub fn validate_script(script: &str) -> Result<String, SessionError> {
    if script.trim().is_empty() {
        return Err(SessionError::invalid("Please enter a script."));
    }
    let count = script.chars().count();
    if count > MAX_SCRIPT_CHARS {
        return Err(SessionError::invalid(format!(
            "Script is {} characters; the limit is {}.",
            count, MAX_SCRIPT_CHARS
        )));
    }
    Ok(script.to_string())
}
