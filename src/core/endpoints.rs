use std::fmt;

use url::Url;

use super::bridge::{BridgeError, Method};

pub const DEFAULT_AVATAR_HOST: &str = "https://avatar.pipio.ai";
pub const DEFAULT_GENERATE_HOST: &str = "https://generate.pipio.ai";
pub const DEFAULT_PROJECT_HOST: &str = "https://project.pipio.ai";
pub const DEFAULT_CHAT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Every remote operation the studio knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    ListAvatars,
    ListVoices,
    GenerateClip,
    ListClips { page_size: u32 },
    ClipStatus { id: String },
    StartDubbing,
    StartLipSync,
    ProjectTemplate { project_id: String },
    ChatCompletion,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::ListAvatars
            | Endpoint::ListVoices
            | Endpoint::ListClips { .. }
            | Endpoint::ClipStatus { .. }
            | Endpoint::ProjectTemplate { .. } => Method::Get,
            Endpoint::GenerateClip
            | Endpoint::StartDubbing
            | Endpoint::StartLipSync
            | Endpoint::ChatCompletion => Method::Post,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::ListAvatars => "list avatars",
            Endpoint::ListVoices => "list voices",
            Endpoint::GenerateClip => "generate clip",
            Endpoint::ListClips { .. } => "list clips",
            Endpoint::ClipStatus { .. } => "check clip status",
            Endpoint::StartDubbing => "start dubbing",
            Endpoint::StartLipSync => "start lip-sync",
            Endpoint::ProjectTemplate { .. } => "project template",
            Endpoint::ChatCompletion => "chat completion",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base URLs of the four remote services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHosts {
    pub avatar: Url,
    pub generate: Url,
    pub project: Url,
    pub chat_completion: Url,
}

impl ServiceHosts {
    pub fn parse(
        avatar: &str,
        generate: &str,
        project: &str,
        chat_completion: &str,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            avatar: parse_base(avatar)?,
            generate: parse_base(generate)?,
            project: parse_base(project)?,
            chat_completion: parse_base(chat_completion)?,
        })
    }

    /// All four services behind one base URL, as a local stand-in server exposes them.
    pub fn single_origin(base: &str) -> Result<Self, BridgeError> {
        let chat = format!("{}/v1/chat/completions", base.trim_end_matches('/'));
        Self::parse(base, base, base, &chat)
    }
}

impl Default for ServiceHosts {
    fn default() -> Self {
        let parse = |s: &str| Url::parse(s).expect("default service URL is valid");
        Self {
            avatar: parse(DEFAULT_AVATAR_HOST),
            generate: parse(DEFAULT_GENERATE_HOST),
            project: parse(DEFAULT_PROJECT_HOST),
            chat_completion: parse(DEFAULT_CHAT_COMPLETION_URL),
        }
    }
}

fn parse_base(raw: &str) -> Result<Url, BridgeError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| BridgeError::invalid(format!("bad service URL '{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BridgeError::invalid(format!(
            "service URL '{}' must use http or https",
            raw
        )));
    }
    Ok(url)
}

/// Resolves endpoints to absolute URLs. Built once per session, never mutated.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    hosts: ServiceHosts,
}

impl EndpointRegistry {
    pub fn new(hosts: ServiceHosts) -> Self {
        Self { hosts }
    }

    pub fn hosts(&self) -> &ServiceHosts {
        &self.hosts
    }

    pub fn resolve(&self, endpoint: &Endpoint) -> Result<Url, BridgeError> {
        match endpoint {
            Endpoint::ListAvatars => join(&self.hosts.avatar, "/actor"),
            Endpoint::ListVoices => join(&self.hosts.avatar, "/voice"),
            Endpoint::GenerateClip => join(&self.hosts.generate, "/single-clip"),
            Endpoint::ListClips { page_size } => {
                if !(1..=MAX_PAGE_SIZE).contains(page_size) {
                    return Err(BridgeError::invalid(format!(
                        "pageSize must be between 1 and {}, got {}",
                        MAX_PAGE_SIZE, page_size
                    )));
                }
                let mut url = join(&self.hosts.generate, "/single-clip")?;
                url.query_pairs_mut()
                    .append_pair("pageSize", &page_size.to_string());
                Ok(url)
            }
            Endpoint::ClipStatus { id } => join(
                &self.hosts.generate,
                &format!("/single-clip/{}", path_segment(id)?),
            ),
            Endpoint::StartDubbing => join(&self.hosts.project, "/project/generate/dubbingV2"),
            Endpoint::StartLipSync => join(&self.hosts.project, "/project/generate/lipsync"),
            Endpoint::ProjectTemplate { project_id } => join(
                &self.hosts.project,
                &format!("/project/{}/template", path_segment(project_id)?),
            ),
            Endpoint::ChatCompletion => Ok(self.hosts.chat_completion.clone()),
        }
    }
}

fn path_segment(id: &str) -> Result<String, BridgeError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(BridgeError::invalid("identifier must not be empty"));
    }
    Ok(urlencoding::encode(id).into_owned())
}

// Appends to any path prefix on the base instead of replacing it.
fn join(base: &Url, path: &str) -> Result<Url, BridgeError> {
    let raw = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    Url::parse(&raw).map_err(|e| BridgeError::invalid(format!("bad endpoint URL '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EndpointRegistry {
        EndpointRegistry::new(ServiceHosts::default())
    }

    #[test]
    fn default_registry_matches_service_paths() {
        let reg = registry();
        let cases = [
            (Endpoint::ListAvatars, "https://avatar.pipio.ai/actor"),
            (Endpoint::ListVoices, "https://avatar.pipio.ai/voice"),
            (Endpoint::GenerateClip, "https://generate.pipio.ai/single-clip"),
            (
                Endpoint::ListClips { page_size: 20 },
                "https://generate.pipio.ai/single-clip?pageSize=20",
            ),
            (
                Endpoint::ClipStatus {
                    id: "abc".to_string(),
                },
                "https://generate.pipio.ai/single-clip/abc",
            ),
            (
                Endpoint::StartDubbing,
                "https://project.pipio.ai/project/generate/dubbingV2",
            ),
            (
                Endpoint::StartLipSync,
                "https://project.pipio.ai/project/generate/lipsync",
            ),
            (
                Endpoint::ProjectTemplate {
                    project_id: "p1".to_string(),
                },
                "https://project.pipio.ai/project/p1/template",
            ),
            (
                Endpoint::ChatCompletion,
                "https://api.openai.com/v1/chat/completions",
            ),
        ];
        for (endpoint, expected) in cases {
            assert_eq!(reg.resolve(&endpoint).unwrap().as_str(), expected, "{}", endpoint);
        }
    }

    #[test]
    fn verbs_follow_the_operation() {
        assert_eq!(Endpoint::ListAvatars.method(), Method::Get);
        assert_eq!(Endpoint::ListClips { page_size: 5 }.method(), Method::Get);
        assert_eq!(Endpoint::GenerateClip.method(), Method::Post);
        assert_eq!(Endpoint::StartLipSync.method(), Method::Post);
        assert_eq!(Endpoint::ChatCompletion.method(), Method::Post);
    }

    #[test]
    fn ids_are_percent_encoded() {
        let url = registry()
            .resolve(&Endpoint::ClipStatus {
                id: "a/b c".to_string(),
            })
            .unwrap();
        assert_eq!(url.path(), "/single-clip/a%2Fb%20c");
    }

    #[test]
    fn blank_ids_and_bad_page_sizes_are_rejected() {
        let reg = registry();
        assert!(reg
            .resolve(&Endpoint::ClipStatus {
                id: "  ".to_string()
            })
            .is_err());
        assert!(reg.resolve(&Endpoint::ListClips { page_size: 0 }).is_err());
        assert!(reg
            .resolve(&Endpoint::ListClips {
                page_size: MAX_PAGE_SIZE + 1
            })
            .is_err());
    }

    #[test]
    fn base_path_prefix_is_preserved() {
        let hosts = ServiceHosts::single_origin("http://127.0.0.1:8080/pipio/").unwrap();
        let reg = EndpointRegistry::new(hosts);
        assert_eq!(
            reg.resolve(&Endpoint::ListVoices).unwrap().as_str(),
            "http://127.0.0.1:8080/pipio/voice"
        );
        assert_eq!(
            reg.resolve(&Endpoint::ChatCompletion).unwrap().as_str(),
            "http://127.0.0.1:8080/pipio/v1/chat/completions"
        );
    }

    #[test]
    fn non_http_hosts_are_rejected() {
        assert!(ServiceHosts::single_origin("ftp://example.com").is_err());
        assert!(ServiceHosts::single_origin("not a url").is_err());
    }
}
