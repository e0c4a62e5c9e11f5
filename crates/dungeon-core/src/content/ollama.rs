//! Ollama-compatible HTTP content source.
//!
//! Posts a structured prompt to `/api/generate` and parses the labelled reply
//! with [`ContentPayload::parse_response`]. Blocking; wrap it in
//! [`TimeoutContent`](super::TimeoutContent) to bound a turn.

use std::time::Duration;

use dungeon_model::{ContentPayload, Theme};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{ContentGenerationError, ContentSource, RoomContext};

/// Connection settings, usually read from the `[ollama]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on generated tokens per room.
    pub num_predict: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:11434".into(),
            model: "mistral-small:22b".into(),
            temperature: 0.85,
            num_predict: 300,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

pub struct OllamaContent {
    config: OllamaConfig,
    agent: ureq::Agent,
}

impl OllamaContent {
    /// `timeout` bounds each HTTP request.
    pub fn new(config: OllamaConfig, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { config, agent }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Names of the models the server has pulled.
    pub fn list_models(&self) -> Result<Vec<String>, ContentGenerationError> {
        let response = self
            .agent
            .get(&self.url("/api/tags"))
            .call()
            .map_err(convert_error)?;
        let tags: TagsResponse = response
            .into_json()
            .map_err(|e| ContentGenerationError::Unavailable(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

impl ContentSource for OllamaContent {
    fn generate_content(
        &self,
        theme: Theme,
        context: &RoomContext,
    ) -> Result<ContentPayload, ContentGenerationError> {
        let body = json!({
            "model": self.config.model,
            "prompt": build_prompt(theme, context),
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.num_predict,
            },
        });

        let response = self
            .agent
            .post(&self.url("/api/generate"))
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(convert_error)?;
        let reply: GenerateResponse = response
            .into_json()
            .map_err(|e| ContentGenerationError::Unavailable(e.to_string()))?;

        debug!(model = %self.config.model, chars = reply.response.len(), "ollama replied");
        Ok(ContentPayload::parse_response(&reply.response)?)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

fn convert_error(e: ureq::Error) -> ContentGenerationError {
    match e {
        ureq::Error::Status(status, response) => ContentGenerationError::Http {
            status,
            body: response.into_string().unwrap_or_default(),
        },
        other => ContentGenerationError::Unavailable(other.to_string()),
    }
}

/// Prompt asking for the labelled format the parser understands.
pub fn build_prompt(theme: Theme, context: &RoomContext) -> String {
    let profile = theme.profile();
    let mut prompt = format!(
        "You are the narrator of a {} text adventure. {}\n",
        profile.name, profile.blurb
    );
    prompt.push_str(&format!(
        "Describe a new room at depth {} of the dungeon.",
        context.depth
    ));
    if let Some(direction) = context.arrived_by {
        prompt.push_str(&format!(" The player arrives by going {}.", direction));
    }
    if let Some(from) = &context.from_title {
        prompt.push_str(&format!(" They come from the {}.", from));
    }
    prompt.push_str(
        "\n\nAnswer in exactly this format:\n\
         TITLE: <short room name>\n\
         DESCRIPTION: <two or three vivid sentences>\n\
         ITEMS: <comma separated items>\n\
         NPCS: <comma separated entries like Name (role), or none>\n\
         ART:\n\
         <optional ASCII art of the room, at most 6 lines of 40 columns>\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_model::{Coordinate, Direction};

    #[test]
    fn test_prompt_carries_context() {
        let context = RoomContext {
            coordinate: Coordinate::new(0, 1, 0),
            depth: 3,
            arrived_by: Some(Direction::North),
            from_title: Some("Mossy Chamber".into()),
        };
        let prompt = build_prompt(Theme::Horror, &context);
        assert!(prompt.contains("depth 3"));
        assert!(prompt.contains("going north"));
        assert!(prompt.contains("Mossy Chamber"));
        assert!(prompt.contains("TITLE:"));
        assert!(prompt.contains("ART:"));
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let source = OllamaContent::new(
            OllamaConfig {
                base_url: "http://127.0.0.1:11434/".into(),
                ..OllamaConfig::default()
            },
            Duration::from_millis(100),
        );
        assert_eq!(source.url("/api/generate"), "http://127.0.0.1:11434/api/generate");
    }

    #[test]
    fn test_unreachable_server_is_unavailable() {
        // Port 9 (discard) is closed on test machines.
        let source = OllamaContent::new(
            OllamaConfig {
                base_url: "http://127.0.0.1:9".into(),
                ..OllamaConfig::default()
            },
            Duration::from_millis(200),
        );
        let err = source
            .generate_content(Theme::Fantasy, &RoomContext::origin())
            .unwrap_err();
        assert!(matches!(err, ContentGenerationError::Unavailable(_)));
        assert!(source.list_models().is_err());
    }
}
