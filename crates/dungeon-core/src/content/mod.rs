//! Content collaborators.
//!
//! The engine asks a [`ContentSource`] for the text of every new room. Any
//! failure falls back to [`TemplateContent`]; content problems never reach
//! the spatial graph.

pub mod ollama;
pub mod template;
pub mod timeout;

pub use ollama::{OllamaConfig, OllamaContent};
pub use template::TemplateContent;
pub use timeout::TimeoutContent;

use dungeon_model::{ContentError, ContentPayload, Coordinate, Direction, Theme};
use std::time::Duration;
use tracing::{info, warn};

/// Errors from a content collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentGenerationError {
    #[error("content generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("content worker stopped without answering")]
    WorkerLost,
    #[error("content service unavailable: {0}")]
    Unavailable(String),
    #[error("content service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid content: {0}")]
    Invalid(#[from] ContentError),
}

/// What the collaborator is told about the room it is writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomContext {
    pub coordinate: Coordinate,
    pub depth: u32,
    /// Direction travelled to reach the new room, if any.
    pub arrived_by: Option<Direction>,
    /// Title of the room the player comes from.
    pub from_title: Option<String>,
}

impl RoomContext {
    pub fn origin() -> Self {
        Self {
            coordinate: Coordinate::ORIGIN,
            depth: 0,
            arrived_by: None,
            from_title: None,
        }
    }
}

/// External generator of room text.
pub trait ContentSource: Send + Sync {
    fn generate_content(
        &self,
        theme: Theme,
        context: &RoomContext,
    ) -> Result<ContentPayload, ContentGenerationError>;

    /// Short label for log lines.
    fn name(&self) -> &str;
}

/// Primary source with template fallback.
pub struct ContentPipeline {
    primary: Option<Box<dyn ContentSource>>,
    fallback: TemplateContent,
    fallbacks: u64,
}

impl ContentPipeline {
    /// Template content only.
    pub fn templates() -> Self {
        Self {
            primary: None,
            fallback: TemplateContent,
            fallbacks: 0,
        }
    }

    pub fn with_primary(source: Box<dyn ContentSource>) -> Self {
        Self {
            primary: Some(source),
            fallback: TemplateContent,
            fallbacks: 0,
        }
    }

    /// Ollama behind a deadline when enabled and reachable, templates otherwise.
    pub fn from_config(ollama: &OllamaConfig, timeout: Duration) -> Self {
        if !ollama.enabled {
            return Self::templates();
        }
        let source = OllamaContent::new(ollama.clone(), timeout);
        match source.list_models() {
            Ok(models) if models.iter().any(|m| m == &ollama.model) => {}
            Ok(models) => {
                warn!(model = %ollama.model, available = ?models, "ollama model not pulled, using templates");
                return Self::templates();
            }
            Err(e) => {
                warn!(url = %ollama.base_url, error = %e, "ollama unreachable, using templates");
                return Self::templates();
            }
        }

        let source = TimeoutContent::new(source, timeout);
        info!(
            model = %ollama.model,
            url = %ollama.base_url,
            deadline_ms = source.deadline().as_millis() as u64,
            "using ollama content source"
        );
        Self::with_primary(Box::new(source))
    }

    /// Always returns a payload. The error, if any, is what the primary reported.
    pub fn produce(
        &mut self,
        theme: Theme,
        context: &RoomContext,
    ) -> (ContentPayload, Option<ContentGenerationError>) {
        if let Some(primary) = &self.primary {
            match primary.generate_content(theme, context) {
                Ok(payload) => return (payload, None),
                Err(err) => {
                    self.fallbacks += 1;
                    warn!(
                        source = primary.name(),
                        coordinate = %context.coordinate,
                        error = %err,
                        "content generation failed, using template"
                    );
                    return (self.fallback.render(theme, context), Some(err));
                }
            }
        }
        (self.fallback.render(theme, context), None)
    }

    /// Number of times the primary failed.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks
    }

    pub fn primary_name(&self) -> Option<&str> {
        self.primary.as_ref().map(|p| p.name())
    }
}

impl Default for ContentPipeline {
    fn default() -> Self {
        Self::templates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl ContentSource for Broken {
        fn generate_content(
            &self,
            _theme: Theme,
            _context: &RoomContext,
        ) -> Result<ContentPayload, ContentGenerationError> {
            Err(ContentGenerationError::Unavailable("offline".into()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_pipeline_without_primary_uses_templates() {
        let mut pipeline = ContentPipeline::templates();
        let (payload, err) = pipeline.produce(Theme::Horror, &RoomContext::origin());
        assert!(err.is_none());
        assert!(!payload.title().is_empty());
        assert_eq!(pipeline.fallback_count(), 0);
    }

    #[test]
    fn test_pipeline_falls_back_on_error() {
        let mut pipeline = ContentPipeline::with_primary(Box::new(Broken));
        let (payload, err) = pipeline.produce(Theme::Fantasy, &RoomContext::origin());
        assert_eq!(
            err,
            Some(ContentGenerationError::Unavailable("offline".into()))
        );
        assert_eq!(payload, TemplateContent.render(Theme::Fantasy, &RoomContext::origin()));
        assert_eq!(pipeline.fallback_count(), 1);
        assert_eq!(pipeline.primary_name(), Some("broken"));
    }

    #[test]
    fn test_disabled_ollama_means_templates() {
        let pipeline = ContentPipeline::from_config(&OllamaConfig::default(), Duration::from_secs(1));
        assert_eq!(pipeline.primary_name(), None);
    }

    #[test]
    fn test_unreachable_ollama_means_templates() {
        let enabled = OllamaConfig {
            enabled: true,
            base_url: "http://127.0.0.1:9".into(),
            ..OllamaConfig::default()
        };
        let mut pipeline = ContentPipeline::from_config(&enabled, Duration::from_millis(200));
        assert_eq!(pipeline.primary_name(), None);

        let (_, err) = pipeline.produce(Theme::Fantasy, &RoomContext::origin());
        assert!(err.is_none());
        assert_eq!(pipeline.fallback_count(), 0);
    }
}
