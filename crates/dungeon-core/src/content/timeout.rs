use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dungeon_model::{ContentPayload, Theme};
use tracing::debug;

use super::{ContentGenerationError, ContentSource, RoomContext};

/// Bounds the wall-clock cost of a content source.
///
/// Each call runs on its own worker thread. A worker that misses the deadline
/// is abandoned; its late answer is dropped.
pub struct TimeoutContent<S> {
    inner: Arc<S>,
    deadline: Duration,
    name: String,
}

impl<S: ContentSource + 'static> TimeoutContent<S> {
    pub fn new(inner: S, deadline: Duration) -> Self {
        let name = format!("{} (timeout {}ms)", inner.name(), deadline.as_millis());
        Self {
            inner: Arc::new(inner),
            deadline,
            name,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl<S: ContentSource + 'static> ContentSource for TimeoutContent<S> {
    fn generate_content(
        &self,
        theme: Theme,
        context: &RoomContext,
    ) -> Result<ContentPayload, ContentGenerationError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let context = context.clone();

        thread::Builder::new()
            .name("content-worker".into())
            .spawn(move || {
                let _ = tx.send(inner.generate_content(theme, &context));
            })
            .map_err(|e| ContentGenerationError::Unavailable(e.to_string()))?;

        match rx.recv_timeout(self.deadline) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                debug!(deadline_ms = self.deadline.as_millis() as u64, "content worker abandoned");
                Err(ContentGenerationError::Timeout(self.deadline))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ContentGenerationError::WorkerLost),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
