//! Bounded speech-to-text execution
//!
//! Runs one transcription per turn on an isolated worker task with a hard
//! wall-clock deadline. A worker that overruns is aborted, never joined,
//! so a hung engine cannot stall the turn loop.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::voice::{Utterance, samples_to_wav};
use crate::{Error, Result};

/// A speech-to-text engine operating on an audio file
///
/// Implementations must tolerate forced cancellation: the caller may abort
/// the task running `infer` at any await point, and the local engine's
/// child process is killed when that happens.
#[async_trait]
pub trait SttEngine: Send + Sync {
    /// Transcribe the audio file at `audio`, hinted with `language`
    async fn infer(&self, audio: &Path, language: &str) -> Result<String>;
}

/// Runs transcription with a deadline and forced cancellation
pub struct BoundedTranscriber {
    engine: Arc<dyn SttEngine>,
    language: String,
    deadline: Duration,
}

impl BoundedTranscriber {
    /// Create a bounded transcriber
    pub fn new(engine: Arc<dyn SttEngine>, language: impl Into<String>, deadline: Duration) -> Self {
        Self {
            engine,
            language: language.into(),
            deadline,
        }
    }

    /// Transcribe one utterance within the configured deadline
    ///
    /// The utterance is written to a turn-scoped WAV file that is removed
    /// on every exit path. The engine call runs on a separate task; on
    /// deadline the task is aborted and any partial output discarded. A
    /// panicking engine is absorbed here, never propagated.
    ///
    /// # Errors
    ///
    /// `Error::SttTimeout` when the deadline elapses, `Error::Stt` when
    /// the engine fails or produces an empty transcript.
    pub async fn transcribe(&self, utterance: &Utterance) -> Result<String> {
        let artifact = write_wav_artifact(utterance)?;

        let engine = Arc::clone(&self.engine);
        let language = self.language.clone();
        let audio = artifact.path().to_path_buf();

        let worker = tokio::spawn(async move { engine.infer(&audio, &language).await });
        let abort = worker.abort_handle();

        let joined = match tokio::time::timeout(self.deadline, worker).await {
            Ok(joined) => joined,
            Err(_) => {
                abort.abort();
                tracing::warn!(deadline = ?self.deadline, "transcription worker overran, aborted");
                return Err(Error::SttTimeout(self.deadline));
            }
        };

        let text = match joined {
            Ok(result) => result?,
            Err(e) => {
                return Err(Error::Stt(format!("transcription worker died: {e}")));
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Stt("empty transcript".to_string()));
        }

        Ok(text.to_string())
    }

    /// Configured deadline
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Write an utterance to a turn-scoped WAV file
///
/// The file is deleted when the returned handle drops, whatever exit path
/// the caller takes.
fn write_wav_artifact(utterance: &Utterance) -> Result<NamedTempFile> {
    let wav = samples_to_wav(&utterance.samples, utterance.sample_rate)?;

    let mut artifact = tempfile::Builder::new()
        .prefix("utterance-")
        .suffix(".wav")
        .tempfile()?;
    artifact.write_all(&wav)?;
    artifact.flush()?;

    Ok(artifact)
}
