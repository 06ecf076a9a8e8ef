//! Speech-to-text engine adapters
//!
//! Two backends: a local model run as a killable child process, and a
//! hosted transcription API. Both implement [`SttEngine`] so the bounded
//! transcriber can cancel either on deadline.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::transcribe::SttEngine;
use crate::{Error, Result};

/// Response from the hosted transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Local transcription model invoked through the `whisper` CLI
///
/// Running the model in a child process is what makes forced cancellation
/// possible: when the worker task is aborted the in-flight child is killed
/// rather than left running inside the supervisor.
pub struct WhisperCli {
    binary: PathBuf,
    model: String,
}

impl WhisperCli {
    /// Create a local engine using the given model size (e.g. "base")
    ///
    /// # Errors
    ///
    /// Returns error if the `whisper` binary is not on PATH
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let binary = which::which("whisper")
            .map_err(|e| Error::Config(format!("whisper binary not found: {e}")))?;

        tracing::debug!(binary = %binary.display(), "local STT engine initialized");

        Ok(Self {
            binary,
            model: model.into(),
        })
    }
}

#[async_trait]
impl SttEngine for WhisperCli {
    async fn infer(&self, audio: &Path, language: &str) -> Result<String> {
        let output_dir = audio.parent().unwrap_or_else(|| Path::new("."));

        let output = tokio::process::Command::new(&self.binary)
            .arg(audio)
            .args(["--model", &self.model])
            .args(["--language", language])
            .args(["--output_format", "txt"])
            .arg("--output_dir")
            .arg(output_dir)
            .args(["--fp16", "False"])
            .args(["--beam_size", "1"])
            .args(["--best_of", "1"])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Stt(format!("failed to run whisper: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Stt(format!(
                "whisper exited with {}: {stderr}",
                output.status
            )));
        }

        // The CLI writes <stem>.txt next to the audio file
        let stem = audio
            .file_stem()
            .ok_or_else(|| Error::Stt("audio path has no file stem".to_string()))?;
        let transcript_path = output_dir.join(stem).with_extension("txt");

        let text = tokio::fs::read_to_string(&transcript_path)
            .await
            .map_err(|e| Error::Stt(format!("transcript not readable: {e}")))?;

        if let Err(e) = tokio::fs::remove_file(&transcript_path).await {
            tracing::warn!(error = %e, path = %transcript_path.display(), "failed to remove transcript");
        }

        Ok(text)
    }
}

/// Hosted transcription over the `OpenAI` audio API
pub struct WhisperApi {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl WhisperApi {
    /// Create a hosted engine using the given model (e.g. "whisper-1")
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: impl Into<String>) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for hosted STT".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait]
impl SttEngine for WhisperApi {
    async fn infer(&self, audio: &Path, language: &str) -> Result<String> {
        let bytes = tokio::fs::read(audio).await?;
        tracing::debug!(audio_bytes = bytes.len(), "starting hosted transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language", language.to_string());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("transcription API error {status}: {body}")));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            e
        })?;

        Ok(result.text)
    }
}
