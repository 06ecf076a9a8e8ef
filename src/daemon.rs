//! The assistant daemon and its turn loop
//!
//! One supervisor drives the sequence listen -> transcribe -> match ->
//! reply -> speak, abandoning the turn at the first failed stage. No
//! single-turn failure ever terminates the loop; only an operator
//! interrupt does, and that is checked at iteration boundaries, never
//! mid-call.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::assistant::ChatResponder;
use crate::config::{Config, SttEngineKind, TtsEngineKind};
use crate::device::SerialLink;
use crate::transcribe::{BoundedTranscriber, SttEngine};
use crate::triggers::TriggerTable;
use crate::voice::stt::{WhisperApi, WhisperCli};
use crate::voice::tts::TextToSpeech;
use crate::voice::{AudioPlayback, MicCapture, Utterance};
use crate::Result;

/// Acquires one utterance per turn
#[async_trait(?Send)]
pub trait Capture {
    /// Block until an utterance is segmented or the listen window elapses
    ///
    /// Never raises: device failures are logged and reported as `None`.
    async fn listen(&mut self) -> Option<Utterance>;
}

/// Produces a reply for transcribed text
#[async_trait(?Send)]
pub trait Responder {
    /// One blocking call to the remote assistant
    async fn reply(&self, text: &str) -> Result<String>;
}

/// Renders and plays a spoken reply
#[async_trait(?Send)]
pub trait Speaker {
    /// Synthesize and play `text`; failures are non-fatal to the loop
    async fn say(&mut self, text: &str) -> Result<()>;
}

/// Outbound hardware signal channel
pub trait DeviceLink {
    /// Fire-and-forget command send; failures are logged, never raised
    fn send(&mut self, command: &str);

    /// Release the underlying channel resource
    fn close(&mut self) {}
}

/// What one turn produced, for logging only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A trigger phrase matched and its canned action ran
    TriggerHandled,
    /// The assistant produced and spoke a reply
    AssistantReplied(String),
    /// The assistant call failed or returned nothing
    AssistantFailed,
    /// Transcription failed, timed out, or was empty
    TranscriptionFailed,
    /// No utterance was captured
    CaptureFailed,
}

/// The supervisor state machine
///
/// Collaborators are trait objects so tests can substitute doubles. The
/// only state shared across turns is the immutable trigger table and the
/// device link handle.
pub struct TurnLoop {
    capture: Box<dyn Capture>,
    transcriber: BoundedTranscriber,
    triggers: TriggerTable,
    responder: Box<dyn Responder>,
    speaker: Box<dyn Speaker>,
    device: Option<Box<dyn DeviceLink>>,
}

impl TurnLoop {
    /// Assemble a turn loop from its collaborators
    #[must_use]
    pub fn new(
        capture: Box<dyn Capture>,
        transcriber: BoundedTranscriber,
        triggers: TriggerTable,
        responder: Box<dyn Responder>,
        speaker: Box<dyn Speaker>,
        device: Option<Box<dyn DeviceLink>>,
    ) -> Self {
        Self {
            capture,
            transcriber,
            triggers,
            responder,
            speaker,
            device,
        }
    }

    /// Run turns until the shutdown channel fires
    ///
    /// The shutdown signal is checked only between turns; a turn in
    /// flight always runs to completion or natural failure. The device
    /// channel is released before returning.
    pub async fn run(&mut self, shutdown: &mut mpsc::Receiver<()>) {
        loop {
            match shutdown.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => {
                    tracing::info!("shutdown requested");
                    break;
                }
                Err(TryRecvError::Empty) => {}
            }

            let outcome = self.turn().await;
            tracing::debug!(?outcome, "turn complete");
        }

        if let Some(device) = self.device.as_mut() {
            device.close();
        }
    }

    /// Process one full turn: capture, transcribe, match, reply, speak
    ///
    /// Every stage failure is caught here, logged with its stage context,
    /// and turns into an early return; the caller simply starts the next
    /// turn.
    pub async fn turn(&mut self) -> TurnOutcome {
        let Some(utterance) = self.capture.listen().await else {
            tracing::info!("no utterance captured, listening again");
            return TurnOutcome::CaptureFailed;
        };

        let text = match self.transcriber.transcribe(&utterance).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed, abandoning turn");
                return TurnOutcome::TranscriptionFailed;
            }
        };
        drop(utterance);

        tracing::info!(transcript = %text, "utterance transcribed");

        if let Some(entry) = self.triggers.find(&text) {
            tracing::info!(phrase = %entry.phrase, "trigger matched");

            if let Some(command) = &entry.command {
                match self.device.as_mut() {
                    Some(device) => device.send(command),
                    None => {
                        tracing::warn!(command = %command, "no device channel configured, dropping command");
                    }
                }
            }

            if let Err(e) = self.speaker.say(&entry.reply).await {
                tracing::warn!(error = %e, "speech output failed");
            }

            return TurnOutcome::TriggerHandled;
        }

        let reply = match self.responder.reply(&text).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                tracing::warn!("assistant returned an empty reply");
                return TurnOutcome::AssistantFailed;
            }
            Err(e) => {
                tracing::warn!(error = %e, "assistant call failed");
                return TurnOutcome::AssistantFailed;
            }
        };

        tracing::info!(reply = %reply, "assistant replied");

        if let Err(e) = self.speaker.say(&reply).await {
            tracing::warn!(error = %e, "speech output failed");
        }

        TurnOutcome::AssistantReplied(reply)
    }
}

/// Speaker backed by a TTS adapter and local playback
pub struct VoiceOutput {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl VoiceOutput {
    /// Create a speaker from a TTS adapter
    ///
    /// # Errors
    ///
    /// Returns error if the output device cannot be opened
    pub fn new(tts: TextToSpeech) -> Result<Self> {
        Ok(Self {
            tts,
            playback: AudioPlayback::new()?,
        })
    }
}

#[async_trait(?Send)]
impl Speaker for VoiceOutput {
    async fn say(&mut self, text: &str) -> Result<()> {
        let audio = self.tts.synthesize(text).await?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");
        self.playback.play(&audio).await
    }
}

/// The voxloop daemon: wires configuration to concrete collaborators
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a daemon from loaded configuration
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the assistant loop until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if a collaborator cannot be initialized
    #[allow(clippy::future_not_send)]
    pub async fn run(self) -> Result<()> {
        let config = self.config;

        let capture = MicCapture::new(
            config.capture.device_index,
            config.capture.sample_rate,
            config.capture.listen_timeout,
        )?;

        let engine: Arc<dyn SttEngine> = match config.stt.engine {
            SttEngineKind::WhisperCli => Arc::new(WhisperCli::new(&config.stt.model)?),
            SttEngineKind::WhisperApi => Arc::new(WhisperApi::new(
                config.api_keys.openai.clone().unwrap_or_default(),
                &config.stt.model,
            )?),
        };
        let transcriber =
            BoundedTranscriber::new(engine, config.stt.language.clone(), config.stt.timeout);

        let responder = ChatResponder::new(
            config.api_keys.openai.clone().unwrap_or_default(),
            config.assistant.model.clone(),
            config.assistant.system_prompt.clone(),
            config.assistant.max_tokens,
            config.assistant.temperature,
        )?;

        let tts = match config.tts.engine {
            TtsEngineKind::OpenAi => TextToSpeech::new_openai(
                config.api_keys.openai.clone().unwrap_or_default(),
                config.tts.voice.clone(),
                config.tts.speaking_rate,
            )?,
            TtsEngineKind::Google => TextToSpeech::new_google(
                config.api_keys.google_tts.clone().unwrap_or_default(),
                config.tts.voice.clone(),
                config.tts.speaking_rate,
            )?,
        };
        let speaker = VoiceOutput::new(tts)?;

        let device: Option<Box<dyn DeviceLink>> = config
            .serial
            .as_ref()
            .map(|serial| {
                Box::new(SerialLink::new(serial.port.clone(), serial.baud)) as Box<dyn DeviceLink>
            });

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        tracing::info!(
            triggers = config.triggers.len(),
            stt = ?config.stt.engine,
            tts = ?config.tts.engine,
            "assistant ready, listening"
        );

        let mut turn_loop = TurnLoop::new(
            Box::new(capture),
            transcriber,
            config.triggers,
            Box::new(responder),
            Box::new(speaker),
            device,
        );

        turn_loop.run(&mut shutdown_rx).await;

        tracing::info!("daemon stopped");
        Ok(())
    }
}
