//! Configuration for the voxloop assistant
//!
//! Everything is read from environment variables once at startup and held
//! in one immutable object passed into the daemon. No config files, no
//! runtime mutation.

use std::time::Duration;

use crate::triggers::TriggerTable;
use crate::{Error, Result};

/// Default capture sample rate in Hz
const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Default per-turn transcription deadline in seconds
const DEFAULT_STT_TIMEOUT_SECS: u64 = 5;

/// Default listen window for one utterance in seconds
const DEFAULT_LISTEN_TIMEOUT_SECS: u64 = 30;

/// Default serial baud rate
const DEFAULT_SERIAL_BAUD: u32 = 115_200;

/// Speech-to-text backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttEngineKind {
    /// Local model via the `whisper` CLI, run as a killable child process
    WhisperCli,
    /// Hosted transcription API
    WhisperApi,
}

impl SttEngineKind {
    /// Parse an engine name from configuration
    ///
    /// # Errors
    ///
    /// Returns error on an unrecognized name
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "whisper-cli" => Ok(Self::WhisperCli),
            "whisper-api" => Ok(Self::WhisperApi),
            other => Err(Error::Config(format!("unknown STT engine {other:?}"))),
        }
    }

    /// Default model identifier for this engine
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::WhisperCli => "base",
            Self::WhisperApi => "whisper-1",
        }
    }
}

/// Text-to-speech backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsEngineKind {
    /// `OpenAI` speech API
    OpenAi,
    /// Google Cloud text-to-speech
    Google,
}

impl TtsEngineKind {
    /// Parse an engine name from configuration
    ///
    /// # Errors
    ///
    /// Returns error on an unrecognized name
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "openai" => Ok(Self::OpenAi),
            "google" => Ok(Self::Google),
            other => Err(Error::Config(format!("unknown TTS engine {other:?}"))),
        }
    }

    /// Default voice identifier for this engine
    #[must_use]
    pub const fn default_voice(self) -> &'static str {
        match self {
            Self::OpenAi => "alloy",
            Self::Google => "ko-KR-Standard-A",
        }
    }
}

/// Microphone capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Input device index, or `None` for the default device
    pub device_index: Option<usize>,

    /// Capture sample rate in Hz
    pub sample_rate: u32,

    /// Maximum wait for one utterance before the loop comes back around
    pub listen_timeout: Duration,
}

/// Speech-to-text configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Selected backend
    pub engine: SttEngineKind,

    /// Model identifier for the backend
    pub model: String,

    /// Language hint passed to the engine
    pub language: String,

    /// Per-turn transcription deadline
    pub timeout: Duration,
}

/// Text-to-speech configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Selected backend
    pub engine: TtsEngineKind,

    /// Voice identifier
    pub voice: String,

    /// Speed multiplier
    pub speaking_rate: f32,
}

/// Remote assistant configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Chat model identifier
    pub model: String,

    /// Reply token cap
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// System prompt override, or `None` for the built-in prompt
    pub system_prompt: Option<String>,
}

/// Serial device channel configuration
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port path (e.g. "/dev/serial0")
    pub port: String,

    /// Baud rate
    pub baud: u32,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (hosted STT, TTS, and chat)
    pub openai: Option<String>,

    /// Google Cloud API key (TTS)
    pub google_tts: Option<String>,
}

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Trigger phrase table
    pub triggers: TriggerTable,

    /// Microphone capture settings
    pub capture: CaptureConfig,

    /// Speech-to-text settings
    pub stt: SttConfig,

    /// Text-to-speech settings
    pub tts: TtsConfig,

    /// Remote assistant settings
    pub assistant: AssistantConfig,

    /// Serial device channel, if configured
    pub serial: Option<SerialConfig>,

    /// External service keys
    pub api_keys: ApiKeys,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns error if the trigger table is invalid or an engine name is
    /// unrecognized
    pub fn from_env() -> Result<Self> {
        let triggers = TriggerTable::parse(&std::env::var("WAKE_WORDS").unwrap_or_default())?;

        let capture = CaptureConfig {
            device_index: std::env::var("MICROPHONE_INDEX")
                .ok()
                .and_then(|s| s.parse().ok()),
            sample_rate: std::env::var("MICROPHONE_SAMPLE_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SAMPLE_RATE),
            listen_timeout: Duration::from_secs(
                std::env::var("LISTEN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_LISTEN_TIMEOUT_SECS),
            ),
        };

        let stt_engine = match std::env::var("STT_ENGINE") {
            Ok(name) => SttEngineKind::parse(&name)?,
            Err(_) => SttEngineKind::WhisperCli,
        };
        let stt = SttConfig {
            engine: stt_engine,
            model: std::env::var("STT_MODEL")
                .unwrap_or_else(|_| stt_engine.default_model().to_string()),
            language: std::env::var("STT_LANGUAGE").unwrap_or_else(|_| "ko".to_string()),
            timeout: Duration::from_secs(
                std::env::var("STT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_STT_TIMEOUT_SECS),
            ),
        };

        let tts_engine = match std::env::var("TTS_ENGINE") {
            Ok(name) => TtsEngineKind::parse(&name)?,
            Err(_) => TtsEngineKind::OpenAi,
        };
        let tts = TtsConfig {
            engine: tts_engine,
            voice: std::env::var("TTS_VOICE")
                .unwrap_or_else(|_| tts_engine.default_voice().to_string()),
            speaking_rate: std::env::var("TTS_SPEAKING_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.1),
        };

        let assistant = AssistantConfig {
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            max_tokens: std::env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            temperature: std::env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.5),
            system_prompt: std::env::var("ASSISTANT_SYSTEM_PROMPT").ok(),
        };

        let serial = std::env::var("SERIAL_PORT")
            .ok()
            .filter(|port| !port.is_empty())
            .map(|port| SerialConfig {
                port,
                baud: std::env::var("SERIAL_BAUDRATE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SERIAL_BAUD),
            });

        let api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY").ok(),
            google_tts: std::env::var("GOOGLE_TTS_API_KEY").ok(),
        };

        Ok(Self {
            triggers,
            capture,
            stt,
            tts,
            assistant,
            serial,
            api_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stt_engine_parsing() {
        assert_eq!(
            SttEngineKind::parse("whisper-cli").unwrap(),
            SttEngineKind::WhisperCli
        );
        assert_eq!(
            SttEngineKind::parse("whisper-api").unwrap(),
            SttEngineKind::WhisperApi
        );
        assert!(SttEngineKind::parse("vosk").is_err());
    }

    #[test]
    fn test_tts_engine_parsing() {
        assert_eq!(TtsEngineKind::parse("openai").unwrap(), TtsEngineKind::OpenAi);
        assert_eq!(TtsEngineKind::parse("google").unwrap(), TtsEngineKind::Google);
        assert!(TtsEngineKind::parse("espeak").is_err());
    }

    #[test]
    fn test_engine_defaults() {
        assert_eq!(SttEngineKind::WhisperCli.default_model(), "base");
        assert_eq!(SttEngineKind::WhisperApi.default_model(), "whisper-1");
        assert_eq!(TtsEngineKind::OpenAi.default_voice(), "alloy");
        assert_eq!(TtsEngineKind::Google.default_voice(), "ko-KR-Standard-A");
    }
}
