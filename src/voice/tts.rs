//! Text-to-speech adapters
//!
//! Two backends: the `OpenAI` speech API (MP3 output) and Google Cloud
//! text-to-speech (LINEAR16 WAV output). Both honor the configured voice
//! and speaking rate.

use base64::Engine as _;

use crate::{Error, Result};

/// Synthesis output sample rate, matched by playback
const SYNTHESIS_SAMPLE_RATE: u32 = 24000;

/// TTS provider backend
#[derive(Clone, Copy, Debug)]
enum TtsProvider {
    OpenAi,
    Google,
}

/// Synthesized audio with its container format
pub enum SynthesizedAudio {
    /// MP3 bytes
    Mp3(Vec<u8>),
    /// WAV bytes (16-bit LINEAR16)
    Wav(Vec<u8>),
}

impl SynthesizedAudio {
    /// Raw byte length
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Mp3(bytes) | Self::Wav(bytes) => bytes.len(),
        }
    }

    /// Whether the payload is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speaking_rate: f32,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a TTS instance using the `OpenAI` speech API
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new_openai(api_key: String, voice: String, speaking_rate: f32) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speaking_rate,
            model: "tts-1".to_string(),
            provider: TtsProvider::OpenAi,
        })
    }

    /// Create a TTS instance using Google Cloud text-to-speech
    ///
    /// The voice identifier (e.g. "ko-KR-Standard-A") also determines the
    /// language code sent to the API.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new_google(api_key: String, voice: String, speaking_rate: f32) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Google API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speaking_rate,
            model: String::new(),
            provider: TtsProvider::Google,
        })
    }

    /// Synthesize text to speech
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        match self.provider {
            TtsProvider::OpenAi => self.synthesize_openai(text).await,
            TtsProvider::Google => self.synthesize_google(text).await,
        }
    }

    /// Synthesize via the `OpenAI` speech API
    async fn synthesize_openai(&self, text: &str) -> Result<SynthesizedAudio> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speaking_rate,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(SynthesizedAudio::Mp3(audio.to_vec()))
    }

    /// Synthesize via Google Cloud text-to-speech
    async fn synthesize_google(&self, text: &str) -> Result<SynthesizedAudio> {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SynthesisInput<'a> {
            text: &'a str,
        }

        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct VoiceSelection<'a> {
            language_code: &'a str,
            name: &'a str,
        }

        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct AudioConfig {
            audio_encoding: &'static str,
            speaking_rate: f32,
            sample_rate_hertz: u32,
        }

        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SynthesizeRequest<'a> {
            input: SynthesisInput<'a>,
            voice: VoiceSelection<'a>,
            audio_config: AudioConfig,
        }

        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SynthesizeResponse {
            audio_content: String,
        }

        let language_code = language_code_of(&self.voice);

        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &language_code,
                name: &self.voice,
            },
            audio_config: AudioConfig {
                audio_encoding: "LINEAR16",
                speaking_rate: self.speaking_rate,
                sample_rate_hertz: SYNTHESIS_SAMPLE_RATE,
            },
        };

        let url = format!(
            "https://texttospeech.googleapis.com/v1/text:synthesize?key={}",
            self.api_key
        );

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("Google TTS error {status}: {body}")));
        }

        let result: SynthesizeResponse = response.json().await?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(result.audio_content)
            .map_err(|e| Error::Tts(format!("invalid audio content: {e}")))?;

        Ok(SynthesizedAudio::Wav(audio))
    }
}

/// Derive the BCP-47 language code from a Google voice name
///
/// "ko-KR-Standard-A" yields "ko-KR"; a name without the region segments
/// falls through unchanged.
fn language_code_of(voice: &str) -> String {
    let mut segments = voice.splitn(3, '-');
    match (segments.next(), segments.next()) {
        (Some(language), Some(region)) => format!("{language}-{region}"),
        _ => voice.to_string(),
    }
}
