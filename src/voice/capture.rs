//! Audio capture from microphone
//!
//! Owns the input stream and segments the incoming sample stream into
//! discrete utterances bounded by trailing silence.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Default sample rate for audio capture (16kHz for speech)
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech for a valid utterance
const MIN_SPEECH_SECS: f32 = 0.3;

/// Trailing silence that ends an utterance
const TRAILING_SILENCE_SECS: f32 = 0.5;

/// Poll interval while waiting for captured samples
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One captured span of microphone audio, bounded by silence or timeout
///
/// Owned by the turn that captured it and discarded when the turn's
/// transcription attempt completes.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Mono samples in the range [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate the samples were captured at
    pub sample_rate: u32,

    /// Channel count (always 1 for microphone capture)
    pub channels: u16,
}

impl Utterance {
    /// Duration of the captured audio
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Captures audio from an input device
pub struct AudioCapture {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    device_index: Option<usize>,
    sample_rate: u32,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Arguments
    ///
    /// * `device_index` - Input device index, or `None` for the default device
    /// * `sample_rate` - Capture sample rate in Hz
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened or does not support
    /// mono capture at the requested rate
    pub fn new(device_index: Option<usize>, sample_rate: u32) -> Result<Self> {
        let device = input_device(device_index)?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
            .ok_or_else(|| {
                Error::Audio(format!("no mono input config at {sample_rate} Hz"))
            })?;

        let config = supported_config
            .with_sample_rate(SampleRate(sample_rate))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            device_index,
            sample_rate,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing audio
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be built or started
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let device = input_device(self.device_index)?;
        let config = self.config.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing audio
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    /// Get captured audio and clear the buffer
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Get captured audio without clearing
    #[must_use]
    pub fn peek_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Clear the audio buffer
    pub fn clear_buffer(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    /// Get the configured sample rate
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Resolve an input device by index, or the default device
fn input_device(index: Option<usize>) -> Result<Device> {
    let host = cpal::default_host();

    match index {
        Some(index) => host
            .input_devices()
            .map_err(|e| Error::Audio(e.to_string()))?
            .nth(index)
            .ok_or_else(|| Error::Audio(format!("no input device at index {index}"))),
        None => host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string())),
    }
}

/// State of the utterance segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech
    Idle,
    /// Detected speech, accumulating until trailing silence
    Accumulating,
}

/// Segments a sample stream into utterances
///
/// Accumulates samples while RMS energy stays above a threshold and
/// reports a complete segment once enough speech is followed by a
/// trailing-silence window.
pub struct SpeechSegmenter {
    state: SegmenterState,
    speech_buffer: Vec<f32>,
    silence_samples: usize,
    min_speech_samples: usize,
    trailing_silence_samples: usize,
}

impl SpeechSegmenter {
    /// Create a segmenter for the given capture rate
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: SegmenterState::Idle,
            speech_buffer: Vec::new(),
            silence_samples: 0,
            min_speech_samples: (sample_rate as f32 * MIN_SPEECH_SECS) as usize,
            trailing_silence_samples: (sample_rate as f32 * TRAILING_SILENCE_SECS) as usize,
        }
    }

    /// Feed captured samples; returns true when an utterance is complete
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            SegmenterState::Idle => {
                if is_speech {
                    self.state = SegmenterState::Accumulating;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_samples = 0;
                    tracing::trace!(energy, "speech detected");
                }
            }
            SegmenterState::Accumulating => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_samples = 0;
                } else {
                    self.silence_samples += samples.len();
                }

                let speech_samples = self.speech_buffer.len() - self.silence_samples;
                if self.silence_samples > self.trailing_silence_samples
                    && speech_samples > self.min_speech_samples
                {
                    tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                    return true;
                }

                // Too much silence without enough speech: noise, start over
                if self.silence_samples > self.trailing_silence_samples * 2 {
                    tracing::trace!("discarding short noise segment");
                    self.reset();
                }
            }
        }

        false
    }

    /// Take the accumulated segment, clearing it
    pub fn take_segment(&mut self) -> Vec<f32> {
        self.silence_samples = 0;
        self.state = SegmenterState::Idle;
        std::mem::take(&mut self.speech_buffer)
    }

    /// Accumulated samples so far
    #[must_use]
    pub fn segment(&self) -> &[f32] {
        &self.speech_buffer
    }

    /// Reset to idle, discarding any accumulated samples
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.speech_buffer.clear();
        self.silence_samples = 0;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }
}

/// Calculate RMS energy of audio samples
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Microphone capture collaborator for the turn loop
///
/// Blocks until one utterance is segmented or the listen window elapses.
pub struct MicCapture {
    capture: AudioCapture,
    segmenter: SpeechSegmenter,
    listen_timeout: Duration,
}

impl MicCapture {
    /// Create a microphone capture collaborator
    ///
    /// # Errors
    ///
    /// Returns error if the input device cannot be opened
    pub fn new(
        device_index: Option<usize>,
        sample_rate: u32,
        listen_timeout: Duration,
    ) -> Result<Self> {
        let capture = AudioCapture::new(device_index, sample_rate)?;
        let segmenter = SpeechSegmenter::new(sample_rate);

        Ok(Self {
            capture,
            segmenter,
            listen_timeout,
        })
    }

    /// Wait for one utterance
    ///
    /// Returns `None` when the listen window elapses without a complete
    /// utterance or the device fails; failures are logged, never raised.
    async fn next_utterance(&mut self) -> Option<Utterance> {
        if let Err(e) = self.capture.start() {
            tracing::error!(error = %e, "failed to start capture");
            return None;
        }

        self.capture.clear_buffer();
        self.segmenter.reset();

        let deadline = tokio::time::Instant::now() + self.listen_timeout;

        loop {
            if tokio::time::Instant::now() >= deadline {
                tracing::debug!("listen window elapsed without an utterance");
                self.segmenter.reset();
                return None;
            }

            tokio::time::sleep(POLL_INTERVAL).await;

            let samples = self.capture.take_buffer();
            if samples.is_empty() {
                continue;
            }

            if self.segmenter.process(&samples) {
                let samples = self.segmenter.take_segment();
                return Some(Utterance {
                    samples,
                    sample_rate: self.capture.sample_rate(),
                    channels: 1,
                });
            }
        }
    }

    /// Stop the underlying stream
    pub fn stop(&mut self) {
        self.capture.stop();
    }
}

#[async_trait::async_trait(?Send)]
impl crate::daemon::Capture for MicCapture {
    async fn listen(&mut self) -> Option<Utterance> {
        self.next_utterance().await
    }
}

/// Encode f32 samples as 16-bit mono WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(sample_i16)?;
        }

        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_calculation() {
        let silence = vec![0.0f32; 100];
        assert!(calculate_energy(&silence) < 0.001);

        let loud = vec![0.5f32; 100];
        assert!(calculate_energy(&loud) > 0.4);
    }

    #[test]
    fn test_segmenter_ignores_silence() {
        let mut segmenter = SpeechSegmenter::new(DEFAULT_SAMPLE_RATE);

        let silence = vec![0.0f32; 1600];
        assert!(!segmenter.process(&silence));
        assert_eq!(segmenter.state(), SegmenterState::Idle);
    }

    #[test]
    fn test_segmenter_completes_on_trailing_silence() {
        let mut segmenter = SpeechSegmenter::new(DEFAULT_SAMPLE_RATE);

        // 0.5s of speech
        let speech = vec![0.3f32; 8000];
        assert!(!segmenter.process(&speech));
        assert_eq!(segmenter.state(), SegmenterState::Accumulating);

        // 0.6s of silence ends the utterance
        let silence = vec![0.0f32; 9600];
        assert!(segmenter.process(&silence));

        let segment = segmenter.take_segment();
        assert_eq!(segment.len(), speech.len() + silence.len());
        assert_eq!(segmenter.state(), SegmenterState::Idle);
    }

    #[test]
    fn test_segmenter_discards_short_noise() {
        let mut segmenter = SpeechSegmenter::new(DEFAULT_SAMPLE_RATE);

        // A brief blip, far below the minimum speech duration
        let blip = vec![0.3f32; 800];
        segmenter.process(&blip);

        // Long silence resets without completing
        let silence = vec![0.0f32; 32000];
        assert!(!segmenter.process(&silence));
        assert_eq!(segmenter.state(), SegmenterState::Idle);
        assert!(segmenter.segment().is_empty());
    }
}
