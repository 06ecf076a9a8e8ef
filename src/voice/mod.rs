//! Audio-path components
//!
//! Microphone capture with utterance segmentation, speech-to-text engine
//! adapters, speech synthesis, and playback.

mod capture;
mod playback;
pub mod stt;
pub mod tts;

pub use capture::{
    AudioCapture, DEFAULT_SAMPLE_RATE, MicCapture, SegmenterState, SpeechSegmenter, Utterance,
    calculate_energy, samples_to_wav,
};
pub use playback::AudioPlayback;
