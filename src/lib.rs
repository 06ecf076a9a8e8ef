//! Voxloop - always-on voice assistant loop
//!
//! This library provides the turn-taking core of a voice assistant:
//! - Microphone capture with utterance segmentation
//! - Bounded transcription in a killable worker
//! - Trigger-phrase short-circuiting with device signaling
//! - Remote assistant replies spoken through a TTS backend
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Turn Loop                        │
//! │  listen → transcribe → match → reply → speak → loop  │
//! └───────┬──────────┬─────────┬────────┬────────┬───────┘
//!         │          │         │        │        │
//!      Capture   Bounded   Trigger  Responder  Speaker
//!      (cpal)  Transcriber  Table     (LLM)   (TTS+play)
//!                  │                              │
//!             STT engine                    Device channel
//!          (local CLI / API)                  (serial)
//! ```
//!
//! Each turn is fully sequential and stateless with respect to prior
//! turns; a failed stage abandons the turn, never the loop.

pub mod assistant;
pub mod config;
pub mod daemon;
pub mod device;
pub mod error;
pub mod transcribe;
pub mod triggers;
pub mod voice;

pub use config::Config;
pub use daemon::{Capture, Daemon, DeviceLink, Responder, Speaker, TurnLoop, TurnOutcome};
pub use error::{Error, Result};
pub use transcribe::{BoundedTranscriber, SttEngine};
pub use triggers::{TriggerEntry, TriggerTable};
