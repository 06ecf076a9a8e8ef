//! Shared test doubles for the turn loop
//!
//! No audio hardware, no network: collaborators are scripted in memory.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;

use voxloop::daemon::{Capture, DeviceLink, Responder, Speaker};
use voxloop::transcribe::SttEngine;
use voxloop::voice::Utterance;
use voxloop::{Error, Result};

/// Build a short synthetic utterance
#[must_use]
pub fn utterance() -> Utterance {
    let samples = (0..1600)
        .map(|i| {
            let t = i as f32 / 16000.0;
            0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();

    Utterance {
        samples,
        sample_rate: 16000,
        channels: 1,
    }
}

/// Capture double that plays back a fixed queue of utterances
pub struct ScriptedCapture {
    queue: RefCell<VecDeque<Utterance>>,
}

impl ScriptedCapture {
    #[must_use]
    pub fn with_turns(count: usize) -> Self {
        Self {
            queue: RefCell::new((0..count).map(|_| utterance()).collect()),
        }
    }
}

#[async_trait(?Send)]
impl Capture for ScriptedCapture {
    async fn listen(&mut self) -> Option<Utterance> {
        self.queue.borrow_mut().pop_front()
    }
}

/// Engine double scripted per call
pub enum ScriptedEngine {
    /// Return this transcript
    Transcribing(String),
    /// Sleep this long before answering (for deadline tests)
    Hanging(Duration),
    /// Fail with an engine error
    Failing,
}

#[async_trait]
impl SttEngine for ScriptedEngine {
    async fn infer(&self, _audio: &Path, _language: &str) -> Result<String> {
        match self {
            Self::Transcribing(text) => Ok(text.clone()),
            Self::Hanging(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("too late".to_string())
            }
            Self::Failing => Err(Error::Stt("scripted engine failure".to_string())),
        }
    }
}

/// Responder double that counts calls
pub struct ScriptedResponder {
    reply: Option<String>,
    pub calls: Rc<RefCell<usize>>,
}

impl ScriptedResponder {
    #[must_use]
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            calls: Rc::new(RefCell::new(0)),
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Rc::new(RefCell::new(0)),
        }
    }
}

#[async_trait(?Send)]
impl Responder for ScriptedResponder {
    async fn reply(&self, _text: &str) -> Result<String> {
        *self.calls.borrow_mut() += 1;
        self.reply
            .clone()
            .ok_or_else(|| Error::Assistant("scripted assistant failure".to_string()))
    }
}

/// Speaker double that records everything it is asked to say
pub struct RecordingSpeaker {
    pub spoken: Rc<RefCell<Vec<String>>>,
    fail: bool,
}

impl RecordingSpeaker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            spoken: Rc::new(RefCell::new(Vec::new())),
            fail: false,
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            spoken: Rc::new(RefCell::new(Vec::new())),
            fail: true,
        }
    }

    /// Handle that outlives the boxed speaker
    #[must_use]
    pub fn transcript(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.spoken)
    }
}

impl Default for RecordingSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Speaker for RecordingSpeaker {
    async fn say(&mut self, text: &str) -> Result<()> {
        self.spoken.borrow_mut().push(text.to_string());
        if self.fail {
            return Err(Error::Tts("scripted speaker failure".to_string()));
        }
        Ok(())
    }
}

/// Device link double that records sends and close calls
pub struct RecordingLink {
    pub sent: Rc<RefCell<Vec<String>>>,
    pub closed: Rc<RefCell<bool>>,
}

impl RecordingLink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sent: Rc::new(RefCell::new(Vec::new())),
            closed: Rc::new(RefCell::new(false)),
        }
    }

    /// Handles that outlive the boxed link
    #[must_use]
    pub fn handles(&self) -> (Rc<RefCell<Vec<String>>>, Rc<RefCell<bool>>) {
        (Rc::clone(&self.sent), Rc::clone(&self.closed))
    }
}

impl Default for RecordingLink {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceLink for RecordingLink {
    fn send(&mut self, command: &str) {
        self.sent.borrow_mut().push(command.to_string());
    }

    fn close(&mut self) {
        *self.closed.borrow_mut() = true;
    }
}
