//! Audio-path integration tests
//!
//! Tests capture segmentation and WAV encoding without audio hardware.

use std::io::Cursor;

use voxloop::voice::{
    DEFAULT_SAMPLE_RATE, SegmenterState, SpeechSegmenter, Utterance, calculate_energy,
    samples_to_wav,
};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (DEFAULT_SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / DEFAULT_SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (DEFAULT_SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

#[test]
fn test_segmenter_starts_idle() {
    let segmenter = SpeechSegmenter::new(DEFAULT_SAMPLE_RATE);

    assert_eq!(segmenter.state(), SegmenterState::Idle);
    assert!(segmenter.segment().is_empty());
}

#[test]
fn test_silence_does_not_accumulate() {
    let mut segmenter = SpeechSegmenter::new(DEFAULT_SAMPLE_RATE);

    let silence = generate_silence(0.3);
    assert!(!segmenter.process(&silence));

    assert_eq!(segmenter.state(), SegmenterState::Idle);
    assert!(segmenter.segment().is_empty());
}

#[test]
fn test_speech_starts_accumulation() {
    let mut segmenter = SpeechSegmenter::new(DEFAULT_SAMPLE_RATE);

    let speech = generate_sine_samples(440.0, 0.2, 0.3);
    assert!(!segmenter.process(&speech));

    assert_eq!(segmenter.state(), SegmenterState::Accumulating);
    assert_eq!(segmenter.segment().len(), speech.len());
}

#[test]
fn test_utterance_completes_after_trailing_silence() {
    let mut segmenter = SpeechSegmenter::new(DEFAULT_SAMPLE_RATE);

    let speech = generate_sine_samples(440.0, 0.5, 0.3);
    segmenter.process(&speech);

    let more_speech = generate_sine_samples(440.0, 0.3, 0.3);
    segmenter.process(&more_speech);

    let silence = generate_silence(0.6);
    assert!(segmenter.process(&silence));

    let segment = segmenter.take_segment();
    assert_eq!(
        segment.len(),
        speech.len() + more_speech.len() + silence.len()
    );
    assert_eq!(segmenter.state(), SegmenterState::Idle);
}

#[test]
fn test_take_segment_resets() {
    let mut segmenter = SpeechSegmenter::new(DEFAULT_SAMPLE_RATE);

    let speech = generate_sine_samples(440.0, 0.2, 0.3);
    segmenter.process(&speech);

    let taken = segmenter.take_segment();
    assert_eq!(taken.len(), speech.len());
    assert!(segmenter.segment().is_empty());
    assert_eq!(segmenter.state(), SegmenterState::Idle);
}

#[test]
fn test_chunked_feeding_accumulates() {
    let mut segmenter = SpeechSegmenter::new(DEFAULT_SAMPLE_RATE);

    let chunk1 = generate_sine_samples(440.0, 0.1, 0.3);
    segmenter.process(&chunk1);

    let chunk2 = generate_sine_samples(440.0, 0.1, 0.3);
    segmenter.process(&chunk2);

    assert_eq!(segmenter.segment().len(), chunk1.len() + chunk2.len());
}

#[test]
fn test_energy_distinguishes_speech_from_silence() {
    let silence = generate_silence(0.1);
    assert!(calculate_energy(&silence) < 0.001);

    let speech = generate_sine_samples(440.0, 0.1, 0.3);
    assert!(calculate_energy(&speech) > 0.1);

    assert!((calculate_energy(&[]) - 0.0).abs() < f32::EPSILON);
}

#[test]
fn test_samples_to_wav_header() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, DEFAULT_SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    // WAV should have reasonable size
    assert!(wav_data.len() > 44); // WAV header is 44 bytes
}

#[test]
fn test_wav_roundtrip() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, DEFAULT_SAMPLE_RATE).unwrap();

    // Read WAV back
    let cursor = Cursor::new(wav_data);
    let mut reader = hound::WavReader::new(cursor).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, DEFAULT_SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    // Read samples back
    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), original_samples.len());
}

#[test]
fn test_utterance_duration() {
    let utterance = Utterance {
        samples: vec![0.0; 16000],
        sample_rate: DEFAULT_SAMPLE_RATE,
        channels: 1,
    };

    assert!((utterance.duration_secs() - 1.0).abs() < 0.001);
}
