//! Offline dictation: transcribe a WAV recording with Whisper and feed the
//! segments through the transcript queue as final chunks. Compiled only with
//! the `dictation` feature; the queue/appender path works without it.

use std::path::Path;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::{
    error::{CoreError, Result},
    speech::{TranscriptChunk, TranscriptQueue},
};

fn dictation_error(audio_path: &Path, reason: impl ToString) -> CoreError {
    CoreError::DictationFailed {
        audio_path: audio_path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Transcribe a 16 kHz mono PCM WAV and push one final chunk per Whisper
/// segment. Returns how many chunks were queued.
pub fn transcribe_wav_into(
    queue: &TranscriptQueue,
    audio_path: &Path,
    model_path: &Path,
) -> Result<usize> {
    let mut reader =
        hound::WavReader::open(audio_path).map_err(|e| dictation_error(audio_path, e))?;
    let samples: Vec<f32> = reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| dictation_error(audio_path, e))?;

    let model_path_str = model_path
        .to_str()
        .ok_or_else(|| dictation_error(audio_path, "model path is not valid UTF-8"))?;
    let ctx = WhisperContext::new_with_params(model_path_str, WhisperContextParameters::default())
        .map_err(|e| dictation_error(audio_path, format!("failed to load model: {e}")))?;

    let params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    let mut state = ctx
        .create_state()
        .map_err(|e| dictation_error(audio_path, format!("failed to create state: {e}")))?;
    state
        .full(params, &samples)
        .map_err(|e| dictation_error(audio_path, format!("transcription failed: {e}")))?;

    let mut queued = 0;
    for segment in state.as_iter() {
        let Ok(text) = segment.to_str() else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        queue.push_overwrite(TranscriptChunk {
            text: text.to_string(),
            is_final: true,
        });
        queued += 1;
    }

    Ok(queued)
}
