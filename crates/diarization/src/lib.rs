//! Dispatcher/caller diarization for emergency-call recordings.
//!
//! Takes a time-aligned transcript and the source waveform, aggregates
//! per-segment cepstral features, partitions segments into two acoustic
//! groups, names the groups by question density, and emits the final
//! role-labeled transcript. Linear, stateless per call.

mod compose;
mod grouping;
mod roles;
mod segment;

pub use compose::{compose_transcript, CALLER_LABEL};
pub use grouping::{
    AcousticGroup, CentroidClustering, GroupingMethod, GroupingStrategy, ThresholdVote,
};
pub use roles::{assign_roles, Role, RolePartition};
pub use segment::{aggregate_segments, AnnotatedSegment};

use std::path::Path;

use callsift_audio::{read_wav, AudioError};
use callsift_features::MfccExtractor;
use callsift_transcript::{
    load_segments_file, CallMetadata, DiarizedTranscript, Segment, TranscriptError,
};

#[derive(Debug, thiserror::Error)]
pub enum DiarizationError {
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("transcript error: {0}")]
    Transcript(#[from] TranscriptError),
}

pub type Result<T> = std::result::Result<T, DiarizationError>;

#[derive(Debug, Clone, Copy, Default)]
pub struct DiarizationOptions {
    pub grouping: GroupingMethod,
}

/// Run the full pipeline on in-memory audio and segments.
///
/// Extract, aggregate, group, assign, compose. Every intermediate is local
/// to this call, so concurrent invocations on different calls are safe.
pub fn diarize(
    samples: &[f32],
    sample_rate: u32,
    segments: &[Segment],
    metadata: &CallMetadata,
    options: &DiarizationOptions,
) -> DiarizedTranscript {
    let extractor = MfccExtractor::new();
    let matrix = extractor.compute(samples, sample_rate);
    tracing::info!(
        frames = matrix.n_frames(),
        segments = segments.len(),
        sample_rate,
        "extracted cepstral features"
    );

    let mut annotated = aggregate_segments(&matrix, sample_rate, segments);

    let strategy = options.grouping.strategy();
    let labels = strategy.group(&annotated);
    for (seg, label) in annotated.iter_mut().zip(labels) {
        seg.acoustic_group = Some(label);
    }
    tracing::info!(strategy = strategy.name(), "grouped segments");

    let partition = assign_roles(annotated);
    tracing::info!(
        dispatcher = partition.dispatcher.len(),
        caller = partition.caller.len(),
        "assigned speaker roles"
    );

    compose_transcript(partition, metadata)
}

/// Diarize a call from its audio file and transcription JSON.
///
/// Both paths are checked up front; a missing input fails before any
/// feature extraction and nothing is written. Provenance comes from the
/// audio file stem (`YYYYMMDD_HHMMSS_<name>`).
pub fn diarize_call(
    audio_path: &Path,
    transcript_path: &Path,
    options: &DiarizationOptions,
) -> Result<DiarizedTranscript> {
    if !audio_path.exists() {
        return Err(AudioError::NotFound(audio_path.to_path_buf()).into());
    }
    if !transcript_path.exists() {
        return Err(TranscriptError::NotFound(transcript_path.to_path_buf()).into());
    }

    let audio = read_wav(audio_path)?;
    let segments = load_segments_file(transcript_path)?;
    let metadata = audio_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(CallMetadata::parse)
        .unwrap_or_default();

    tracing::info!(
        audio = %audio_path.display(),
        duration_secs = audio.duration_secs(),
        segments = segments.len(),
        "diarizing call"
    );

    Ok(diarize(
        &audio.samples,
        audio.sample_rate,
        &segments,
        &metadata,
        options,
    ))
}
