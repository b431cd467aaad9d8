use callsift_features::{FeatureMatrix, HOP_LENGTH, N_COEFFS};
use callsift_transcript::Segment;

use crate::grouping::AcousticGroup;
use crate::roles::Role;

/// A transcript segment annotated with its mean cepstral feature vector and,
/// once the pipeline has run, its acoustic group and speaker role.
///
/// Owned by a single diarization run; never shared across runs.
#[derive(Debug, Clone)]
pub struct AnnotatedSegment {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub text: String,
    pub features: [f32; N_COEFFS],
    pub acoustic_group: Option<AcousticGroup>,
    pub speaker: Option<Role>,
}

/// Map each segment onto its frame range and reduce to one mean vector.
///
/// `start_frame = max(0, floor(start * sr / hop))`,
/// `end_frame = min(F, floor(end * sr / hop))`. A segment mapping to zero
/// frames gets an all-zero vector; that is policy for degenerate spans, not
/// an error.
pub fn aggregate_segments(
    matrix: &FeatureMatrix,
    sample_rate: u32,
    segments: &[Segment],
) -> Vec<AnnotatedSegment> {
    let frames_per_sec = sample_rate as f64 / HOP_LENGTH as f64;

    segments
        .iter()
        .map(|seg| {
            let start_frame = (seg.start * frames_per_sec).floor().max(0.0) as usize;
            let end_frame =
                (((seg.end * frames_per_sec).floor().max(0.0)) as usize).min(matrix.n_frames());

            let mut features = [0.0f32; N_COEFFS];
            if start_frame < end_frame {
                for (band, value) in features.iter_mut().enumerate() {
                    *value = matrix.band_mean(band, start_frame, end_frame);
                }
            } else {
                tracing::debug!(
                    start = seg.start,
                    end = seg.end,
                    "segment maps to zero frames, using zero vector"
                );
            }

            AnnotatedSegment {
                start: seg.start,
                end: seg.end,
                duration: seg.duration,
                text: seg.text.clone(),
                features,
                acoustic_group: None,
                speaker: None,
            }
        })
        .collect()
}
