use callsift_features::N_COEFFS;

use crate::segment::AnnotatedSegment;

/// Unsupervised binary partition label, prior to role naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcousticGroup {
    A,
    B,
}

/// A two-way acoustic grouping of annotated segments.
///
/// Implementations return one label per input segment, in order, and must
/// return an empty vector for empty input without further computation.
pub trait GroupingStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn group(&self, segments: &[AnnotatedSegment]) -> Vec<AcousticGroup>;
}

/// Which grouping strategy the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingMethod {
    /// Per-coefficient majority vote against the global mean. Deterministic,
    /// needs no initialization. The default.
    #[default]
    ThresholdVote,
    /// Iterative two-centroid clustering with random initialization.
    Centroid,
}

impl GroupingMethod {
    pub fn strategy(&self) -> Box<dyn GroupingStrategy> {
        match self {
            Self::ThresholdVote => Box::new(ThresholdVote),
            Self::Centroid => Box::new(CentroidClustering::default()),
        }
    }
}

/// Majority-vote threshold partition.
///
/// Computes the global mean of each of the 13 coefficients across all
/// segments, then assigns group A to segments with more coefficients strictly
/// above their global mean than not. Ties on a coefficient count as below.
pub struct ThresholdVote;

impl GroupingStrategy for ThresholdVote {
    fn name(&self) -> &'static str {
        "threshold-vote"
    }

    fn group(&self, segments: &[AnnotatedSegment]) -> Vec<AcousticGroup> {
        if segments.is_empty() {
            return Vec::new();
        }

        let mut global_averages = [0.0f64; N_COEFFS];
        for seg in segments {
            for (avg, value) in global_averages.iter_mut().zip(seg.features.iter()) {
                *avg += *value as f64;
            }
        }
        for avg in &mut global_averages {
            *avg /= segments.len() as f64;
        }

        segments
            .iter()
            .map(|seg| {
                let above = seg
                    .features
                    .iter()
                    .zip(global_averages.iter())
                    .filter(|(value, avg)| (**value as f64) > **avg)
                    .count();
                let below = N_COEFFS - above;
                if above > below {
                    AcousticGroup::A
                } else {
                    AcousticGroup::B
                }
            })
            .collect()
    }
}

/// Iterative two-centroid clustering over the segment feature vectors.
///
/// Centroids start from two distinct randomly chosen segments, points go to
/// the nearest centroid by squared Euclidean distance, and centroids move to
/// their cluster means until assignments stop changing or the iteration cap
/// is hit. A fixed seed makes runs reproducible.
pub struct CentroidClustering {
    pub max_iters: usize,
    pub seed: Option<u64>,
}

impl Default for CentroidClustering {
    fn default() -> Self {
        Self {
            max_iters: 100,
            seed: None,
        }
    }
}

impl CentroidClustering {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            max_iters: 100,
            seed: Some(seed),
        }
    }
}

impl GroupingStrategy for CentroidClustering {
    fn name(&self) -> &'static str {
        "centroid"
    }

    fn group(&self, segments: &[AnnotatedSegment]) -> Vec<AcousticGroup> {
        let n = segments.len();
        if n < 2 {
            return vec![AcousticGroup::A; n];
        }

        let mut rng = match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        let first = rng.usize(..n);
        let mut second = rng.usize(..n);
        while second == first {
            second = rng.usize(..n);
        }

        let mut centroids = [to_f64(&segments[first].features), to_f64(&segments[second].features)];
        let mut labels = vec![0usize; n];

        for _ in 0..self.max_iters {
            let mut changed = false;

            for (i, seg) in segments.iter().enumerate() {
                let d0 = squared_distance(&seg.features, &centroids[0]);
                let d1 = squared_distance(&seg.features, &centroids[1]);
                let nearest = usize::from(d1 < d0);
                if labels[i] != nearest {
                    labels[i] = nearest;
                    changed = true;
                }
            }

            if !changed {
                break;
            }

            for (cluster, centroid) in centroids.iter_mut().enumerate() {
                let mut sum = [0.0f64; N_COEFFS];
                let mut count = 0usize;
                for (seg, &label) in segments.iter().zip(labels.iter()) {
                    if label == cluster {
                        for (s, v) in sum.iter_mut().zip(seg.features.iter()) {
                            *s += *v as f64;
                        }
                        count += 1;
                    }
                }
                // An emptied cluster keeps its previous centroid.
                if count > 0 {
                    for (c, s) in centroid.iter_mut().zip(sum.iter()) {
                        *c = *s / count as f64;
                    }
                }
            }
        }

        labels
            .into_iter()
            .map(|label| {
                if label == 0 {
                    AcousticGroup::A
                } else {
                    AcousticGroup::B
                }
            })
            .collect()
    }
}

fn to_f64(features: &[f32; N_COEFFS]) -> [f64; N_COEFFS] {
    let mut out = [0.0f64; N_COEFFS];
    for (o, v) in out.iter_mut().zip(features.iter()) {
        *o = *v as f64;
    }
    out
}

fn squared_distance(features: &[f32; N_COEFFS], centroid: &[f64; N_COEFFS]) -> f64 {
    features
        .iter()
        .zip(centroid.iter())
        .map(|(v, c)| {
            let d = *v as f64 - c;
            d * d
        })
        .sum()
}
