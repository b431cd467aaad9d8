//! Cepstral feature extraction for call audio.
//!
//! Computes MFCC frame matrices from mono audio at its native sample rate:
//! centered STFT, Slaney mel filterbank, dB scaling, orthonormal DCT-II.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Number of cepstral coefficients kept per frame.
pub const N_COEFFS: usize = 13;

/// Samples between successive analysis frames.
pub const HOP_LENGTH: usize = 512;

const N_FFT: usize = 2048;
const N_FREQ: usize = (N_FFT / 2) + 1; // 1025
const N_MELS: usize = 128;

const PAD: usize = N_FFT / 2; // 1024

/// Floor below the loudest frame, in dB.
const TOP_DB: f64 = 80.0;

/// Per-frame cepstral coefficients, stored frame-major.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    data: Vec<f32>,
    n_frames: usize,
}

impl FeatureMatrix {
    /// Build a matrix from frame-major data, `N_COEFFS` values per frame.
    pub fn from_flat(data: Vec<f32>, n_frames: usize) -> Self {
        debug_assert_eq!(data.len(), n_frames * N_COEFFS);
        Self { data, n_frames }
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn coeff(&self, frame: usize, band: usize) -> f32 {
        self.data[frame * N_COEFFS + band]
    }

    /// Mean of one coefficient band over `[start_frame, end_frame)`.
    pub fn band_mean(&self, band: usize, start_frame: usize, end_frame: usize) -> f32 {
        let mut sum = 0.0f64;
        for frame in start_frame..end_frame {
            sum += self.coeff(frame, band) as f64;
        }
        (sum / (end_frame - start_frame) as f64) as f32
    }
}

/// MFCC extractor with a fixed FFT plan, window, and DCT basis.
///
/// The mel filterbank depends on the input sample rate and is built per call.
/// Stateless across calls: the same samples always produce the same matrix.
pub struct MfccExtractor {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    dct_basis: Vec<f64>,
}

impl MfccExtractor {
    pub fn new() -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            fft: planner.plan_fft_forward(N_FFT),
            window: hann_window(N_FFT),
            dct_basis: dct_ii_basis(N_MELS, N_COEFFS),
        }
    }

    /// Compute the 13-band cepstral matrix for mono samples.
    ///
    /// Frames are centered (reflect padding), advanced by [`HOP_LENGTH`],
    /// giving `1 + len / HOP_LENGTH` frames. Empty input yields zero frames.
    pub fn compute(&self, samples: &[f32], sample_rate: u32) -> FeatureMatrix {
        if samples.is_empty() {
            return FeatureMatrix {
                data: Vec::new(),
                n_frames: 0,
            };
        }

        let n_frames = 1 + samples.len() / HOP_LENGTH;
        let padded = reflect_pad_1d(samples, PAD);
        let mel_filters = mel_filter_bank_slaney(
            N_FREQ,
            N_MELS,
            sample_rate as usize,
            0.0,
            sample_rate as f64 / 2.0,
        );

        // Log-mel energies for every frame, then a global top-dB floor.
        let mut log_mel = vec![0.0f64; n_frames * N_MELS];
        let mut frame_in: Vec<Complex<f64>> = vec![Complex { re: 0.0, im: 0.0 }; N_FFT];
        let mut power = vec![0.0f64; N_FREQ];

        for frame_idx in 0..n_frames {
            let start = frame_idx * HOP_LENGTH;
            let frame = &padded[start..start + N_FFT];

            for (out, (sample, win)) in frame_in
                .iter_mut()
                .zip(frame.iter().zip(self.window.iter()))
            {
                out.re = (*sample as f64) * win;
                out.im = 0.0;
            }

            self.fft.process(&mut frame_in);

            for (p, c) in power.iter_mut().zip(frame_in.iter().take(N_FREQ)) {
                *p = c.re * c.re + c.im * c.im;
            }

            for m in 0..N_MELS {
                let mut v = 0.0f64;
                for k in 0..N_FREQ {
                    v += mel_filters[k][m] * power[k];
                }
                log_mel[frame_idx * N_MELS + m] = 10.0 * v.max(1e-10).log10();
            }
        }

        let max_db = log_mel.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let floor = max_db - TOP_DB;
        for v in log_mel.iter_mut() {
            if *v < floor {
                *v = floor;
            }
        }

        // DCT-II along the mel axis, keeping the first N_COEFFS coefficients.
        let mut data = vec![0.0f32; n_frames * N_COEFFS];
        for frame_idx in 0..n_frames {
            let mels = &log_mel[frame_idx * N_MELS..(frame_idx + 1) * N_MELS];
            for k in 0..N_COEFFS {
                let basis = &self.dct_basis[k * N_MELS..(k + 1) * N_MELS];
                let mut c = 0.0f64;
                for (x, b) in mels.iter().zip(basis.iter()) {
                    c += x * b;
                }
                data[frame_idx * N_COEFFS + k] = c as f32;
            }
        }

        FeatureMatrix { data, n_frames }
    }
}

impl Default for MfccExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn reflect_pad_1d(x: &[f32], pad: usize) -> Vec<f32> {
    if pad == 0 {
        return x.to_vec();
    }
    if x.len() < pad + 1 {
        let mut out = vec![0.0; pad];
        out.extend_from_slice(x);
        out.extend(std::iter::repeat(0.0).take(pad));
        return out;
    }

    let mut out = Vec::with_capacity(x.len() + (2 * pad));
    for i in 0..pad {
        out.push(x[pad - i]);
    }
    out.extend_from_slice(x);
    for i in 0..pad {
        out.push(x[x.len() - 2 - i]);
    }
    out
}

fn hann_window(n: usize) -> Vec<f64> {
    let n_f = n as f64;
    (0..n)
        .map(|i| 0.5 - 0.5 * ((2.0 * std::f64::consts::PI * i as f64) / n_f).cos())
        .collect()
}

/// Orthonormal DCT-II basis, `n_coeffs` rows over `n_input` points.
fn dct_ii_basis(n_input: usize, n_coeffs: usize) -> Vec<f64> {
    let n_f = n_input as f64;
    let mut basis = vec![0.0f64; n_coeffs * n_input];
    for k in 0..n_coeffs {
        let scale = if k == 0 {
            (1.0 / n_f).sqrt()
        } else {
            (2.0 / n_f).sqrt()
        };
        for n in 0..n_input {
            basis[k * n_input + n] = scale
                * (std::f64::consts::PI * (n as f64 + 0.5) * k as f64 / n_f).cos();
        }
    }
    basis
}

fn hertz_to_mel_slaney(freq: f64) -> f64 {
    let min_log_hertz = 1000.0;
    let min_log_mel = 15.0;
    let logstep = 27.0 / 6.4_f64.ln();
    let mut mels = 3.0 * freq / 200.0;
    if freq >= min_log_hertz {
        mels = min_log_mel + (freq / min_log_hertz).ln() * logstep;
    }
    mels
}

fn mel_to_hertz_slaney(mels: f64) -> f64 {
    let min_log_hertz = 1000.0;
    let min_log_mel = 15.0;
    let logstep = 6.4_f64.ln() / 27.0;
    let mut freq = 200.0 * mels / 3.0;
    if mels >= min_log_mel {
        freq = min_log_hertz * (logstep * (mels - min_log_mel)).exp();
    }
    freq
}

fn mel_filter_bank_slaney(
    num_frequency_bins: usize,
    num_mel_filters: usize,
    sampling_rate: usize,
    min_frequency: f64,
    max_frequency: f64,
) -> Vec<Vec<f64>> {
    let mel_min = hertz_to_mel_slaney(min_frequency);
    let mel_max = hertz_to_mel_slaney(max_frequency);

    let mut mel_freqs = Vec::with_capacity(num_mel_filters + 2);
    for i in 0..(num_mel_filters + 2) {
        let t = i as f64 / (num_mel_filters + 1) as f64;
        mel_freqs.push(mel_min + t * (mel_max - mel_min));
    }

    let mut filter_freqs = Vec::with_capacity(num_mel_filters + 2);
    for m in mel_freqs {
        filter_freqs.push(mel_to_hertz_slaney(m));
    }

    let nyquist = (sampling_rate as f64) / 2.0;
    let mut fft_freqs = Vec::with_capacity(num_frequency_bins);
    if num_frequency_bins == 1 {
        fft_freqs.push(0.0);
    } else {
        for i in 0..num_frequency_bins {
            let t = i as f64 / (num_frequency_bins - 1) as f64;
            fft_freqs.push(t * nyquist);
        }
    }

    let mut mel_filters = vec![vec![0.0f64; num_mel_filters]; num_frequency_bins];
    for f in 0..num_frequency_bins {
        let ff = fft_freqs[f];
        for m in 0..num_mel_filters {
            let f_left = filter_freqs[m];
            let f_center = filter_freqs[m + 1];
            let f_right = filter_freqs[m + 2];

            let down = (ff - f_left) / (f_center - f_left);
            let up = (f_right - ff) / (f_right - f_center);
            let v = down.min(up).max(0.0);
            mel_filters[f][m] = v;
        }
    }

    // Slaney area normalization
    for m in 0..num_mel_filters {
        let enorm = 2.0 / (filter_freqs[m + 2] - filter_freqs[m]);
        for row in &mut mel_filters {
            row[m] *= enorm;
        }
    }

    mel_filters
}
