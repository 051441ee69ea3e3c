use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{
    synth::{WaveformBuffer, TAPER_SAMPLES},
    MicrotoneError, Result,
};

/// Longest window handed to the FFT.
const MAX_WINDOW: usize = 8192;
/// Shortest window worth analysing.
const MIN_WINDOW: usize = 64;

/// Measurements taken from a rendered note buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneSummary {
    pub requested_frequency: f64,
    pub estimated_frequency: Option<f64>,
    pub peak: f32,
    pub rms: f32,
    /// Peak of the final taper window; should sit far below `peak`.
    pub tail_peak: f32,
    pub duration_seconds: f64,
}

/// Spectrum based checks on note buffers. Keeps its FFT plan between calls.
pub struct ToneAnalyser {
    planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl Default for ToneAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneAnalyser {
    pub fn new() -> Self {
        Self {
            planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    pub fn summarize(&mut self, buffer: &WaveformBuffer) -> Result<ToneSummary> {
        let samples = buffer.samples();
        let tail_start = samples.len().saturating_sub(TAPER_SAMPLES);

        Ok(ToneSummary {
            requested_frequency: buffer.frequency(),
            estimated_frequency: self.estimate_fundamental(buffer)?,
            peak: buffer.peak(),
            rms: compute_rms(samples),
            tail_peak: peak(&samples[tail_start..]),
            duration_seconds: buffer.duration_seconds(),
        })
    }

    /// Frequency of the strongest spectral peak in the untapered part of the
    /// buffer, refined by parabolic interpolation. Returns `None` for silent
    /// or very short buffers.
    pub fn estimate_fundamental(&mut self, buffer: &WaveformBuffer) -> Result<Option<f64>> {
        let samples = buffer.samples();
        let usable = samples
            .len()
            .saturating_sub(TAPER_SAMPLES)
            .max(samples.len().min(MIN_WINDOW));
        let size = window_size(usable);
        if size < MIN_WINDOW || buffer.sample_rate() == 0 {
            return Ok(None);
        }

        let fft = self.prepare_fft(size)?;
        for (index, (slot, value)) in fft.input.iter_mut().zip(samples).enumerate() {
            *slot = *value * hann_value(index, size);
        }
        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let magnitudes: Vec<f32> = fft.spectrum.iter().map(|bin| bin.norm()).collect();
        let Some((bin, &strongest)) = magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
        else {
            return Ok(None);
        };
        if strongest <= f32::EPSILON {
            return Ok(None);
        }

        let offset = match (magnitudes.get(bin - 1), magnitudes.get(bin + 1)) {
            (Some(&left), Some(&right)) => {
                let denominator = left - 2.0 * strongest + right;
                if denominator.abs() > f32::EPSILON {
                    0.5 * (left - right) / denominator
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        let bin_hz = f64::from(buffer.sample_rate()) / size as f64;
        Ok(Some((bin as f64 + f64::from(offset)) * bin_hz))
    }

    fn prepare_fft(&mut self, size: usize) -> Result<&mut FftResources> {
        let rebuild = self
            .fft
            .as_ref()
            .map(|fft| fft.size != size)
            .unwrap_or(true);

        if rebuild {
            let plan = self.planner.plan_fft_forward(size);
            let scratch = plan.make_scratch_vec();
            let spectrum = plan.make_output_vec();
            let input = plan.make_input_vec();
            self.fft = Some(FftResources {
                size,
                plan,
                scratch,
                spectrum,
                input,
            });
        }

        self.fft
            .as_mut()
            .ok_or_else(|| MicrotoneError::msg("fft resources were not prepared"))
    }
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for ToneAnalyser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToneAnalyser")
            .field("fft_size", &self.fft.as_ref().map(|fft| fft.size))
            .finish()
    }
}

/// Largest power of two not above `len`, capped at [`MAX_WINDOW`].
fn window_size(len: usize) -> usize {
    let capped = len.min(MAX_WINDOW);
    if capped == 0 {
        return 0;
    }
    1 << (usize::BITS - 1 - capped.leading_zeros())
}

fn compute_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}
