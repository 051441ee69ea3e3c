use std::{f64::consts::PI, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{MicrotoneError, Result};

/// Number of trailing samples faded towards silence so the loop point does not click.
pub const TAPER_SAMPLES: usize = 1000;
/// Amplitude removed per sample inside the taper window.
pub const TAPER_STEP: f64 = 0.001;

/// Oscillator shape used when filling a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformKind {
    #[default]
    Sine,
    Square,
    Triangle,
}

impl fmt::Display for WaveformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaveformKind::Sine => "sine",
            WaveformKind::Square => "square",
            WaveformKind::Triangle => "triangle",
        };
        f.write_str(name)
    }
}

impl FromStr for WaveformKind {
    type Err = MicrotoneError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" => Ok(WaveformKind::Sine),
            "square" => Ok(WaveformKind::Square),
            "triangle" => Ok(WaveformKind::Triangle),
            other => Err(MicrotoneError::invalid(format!(
                "unknown waveform `{other}` (expected sine, square or triangle)"
            ))),
        }
    }
}

/// Immutable block of mono samples for one note, looped during playback.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    frequency: f64,
    amplitude: f64,
    kind: WaveformKind,
}

impl WaveformBuffer {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn kind(&self) -> WaveformKind {
        self.kind
    }

    /// Length of the buffer in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }
}

/// Renders `sample_count` samples of the requested tone.
///
/// Samples are not clamped: an `amplitude` above 1 produces values outside
/// `[-1, 1]`.
pub fn synthesize(
    sample_rate: u32,
    sample_count: usize,
    frequency: f64,
    amplitude: f64,
    kind: WaveformKind,
) -> WaveformBuffer {
    let mut envelope = Taper::new(sample_count, amplitude);
    let rate = f64::from(sample_rate);
    let samples_per_oscillation = rate / frequency;

    let samples = match kind {
        WaveformKind::Sine => (0..sample_count)
            .map(|i| {
                let amp = envelope.next(i);
                (2.0 * PI * frequency * i as f64 / rate).sin() * amp
            })
            .map(|value| value as f32)
            .collect(),
        WaveformKind::Square => {
            let half = samples_per_oscillation / 2.0;
            let mut cycle = CycleCounter::new(samples_per_oscillation);
            (0..sample_count)
                .map(|i| {
                    let counter = cycle.tick();
                    let amp = envelope.next(i);
                    let value = if counter <= half { amp } else { -amp };
                    cycle.wrap_if_done();
                    value as f32
                })
                .collect()
        }
        WaveformKind::Triangle => {
            let quarter = samples_per_oscillation / 4.0;
            let half = samples_per_oscillation / 2.0;
            let three_quarters = half + quarter;
            let step = 1.0 / quarter;
            let mut cycle = CycleCounter::new(samples_per_oscillation);
            (0..sample_count)
                .map(|i| {
                    let counter = cycle.tick();
                    let amp = envelope.next(i);
                    let level = if counter <= quarter {
                        step * counter
                    } else if counter <= half {
                        1.0 - step * (counter - quarter)
                    } else if counter <= three_quarters {
                        -(step * (counter - half))
                    } else {
                        -1.0 + step * (counter - three_quarters)
                    };
                    cycle.wrap_if_done();
                    (level * amp) as f32
                })
                .collect()
        }
    };

    WaveformBuffer {
        samples,
        sample_rate,
        frequency,
        amplitude,
        kind,
    }
}

/// Running amplitude that drops by [`TAPER_STEP`] per sample over the last
/// [`TAPER_SAMPLES`] samples, never below zero.
struct Taper {
    start: usize,
    amplitude: f64,
}

impl Taper {
    fn new(sample_count: usize, amplitude: f64) -> Self {
        Self {
            start: sample_count.saturating_sub(TAPER_SAMPLES),
            amplitude,
        }
    }

    fn next(&mut self, index: usize) -> f64 {
        if index >= self.start {
            self.amplitude = (self.amplitude - TAPER_STEP).max(0.0);
        }
        self.amplitude
    }
}

/// 1-based sample position inside the current oscillation. Wraps to zero on
/// the first sample at or past the period, so every cycle lasts
/// `period.ceil()` samples and a fractional period plays slightly flat.
struct CycleCounter {
    period: f64,
    counter: f64,
}

impl CycleCounter {
    fn new(period: f64) -> Self {
        Self {
            period,
            counter: 0.0,
        }
    }

    fn tick(&mut self) -> f64 {
        self.counter += 1.0;
        self.counter
    }

    fn wrap_if_done(&mut self) {
        if self.counter >= self.period {
            self.counter = 0.0;
        }
    }
}
