use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{color::Rgb, synth::WaveformKind, MicrotoneError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scale: ScaleConfig,
    pub synth: SynthConfig,
    pub canvas: CanvasConfig,
    pub layout: LayoutConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections fall back to their
    /// defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects parameters that would make scale, buffer or layout generation
    /// meaningless.
    pub fn validate(&self) -> Result<()> {
        self.scale.validate()?;
        self.synth.validate()?;
        self.canvas.validate()
    }
}

/// Largest accepted division count. Every division costs one note buffer.
pub const MAX_DIVISIONS: u32 = 256;

/// Parameters handed to the scale provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    pub reference_pitch: f64,
    pub divisions: u32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            reference_pitch: 440.0,
            divisions: 12,
        }
    }
}

impl ScaleConfig {
    /// Parses the reference pitch and division count from free text, the way
    /// they arrive from a form field.
    pub fn parse(reference_pitch: &str, divisions: &str) -> Result<Self> {
        let reference_pitch: f64 = reference_pitch.trim().parse().map_err(|_| {
            MicrotoneError::invalid(format!(
                "reference pitch `{}` is not a number",
                reference_pitch.trim()
            ))
        })?;
        let divisions: u32 = divisions.trim().parse().map_err(|_| {
            MicrotoneError::invalid(format!(
                "divisions `{}` is not a whole number",
                divisions.trim()
            ))
        })?;

        let config = Self {
            reference_pitch,
            divisions,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.reference_pitch.is_finite() || self.reference_pitch <= 0.0 {
            return Err(MicrotoneError::invalid(format!(
                "reference pitch must be a positive number, got {}",
                self.reference_pitch
            )));
        }
        if self.divisions == 0 {
            return Err(MicrotoneError::invalid("divisions must be at least 1"));
        }
        if self.divisions > MAX_DIVISIONS {
            return Err(MicrotoneError::invalid(format!(
                "divisions must be at most {MAX_DIVISIONS}, got {}",
                self.divisions
            )));
        }
        Ok(())
    }
}

/// Configuration specific to note buffer generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthConfig {
    pub sample_rate: u32,
    pub sample_count: usize,
    pub amplitude: f64,
    pub waveform: WaveformKind,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            sample_count: 16_834 * 6,
            amplitude: 1.0,
            waveform: WaveformKind::Sine,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(MicrotoneError::invalid("sample rate must be positive"));
        }
        if self.sample_count == 0 {
            return Err(MicrotoneError::invalid("sample count must be positive"));
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(MicrotoneError::invalid(format!(
                "amplitude must lie in [0, 1], got {}",
                self.amplitude
            )));
        }
        Ok(())
    }
}

/// Size of the drawing surface in its own coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1_200.0,
            height: 400.0,
        }
    }
}

impl CanvasConfig {
    pub fn validate(&self) -> Result<()> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(self.width) || !valid(self.height) {
            return Err(MicrotoneError::invalid(format!(
                "canvas must have a positive size, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Which family of shapes the keys are drawn as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Piano,
    Hexagon,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayoutMode::Piano => "piano",
            LayoutMode::Hexagon => "hexagon",
        })
    }
}

impl FromStr for LayoutMode {
    type Err = MicrotoneError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "piano" => Ok(LayoutMode::Piano),
            "hexagon" | "hex" => Ok(LayoutMode::Hexagon),
            other => Err(MicrotoneError::invalid(format!(
                "unknown layout `{other}` (expected piano or hexagon)"
            ))),
        }
    }
}

/// Layout family plus the gradient used for hexagons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub start_color: Rgb,
    pub end_color: Rgb,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Piano,
            start_color: Rgb::new(0x11, 0x11, 0xff),
            end_color: Rgb::new(0xff, 0x11, 0xff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.synth.sample_count, 101_004);
    }

    #[test]
    fn parses_form_text() {
        let scale = ScaleConfig::parse(" 432.5 ", "19").unwrap();
        assert_eq!(scale.reference_pitch, 432.5);
        assert_eq!(scale.divisions, 19);
    }

    #[test]
    fn rejects_non_numeric_form_text() {
        assert!(ScaleConfig::parse("abc", "12").unwrap_err().is_invalid_input());
        assert!(ScaleConfig::parse("440", "1.5").unwrap_err().is_invalid_input());
        assert!(ScaleConfig::parse("-3", "12").unwrap_err().is_invalid_input());
        assert!(ScaleConfig::parse("inf", "12").unwrap_err().is_invalid_input());
    }

    #[test]
    fn caps_the_division_count() {
        ScaleConfig::parse("440", "256").unwrap();
        assert!(ScaleConfig::parse("440", "257").unwrap_err().is_invalid_input());

        let mut config = AppConfig::default();
        config.scale.divisions = 100_000;
        assert!(config.validate().unwrap_err().is_invalid_input());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let text = r##"{
            "layout": { "mode": "hexagon", "start_color": "#000000", "end_color": "#ffffff" }
        }"##;
        let config = AppConfig::from_json(text).unwrap();
        assert_eq!(config.layout.mode, LayoutMode::Hexagon);
        assert_eq!(config.scale, ScaleConfig::default());
    }

    #[test]
    fn json_round_trip_keeps_waveform() {
        let mut config = AppConfig::default();
        config.synth.waveform = WaveformKind::Triangle;
        let text = config.to_json().unwrap();
        assert!(text.contains("\"triangle\""));
        assert_eq!(AppConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn rejects_out_of_range_amplitude() {
        let text = r#"{
            "synth": {
                "sample_rate": 44100, "sample_count": 10, "amplitude": 1.5, "waveform": "sine"
            }
        }"#;
        assert!(AppConfig::from_json(text).unwrap_err().is_invalid_input());
    }
}
