use crate::{MicrotoneError, Result};

/// Produces the ordered frequencies a keyboard is built from.
pub trait ScaleProvider {
    /// Returns `divisions + 1` frequencies starting at `reference_pitch`.
    fn frequencies(&self, reference_pitch: f64, divisions: u32) -> Result<Vec<f64>>;
}

/// Splits one octave above the reference pitch into equal ratio steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EqualDivision;

impl ScaleProvider for EqualDivision {
    fn frequencies(&self, reference_pitch: f64, divisions: u32) -> Result<Vec<f64>> {
        if !reference_pitch.is_finite() || reference_pitch <= 0.0 {
            return Err(MicrotoneError::invalid(format!(
                "reference pitch must be a positive number, got {reference_pitch}"
            )));
        }
        if divisions == 0 {
            return Err(MicrotoneError::invalid("divisions must be at least 1"));
        }

        let steps = f64::from(divisions);
        Ok((0..=divisions)
            .map(|i| reference_pitch * 2f64.powf(f64::from(i) / steps))
            .collect())
    }
}

/// Text shown on a key for its frequency.
pub fn frequency_label(frequency: f64) -> String {
    format!("{frequency:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_divisions_yield_thirteen_frequencies() {
        let scale = EqualDivision.frequencies(440.0, 12).unwrap();

        assert_eq!(scale.len(), 13);
        assert_eq!(scale[0], 440.0);
        assert!((scale[12] - 880.0).abs() < 1e-9);
        assert!((scale[7] - 659.255).abs() < 1e-3);
        assert!(scale.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(EqualDivision.frequencies(440.0, 0).unwrap_err().is_invalid_input());
        assert!(EqualDivision.frequencies(0.0, 12).unwrap_err().is_invalid_input());
        assert!(EqualDivision.frequencies(f64::NAN, 12).unwrap_err().is_invalid_input());
    }

    #[test]
    fn labels_use_two_decimals() {
        assert_eq!(frequency_label(440.0), "440.00");
        assert_eq!(frequency_label(466.1637615180899), "466.16");
    }
}
