//! One-pole filters used by the amp chain.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// RC-style one-pole low-pass (cabinet simulation).
///
/// `alpha = dt / (rc + dt)` with `rc = 1 / (2π·cutoff)` and `dt = 1 / sample_rate`.
#[derive(Debug, Clone)]
pub struct OnePoleLowpass {
    alpha: f64,
    last: f64,
}

impl OnePoleLowpass {
    pub fn new(cutoff: f64, sample_rate: f64) -> Self {
        OnePoleLowpass {
            alpha: Self::coefficient(cutoff, sample_rate),
            last: 0.0,
        }
    }

    pub fn coefficient(cutoff: f64, sample_rate: f64) -> f64 {
        let rc = 1.0 / (2.0 * PI * cutoff);
        let dt = 1.0 / sample_rate;
        dt / (rc + dt)
    }

    pub fn process(&mut self, input: f64) -> f64 {
        self.last += self.alpha * (input - self.last);
        self.last
    }
}

/// Filter applied before the gain stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "coefficient")]
pub enum PreFilter {
    /// Signal passes unchanged.
    None,
    /// `y = x - state * c; state = y`. Tightens the low end before distortion.
    LeakySubtract(f64),
    /// `state += c * (x - state); y = state`. Rolls off highs before distortion.
    Smoothing(f64),
}

impl Default for PreFilter {
    fn default() -> Self {
        PreFilter::None
    }
}

/// A [`PreFilter`] together with its one-sample state.
#[derive(Debug, Clone)]
pub struct PreFilterStage {
    kind: PreFilter,
    state: f64,
}

impl PreFilterStage {
    pub fn new(kind: PreFilter) -> Self {
        PreFilterStage { kind, state: 0.0 }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        match self.kind {
            PreFilter::None => input,
            PreFilter::LeakySubtract(c) => {
                let y = input - self.state * c;
                self.state = y;
                y
            }
            PreFilter::Smoothing(c) => {
                self.state += c * (input - self.state);
                self.state
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_passes_dc() {
        let mut f = OnePoleLowpass::new(4000.0, 44100.0);
        let mut output = 0.0;
        for _ in 0..1000 {
            output = f.process(1.0);
        }
        assert!((output - 1.0).abs() < 1e-6, "Lowpass should pass DC, got {output}");
    }

    #[test]
    fn lowpass_coefficient_matches_rc_formula() {
        let mut f = OnePoleLowpass::new(3500.0, 44100.0);
        let rc = 1.0 / (2.0 * PI * 3500.0);
        let dt = 1.0 / 44100.0;
        // From rest, the first step response is exactly alpha.
        let first = f.process(1.0);
        assert!((first - dt / (rc + dt)).abs() < 1e-15);
        assert!(first > 0.0 && first < 1.0);
    }

    #[test]
    fn lowpass_attenuates_nyquist() {
        let mut f = OnePoleLowpass::new(1000.0, 44100.0);
        let mut max_out = 0.0_f64;
        for i in 0..4410 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            let out = f.process(input);
            if i > 1000 {
                max_out = max_out.max(out.abs());
            }
        }
        assert!(max_out < 0.1, "Nyquist tone should be attenuated, got {max_out}");
    }

    #[test]
    fn leaky_subtract_follows_recurrence() {
        let mut stage = PreFilterStage::new(PreFilter::LeakySubtract(0.5));
        assert_eq!(stage.process(1.0), 1.0);
        assert_eq!(stage.process(1.0), 0.5);
        assert_eq!(stage.process(1.0), 0.75);
    }

    #[test]
    fn smoothing_converges_to_input() {
        let mut stage = PreFilterStage::new(PreFilter::Smoothing(0.15));
        let mut out = 0.0;
        for _ in 0..500 {
            out = stage.process(0.8);
        }
        assert!((out - 0.8).abs() < 1e-9);
    }

    #[test]
    fn none_is_passthrough() {
        let mut stage = PreFilterStage::new(PreFilter::None);
        for x in [0.3, -0.7, 1.0] {
            assert_eq!(stage.process(x), x);
        }
    }
}
