//! Naive (non-band-limited) oscillators evaluated from time or phase.
//!
//! The raw aliasing of these shapes is part of the distorted guitar texture,
//! so no PolyBLEP correction is applied.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Evaluate the shape at `phase` in cycles. Only the fractional part of
    /// `phase` is used.
    pub fn at_phase(self, phase: f64) -> f64 {
        let phase = phase - phase.floor();
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
        }
    }
}

/// Sample `shape` at `time` seconds for a tone of `frequency` Hz.
///
/// Non-positive (or non-finite) frequencies are rests and yield exactly `0.0`.
pub fn generate(frequency: f64, time: f64, shape: Waveform) -> f64 {
    if !(frequency > 0.0) || !frequency.is_finite() {
        return 0.0;
    }
    match shape {
        Waveform::Sine => (2.0 * PI * frequency * time).sin(),
        _ => shape.at_phase(time * frequency),
    }
}

/// Fixed-weight mix of two waveforms, e.g. bridge-pickup saw over a square body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneBlend {
    pub primary: Waveform,
    pub secondary: Waveform,
    pub primary_weight: f64,
    pub secondary_weight: f64,
}

impl ToneBlend {
    pub fn new(primary: Waveform, primary_weight: f64, secondary: Waveform, secondary_weight: f64) -> Self {
        ToneBlend {
            primary,
            secondary,
            primary_weight,
            secondary_weight,
        }
    }

    /// A single shape at full weight.
    pub fn pure(shape: Waveform) -> Self {
        ToneBlend::new(shape, 1.0, shape, 0.0)
    }

    /// Blend sampled from time, for notes with a steady pitch.
    pub fn sample(&self, frequency: f64, time: f64) -> f64 {
        if !(frequency > 0.0) {
            return 0.0;
        }
        generate(frequency, time, self.primary) * self.primary_weight
            + generate(frequency, time, self.secondary) * self.secondary_weight
    }

    /// Blend sampled from an accumulated phase, for gliding pitches.
    pub fn sample_phase(&self, phase: f64) -> f64 {
        self.primary.at_phase(phase) * self.primary_weight
            + self.secondary.at_phase(phase) * self.secondary_weight
    }
}

impl Default for ToneBlend {
    /// 70% sawtooth bite, 30% square body.
    fn default() -> Self {
        ToneBlend::new(Waveform::Sawtooth, 0.7, Waveform::Square, 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPES: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    #[test]
    fn square_is_bipolar() {
        for i in 0..44100 {
            let t = i as f64 / 44100.0;
            let s = generate(440.0, t, Waveform::Square);
            assert!(s == 1.0 || s == -1.0, "Square out of set: {s}");
        }
    }

    #[test]
    fn sawtooth_half_open_range() {
        for i in 0..44100 {
            let t = i as f64 / 44100.0 + 0.123;
            let s = generate(329.63, t, Waveform::Sawtooth);
            assert!(s >= -1.0 && s < 1.0, "Saw out of range: {s}");
        }
    }

    #[test]
    fn triangle_and_sine_range() {
        for i in 0..44100 {
            let t = i as f64 / 44100.0;
            for shape in [Waveform::Sine, Waveform::Triangle] {
                let s = generate(97.0, t, shape);
                assert!((-1.0..=1.0).contains(&s), "{shape:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn rests_are_silent() {
        for shape in SHAPES {
            for f in [0.0, -110.0, f64::NAN] {
                assert_eq!(generate(f, 0.37, shape), 0.0);
            }
        }
        assert_eq!(ToneBlend::default().sample(0.0, 1.0), 0.0);
    }

    #[test]
    fn triangle_peaks_at_phase_edges() {
        assert_eq!(Waveform::Triangle.at_phase(0.0), 1.0);
        assert_eq!(Waveform::Triangle.at_phase(0.5), -1.0);
        assert!((Waveform::Triangle.at_phase(0.25)).abs() < 1e-12);
    }

    #[test]
    fn phase_and_time_agree() {
        let f = 220.0;
        for i in 1..200 {
            let t = i as f64 / 48000.0;
            for shape in [Waveform::Sawtooth, Waveform::Triangle, Waveform::Sine] {
                let a = generate(f, t, shape);
                let b = shape.at_phase(f * t);
                assert!((a - b).abs() < 1e-9, "{shape:?}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn blend_weights_apply() {
        let blend = ToneBlend::new(Waveform::Square, 0.6, Waveform::Square, 0.4);
        assert!((blend.sample(100.0, 0.001) - 1.0).abs() < 1e-12);
        let solo = ToneBlend::pure(Waveform::Sawtooth);
        assert_eq!(solo.sample(100.0, 0.0025), generate(100.0, 0.0025, Waveform::Sawtooth));
    }
}
