//! Per-technique pluck envelopes: linear attack, then exponential decay.

use serde::{Deserialize, Serialize};

use crate::note::Technique;

/// Attack/decay pair for one technique.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeShape {
    /// Attack ramp length in seconds.
    pub attack: f64,
    /// Decay constant `k` in `exp(-k * t)`, per second.
    pub decay: f64,
}

impl EnvelopeShape {
    pub const fn new(attack: f64, decay: f64) -> Self {
        EnvelopeShape { attack, decay }
    }

    /// Gain at `elapsed` seconds after note start.
    pub fn amplitude(&self, elapsed: f64) -> f64 {
        if !(elapsed >= 0.0) {
            return 0.0;
        }
        if self.attack > 0.0 && elapsed < self.attack {
            return elapsed / self.attack;
        }
        let after = elapsed - self.attack.max(0.0);
        (-self.decay.max(0.0) * after).exp()
    }
}

/// Envelope parameters for every sounding technique. `Rest` has no entry and
/// is always silent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeTable {
    pub pick: EnvelopeShape,
    pub palm_mute: EnvelopeShape,
    pub sustain: EnvelopeShape,
    pub shred: EnvelopeShape,
    pub tap: EnvelopeShape,
    pub sweep: EnvelopeShape,
    pub bend: EnvelopeShape,
    pub dive: EnvelopeShape,
}

impl Default for EnvelopeTable {
    fn default() -> Self {
        EnvelopeTable {
            pick: EnvelopeShape::new(0.01, 4.0),
            palm_mute: EnvelopeShape::new(0.005, 20.0),
            sustain: EnvelopeShape::new(0.02, 1.5),
            shred: EnvelopeShape::new(0.005, 5.0),
            tap: EnvelopeShape::new(0.02, 2.0),
            sweep: EnvelopeShape::new(0.003, 6.0),
            bend: EnvelopeShape::new(0.05, 1.0),
            dive: EnvelopeShape::new(0.005, 0.3),
        }
    }
}

impl EnvelopeTable {
    pub fn shape(&self, technique: Technique) -> Option<&EnvelopeShape> {
        match technique {
            Technique::Pick => Some(&self.pick),
            Technique::PalmMute => Some(&self.palm_mute),
            Technique::Sustain => Some(&self.sustain),
            Technique::Shred => Some(&self.shred),
            Technique::Tap => Some(&self.tap),
            Technique::Sweep => Some(&self.sweep),
            Technique::Bend => Some(&self.bend),
            Technique::Dive => Some(&self.dive),
            Technique::Rest => None,
        }
    }

    /// Gain for `technique` at `elapsed` seconds into the note.
    pub fn amplitude(&self, elapsed: f64, technique: Technique) -> f64 {
        self.shape(technique)
            .map_or(0.0, |shape| shape.amplitude(elapsed))
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (Technique, &EnvelopeShape)> {
        Technique::ALL
            .into_iter()
            .filter_map(|t| self.shape(t).map(|s| (t, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_is_silent() {
        let table = EnvelopeTable::default();
        for i in 0..100 {
            assert_eq!(table.amplitude(i as f64 * 0.01, Technique::Rest), 0.0);
        }
    }

    #[test]
    fn attack_ramps_to_one() {
        let shape = EnvelopeShape::new(0.01, 4.0);
        assert_eq!(shape.amplitude(0.0), 0.0);
        assert!((shape.amplitude(0.005) - 0.5).abs() < 1e-12);
        assert!((shape.amplitude(0.01) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn decays_exponentially_after_attack() {
        let shape = EnvelopeShape::new(0.01, 4.0);
        let expected = (-4.0_f64 * 0.5).exp();
        assert!((shape.amplitude(0.51) - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_attack_starts_at_full_gain() {
        let shape = EnvelopeShape::new(0.0, 3.0);
        assert_eq!(shape.amplitude(0.0), 1.0);
    }

    #[test]
    fn never_negative() {
        let table = EnvelopeTable::default();
        for (technique, _) in table.entries() {
            for i in -10..2000 {
                let g = table.amplitude(i as f64 * 0.001, technique);
                assert!(g >= 0.0 && g <= 1.0, "{technique:?} gain {g}");
            }
        }
    }

    #[test]
    fn palm_mute_dies_faster_than_sustain() {
        let table = EnvelopeTable::default();
        let pm = table.amplitude(0.2, Technique::PalmMute);
        let sus = table.amplitude(0.2, Technique::Sustain);
        assert!(pm < sus, "palm mute {pm} should be below sustain {sus}");
        assert!(table.palm_mute.attack < table.tap.attack);
        assert!(table.shred.decay > table.sustain.decay);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let table: EnvelopeTable =
            serde_json::from_str(r#"{"pick": {"attack": 0.002, "decay": 9.0}}"#).unwrap();
        assert_eq!(table.pick, EnvelopeShape::new(0.002, 9.0));
        assert_eq!(table.sustain, EnvelopeTable::default().sustain);
    }
}
