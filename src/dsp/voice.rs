//! Voice — renders note events into raw samples (oscillator × envelope).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::note::{NoteEvent, Technique};

use super::amp::AmpProfile;
use super::envelope::EnvelopeTable;
use super::oscillator::ToneBlend;

/// Periodic pitch wobble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vibrato {
    /// Rate in Hz.
    pub rate: f64,
    /// Relative depth: the pitch swings over `f · (1 ± depth)`.
    pub depth: f64,
}

/// Everything that makes one instrument sound the way it does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceProfile {
    pub tone: ToneBlend,
    pub amp: AmpProfile,
    pub vibrato: Option<Vibrato>,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        VoiceProfile {
            tone: ToneBlend::default(),
            amp: AmpProfile::default(),
            vibrato: None,
        }
    }
}

/// Pitch glides applied by technique.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlideSettings {
    /// Octaves a dive bomb falls over its full length.
    pub dive_octaves: f64,
    /// Semitones a bend rises.
    pub bend_semitones: f64,
    /// Fraction of the note spent rising into the bend.
    pub bend_rise: f64,
}

impl Default for GlideSettings {
    fn default() -> Self {
        GlideSettings {
            dive_octaves: 2.0,
            bend_semitones: 2.0,
            bend_rise: 0.25,
        }
    }
}

/// Renders notes for one voice. Stateless between notes: every note starts at
/// phase zero.
#[derive(Debug, Clone)]
pub struct Voice<'a> {
    profile: &'a VoiceProfile,
    envelopes: &'a EnvelopeTable,
    glide: GlideSettings,
    sample_rate: f64,
}

impl<'a> Voice<'a> {
    pub fn new(
        profile: &'a VoiceProfile,
        envelopes: &'a EnvelopeTable,
        glide: GlideSettings,
        sample_rate: u32,
    ) -> Self {
        Voice {
            profile,
            envelopes,
            glide,
            sample_rate: sample_rate as f64,
        }
    }

    /// Frequency of `note` at `elapsed` seconds, given its full `length`.
    fn frequency_at(&self, note: &NoteEvent, elapsed: f64, length: f64) -> f64 {
        let progress = if length > 0.0 { elapsed / length } else { 0.0 };
        let mut f = match note.technique {
            Technique::Dive => note.frequency * 0.5_f64.powf(progress * self.glide.dive_octaves),
            Technique::Bend => {
                let rise = if self.glide.bend_rise > 0.0 {
                    (progress / self.glide.bend_rise).min(1.0)
                } else {
                    1.0
                };
                note.frequency * 2.0_f64.powf(rise * self.glide.bend_semitones / 12.0)
            }
            _ => note.frequency,
        };
        if let Some(vibrato) = self.profile.vibrato {
            f *= 1.0 + vibrato.depth * (2.0 * PI * vibrato.rate * elapsed).sin();
        }
        f
    }

    fn glides(&self, technique: Technique) -> bool {
        self.profile.vibrato.is_some() || matches!(technique, Technique::Dive | Technique::Bend)
    }

    /// Append the raw samples of `note` to `out`.
    pub fn render_note(&self, note: &NoteEvent, out: &mut Vec<f64>) {
        let count = note.sample_count(self.sample_rate as u32);
        if note.is_rest() {
            out.resize(out.len() + count, 0.0);
            return;
        }

        out.reserve(count);
        let dt = 1.0 / self.sample_rate;
        let gliding = self.glides(note.technique);
        // Chord strings are summed unscaled, like strings into one pickup.
        let ratios: Vec<f64> = note
            .voicing
            .intervals()
            .iter()
            .map(|&semitones| 2.0_f64.powf(semitones as f64 / 12.0))
            .collect();
        let mut phases = vec![0.0; ratios.len()];

        for i in 0..count {
            let t = i as f64 * dt;
            let env = self.envelopes.amplitude(t, note.technique);
            let raw: f64 = if gliding {
                let f = self.frequency_at(note, t, note.duration);
                ratios
                    .iter()
                    .zip(phases.iter_mut())
                    .map(|(ratio, phase)| {
                        let s = self.profile.tone.sample_phase(*phase);
                        *phase += f * ratio * dt;
                        *phase -= phase.floor();
                        s
                    })
                    .sum()
            } else {
                ratios
                    .iter()
                    .map(|ratio| self.profile.tone.sample(note.frequency * ratio, t))
                    .sum()
            };
            out.push(raw * env);
        }
    }

    /// Render a run of notes back to back.
    pub fn render_notes<'n>(&self, notes: impl IntoIterator<Item = &'n NoteEvent>, out: &mut Vec<f64>) {
        for note in notes {
            self.render_note(note, out);
        }
    }
}
