//! Note events and phrases — the composer's output, the renderer's input.

use serde::{Deserialize, Serialize};

use crate::composer::Template;

/// Articulation of a note. Selects envelope parameters and, for `Bend` and
/// `Dive`, a pitch glide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    Pick,
    PalmMute,
    Sustain,
    Shred,
    Tap,
    Sweep,
    Bend,
    Dive,
    Rest,
}

impl Technique {
    pub const ALL: [Technique; 9] = [
        Technique::Pick,
        Technique::PalmMute,
        Technique::Sustain,
        Technique::Shred,
        Technique::Tap,
        Technique::Sweep,
        Technique::Bend,
        Technique::Dive,
        Technique::Rest,
    ];
}

/// Strings struck together for one note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voicing {
    #[default]
    Single,
    /// Root plus the fifth above it.
    Power,
}

impl Voicing {
    /// Semitones above the note's pitch of each sounding string.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            Voicing::Single => &[0],
            Voicing::Power => &[0, 7],
        }
    }
}

/// A single note. A frequency of `0.0` is a rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Pitch in Hz; the lowest string of a chord.
    pub frequency: f64,
    /// Length in seconds.
    pub duration: f64,
    pub technique: Technique,
    #[serde(default)]
    pub voicing: Voicing,
}

impl NoteEvent {
    pub fn new(frequency: f64, duration: f64, technique: Technique) -> Self {
        NoteEvent {
            frequency,
            duration,
            technique,
            voicing: Voicing::Single,
        }
    }

    pub fn with_voicing(mut self, voicing: Voicing) -> Self {
        self.voicing = voicing;
        self
    }

    pub fn rest(duration: f64) -> Self {
        NoteEvent::new(0.0, duration, Technique::Rest)
    }

    pub fn is_rest(&self) -> bool {
        self.technique == Technique::Rest || !(self.frequency > 0.0)
    }

    /// Number of samples this note occupies at `sample_rate`.
    pub fn sample_count(&self, sample_rate: u32) -> usize {
        if !(self.duration > 0.0) {
            return 0;
        }
        (self.duration * sample_rate as f64).round() as usize
    }
}

/// Notes produced by one template invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub template: Template,
    pub notes: Vec<NoteEvent>,
}

impl Phrase {
    pub fn new(template: Template, notes: Vec<NoteEvent>) -> Self {
        Phrase { template, notes }
    }

    /// Total length in seconds.
    pub fn duration(&self) -> f64 {
        self.notes.iter().map(|n| n.duration.max(0.0)).sum()
    }

    pub fn sample_count(&self, sample_rate: u32) -> usize {
        self.notes
            .iter()
            .fold(0usize, |total, n| total.saturating_add(n.sample_count(sample_rate)))
    }
}
