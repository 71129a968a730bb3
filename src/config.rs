//! Render configuration: global amp settings, scales, tracks and composer tuning.
//!
//! A [`Config`] is built once, checked with [`Config::validate`], and then only
//! read. The built-in presets reproduce distinct rigs as data rather than as
//! separate code paths.

use serde::{Deserialize, Serialize};

use crate::composer::{ComposerSettings, Modulation, Template, WeightedTemplate};
use crate::dsp::amp::AmpProfile;
use crate::dsp::envelope::{EnvelopeShape, EnvelopeTable};
use crate::dsp::oscillator::{ToneBlend, Waveform};
use crate::dsp::voice::{GlideSettings, Vibrato, VoiceProfile};
use crate::error::{ConfigError, RiffError};
use crate::note::Voicing;

/// Beats per bar when lengths are given in bars.
pub const BEATS_PER_BAR: f64 = 4.0;

pub const MAX_SAMPLE_RATE: u32 = 384_000;
/// Longest single note (and so longest bar), in seconds.
pub const MAX_NOTE_SECONDS: f64 = 60.0;
pub const MAX_DELAY_SECONDS: f64 = 10.0;
/// Longest requested track length, in seconds.
pub const MAX_RENDER_SECONDS: f64 = 600.0;
pub const MAX_RIFF_SLOTS: usize = 64;
pub const MAX_RUN_NOTES: usize = 64;
/// Bound on octave shifts, and on semitone offsets divided by 12.
pub const MAX_OCTAVE_SHIFT: u32 = 8;

/// A named scale: ascending semitone offsets spanning one octave, ending at 12.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub name: String,
    pub steps: Vec<i32>,
}

impl Scale {
    pub fn new(name: impl Into<String>, steps: Vec<i32>) -> Self {
        Scale {
            name: name.into(),
            steps,
        }
    }

    pub fn harmonic_minor() -> Self {
        Scale::new("harmonic_minor", vec![0, 2, 3, 5, 7, 8, 11, 12])
    }

    pub fn phrygian_dominant() -> Self {
        Scale::new("phrygian_dominant", vec![0, 1, 4, 5, 7, 8, 10, 12])
    }

    pub fn chromatic() -> Self {
        Scale::new("chromatic", (0..=12).collect())
    }

    pub fn minor_blues() -> Self {
        Scale::new("minor_blues", vec![0, 3, 5, 6, 7, 10, 12])
    }

    pub fn natural_minor() -> Self {
        Scale::new("natural_minor", vec![0, 2, 3, 5, 7, 8, 10, 12])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let Some(&last) = self.steps.last() else {
            return Err(ConfigError::EmptyScale(self.name.clone()));
        };
        if last != 12 {
            return Err(ConfigError::ScaleNotOctave {
                name: self.name.clone(),
                last,
            });
        }
        if self.steps.windows(2).any(|w| w[1] <= w[0]) || self.steps[0] < 0 {
            return Err(ConfigError::ScaleNotAscending(self.name.clone()));
        }
        Ok(())
    }
}

/// How long each track is composed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLength {
    Seconds(f64),
    /// Bars of [`BEATS_PER_BAR`] beats at the configured tempo.
    Bars(u32),
}

/// One voice of the arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub name: String,
    #[serde(default)]
    pub voice: VoiceProfile,
    /// Weight of this track in the final sum.
    #[serde(default = "unity")]
    pub level: f64,
    pub templates: Vec<WeightedTemplate>,
    #[serde(default)]
    pub intro: Option<Template>,
    #[serde(default)]
    pub outro: Option<Template>,
}

fn unity() -> f64 {
    1.0
}

impl TrackConfig {
    pub fn new(name: impl Into<String>, voice: VoiceProfile, templates: Vec<WeightedTemplate>) -> Self {
        TrackConfig {
            name: name.into(),
            voice,
            level: 1.0,
            templates,
            intro: None,
            outro: None,
        }
    }

    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn with_intro(mut self, intro: Template) -> Self {
        self.intro = Some(intro);
        self
    }

    pub fn with_outro(mut self, outro: Template) -> Self {
        self.outro = Some(outro);
        self
    }
}

/// Complete, immutable render settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Samples per second.
    pub sample_rate: u32,
    /// Beats per minute.
    pub tempo: f64,
    pub distortion_gain: f64,
    /// Cabinet low-pass cutoff in Hz.
    pub cabinet_cutoff: f64,
    /// Delay line length in seconds.
    pub delay_time: f64,
    pub delay_feedback: f64,
    pub master_volume: f64,
    pub scales: Vec<Scale>,
    /// Name of the scale composition starts in.
    pub scale: String,
    /// Frequency of scale degree 0, in Hz.
    pub root: f64,
    pub envelopes: EnvelopeTable,
    pub glide: GlideSettings,
    pub length: RenderLength,
    pub tracks: Vec<TrackConfig>,
    pub composer: ComposerSettings,
}

impl Default for Config {
    /// Single-guitar metal rig alternating chug riffs and harmonic-minor runs.
    fn default() -> Self {
        Config {
            sample_rate: 44100,
            tempo: 170.0,
            distortion_gain: 50.0,
            cabinet_cutoff: 4000.0,
            delay_time: 0.35,
            delay_feedback: 0.4,
            master_volume: 0.6,
            scales: vec![Scale::harmonic_minor()],
            scale: "harmonic_minor".into(),
            root: 110.0,
            envelopes: EnvelopeTable::default(),
            glide: GlideSettings::default(),
            length: RenderLength::Seconds(60.0),
            tracks: vec![TrackConfig::new(
                "guitar",
                VoiceProfile::default(),
                vec![
                    WeightedTemplate::new(Template::Riff, 0.6),
                    WeightedTemplate::new(Template::ScalarRun, 0.4),
                ],
            )],
            composer: ComposerSettings::default(),
        }
    }
}

impl Config {
    /// Neo-classical shred solo: sweeps, runs and taps in D harmonic minor,
    /// opening on a scream and closing on a dive bomb.
    pub fn neoclassical() -> Self {
        let lead = VoiceProfile {
            tone: ToneBlend::new(Waveform::Sawtooth, 0.8, Waveform::Sine, 0.2),
            amp: AmpProfile::shred(),
            vibrato: None,
        };
        Config {
            tempo: 190.0,
            distortion_gain: 150.0,
            master_volume: 0.7,
            scales: vec![
                Scale::harmonic_minor(),
                Scale::phrygian_dominant(),
                Scale::chromatic(),
            ],
            root: 146.83,
            length: RenderLength::Bars(16),
            tracks: vec![
                TrackConfig::new(
                    "lead",
                    lead,
                    vec![
                        WeightedTemplate::new(Template::SweepArpeggio, 0.3),
                        WeightedTemplate::new(Template::ScalarRun, 0.3),
                        WeightedTemplate::new(Template::TappingRun, 0.3),
                        WeightedTemplate::new(Template::IsolatedNote, 0.1),
                    ],
                )
                .with_intro(Template::IsolatedNote)
                .with_outro(Template::DiveBomb),
            ],
            composer: ComposerSettings {
                run_step: 60.0 / 190.0 / 4.0,
                run_min_len: 16,
                run_max_len: 16,
                modulation: Some(Modulation {
                    scale: "phrygian_dominant".into(),
                    after: 9,
                }),
                pinch_harmonic_chance: 0.1,
                ..ComposerSettings::default()
            },
            ..Config::default()
        }
    }

    /// Slow E-flat blues: fuzz lead licks with vibrato over a twelve-bar
    /// rhythm part.
    pub fn blues() -> Self {
        let lead = VoiceProfile {
            tone: ToneBlend::new(Waveform::Sine, 0.7, Waveform::Triangle, 0.3),
            amp: AmpProfile::vintage_lead(),
            vibrato: Some(Vibrato {
                rate: 5.0,
                depth: 0.015,
            }),
        };
        let rhythm = VoiceProfile {
            tone: ToneBlend::new(Waveform::Square, 0.6, Waveform::Square, 0.0),
            amp: AmpProfile::vintage_rhythm(),
            vibrato: None,
        };
        Config {
            tempo: 90.0,
            distortion_gain: 4.0,
            delay_time: 12000.0 / 44100.0,
            master_volume: 0.75,
            scales: vec![Scale::minor_blues()],
            scale: "minor_blues".into(),
            root: 82.41 * 2.0_f64.powf(-1.0 / 12.0),
            length: RenderLength::Bars(48),
            tracks: vec![
                TrackConfig::new(
                    "lead",
                    lead,
                    vec![
                        WeightedTemplate::new(Template::SlowBend, 1.0),
                        WeightedTemplate::new(Template::RapidFire, 1.0),
                        WeightedTemplate::new(Template::Rest, 1.0),
                    ],
                ),
                TrackConfig::new(
                    "rhythm",
                    rhythm,
                    vec![WeightedTemplate::new(Template::BarChord, 1.0)],
                )
                .with_level(0.6),
            ],
            composer: ComposerSettings {
                lick_octave: 3,
                progression: vec![0, 0, 0, 0, 5, 5, 0, 0, 7, 5, 0, 7],
                ..ComposerSettings::default()
            },
            envelopes: EnvelopeTable {
                pick: EnvelopeShape::new(0.13, 0.75),
                ..EnvelopeTable::default()
            },
            ..Config::default()
        }
    }

    /// Arena rock: delayed palm-muted lead riff over driving power-chord bars.
    pub fn arena() -> Self {
        let tone = ToneBlend::new(Waveform::Sawtooth, 0.6, Waveform::Square, 0.4);
        Config {
            tempo: 124.0,
            distortion_gain: 85.0,
            cabinet_cutoff: 3800.0,
            delay_time: 0.363,
            delay_feedback: 0.3,
            master_volume: 1.0,
            scales: vec![Scale::natural_minor()],
            scale: "natural_minor".into(),
            root: 82.41,
            length: RenderLength::Bars(16),
            tracks: vec![
                TrackConfig::new(
                    "lead",
                    VoiceProfile {
                        tone,
                        amp: AmpProfile::arena_lead(),
                        vibrato: None,
                    },
                    vec![
                        WeightedTemplate::new(Template::Riff, 0.7),
                        WeightedTemplate::new(Template::IsolatedNote, 0.3),
                    ],
                )
                .with_level(0.6),
                TrackConfig::new(
                    "rhythm",
                    VoiceProfile {
                        tone,
                        amp: AmpProfile::arena_rhythm(),
                        vibrato: None,
                    },
                    vec![WeightedTemplate::new(Template::BarChord, 1.0)],
                )
                .with_level(0.6),
            ],
            composer: ComposerSettings {
                riff_patterns: vec![vec![1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0, 0, 0, 0, 0, 0]],
                riff_step: 60.0 / 124.0 / 4.0 * 2.0,
                riff_degree: 8,
                progression: vec![7, 5, 3, 0],
                chord_voicing: Voicing::Power,
                ..ComposerSettings::default()
            },
            ..Config::default()
        }
    }

    /// Parse a (possibly partial) JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, RiffError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, RiffError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Seconds per beat at the configured tempo.
    pub fn beat_seconds(&self) -> f64 {
        60.0 / self.tempo
    }

    /// Target track length in seconds.
    pub fn length_seconds(&self) -> f64 {
        match self.length {
            RenderLength::Seconds(s) => s,
            RenderLength::Bars(bars) => bars as f64 * BEATS_PER_BAR * self.beat_seconds(),
        }
    }

    /// Look up a scale by name.
    pub fn scale_named(&self, name: &str) -> Result<&Scale, ConfigError> {
        self.scales
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError::UnknownScale(name.to_string()))
    }

    /// Reject settings that could not produce a meaningful render.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            return Err(ConfigError::SampleRate(self.sample_rate));
        }
        if !(self.tempo > 0.0)
            || !self.tempo.is_finite()
            || BEATS_PER_BAR * self.beat_seconds() > MAX_NOTE_SECONDS
        {
            return Err(ConfigError::Tempo(self.tempo));
        }
        let seconds = self.length_seconds();
        if seconds > MAX_RENDER_SECONDS {
            return Err(ConfigError::RenderLength(seconds));
        }
        if !self.distortion_gain.is_finite() || self.distortion_gain < 0.0 {
            return Err(ConfigError::Gain(self.distortion_gain));
        }
        check_cutoff(self.cabinet_cutoff)?;
        check_delay(self.delay_time, self.delay_feedback)?;
        if !(0.0..=1.0).contains(&self.master_volume) {
            return Err(ConfigError::MasterVolume(self.master_volume));
        }
        if !(self.root > 0.0) || !self.root.is_finite() {
            return Err(ConfigError::Root(self.root));
        }

        if self.scales.is_empty() {
            return Err(ConfigError::NoScales);
        }
        for scale in &self.scales {
            scale.validate()?;
        }
        self.scale_named(&self.scale)?;
        if let Some(modulation) = &self.composer.modulation {
            self.scale_named(&modulation.scale)?;
        }

        for (technique, shape) in self.envelopes.entries() {
            if !(shape.attack >= 0.0) || !(shape.decay >= 0.0) {
                return Err(ConfigError::Envelope {
                    technique,
                    attack: shape.attack,
                    decay: shape.decay,
                });
            }
        }

        let composer = &self.composer;
        if composer.riff_patterns.is_empty() || composer.riff_patterns.iter().any(Vec::is_empty) {
            return Err(ConfigError::EmptyRiffPattern);
        }
        if let Some(long) = composer.riff_patterns.iter().find(|p| p.len() > MAX_RIFF_SLOTS) {
            return Err(ConfigError::RiffPatternLength(long.len()));
        }
        check_timing("riff_step", composer.riff_step)?;
        check_timing("run_step", composer.run_step)?;
        check_timing("run_sustain", composer.run_sustain)?;
        if composer.run_min_len > composer.run_max_len || composer.run_max_len > MAX_RUN_NOTES {
            return Err(ConfigError::RunLength {
                shortest: composer.run_min_len,
                longest: composer.run_max_len,
            });
        }
        check_pitch("riff_degree", composer.riff_degree, 12 * MAX_OCTAVE_SHIFT)?;
        check_pitch("riff_octave", composer.riff_octave, MAX_OCTAVE_SHIFT)?;
        check_pitch("run_octave", composer.run_octave, MAX_OCTAVE_SHIFT)?;
        check_pitch("lick_octave", composer.lick_octave, MAX_OCTAVE_SHIFT)?;
        for &offset in &composer.progression {
            check_pitch("progression", offset, 12 * MAX_OCTAVE_SHIFT)?;
        }
        if !(0.0..=1.0).contains(&composer.pinch_harmonic_chance) {
            return Err(ConfigError::Probability(composer.pinch_harmonic_chance));
        }

        for track in &self.tracks {
            let amp = &track.voice.amp;
            if let Some(cutoff) = amp.cabinet_cutoff {
                check_cutoff(cutoff)?;
            }
            check_delay(
                amp.delay_time.unwrap_or(self.delay_time),
                amp.delay_feedback.unwrap_or(self.delay_feedback),
            )?;
            let weights_ok = track.templates.iter().all(|t| t.weight >= 0.0 && t.weight.is_finite())
                && track.templates.iter().any(|t| t.weight > 0.0);
            if !weights_ok {
                return Err(ConfigError::TemplateWeights {
                    track: track.name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn check_cutoff(cutoff: f64) -> Result<(), ConfigError> {
    if !(cutoff > 0.0) || !cutoff.is_finite() {
        return Err(ConfigError::Cutoff(cutoff));
    }
    Ok(())
}

fn check_delay(time: f64, feedback: f64) -> Result<(), ConfigError> {
    if !(0.0..=MAX_DELAY_SECONDS).contains(&time) {
        return Err(ConfigError::DelayTime(time));
    }
    if !(0.0..1.0).contains(&feedback) {
        return Err(ConfigError::Feedback(feedback));
    }
    Ok(())
}

fn check_timing(field: &'static str, seconds: f64) -> Result<(), ConfigError> {
    if !(seconds > 0.0 && seconds <= MAX_NOTE_SECONDS) {
        return Err(ConfigError::Timing { field, seconds });
    }
    Ok(())
}

fn check_pitch(field: &'static str, value: i32, bound: u32) -> Result<(), ConfigError> {
    if value.unsigned_abs() > bound {
        return Err(ConfigError::Pitch { field, value });
    }
    Ok(())
}
