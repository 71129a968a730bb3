//! Phrase composer — maps scale degrees to pitches and strings templates
//! (riffs, runs, sweeps, taps, dives, licks) into phrases.
//!
//! All randomness comes from the generator handed to [`Composer::new`], so a
//! seeded generator reproduces the same score every time.

use log::{debug, trace, warn};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::{BEATS_PER_BAR, Config, Scale, TrackConfig};
use crate::error::{ConfigError, EmptyRenderError, RiffError};
use crate::note::{NoteEvent, Phrase, Technique, Voicing};

/// Degree offsets of a sweep-picked arpeggio, up and back down.
const SWEEP_SHAPE: [i32; 6] = [0, 2, 4, 7, 4, 2];

/// Frequency of scale `degree` above `root`.
///
/// `degree` may be negative: it is split with floor division and a
/// non-negative remainder, so degree `-1` is the top scale entry one octave
/// down.
pub fn get_frequency(scale: &[i32], root: f64, degree: i32, octave_shift: i32) -> f64 {
    if scale.is_empty() {
        return 0.0;
    }
    let len = scale.len() as i32;
    let octave = degree.div_euclid(len) + octave_shift;
    let offset = scale[degree.rem_euclid(len) as usize];
    let semitones = offset + 12 * octave;
    root * 2.0_f64.powf(semitones as f64 / 12.0)
}

/// Phrase-producing pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// Palm-muted chugs over an on/off rhythm.
    Riff,
    /// Fast stepwise run ending on a long held note.
    ScalarRun,
    /// Sweep-picked arpeggio.
    SweepArpeggio,
    /// Tap / pull-off triplets.
    TappingRun,
    /// Whammy-bar dive.
    DiveBomb,
    /// One high picked note.
    IsolatedNote,
    /// Long bent note, then space.
    SlowBend,
    /// Hammer-on flurry around a start degree.
    RapidFire,
    /// Whole bar on the current progression root.
    BarChord,
    /// A bar of silence.
    Rest,
}

/// A template and its selection weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedTemplate {
    pub template: Template,
    pub weight: f64,
}

impl WeightedTemplate {
    pub const fn new(template: Template, weight: f64) -> Self {
        WeightedTemplate { template, weight }
    }
}

/// Switch to another scale part-way through a scalar run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modulation {
    /// Name of the scale to switch to.
    pub scale: String,
    /// Run steps played before switching.
    pub after: usize,
}

/// Template tuning shared by every track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerSettings {
    /// Riff rhythms; `1` is a hit, `0` a dead slot.
    pub riff_patterns: Vec<Vec<u8>>,
    /// Seconds per riff slot.
    pub riff_step: f64,
    pub riff_degree: i32,
    pub riff_octave: i32,
    /// Seconds per run note.
    pub run_step: f64,
    /// Seconds of the closing run note.
    pub run_sustain: f64,
    pub run_min_len: usize,
    pub run_max_len: usize,
    pub run_octave: i32,
    pub modulation: Option<Modulation>,
    /// Chance that a picked note rings as a pinch harmonic an octave up.
    pub pinch_harmonic_chance: f64,
    /// Octave used by the blues licks.
    pub lick_octave: i32,
    /// Semitone offsets of each bar's root, cycled bar by bar.
    pub progression: Vec<i32>,
    /// How bar chords are voiced.
    pub chord_voicing: Voicing,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        ComposerSettings {
            riff_patterns: vec![
                vec![1, 1, 0, 1, 0, 0, 1, 0],
                vec![1, 0, 0, 1, 1, 0, 1, 1],
                vec![1, 1, 1, 1, 0, 1, 1, 0],
            ],
            riff_step: 0.15,
            riff_degree: 0,
            riff_octave: 0,
            run_step: 0.08,
            run_sustain: 1.0,
            run_min_len: 8,
            run_max_len: 16,
            run_octave: 1,
            modulation: None,
            pinch_harmonic_chance: 0.0,
            lick_octave: 2,
            progression: vec![0],
            chord_voicing: Voicing::Single,
        }
    }
}

/// Composed phrases for one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTrack {
    pub name: String,
    pub phrases: Vec<Phrase>,
}

impl ScoreTrack {
    pub fn duration(&self) -> f64 {
        self.phrases.iter().map(Phrase::duration).sum()
    }
}

/// Composed phrases for every track, in [`Config::tracks`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub tracks: Vec<ScoreTrack>,
}

/// Procedural phrase generator.
pub struct Composer<'a, R: Rng> {
    config: &'a Config,
    rng: R,
    scale: &'a Scale,
    bar: usize,
}

impl<'a, R: Rng> Composer<'a, R> {
    /// Create a composer over `config` drawing from `rng`.
    pub fn new(config: &'a Config, rng: R) -> Result<Self, ConfigError> {
        let scale = config.scale_named(&config.scale)?;
        Ok(Composer {
            config,
            rng,
            scale,
            bar: 0,
        })
    }

    /// Name of the scale currently in use.
    pub fn current_scale(&self) -> &str {
        &self.scale.name
    }

    fn beat(&self) -> f64 {
        self.config.beat_seconds()
    }

    fn settings(&self) -> &'a ComposerSettings {
        &self.config.composer
    }

    fn freq(&self, degree: i32, octave_shift: i32) -> f64 {
        get_frequency(&self.scale.steps, self.config.root, degree, octave_shift)
    }

    /// A picked note, occasionally turned into a pinch harmonic.
    fn pick(&mut self, frequency: f64, duration: f64) -> NoteEvent {
        let chance = self.settings().pinch_harmonic_chance;
        let frequency = if chance > 0.0 && self.rng.gen_bool(chance.min(1.0)) {
            frequency * 2.0
        } else {
            frequency
        };
        NoteEvent::new(frequency, duration, Technique::Pick)
    }

    /// Produce one phrase from `template`.
    pub fn compose(&mut self, template: Template) -> Phrase {
        let phrase = match template {
            Template::Riff => self.riff(),
            Template::ScalarRun => self.scalar_run(),
            Template::SweepArpeggio => self.sweep_arpeggio(),
            Template::TappingRun => self.tapping_run(),
            Template::DiveBomb => self.dive_bomb(),
            Template::IsolatedNote => self.isolated_note(),
            Template::SlowBend => self.slow_bend(),
            Template::RapidFire => self.rapid_fire(),
            Template::BarChord => self.bar_chord(),
            Template::Rest => self.rest(),
        };
        trace!(
            "composed {:?}: {} notes, {:.3}s",
            phrase.template,
            phrase.notes.len(),
            phrase.duration()
        );
        phrase
    }

    /// Riff over a randomly chosen configured pattern.
    pub fn riff(&mut self) -> Phrase {
        let settings = self.settings();
        match settings.riff_patterns.choose(&mut self.rng) {
            Some(pattern) => self.riff_with_pattern(pattern),
            None => Phrase::new(Template::Riff, Vec::new()),
        }
    }

    /// Riff over a fixed `pattern`: each non-zero slot is a palm-muted
    /// low note, each zero slot a rest of the same length.
    pub fn riff_with_pattern(&self, pattern: &[u8]) -> Phrase {
        let settings = self.settings();
        let step = settings.riff_step;
        let chug = self.freq(settings.riff_degree, settings.riff_octave);
        let notes = pattern
            .iter()
            .map(|&hit| {
                if hit != 0 {
                    NoteEvent::new(chug, step, Technique::PalmMute)
                } else {
                    NoteEvent::rest(step)
                }
            })
            .collect();
        Phrase::new(Template::Riff, notes)
    }

    /// Stepwise run up or down the scale, closing on a held note.
    pub fn scalar_run(&mut self) -> Phrase {
        let settings = self.settings();
        let start = self.rng.gen_range(0..=7);
        let min_len = settings.run_min_len.min(settings.run_max_len);
        let length = self.rng.gen_range(min_len..=settings.run_max_len) as i32;
        let direction = if self.rng.gen_bool(0.5) { 1 } else { -1 };

        let mut notes = Vec::with_capacity(length as usize + 1);
        for i in 0..length {
            if let Some(modulation) = &settings.modulation {
                if i as usize == modulation.after {
                    if let Ok(scale) = self.config.scale_named(&modulation.scale) {
                        debug!("run modulates {} -> {}", self.scale.name, scale.name);
                        self.scale = scale;
                    }
                }
            }
            let degree = start + i * direction;
            notes.push(NoteEvent::new(
                self.freq(degree, settings.run_octave),
                settings.run_step,
                Technique::Shred,
            ));
        }
        let last = start + length * direction;
        notes.push(NoteEvent::new(
            self.freq(last, settings.run_octave),
            settings.run_sustain,
            Technique::Sustain,
        ));
        Phrase::new(Template::ScalarRun, notes)
    }

    /// Sixteenth-note sweep over [`SWEEP_SHAPE`] from a random base degree.
    pub fn sweep_arpeggio(&mut self) -> Phrase {
        let base = self.rng.gen_range(0..=5);
        let step = self.beat() / 4.0;
        let notes = SWEEP_SHAPE
            .iter()
            .map(|&offset| NoteEvent::new(self.freq(base + offset, 1), step, Technique::Sweep))
            .collect();
        Phrase::new(Template::SweepArpeggio, notes)
    }

    /// Four rounds of tap high, pull off to base, pull off below, in sextuplets.
    pub fn tapping_run(&mut self) -> Phrase {
        let base = self.rng.gen_range(5..=12);
        let step = self.beat() / 6.0;
        let mut notes = Vec::with_capacity(12);
        for _ in 0..4 {
            notes.push(NoteEvent::new(self.freq(base + 7, 1), step, Technique::Tap));
            let low = self.freq(base, 0);
            notes.push(self.pick(low, step));
            let lower = self.freq(base - 2, 0);
            notes.push(self.pick(lower, step));
        }
        Phrase::new(Template::TappingRun, notes)
    }

    /// One four-beat note the renderer sweeps downward.
    pub fn dive_bomb(&mut self) -> Phrase {
        let start = self.freq(12, 0);
        Phrase::new(
            Template::DiveBomb,
            vec![NoteEvent::new(start, self.beat() * 4.0, Technique::Dive)],
        )
    }

    /// One beat on a random high degree.
    pub fn isolated_note(&mut self) -> Phrase {
        let degree = self.rng.gen_range(10..=15);
        let f = self.freq(degree, 1);
        let note = self.pick(f, self.beat());
        Phrase::new(Template::IsolatedNote, vec![note])
    }

    /// Two beats bent, two beats of space.
    pub fn slow_bend(&mut self) -> Phrase {
        let degree = self.rng.gen_range(2..=5) + self.bar_root_degree();
        let beat = self.beat();
        let f = self.freq(degree, self.settings().lick_octave);
        Phrase::new(
            Template::SlowBend,
            vec![
                NoteEvent::new(f, beat * 2.0, Technique::Bend),
                NoteEvent::rest(beat * 2.0),
            ],
        )
    }

    /// Eight half-beat notes hovering near a random start degree.
    pub fn rapid_fire(&mut self) -> Phrase {
        let start = self.rng.gen_range(0..=5);
        let octave = self.settings().lick_octave;
        let step = self.beat() / 2.0;
        let mut notes = Vec::with_capacity(8);
        for _ in 0..8 {
            let degree = start + self.rng.gen_range(0..=2);
            let f = self.freq(degree, octave);
            notes.push(self.pick(f, step));
        }
        Phrase::new(Template::RapidFire, notes)
    }

    /// A bar-long chord on the current progression root; advances the bar.
    pub fn bar_chord(&mut self) -> Phrase {
        let progression = &self.settings().progression;
        let offset = if progression.is_empty() {
            0
        } else {
            progression[self.bar % progression.len()]
        };
        self.bar += 1;
        let f = self.config.root * 2.0_f64.powf((offset + 12) as f64 / 12.0);
        Phrase::new(
            Template::BarChord,
            vec![
                NoteEvent::new(f, self.beat() * BEATS_PER_BAR, Technique::Pick)
                    .with_voicing(self.settings().chord_voicing),
            ],
        )
    }

    /// A bar of silence.
    pub fn rest(&mut self) -> Phrase {
        Phrase::new(Template::Rest, vec![NoteEvent::rest(self.beat() * BEATS_PER_BAR)])
    }

    /// Scale degree nearest the current progression root (roughly two
    /// semitones per degree).
    fn bar_root_degree(&self) -> i32 {
        let progression = &self.settings().progression;
        if progression.is_empty() {
            return 0;
        }
        progression[self.bar % progression.len()] / 2
    }

    /// Compose one track until it lasts at least `seconds`.
    ///
    /// The intro is placed first and the outro last; the body is drawn from the
    /// track's weighted template table. A phrase that would not advance time
    /// is reported instead of looping forever.
    pub fn compose_track(&mut self, track: &TrackConfig, seconds: f64) -> Result<ScoreTrack, RiffError> {
        if !(seconds > 0.0) {
            return Err(EmptyRenderError::ZeroDuration(seconds).into());
        }
        let sample_rate = self.config.sample_rate;
        self.scale = self.config.scale_named(&self.config.scale)?;
        self.bar = 0;

        let weights: Vec<f64> = track.templates.iter().map(|t| t.weight).collect();
        let table = WeightedIndex::new(&weights).map_err(|_| ConfigError::TemplateWeights {
            track: track.name.clone(),
        })?;

        for skipped in track.templates.iter().filter(|t| t.weight == 0.0) {
            warn!(
                "track '{}': {:?} has zero weight and will never be drawn",
                track.name, skipped.template
            );
        }

        let mut phrases = Vec::new();
        let mut elapsed = 0.0;
        let mut push = |phrase: Phrase, elapsed: &mut f64| -> Result<(), RiffError> {
            if phrase.sample_count(sample_rate) == 0 {
                return Err(EmptyRenderError::EmptyPhrase {
                    track: track.name.clone(),
                    template: phrase.template,
                }
                .into());
            }
            *elapsed += phrase.duration();
            phrases.push(phrase);
            Ok(())
        };

        if let Some(intro) = track.intro {
            let phrase = self.compose(intro);
            push(phrase, &mut elapsed)?;
        }
        let bar_seconds = self.beat() * BEATS_PER_BAR;
        while elapsed < seconds {
            // Licks follow the progression bar they start in.
            self.bar = (elapsed / bar_seconds + 1e-9).floor() as usize;
            let template = track.templates[table.sample(&mut self.rng)].template;
            let phrase = self.compose(template);
            push(phrase, &mut elapsed)?;
        }
        if let Some(outro) = track.outro {
            let phrase = self.compose(outro);
            push(phrase, &mut elapsed)?;
        }

        debug!(
            "track '{}': {} phrases, {:.2}s, ending in {}",
            track.name,
            phrases.len(),
            elapsed,
            self.current_scale()
        );
        Ok(ScoreTrack {
            name: track.name.clone(),
            phrases,
        })
    }

    /// Compose every configured track, in order, from the one generator.
    pub fn compose_score(&mut self) -> Result<Score, RiffError> {
        let seconds = self.config.length_seconds();
        let config = self.config;
        let tracks = config
            .tracks
            .iter()
            .map(|track| self.compose_track(track, seconds))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Score { tracks })
    }
}
