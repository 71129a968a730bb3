//! Render engine — turns a [`Config`] into a finished, limited sample stream.
//!
//! Composition, synthesis and amp processing run in one synchronous pass:
//! each track's notes are synthesized into a raw [`Track`], tracks are padded
//! to a common length, and every sample index is pushed through every track's
//! [`AmpChannel`] in lock-step before mixing.

use log::{debug, info};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::composer::{Composer, Score, ScoreTrack};
use crate::config::{Config, MAX_NOTE_SECONDS, TrackConfig};
use crate::error::{ConfigError, EmptyRenderError, RiffError};

use super::amp::AmpChannel;
use super::mixer::{Mixer, pad_to_longest};
use super::renderer::Render;
use super::voice::Voice;

/// Raw (pre-amp) samples for one voice. Only ever appended to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub name: String,
    samples: Vec<f64>,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Track {
            name: name.into(),
            samples: Vec::new(),
        }
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

/// The rendering engine. Borrows a validated [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct RenderEngine<'a> {
    config: &'a Config,
}

impl<'a> RenderEngine<'a> {
    /// Validate `config` and build an engine over it. Nothing is rendered
    /// unless the config passes.
    pub fn new(config: &'a Config) -> Result<Self, RiffError> {
        config.validate()?;
        if config.tracks.is_empty() {
            return Err(EmptyRenderError::NoTracks.into());
        }
        let seconds = config.length_seconds();
        if !(seconds > 0.0) {
            return Err(EmptyRenderError::ZeroDuration(seconds).into());
        }
        Ok(RenderEngine { config })
    }

    /// Compose a score from `rng`.
    pub fn compose<R: Rng>(&self, rng: R) -> Result<Score, RiffError> {
        Composer::new(self.config, rng)?.compose_score()
    }

    /// Compose and render in one go.
    pub fn render<R: Rng>(&self, rng: R) -> Result<Render, RiffError> {
        let score = self.compose(rng)?;
        self.render_score(&score)
    }

    /// Compose and render from a `StdRng` seeded with `seed`.
    pub fn render_seeded(&self, seed: u64) -> Result<Render, RiffError> {
        self.render(StdRng::seed_from_u64(seed))
    }

    /// Synthesize the raw samples of `phrases` with the voice of `track`.
    pub fn synthesize(&self, track: &TrackConfig, score: &ScoreTrack) -> Track {
        let voice = Voice::new(
            &track.voice,
            &self.config.envelopes,
            self.config.glide,
            self.config.sample_rate,
        );
        let mut out = Track::new(score.name.clone());
        for phrase in &score.phrases {
            voice.render_notes(&phrase.notes, &mut out.samples);
        }
        out
    }

    /// Render an already composed score. Score tracks pair with
    /// [`Config::tracks`] by position.
    pub fn render_score(&self, score: &Score) -> Result<Render, RiffError> {
        let config = self.config;
        if score.tracks.is_empty() {
            return Err(EmptyRenderError::NoTracks.into());
        }
        if score.tracks.len() != config.tracks.len() {
            return Err(RiffError::ScoreMismatch {
                expected: config.tracks.len(),
                found: score.tracks.len(),
            });
        }
        let overlong = score
            .tracks
            .iter()
            .flat_map(|part| &part.phrases)
            .flat_map(|phrase| &phrase.notes)
            .find(|note| !(note.duration <= MAX_NOTE_SECONDS));
        if let Some(note) = overlong {
            return Err(ConfigError::NoteLength(note.duration).into());
        }
        info!(
            "rendering {} track(s) at {} Hz",
            score.tracks.len(),
            config.sample_rate
        );

        let mut raw: Vec<Vec<f64>> = config
            .tracks
            .iter()
            .zip(&score.tracks)
            .map(|(track, part)| {
                let synthesized = self.synthesize(track, part);
                debug!(
                    "track '{}': {:.2}s composed, {} raw samples",
                    synthesized.name,
                    part.duration(),
                    synthesized.samples.len()
                );
                synthesized.into_samples()
            })
            .collect();

        let length = pad_to_longest(&mut raw);
        if length == 0 {
            return Err(EmptyRenderError::Silent.into());
        }

        let mut channels: Vec<(AmpChannel, f64)> = config
            .tracks
            .iter()
            .map(|track| {
                let channel = AmpChannel::new(config, &track.voice.amp);
                debug!("track '{}': {}-sample delay line", track.name, channel.delay_len());
                (channel, track.level)
            })
            .collect();

        let mut mixer = Mixer::new(config.master_volume);
        mixer.clear(length);
        for i in 0..length {
            for ((channel, level), track) in channels.iter_mut().zip(&raw) {
                mixer.add(i, channel.process(track[i]) * *level);
            }
        }

        let render = Render::new(config.sample_rate, mixer.into_output());
        info!(
            "rendered {} samples ({:.2}s)",
            render.samples.len(),
            render.duration()
        );
        Ok(render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{Template, WeightedTemplate};
    use crate::config::RenderLength;
    use crate::note::Phrase;

    fn short(mut config: Config, seconds: f64) -> Config {
        config.length = RenderLength::Seconds(seconds);
        config
    }

    fn fixed_riff_score(config: &Config, pattern: &[u8]) -> Score {
        let composer = Composer::new(config, StdRng::seed_from_u64(0)).unwrap();
        Score {
            tracks: vec![ScoreTrack {
                name: "guitar".into(),
                phrases: vec![composer.riff_with_pattern(pattern)],
            }],
        }
    }

    #[test]
    fn fixed_riff_length_and_bounds() {
        let config = Config::default();
        let engine = RenderEngine::new(&config).unwrap();
        let score = fixed_riff_score(&config, &[1, 0, 1, 1]);
        let render = engine.render_score(&score).unwrap();
        assert_eq!(render.samples.len(), (4.0_f64 * 0.15 * 44100.0).round() as usize);
        assert_eq!(render.samples.len(), 26460);
        assert!(render.samples.iter().all(|s| s.abs() <= 1.0));
        assert!(render.samples.iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn rest_slot_is_quiet_before_the_echo() {
        let mut config = Config::default();
        config.tracks[0].voice.amp.wet = 0.0;
        let engine = RenderEngine::new(&config).unwrap();
        let render = engine
            .render_score(&fixed_riff_score(&config, &[1, 0, 1, 1]))
            .unwrap();
        // Palm-muted chug has decayed well before the end of the rest slot.
        let tail = &render.samples[6615 * 2 - 100..6615 * 2];
        assert!(tail.iter().all(|s| s.abs() < 0.05), "rest slot not quiet");
    }

    #[test]
    fn seeded_renders_are_identical() {
        for preset in [Config::default(), Config::neoclassical(), Config::blues(), Config::arena()] {
            let config = Config {
                sample_rate: 8000,
                ..short(preset, 2.0)
            };
            let engine = RenderEngine::new(&config).unwrap();
            let a = engine.render_seeded(1234).unwrap();
            let b = engine.render_seeded(1234).unwrap();
            assert_eq!(a.samples, b.samples);
            assert!(a.samples.iter().all(|s| s.abs() <= 1.0));
        }
    }

    #[test]
    fn tracks_are_padded_to_longest() {
        let mut config = short(Config::blues(), 1.0);
        config.sample_rate = 8000;
        let engine = RenderEngine::new(&config).unwrap();
        let beat = config.beat_seconds();
        let lead = Phrase::new(
            Template::Rest,
            vec![crate::note::NoteEvent::rest(beat)],
        );
        let score = Score {
            tracks: vec![
                ScoreTrack {
                    name: "lead".into(),
                    phrases: vec![lead],
                },
                ScoreTrack {
                    name: "rhythm".into(),
                    phrases: vec![Composer::new(&config, StdRng::seed_from_u64(0)).unwrap().bar_chord()],
                },
            ],
        };
        let render = engine.render_score(&score).unwrap();
        let bar_samples = (beat * 4.0 * 8000.0).round() as usize;
        assert_eq!(render.samples.len(), bar_samples);
    }

    #[test]
    fn rejects_invalid_config_before_rendering() {
        let config = Config {
            cabinet_cutoff: -5.0,
            ..Config::default()
        };
        assert!(matches!(RenderEngine::new(&config), Err(RiffError::Config(_))));
    }

    #[test]
    fn rejects_empty_renders() {
        let config = short(Config::default(), 0.0);
        assert!(matches!(
            RenderEngine::new(&config),
            Err(RiffError::EmptyRender(EmptyRenderError::ZeroDuration(_)))
        ));

        let config = Config {
            tracks: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(
            RenderEngine::new(&config),
            Err(RiffError::EmptyRender(EmptyRenderError::NoTracks))
        ));

        let config = Config::default();
        let engine = RenderEngine::new(&config).unwrap();
        let silent = Score {
            tracks: vec![ScoreTrack {
                name: "guitar".into(),
                phrases: Vec::new(),
            }],
        };
        assert!(matches!(
            engine.render_score(&silent),
            Err(RiffError::EmptyRender(EmptyRenderError::Silent))
        ));
    }

    #[test]
    fn rejects_overlong_notes_in_supplied_scores() {
        let config = Config::default();
        let engine = RenderEngine::new(&config).unwrap();
        for duration in [1e15, f64::NAN] {
            let score = Score {
                tracks: vec![ScoreTrack {
                    name: "guitar".into(),
                    phrases: vec![Phrase::new(
                        Template::IsolatedNote,
                        vec![crate::note::NoteEvent::new(110.0, duration, crate::note::Technique::Pick)],
                    )],
                }],
            };
            assert!(matches!(
                engine.render_score(&score),
                Err(RiffError::Config(ConfigError::NoteLength(_)))
            ));
        }
    }

    #[test]
    fn oversized_composer_step_is_rejected_before_rendering() {
        let mut config = short(Config::default(), 1.0);
        config.composer.riff_step = 1e15;
        config.tracks[0].templates = vec![WeightedTemplate::new(Template::Riff, 1.0)];
        assert!(matches!(
            RenderEngine::new(&config),
            Err(RiffError::Config(ConfigError::Timing { field: "riff_step", .. }))
        ));
    }

    #[test]
    fn score_must_match_tracks() {
        let config = Config::blues();
        let engine = RenderEngine::new(&config).unwrap();
        let score = fixed_riff_score(&config, &[1]);
        assert!(matches!(
            engine.render_score(&score),
            Err(RiffError::ScoreMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn louder_track_level_is_louder() {
        let mut config = Config::default();
        config.tracks[0].templates = vec![WeightedTemplate::new(Template::Riff, 1.0)];
        let quiet_config = {
            let mut c = config.clone();
            c.tracks[0].level = 0.1;
            c
        };
        let score = fixed_riff_score(&config, &[1, 1]);
        let loud = RenderEngine::new(&config).unwrap().render_score(&score).unwrap();
        let quiet = RenderEngine::new(&quiet_config).unwrap().render_score(&score).unwrap();
        let energy = |s: &[f64]| s.iter().map(|x| x * x).sum::<f64>();
        assert!(energy(&loud.samples) > energy(&quiet.samples));
    }
}
