use thiserror::Error;

use crate::composer::Template;
use crate::config::{
    MAX_DELAY_SECONDS, MAX_NOTE_SECONDS, MAX_RENDER_SECONDS, MAX_RIFF_SLOTS, MAX_RUN_NOTES,
    MAX_SAMPLE_RATE,
};
use crate::note::Technique;

#[derive(Debug, Error)]
pub enum RiffError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Empty render: {0}")]
    EmptyRender(#[from] EmptyRenderError),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Score has {found} track(s) but the config has {expected}")]
    ScoreMismatch { expected: usize, found: usize },
    #[cfg(feature = "export")]
    #[error("WAV export failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Settings rejected before any sample is rendered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample rate must lie in 1..={max} Hz, got {0}", max = MAX_SAMPLE_RATE)]
    SampleRate(u32),
    #[error("tempo must be finite with bars of at most {max}s, got {0} BPM", max = MAX_NOTE_SECONDS)]
    Tempo(f64),
    #[error("render length must be at most {max}s, got {0}s", max = MAX_RENDER_SECONDS)]
    RenderLength(f64),
    #[error("distortion gain must be finite and non-negative, got {0}")]
    Gain(f64),
    #[error("cabinet cutoff must be positive, got {0} Hz")]
    Cutoff(f64),
    #[error("delay time must lie in [0, {max}]s, got {0}s", max = MAX_DELAY_SECONDS)]
    DelayTime(f64),
    #[error("delay feedback must lie in [0, 1), got {0}")]
    Feedback(f64),
    #[error("master volume must lie in [0, 1], got {0}")]
    MasterVolume(f64),
    #[error("root frequency must be positive, got {0} Hz")]
    Root(f64),
    #[error("at least one scale is required")]
    NoScales,
    #[error("scale '{0}' is empty")]
    EmptyScale(String),
    #[error("scale '{name}' must end at 12 semitones, ends at {last}")]
    ScaleNotOctave { name: String, last: i32 },
    #[error("scale '{0}' must rise strictly from a non-negative first step")]
    ScaleNotAscending(String),
    #[error("unknown scale '{0}'")]
    UnknownScale(String),
    #[error("{technique:?} envelope needs non-negative attack and decay, got {attack}/{decay}")]
    Envelope {
        technique: Technique,
        attack: f64,
        decay: f64,
    },
    #[error("riff patterns must be present and non-empty")]
    EmptyRiffPattern,
    #[error("riff patterns may hold at most {max} slots, got {0}", max = MAX_RIFF_SLOTS)]
    RiffPatternLength(usize),
    #[error("composer {field} must lie in (0, {max}]s, got {seconds}", max = MAX_NOTE_SECONDS)]
    Timing { field: &'static str, seconds: f64 },
    #[error("scalar runs need run_min_len <= run_max_len <= {limit}, got {shortest}..={longest}", limit = MAX_RUN_NOTES)]
    RunLength { shortest: usize, longest: usize },
    #[error("composer {field} is out of range: {value}")]
    Pitch { field: &'static str, value: i32 },
    #[error("note length must be finite and at most {max}s, got {0}s", max = MAX_NOTE_SECONDS)]
    NoteLength(f64),
    #[error("probability must lie in [0, 1], got {0}")]
    Probability(f64),
    #[error("track '{track}' needs finite non-negative template weights with at least one above zero")]
    TemplateWeights { track: String },
}

/// A render that would produce no audio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmptyRenderError {
    #[error("render length must be positive, got {0}s")]
    ZeroDuration(f64),
    #[error("no tracks to render")]
    NoTracks,
    #[error("track '{track}' produced a {template:?} phrase with no samples")]
    EmptyPhrase { track: String, template: Template },
    #[error("score contains no samples")]
    Silent,
}
