//! Amplifier channel — tremolo → pre-filter → gain → waveshaper → cabinet → delay.
//!
//! Every voice owns one [`AmpChannel`]. The differences between amp voicings
//! (tight shred rig, arena lead, vintage fuzz) live in [`AmpProfile`] data.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::Config;

use super::delay::DelayLine;
use super::filter::{OnePoleLowpass, PreFilter, PreFilterStage};

/// Largest magnitude the waveshaper may emit.
const SHAPER_CEILING: f64 = 1.0 - f64::EPSILON;

/// Amplitude LFO applied ahead of the pre-filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tremolo {
    /// LFO rate in Hz.
    pub rate: f64,
    /// Modulation depth; gain swings over `1 ± depth`.
    pub depth: f64,
}

/// Per-voice amp settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmpProfile {
    pub prefilter: PreFilter,
    /// Multiplier on [`Config::distortion_gain`].
    pub drive: f64,
    /// Scale `s` of the negative branch, `tanh(x·s)/s`. `1.0` is symmetric.
    pub negative_scale: f64,
    pub tremolo: Option<Tremolo>,
    /// Overrides [`Config::cabinet_cutoff`].
    pub cabinet_cutoff: Option<f64>,
    /// Overrides [`Config::delay_time`].
    pub delay_time: Option<f64>,
    /// Overrides [`Config::delay_feedback`].
    pub delay_feedback: Option<f64>,
    pub dry: f64,
    pub wet: f64,
}

impl Default for AmpProfile {
    /// Straight into the amp: no pre-filter, symmetric clipping, echo added on
    /// top of the full dry signal.
    fn default() -> Self {
        AmpProfile {
            prefilter: PreFilter::None,
            drive: 1.0,
            negative_scale: 1.0,
            tremolo: None,
            cabinet_cutoff: None,
            delay_time: None,
            delay_feedback: None,
            dry: 1.0,
            wet: 0.3,
        }
    }
}

impl AmpProfile {
    /// Tight high-gain rig: low-end tightening and diode-style asymmetry.
    pub fn shred() -> Self {
        AmpProfile {
            prefilter: PreFilter::LeakySubtract(0.85),
            negative_scale: 1.2,
            delay_time: Some(0.4),
            delay_feedback: Some(0.4),
            dry: 0.7,
            wet: 0.3,
            ..Self::default()
        }
    }

    /// Arena lead: pushed harder, dotted-eighth echo.
    pub fn arena_lead() -> Self {
        AmpProfile {
            prefilter: PreFilter::LeakySubtract(0.1),
            drive: 1.5,
            delay_feedback: Some(0.3),
            dry: 0.8,
            wet: 0.4,
            ..Self::default()
        }
    }

    /// Arena rhythm: same amp, no echo.
    pub fn arena_rhythm() -> Self {
        AmpProfile {
            prefilter: PreFilter::LeakySubtract(0.1),
            dry: 0.8,
            wet: 0.0,
            ..Self::default()
        }
    }

    /// Creamy fuzz lead with a swirling tremolo.
    pub fn vintage_lead() -> Self {
        AmpProfile {
            prefilter: PreFilter::Smoothing(0.15),
            drive: 1.5,
            negative_scale: 0.8,
            tremolo: Some(Tremolo {
                rate: 4.0,
                depth: 0.3,
            }),
            cabinet_cutoff: Some(3500.0),
            delay_feedback: Some(0.4),
            dry: 0.7,
            wet: 0.25,
            ..Self::default()
        }
    }

    /// Cleaner, thinner vintage rhythm.
    pub fn vintage_rhythm() -> Self {
        AmpProfile {
            prefilter: PreFilter::Smoothing(0.3),
            drive: 0.8,
            negative_scale: 0.8,
            cabinet_cutoff: Some(3500.0),
            delay_feedback: Some(0.4),
            dry: 0.7,
            wet: 0.25,
            ..Self::default()
        }
    }
}

/// Soft clip with an optional asymmetric negative branch.
///
/// Positive input: `tanh(x)`. Negative input: `tanh(x·s)/s`. The result is
/// held strictly inside (-1, 1).
pub fn waveshape(x: f64, negative_scale: f64) -> f64 {
    let y = if x >= 0.0 || negative_scale == 1.0 || !(negative_scale > 0.0) {
        x.tanh()
    } else {
        (x * negative_scale).tanh() / negative_scale
    };
    y.clamp(-SHAPER_CEILING, SHAPER_CEILING)
}

/// One voice's amp: owns its filter, delay and LFO state.
///
/// `process` must be called once per sample in time order.
#[derive(Debug, Clone)]
pub struct AmpChannel {
    prefilter: PreFilterStage,
    gain: f64,
    negative_scale: f64,
    tremolo: Option<Tremolo>,
    lfo_phase: f64,
    lfo_increment: f64,
    cabinet: OnePoleLowpass,
    delay: DelayLine,
    dry: f64,
    wet: f64,
}

impl AmpChannel {
    /// Build a channel for `profile`, filling unset fields from `config`.
    pub fn new(config: &Config, profile: &AmpProfile) -> Self {
        let sample_rate = config.sample_rate as f64;
        let cutoff = profile.cabinet_cutoff.unwrap_or(config.cabinet_cutoff);
        let delay_time = profile.delay_time.unwrap_or(config.delay_time);
        let feedback = profile.delay_feedback.unwrap_or(config.delay_feedback);
        let lfo_increment = profile.tremolo.map_or(0.0, |t| t.rate / sample_rate);

        AmpChannel {
            prefilter: PreFilterStage::new(profile.prefilter),
            gain: config.distortion_gain * profile.drive,
            negative_scale: profile.negative_scale,
            tremolo: profile.tremolo,
            lfo_phase: 0.0,
            lfo_increment,
            cabinet: OnePoleLowpass::new(cutoff, sample_rate),
            delay: DelayLine::with_time(delay_time, sample_rate, feedback),
            dry: profile.dry,
            wet: profile.wet,
        }
    }

    pub fn delay_len(&self) -> usize {
        self.delay.len()
    }

    /// Run one sample through the chain.
    #[inline]
    pub fn process(&mut self, raw: f64) -> f64 {
        let mut x = raw;

        if let Some(tremolo) = self.tremolo {
            self.lfo_phase += self.lfo_increment;
            self.lfo_phase -= self.lfo_phase.floor();
            x *= 1.0 + tremolo.depth * (2.0 * PI * self.lfo_phase).sin();
        }

        let tightened = self.prefilter.process(x);
        let driven = tightened * self.gain;
        let distorted = waveshape(driven, self.negative_scale);
        let filtered = self.cabinet.process(distorted);
        let delayed = self.delay.process(filtered);

        filtered * self.dry + delayed * self.wet
    }
}
