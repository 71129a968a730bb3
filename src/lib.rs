pub mod composer;
pub mod config;
pub mod dsp;
pub mod error;
pub mod note;

use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

use crate::composer::Score;
use crate::config::Config;
use crate::dsp::engine::RenderEngine;
use crate::dsp::renderer::Render;
use crate::error::RiffError;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render `config` with a generator seeded from `seed`.
pub fn render(config: &Config, seed: u64) -> Result<Render, RiffError> {
    RenderEngine::new(config)?.render_seeded(seed)
}

/// Compose `config`'s score with a generator seeded from `seed`, without
/// synthesizing it.
pub fn compose(config: &Config, seed: u64) -> Result<Score, RiffError> {
    RenderEngine::new(config)?.compose(StdRng::seed_from_u64(seed))
}

fn render_json(config_json: &str, seed: u64) -> Result<Render, RiffError> {
    let config = Config::from_json(config_json)?;
    render(&config, seed)
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-exposed: return the riffwalker-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: render a JSON config to a WAV byte array.
#[wasm_bindgen]
pub fn render_wav(config_json: &str, seed: u64) -> Result<Vec<u8>, JsValue> {
    let render = render_json(config_json, seed).map_err(js_error)?;
    Ok(render.to_wav_bytes())
}

/// WASM-exposed: render a JSON config to mono f32 samples.
/// Returns the raw audio buffer for AudioWorklet playback.
#[wasm_bindgen]
pub fn render_samples(config_json: &str, seed: u64) -> Result<Vec<f32>, JsValue> {
    let render = render_json(config_json, seed).map_err(js_error)?;
    Ok(render.to_f32())
}

/// WASM-exposed: compose a JSON config into its score (phrases and notes).
#[wasm_bindgen]
pub fn compose_score(config_json: &str, seed: u64) -> Result<JsValue, JsValue> {
    let config = Config::from_json(config_json).map_err(js_error)?;
    let score = compose(&config, seed).map_err(js_error)?;
    serde_wasm_bindgen::to_value(&score).map_err(js_error)
}
