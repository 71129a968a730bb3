//! DSP Engine — pure Rust guitar synthesis and amp simulation.
//!
//! Everything is sample-accurate and deterministic, so the same render comes
//! out of the WASM build and an offline WAV export.

pub mod amp;
pub mod delay;
pub mod engine;
pub mod envelope;
pub mod filter;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod voice;
