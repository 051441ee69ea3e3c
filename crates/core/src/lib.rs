//! Core library for the microtonal keyboard.
//!
//! A scale of frequencies is turned into a row of drawable keys (piano keys or
//! hexagons), pointer and keyboard input is resolved against those shapes, and
//! each key loops a pre-rendered waveform while it is held. Drawing and audio
//! output sit behind the [`render::Surface`] and [`playback::AudioOutput`]
//! traits so the whole instrument runs headless in tests and in the CLI.

pub mod analysis;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod hit;
pub mod instrument;
pub mod interaction;
pub mod layout;
pub mod playback;
pub mod render;
pub mod scale;
pub mod synth;

pub use analysis::{ToneAnalyser, ToneSummary};
pub use color::{Gradient, Rgb};
pub use config::{AppConfig, CanvasConfig, LayoutConfig, LayoutMode, ScaleConfig, SynthConfig};
pub use error::{MicrotoneError, Result};
pub use geometry::{build_hexagon, build_key, Extents, KeyDimensions, Point, Shape, ShapeKind};
pub use instrument::Instrument;
pub use interaction::{InteractionState, InteractionStateMachine, NoteSink, Readout, Transition};
pub use layout::{KeyEntry, Layout, StateColors};
pub use playback::{AudioOutput, NotePlaybackEngine, OutputEvent, RecordingOutput, VoiceId};
pub use render::{DrawCommand, RecordingSurface, Snapshot, Surface};
pub use scale::{EqualDivision, ScaleProvider};
pub use synth::{synthesize, WaveformBuffer, WaveformKind};
