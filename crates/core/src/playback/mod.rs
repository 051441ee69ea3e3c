use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::SynthConfig,
    interaction::NoteSink,
    synth::{synthesize, WaveformBuffer, WaveformKind},
    MicrotoneError, Result,
};

/// Handle for one looping note inside an [`AudioOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoiceId(pub u64);

/// Sink that loops buffers until told to stop.
///
/// Implementations are acquired once at startup and handed to
/// [`NotePlaybackEngine`]; [`AudioOutput::close`] is called on teardown.
pub trait AudioOutput {
    /// Starts looping `buffer` and returns the handle used to stop it.
    fn play(&mut self, buffer: Arc<WaveformBuffer>) -> Result<VoiceId>;
    /// Stops a voice. Unknown voices are ignored.
    fn stop(&mut self, voice: VoiceId);
    /// Releases the underlying device.
    fn close(&mut self) {}
}

/// One play or stop request observed by [`RecordingOutput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputEvent {
    Play { voice: VoiceId, frequency: f64 },
    Stop { voice: VoiceId },
}

/// Output that keeps a log of requests instead of making sound.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    next_voice: u64,
    active: BTreeMap<VoiceId, Arc<WaveformBuffer>>,
    events: Vec<OutputEvent>,
    closed: bool,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[OutputEvent] {
        &self.events
    }

    /// Frequencies of the voices currently looping, in start order.
    pub fn active_frequencies(&self) -> Vec<f64> {
        self.active
            .values()
            .map(|buffer| buffer.frequency())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl AudioOutput for RecordingOutput {
    fn play(&mut self, buffer: Arc<WaveformBuffer>) -> Result<VoiceId> {
        if self.closed {
            return Err(MicrotoneError::Audio("output has been closed".into()));
        }

        let voice = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.events.push(OutputEvent::Play {
            voice,
            frequency: buffer.frequency(),
        });
        self.active.insert(voice, buffer);
        Ok(voice)
    }

    fn stop(&mut self, voice: VoiceId) {
        if self.active.remove(&voice).is_some() {
            self.events.push(OutputEvent::Stop { voice });
        }
    }

    fn close(&mut self) {
        self.active.clear();
        self.closed = true;
    }
}

/// Owns one pre-rendered buffer per scale degree and the set of notes
/// currently looping.
#[derive(Debug)]
pub struct NotePlaybackEngine<A: AudioOutput> {
    output: A,
    sample_rate: u32,
    sample_count: usize,
    buffers: Vec<Arc<WaveformBuffer>>,
    sounding: BTreeMap<usize, VoiceId>,
}

impl<A: AudioOutput> NotePlaybackEngine<A> {
    pub fn new(output: A, synth: &SynthConfig) -> Self {
        Self {
            output,
            sample_rate: synth.sample_rate,
            sample_count: synth.sample_count,
            buffers: Vec::new(),
            sounding: BTreeMap::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Updates the rate and length used by the next [`Self::regenerate`].
    pub fn set_format(&mut self, sample_rate: u32, sample_count: usize) {
        self.sample_rate = sample_rate;
        self.sample_count = sample_count;
    }

    /// Replaces every buffer with a fresh one per frequency. Notes that were
    /// sounding are stopped first since their indices may no longer exist.
    pub fn regenerate(&mut self, frequencies: &[f64], amplitude: f64, kind: WaveformKind) {
        self.stop_all();
        self.buffers = frequencies
            .iter()
            .map(|&frequency| {
                Arc::new(synthesize(
                    self.sample_rate,
                    self.sample_count,
                    frequency,
                    amplitude,
                    kind,
                ))
            })
            .collect();
        info!(
            count = self.buffers.len(),
            %kind,
            amplitude,
            sample_rate = self.sample_rate,
            "regenerated note buffers"
        );
    }

    pub fn buffers(&self) -> &[Arc<WaveformBuffer>] {
        &self.buffers
    }

    pub fn buffer(&self, index: usize) -> Option<&Arc<WaveformBuffer>> {
        self.buffers.get(index)
    }

    /// Begins looping the buffer for `index`. Already sounding notes are left
    /// alone.
    pub fn start(&mut self, index: usize) -> Result<()> {
        if self.sounding.contains_key(&index) {
            return Ok(());
        }

        let buffer = self.buffers.get(index).cloned().ok_or_else(|| {
            MicrotoneError::invalid(format!(
                "no note buffer for index {index} ({} generated)",
                self.buffers.len()
            ))
        })?;
        let frequency = buffer.frequency();
        let voice = self.output.play(buffer)?;
        self.sounding.insert(index, voice);
        debug!(index, frequency, ?voice, "note started");
        Ok(())
    }

    pub fn stop(&mut self, index: usize) {
        if let Some(voice) = self.sounding.remove(&index) {
            self.output.stop(voice);
            debug!(index, ?voice, "note stopped");
        }
    }

    pub fn stop_all(&mut self) {
        let indices: Vec<usize> = self.sounding.keys().copied().collect();
        for index in indices {
            self.stop(index);
        }
    }

    pub fn is_sounding(&self, index: usize) -> bool {
        self.sounding.contains_key(&index)
    }

    /// Indices of the notes currently sounding, ascending.
    pub fn sounding(&self) -> impl Iterator<Item = usize> + '_ {
        self.sounding.keys().copied()
    }

    pub fn output(&self) -> &A {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut A {
        &mut self.output
    }

    /// Stops every note and releases the output.
    pub fn shutdown(&mut self) {
        self.stop_all();
        self.output.close();
        info!("playback shut down");
    }
}

impl<A: AudioOutput> NoteSink for NotePlaybackEngine<A> {
    fn is_sounding(&self, index: usize) -> bool {
        NotePlaybackEngine::is_sounding(self, index)
    }

    fn start(&mut self, index: usize) -> Result<()> {
        NotePlaybackEngine::start(self, index)
    }

    fn stop(&mut self, index: usize) {
        NotePlaybackEngine::stop(self, index)
    }
}
