use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Stream, StreamConfig,
};
use microtone_core::{AudioOutput, MicrotoneError, Result, VoiceId, WaveformBuffer};
use tracing::{error, info, warn};

struct Voice {
    buffer: Arc<WaveformBuffer>,
    position: usize,
}

type Voices = Arc<Mutex<BTreeMap<VoiceId, Voice>>>;

/// Default output device of the host, mixing every looping voice.
pub struct DeviceOutput {
    stream: Option<Stream>,
    voices: Voices,
    sample_rate: u32,
    next_voice: u64,
}

impl DeviceOutput {
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| MicrotoneError::Audio("no output device found".into()))?;
        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            "using output device"
        );

        let supported = device
            .default_output_config()
            .map_err(|err| MicrotoneError::Audio(err.to_string()))?;
        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };
        info!(?config, "audio stream configuration");

        let voices: Voices = Arc::new(Mutex::new(BTreeMap::new()));
        let channels = usize::from(config.channels);
        let shared = Arc::clone(&voices);
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mix_voices(data, channels, &shared);
                },
                |err| error!(%err, "audio stream error"),
                None,
            )
            .map_err(|err| MicrotoneError::Audio(err.to_string()))?;
        stream
            .play()
            .map_err(|err| MicrotoneError::Audio(err.to_string()))?;

        Ok(Self {
            stream: Some(stream),
            voices,
            sample_rate: config.sample_rate.0,
            next_voice: 0,
        })
    }

    /// Rate the note buffers should be rendered at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl AudioOutput for DeviceOutput {
    fn play(&mut self, buffer: Arc<WaveformBuffer>) -> Result<VoiceId> {
        if self.stream.is_none() {
            return Err(MicrotoneError::Audio("output has been closed".into()));
        }
        if buffer.sample_rate() != self.sample_rate {
            warn!(
                buffer = buffer.sample_rate(),
                device = self.sample_rate,
                "buffer sample rate differs from device"
            );
        }

        let voice = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.voices
            .lock()
            .map_err(|_| MicrotoneError::Audio("voice table poisoned".into()))?
            .insert(
                voice,
                Voice {
                    buffer,
                    position: 0,
                },
            );
        Ok(voice)
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Ok(mut voices) = self.voices.lock() {
            voices.remove(&voice);
        }
    }

    fn close(&mut self) {
        if let Ok(mut voices) = self.voices.lock() {
            voices.clear();
        }
        self.stream = None;
        info!("output device closed");
    }
}

fn mix_voices(data: &mut [f32], channels: usize, voices: &Mutex<BTreeMap<VoiceId, Voice>>) {
    let Ok(mut voices) = voices.lock() else {
        data.fill(0.0);
        return;
    };

    for frame in data.chunks_mut(channels.max(1)) {
        let mut value = 0.0_f32;
        for voice in voices.values_mut() {
            let samples = voice.buffer.samples();
            if samples.is_empty() {
                continue;
            }
            value += samples[voice.position];
            voice.position = (voice.position + 1) % samples.len();
        }

        let value = value.clamp(-1.0, 1.0);
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }
}
