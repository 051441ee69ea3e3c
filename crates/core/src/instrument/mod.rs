use tracing::{info, warn};

use crate::{
    color::Rgb,
    config::{AppConfig, CanvasConfig},
    geometry::{Extents, Point},
    interaction::{InteractionState, InteractionStateMachine, Readout, Transition},
    layout::Layout,
    playback::{AudioOutput, NotePlaybackEngine},
    render::{self, Snapshot, Surface},
    scale::{EqualDivision, ScaleProvider},
    synth::WaveformKind,
    MicrotoneError, Result,
};

/// A playable keyboard: scale, note buffers, layout, interaction state and the
/// surface it is painted on.
///
/// Nothing responds to input until [`Instrument::generate`] has succeeded
/// once.
#[derive(Debug)]
pub struct Instrument<S: Surface, A: AudioOutput> {
    config: AppConfig,
    frequencies: Vec<f64>,
    machine: Option<InteractionStateMachine>,
    engine: NotePlaybackEngine<A>,
    surface: S,
    readout: Option<Snapshot>,
}

impl<S: Surface, A: AudioOutput> Instrument<S, A> {
    pub fn new(surface: S, output: A, config: AppConfig) -> Self {
        let engine = NotePlaybackEngine::new(output, &config.synth);
        Self {
            config,
            frequencies: Vec::new(),
            machine: None,
            engine,
            surface,
            readout: None,
        }
    }

    /// Builds scale, buffers and layout from `config` and repaints everything.
    ///
    /// Validation and scale generation run before anything is replaced, so a
    /// rejected config leaves the previous keyboard playable.
    pub fn generate(&mut self, config: AppConfig) -> Result<()> {
        if let Err(err) = config.validate() {
            warn!(%err, "rejected instrument config");
            return Err(err);
        }
        let frequencies = EqualDivision
            .frequencies(config.scale.reference_pitch, config.scale.divisions)?;
        let layout = Layout::build(&frequencies, &config.canvas, &config.layout);

        self.engine
            .set_format(config.synth.sample_rate, config.synth.sample_count);
        self.engine.regenerate(&frequencies, config.synth.amplitude, config.synth.waveform);
        self.install(layout);
        self.frequencies = frequencies;
        self.config = config;
        self.redraw_all();

        info!(
            keys = self.frequencies.len(),
            mode = %self.config.layout.mode,
            reference_pitch = self.config.scale.reference_pitch,
            "instrument generated"
        );
        Ok(())
    }

    /// Lays the keys out again for a new canvas size. Held notes are stopped.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        let canvas = CanvasConfig { width, height };
        canvas.validate()?;
        self.config.canvas = canvas;
        if self.machine.is_none() {
            return Ok(());
        }

        self.engine.stop_all();
        self.rebuild_layout();
        info!(width, height, "instrument resized");
        Ok(())
    }

    /// Recolours the hexagon gradient and repaints. Buffers are left alone.
    pub fn set_colors(&mut self, start: Rgb, end: Rgb) {
        self.config.layout.start_color = start;
        self.config.layout.end_color = end;
        if self.machine.is_none() {
            return;
        }

        self.engine.stop_all();
        self.rebuild_layout();
        info!(%start, %end, "instrument recoloured");
    }

    /// Re-renders every buffer with a different waveform.
    pub fn set_waveform(&mut self, kind: WaveformKind) {
        self.config.synth.waveform = kind;
        self.regenerate_buffers();
    }

    pub fn set_amplitude(&mut self, amplitude: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&amplitude) {
            return Err(MicrotoneError::invalid(format!(
                "amplitude must lie in [0, 1], got {amplitude}"
            )));
        }
        self.config.synth.amplitude = amplitude;
        self.regenerate_buffers();
        Ok(())
    }

    pub fn pointer_move(&mut self, point: Point) {
        let Some(machine) = self.machine.as_mut() else {
            return;
        };
        let transition = machine.pointer_move(point);
        self.paint(&transition);
    }

    pub fn pointer_down(&mut self, point: Point) -> Result<()> {
        let Some(machine) = self.machine.as_mut() else {
            return Ok(());
        };
        let transition = machine.pointer_down(point, &mut self.engine)?;
        self.paint(&transition);
        Ok(())
    }

    pub fn pointer_up(&mut self, point: Point) {
        let Some(machine) = self.machine.as_mut() else {
            return;
        };
        let transition = machine.pointer_up(point, &mut self.engine);
        self.paint(&transition);
    }

    pub fn key_down(&mut self, key: char) -> Result<()> {
        let Some(machine) = self.machine.as_mut() else {
            return Ok(());
        };
        let transition = machine.key_down(key, &mut self.engine)?;
        self.paint(&transition);
        Ok(())
    }

    pub fn key_up(&mut self, key: char) {
        let Some(machine) = self.machine.as_mut() else {
            return;
        };
        let transition = machine.key_up(key, &mut self.engine);
        self.paint(&transition);
    }

    /// Silences everything and releases the audio output.
    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }

    pub fn is_generated(&self) -> bool {
        self.machine.is_some()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.machine.as_ref().map(InteractionStateMachine::layout)
    }

    pub fn state(&self, index: usize) -> Option<InteractionState> {
        self.layout()
            .and_then(|layout| layout.get(index))
            .map(|entry| entry.state)
    }

    pub fn engine(&self) -> &NotePlaybackEngine<A> {
        &self.engine
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn regenerate_buffers(&mut self) {
        if self.machine.is_none() {
            return;
        }
        let synth = &self.config.synth;
        self.engine
            .regenerate(&self.frequencies, synth.amplitude, synth.waveform);
        // regenerate stopped every note, so no key may stay held
        self.rebuild_layout();
    }

    fn rebuild_layout(&mut self) {
        let layout = Layout::build(&self.frequencies, &self.config.canvas, &self.config.layout);
        self.install(layout);
        self.redraw_all();
    }

    fn install(&mut self, layout: Layout) {
        match self.machine.as_mut() {
            Some(machine) => machine.replace_layout(layout),
            None => self.machine = Some(InteractionStateMachine::new(layout)),
        }
    }

    fn canvas_extents(&self) -> Extents {
        let canvas = self.config.canvas;
        Extents::new(0.0, canvas.width, 0.0, canvas.height)
    }

    fn redraw_all(&mut self) {
        let canvas = self.canvas_extents();
        if let Some(machine) = self.machine.as_ref() {
            self.readout = Some(render::draw_layout(&mut self.surface, machine.layout(), canvas));
        }
    }

    fn paint(&mut self, transition: &Transition) {
        let Some(machine) = self.machine.as_ref() else {
            return;
        };
        let layout = machine.layout();
        for entry in transition.redraw.iter().filter_map(|&index| layout.get(index)) {
            render::draw_entry(&mut self.surface, entry);
        }

        if let (Some(readout), Some(snapshot)) = (&transition.readout, &self.readout) {
            let text = match readout {
                Readout::Show(text) => Some(text.as_str()),
                Readout::Clear => None,
            };
            render::draw_readout(&mut self.surface, snapshot, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::LayoutMode,
        geometry::ShapeKind,
        playback::{OutputEvent, RecordingOutput},
        render::{DrawCommand, RecordingSurface},
    };

    type TestInstrument = Instrument<RecordingSurface, RecordingOutput>;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.synth.sample_count = 2_000;
        config
    }

    fn instrument() -> TestInstrument {
        let mut instrument =
            Instrument::new(RecordingSurface::new(), RecordingOutput::new(), config());
        instrument.generate(config()).unwrap();
        instrument
    }

    // lower half of the first white key on the default 1200 wide canvas
    const FIRST_KEY: Point = Point::new(370.0, 300.0);

    #[test]
    fn twelve_divisions_build_thirteen_keys() {
        let instrument = instrument();
        let layout = instrument.layout().unwrap();

        assert_eq!(layout.len(), 13);
        assert_eq!(instrument.engine().buffers().len(), 13);
        assert_eq!(layout.entries[12].kind(), ShapeKind::WhiteNoNotch);
        assert_eq!(instrument.surface().fills().len(), 13);
        assert!((instrument.frequencies()[12] - 880.0).abs() < 1e-9);
    }

    #[test]
    fn typed_key_plays_until_released() {
        let mut instrument = instrument();

        instrument.key_down('a').unwrap();
        assert_eq!(instrument.state(0), Some(InteractionState::Down));
        assert_eq!(instrument.engine().output().active_frequencies(), vec![440.0]);

        instrument.key_up('a');
        assert_eq!(instrument.state(0), Some(InteractionState::Up));
        assert!(instrument.engine().output().active_frequencies().is_empty());
        assert_eq!(instrument.engine().output().events().len(), 2);
    }

    #[test]
    fn unbound_keys_do_nothing() {
        let mut instrument = instrument();
        instrument.surface_mut().take();

        instrument.key_down('!').unwrap();
        instrument.key_up('!');
        assert!(instrument.engine().output().events().is_empty());
        assert!(instrument.surface().commands().is_empty());
    }

    #[test]
    fn input_before_generate_is_ignored() {
        let mut instrument: TestInstrument =
            Instrument::new(RecordingSurface::new(), RecordingOutput::new(), config());

        instrument.key_down('a').unwrap();
        instrument.pointer_down(FIRST_KEY).unwrap();
        instrument.pointer_move(FIRST_KEY);

        assert!(!instrument.is_generated());
        assert!(instrument.engine().output().events().is_empty());
        assert!(instrument.surface().commands().is_empty());
    }

    #[test]
    fn rejected_config_keeps_previous_keyboard() {
        let mut instrument = instrument();
        let mut bad = config();
        bad.scale.divisions = 0;

        let err = instrument.generate(bad).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(instrument.layout().unwrap().len(), 13);
        assert_eq!(instrument.config().scale.divisions, 12);
    }

    #[test]
    fn hover_shows_and_clears_the_readout() {
        let mut instrument = instrument();
        instrument.surface_mut().take();

        instrument.pointer_move(FIRST_KEY);
        assert_eq!(instrument.state(0), Some(InteractionState::Hover));
        assert!(instrument.surface().texts().contains(&"440.00"));

        instrument.surface_mut().take();
        instrument.pointer_move(Point::new(5.0, 395.0));
        assert_eq!(instrument.state(0), Some(InteractionState::Up));
        assert!(instrument
            .surface()
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::RestoreRect { .. })));
    }

    #[test]
    fn pointer_press_and_release_return_to_hover() {
        let mut instrument = instrument();

        instrument.pointer_down(FIRST_KEY).unwrap();
        assert_eq!(instrument.state(0), Some(InteractionState::PointerDown));
        assert!(instrument.engine().is_sounding(0));

        instrument.pointer_up(FIRST_KEY);
        assert_eq!(instrument.state(0), Some(InteractionState::Hover));
        assert!(!instrument.engine().is_sounding(0));
    }

    #[test]
    fn resize_resets_held_keys() {
        let mut instrument = instrument();
        instrument.key_down('a').unwrap();

        instrument.resize(600.0, 400.0).unwrap();
        assert_eq!(instrument.state(0), Some(InteractionState::Up));
        assert!(!instrument.engine().is_sounding(0));
        let first = &instrument.layout().unwrap().entries[0];
        assert_eq!(first.shape.extents.min_x, 60.0);

        assert!(instrument.resize(0.0, 400.0).unwrap_err().is_invalid_input());
    }

    #[test]
    fn waveform_and_amplitude_rerender_buffers() {
        let mut instrument = instrument();
        instrument.key_down('a').unwrap();

        instrument.set_waveform(WaveformKind::Triangle);
        assert_eq!(instrument.engine().buffer(0).unwrap().kind(), WaveformKind::Triangle);
        assert_eq!(instrument.state(0), Some(InteractionState::Up));

        instrument.set_amplitude(0.25).unwrap();
        assert_eq!(instrument.engine().buffer(3).unwrap().amplitude(), 0.25);
        assert!(instrument.set_amplitude(1.5).is_err());
        assert_eq!(instrument.config().synth.amplitude, 0.25);
    }

    #[test]
    fn hexagon_mode_binds_digits() {
        let mut instrument = instrument();
        let mut hex = config();
        hex.layout.mode = LayoutMode::Hexagon;
        hex.scale.divisions = 19;
        instrument.generate(hex).unwrap();

        assert_eq!(instrument.layout().unwrap().len(), 20);
        instrument.key_down('0').unwrap();
        assert_eq!(instrument.state(9), Some(InteractionState::Down));
    }

    #[test]
    fn recolouring_repaints_without_resynthesis() {
        let mut instrument = instrument();
        let mut hex = config();
        hex.layout.mode = LayoutMode::Hexagon;
        instrument.generate(hex).unwrap();
        let buffer = Arc::clone(instrument.engine().buffer(0).unwrap());
        instrument.surface_mut().take();

        instrument.set_colors(Rgb::RED, Rgb::WHITE);

        let layout = instrument.layout().unwrap();
        assert_eq!(layout.entries[0].colors.up, Rgb::RED);
        assert_eq!(layout.entries[12].colors.up, Rgb::WHITE);
        assert_eq!(instrument.config().layout.start_color, Rgb::RED);
        assert!(Arc::ptr_eq(&buffer, instrument.engine().buffer(0).unwrap()));
        assert_eq!(instrument.surface().fills()[0], Rgb::RED);
    }

    #[test]
    fn shutdown_stops_everything() {
        let mut instrument = instrument();
        instrument.key_down('a').unwrap();
        instrument.shutdown();

        let output = instrument.engine().output();
        assert!(output.is_closed());
        assert!(matches!(output.events().last(), Some(OutputEvent::Stop { .. })));
    }
}
