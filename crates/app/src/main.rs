#[cfg(feature = "device")]
mod device;

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use microtone_core::{
    synthesize, AppConfig, AudioOutput, EqualDivision, Instrument, LayoutMode, MicrotoneError,
    RecordingOutput, RecordingSurface, ScaleConfig, ScaleProvider, ToneAnalyser, WaveformKind,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> microtone_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Commands::Layout => run_layout(config),
        Commands::Render { output } => run_render(config, &output),
        Commands::Play {
            keys,
            hold_ms,
            device,
        } => run_play(config, &keys, Duration::from_millis(hold_ms), device),
        Commands::Inspect { index } => run_inspect(&config, index),
    }
}

fn run_layout(config: AppConfig) -> microtone_core::Result<()> {
    let instrument = generate(RecordingSurface::new(), RecordingOutput::new(), config)?;
    let Some(layout) = instrument.layout() else {
        return Ok(());
    };

    info!(mode = %layout.mode, keys = layout.len(), width = layout.width, "layout built");
    for entry in &layout.entries {
        let extents = entry.shape.extents;
        println!(
            "{:>3}  {:<16} {:<3} {:>9}  x {:>7.1}..{:<7.1} y {:>6.1}..{:<6.1}",
            entry.index,
            format!("{:?}", entry.kind()),
            entry.key().map(String::from).unwrap_or_default(),
            entry.shape.label,
            extents.min_x,
            extents.max_x,
            extents.min_y,
            extents.max_y,
        );
    }
    Ok(())
}

fn run_render(config: AppConfig, output: &PathBuf) -> microtone_core::Result<()> {
    let instrument = generate(RecordingSurface::new(), RecordingOutput::new(), config)?;
    let surface = instrument.surface();
    std::fs::write(output, surface.to_json()?)?;
    info!(?output, commands = surface.commands().len(), "wrote drawing commands");
    Ok(())
}

fn run_play(
    config: AppConfig,
    keys: &str,
    hold: Duration,
    device: bool,
) -> microtone_core::Result<()> {
    if device {
        return play_on_device(config, keys, hold);
    }

    let mut instrument = generate(RecordingSurface::new(), RecordingOutput::new(), config)?;
    press_each(&mut instrument, keys, Duration::ZERO)?;
    for event in instrument.engine().output().events() {
        info!(?event, "output");
    }
    instrument.shutdown();
    Ok(())
}

#[cfg(feature = "device")]
fn play_on_device(mut config: AppConfig, keys: &str, hold: Duration) -> microtone_core::Result<()> {
    let output = device::DeviceOutput::open()?;
    config.synth.sample_rate = output.sample_rate();
    let mut instrument = generate(RecordingSurface::new(), output, config)?;
    press_each(&mut instrument, keys, hold)?;
    instrument.shutdown();
    Ok(())
}

#[cfg(not(feature = "device"))]
fn play_on_device(_config: AppConfig, _keys: &str, _hold: Duration) -> microtone_core::Result<()> {
    Err(MicrotoneError::Audio("built without the `device` feature".into()))
}

fn press_each<A: AudioOutput>(
    instrument: &mut Instrument<RecordingSurface, A>,
    keys: &str,
    hold: Duration,
) -> microtone_core::Result<()> {
    for key in keys.chars().filter(|c| !c.is_whitespace()) {
        instrument.key_down(key)?;
        if !hold.is_zero() {
            std::thread::sleep(hold);
        }
        instrument.key_up(key);
    }
    Ok(())
}

fn run_inspect(config: &AppConfig, index: usize) -> microtone_core::Result<()> {
    let frequencies =
        EqualDivision.frequencies(config.scale.reference_pitch, config.scale.divisions)?;
    let frequency = *frequencies.get(index).ok_or_else(|| {
        MicrotoneError::invalid(format!(
            "index {index} is outside the scale ({} notes)",
            frequencies.len()
        ))
    })?;

    let synth = &config.synth;
    let buffer = synthesize(
        synth.sample_rate,
        synth.sample_count,
        frequency,
        synth.amplitude,
        synth.waveform,
    );
    let summary = ToneAnalyser::new().summarize(&buffer)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn generate<A: AudioOutput>(
    surface: RecordingSurface,
    output: A,
    config: AppConfig,
) -> microtone_core::Result<Instrument<RecordingSurface, A>> {
    let mut instrument = Instrument::new(surface, output, config.clone());
    instrument.generate(config)?;
    Ok(instrument)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Microtonal keyboard synthesiser", long_about = None)]
struct Cli {
    /// JSON configuration file; defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Reference pitch in Hz, overriding the config.
    #[arg(long, global = true)]
    pitch: Option<String>,
    /// Number of equal divisions of the octave, overriding the config.
    #[arg(long, global = true)]
    divisions: Option<String>,
    /// Key layout, `piano` or `hexagon`.
    #[arg(long, global = true)]
    layout: Option<LayoutMode>,
    /// Waveform used for note buffers.
    #[arg(long, global = true)]
    waveform: Option<WaveformKind>,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn resolve_config(&self) -> microtone_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if self.pitch.is_some() || self.divisions.is_some() {
            let pitch = self
                .pitch
                .clone()
                .unwrap_or_else(|| config.scale.reference_pitch.to_string());
            let divisions = self
                .divisions
                .clone()
                .unwrap_or_else(|| config.scale.divisions.to_string());
            config.scale = ScaleConfig::parse(&pitch, &divisions)?;
        }
        if let Some(mode) = self.layout {
            config.layout.mode = mode;
        }
        if let Some(kind) = self.waveform {
            config.synth.waveform = kind;
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one row per key of the configured layout.
    Layout,
    /// Draw the keyboard and save the drawing commands as JSON.
    Render {
        /// Destination for the recorded commands.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Press and release each character of `keys` in turn.
    Play {
        /// Characters bound to keys, e.g. `awsedf`.
        keys: String,
        /// How long each key is held when playing on a device.
        #[arg(long, default_value_t = 400)]
        hold_ms: u64,
        /// Send notes to the default output device.
        #[arg(long)]
        device: bool,
    },
    /// Synthesize one scale degree and report its measured properties.
    Inspect {
        /// Scale degree, 0 being the reference pitch.
        index: usize,
    },
}
