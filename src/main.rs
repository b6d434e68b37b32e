use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use flamometer::host::run_frames;
use flamometer::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Streak-driven particle flame
#[derive(Parser, Debug)]
#[command(name = "flamometer")]
#[command(about = "Particle flame visualization of a streak against its record", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open an interactive window
    Window(FlameArgs),
    /// Render frames headlessly and save the last one as PNG
    Render {
        #[command(flatten)]
        flame: FlameArgs,

        /// Output file
        #[arg(short, long, default_value = "flame.png")]
        out: PathBuf,

        /// Number of ticks to run before saving
        #[arg(short, long, default_value_t = 120)]
        frames: u64,

        /// Width in logical pixels
        #[arg(long, default_value_t = 200.0)]
        width: f32,

        /// Height in logical pixels
        #[arg(long, default_value_t = 384.0)]
        height: f32,

        /// Physical pixels per logical pixel
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
    },
}

#[derive(Args, Debug)]
struct FlameArgs {
    /// Current streak
    #[arg(short, long, default_value_t = 7)]
    streak: i64,

    /// Longest streak on record
    #[arg(short, long, default_value_t = 21)]
    max_streak: i64,

    /// Paint a radial glow behind the flame
    #[arg(short, long)]
    backdrop: bool,

    /// Random seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

impl FlameArgs {
    fn config(&self) -> FlameConfig {
        let config = FlameConfig::new().with_backdrop_glow(self.backdrop);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    fn input(&self) -> StreakInput {
        StreakInput::new(self.streak, self.max_streak)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flamometer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Command::Window(flame) => {
            flamometer::window::run(flame.config(), flame.input()).map_err(Into::into)
        }
        Command::Render {
            flame,
            out,
            frames,
            width,
            height,
            scale,
        } => render(&flame, &out, frames, Vec2::new(width, height), scale),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn render(
    flame: &FlameArgs,
    out: &Path,
    frames: u64,
    size: Vec2,
    scale: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mounted = Mounted::mount(
        ManualHost::new(size, scale),
        Some(PixelSurface::new(size.x, size.y, scale)),
        flame.config(),
        flame.input(),
    );

    if let Some(report) = run_frames(&mut mounted, frames) {
        tracing::info!(
            frame = report.frame,
            particles = report.alive,
            intensity = report.params.intensity,
            "render finished"
        );
    }

    let surface = mounted.surface().ok_or("nothing to render: empty container")?;
    flamometer::export::save_png(surface, out)?;
    Ok(())
}
