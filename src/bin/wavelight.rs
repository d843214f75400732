//! Command line relighting of precomputed scenes.
//!
//! ```bash
//! wavelight render --scene scenes/bunny --environment-root envs --environment grace -o out.png
//! wavelight sweep --scene scenes/bunny --environment-root envs --environment grace -k 8 -k 64
//! ```

use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process;

use wavelight::{
    metrics, write_rgb_png, Basis, EnvironmentMap, FileSystem, ImportancePolicy, Relighter, Scene,
    Settings,
};

#[derive(Parser)]
#[command(name = "wavelight", version, about = "Wavelet relighting of precomputed scenes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one relit frame to a PNG file
    Render {
        #[command(flatten)]
        inputs: Inputs,
        /// Number of lighting terms to sum
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Report the error of several term counts against the full sum
    Sweep {
        #[command(flatten)]
        inputs: Inputs,
        /// Term counts to evaluate
        #[arg(short = 'k', long = "top-k", required = true)]
        top_k: Vec<usize>,
    },
}

#[derive(Args)]
struct Inputs {
    /// Folder of numbered basis images
    #[arg(long)]
    scene: PathBuf,
    /// Folder holding one sub-folder per environment
    #[arg(long)]
    environment_root: PathBuf,
    /// Environment to light the scene with
    #[arg(long)]
    environment: String,
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Importance policy: naive or weighted
    #[arg(long)]
    policy: Option<ImportancePolicy>,
    /// Lighting basis: pixel or haar
    #[arg(long)]
    basis: Option<Basis>,
    /// Environment rotation in texel rows
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    rotate: isize,
}

fn initialize_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn setup(inputs: &Inputs) -> wavelight::Result<Relighter> {
    let mut settings = match &inputs.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    if let Some(policy) = inputs.policy {
        settings.policy = policy;
    }

    if let Some(basis) = inputs.basis {
        settings.basis = basis;
    }

    let scene = Scene::build(&FileSystem, &inputs.scene, &settings)?;
    let environment = EnvironmentMap::load(
        &FileSystem,
        &inputs.environment_root,
        &inputs.environment,
        &settings,
    )?;

    let mut relighter = Relighter::new(settings, scene, environment)?;
    relighter.rotate_environment(inputs.rotate);

    Ok(relighter)
}

fn run(cli: Cli) -> wavelight::Result<()> {
    match cli.command {
        Commands::Render {
            inputs,
            top_k,
            output,
        } => {
            let mut relighter = setup(&inputs)?;

            if let Some(top_k) = top_k {
                relighter.set_top_k(top_k);
            }

            let frame = relighter.render_frame()?;
            write_rgb_png(&output, frame.width, frame.height, &frame.pixels)?;

            info!(
                "rendered {} terms in {:.0} us to {}",
                frame.statistics.terms,
                frame.statistics.frame_time_us,
                output.display()
            );
        }
        Commands::Sweep { inputs, top_k } => {
            let mut relighter = setup(&inputs)?;

            let total = relighter.set_top_k(usize::MAX);
            let reference = relighter.render_frame()?;

            println!("{:>8} {:>12} {:>10}", "terms", "time (us)", "psnr (dB)");

            for requested in top_k {
                relighter.set_top_k(requested);
                let frame = relighter.render_frame()?;
                let psnr = metrics::psnr(&reference.pixels, &frame.pixels)?;

                println!(
                    "{:>8} {:>12.0} {:>10.2}",
                    frame.statistics.terms, frame.statistics.frame_time_us, psnr
                );
            }

            println!("{:>8} {:>12.0} {:>10}", total, reference.statistics.frame_time_us, "ref");
        }
    }

    Ok(())
}

fn main() {
    initialize_logging();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
