//! Cantus CLI - assemble and inspect singing-voice-synthesis task setups.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `build` | Load a task YAML, assemble the model, print the component summary |
//! | `options` | Print the task configuration surface |
//! | `vocoder` | Resolve a vocoder for a task and report what was built |

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;

use cantus_core::config::render_conf;
use cantus_core::vocoder::{Device, Vocoder};
use cantus_core::{SvsTask, TaskConfig};

/// Cantus CLI - SVS task assembly and inspection
#[derive(Parser)]
#[command(name = "cantus")]
#[command(about = "Assemble and inspect singing-voice-synthesis task setups", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble the model from a task configuration and print its summary
    Build {
        /// Path to the task configuration YAML
        config: PathBuf,

        /// Write the normalized config snapshot (inlined vocabulary) here
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Print the task configuration surface
    Options,

    /// Resolve a vocoder for an assembled task
    Vocoder {
        /// Path to the task configuration YAML
        config: PathBuf,

        /// Vocoder checkpoint file (omit to fall back to Griffin-Lim)
        #[arg(long)]
        vocoder_file: Option<PathBuf>,

        /// Vocoder configuration YAML
        #[arg(long)]
        vocoder_config: Option<PathBuf>,

        /// Compute device for a pretrained vocoder
        #[arg(long, default_value = "cpu")]
        device: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build { config, snapshot } => build(&config, snapshot.as_deref()),
        Command::Options => options(),
        Command::Vocoder {
            config,
            vocoder_file,
            vocoder_config,
            device,
        } => vocoder(
            &config,
            vocoder_file.as_deref(),
            vocoder_config.as_deref(),
            &device,
        ),
    }
}

fn load_config(path: &std::path::Path) -> Result<TaskConfig> {
    TaskConfig::from_yaml_file(path)
        .with_context(|| format!("failed to load task config {}", path.display()))
}

fn build(config_path: &std::path::Path, snapshot_path: Option<&std::path::Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let (model, snapshot) = SvsTask::build_model(&config).context("model assembly failed")?;

    println!("{}", "Assembled SVS model".bold());
    println!("  model_type:  {}", model.kind.to_string().cyan());
    println!("  vocab_size:  {}", model.vocab_size);
    println!("  odim:        {}", model.odim);
    if let Some(layers) = model.discrete_token_layers {
        println!("  token_layers: {}", layers);
    }
    println!();
    println!("{}", "Components".bold());
    for (slot, label) in model.summary() {
        match label {
            Some(label) => println!("  {:<20} {}", slot, label.green()),
            None => println!("  {:<20} {}", slot, "-".dimmed()),
        }
    }
    println!("  {:<20} {}", "model_conf", render_conf(&model.model_conf));

    if let Some(path) = snapshot_path {
        std::fs::write(path, snapshot.to_yaml()?)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        println!();
        println!("Snapshot written to {}", path.display());
    }
    Ok(())
}

fn options() -> Result<()> {
    println!("{}", "Task configuration surface".bold());
    for option in SvsTask::describe_options() {
        let required = if option.required {
            " (required)".red().to_string()
        } else {
            String::new()
        };
        let default = if option.default.is_empty() {
            String::new()
        } else {
            format!(" [default: {}]", option.default)
        };
        println!("  {:<24}{}{}", option.name.green(), option.help, required);
        if !default.is_empty() {
            println!("  {:<24}{}", "", default.dimmed());
        }
    }
    Ok(())
}

fn vocoder(
    config_path: &std::path::Path,
    vocoder_file: Option<&std::path::Path>,
    vocoder_config: Option<&std::path::Path>,
    device: &str,
) -> Result<()> {
    let config = load_config(config_path)?;
    let device: Device = device.parse()?;
    let (model, _) = SvsTask::build_model(&config).context("model assembly failed")?;

    match SvsTask::build_vocoder_from_file(vocoder_config, vocoder_file, &model, device)? {
        Some(Vocoder::GriffinLim(gl)) => {
            println!("{}: griffin_lim", "Vocoder".bold());
            println!("  n_fft:   {}", gl.n_fft);
            println!("  n_shift: {}", gl.n_shift);
            println!("  fs:      {}", gl.fs);
            println!("  n_iter:  {}", gl.n_iter);
        }
        Some(Vocoder::Pretrained(pretrained)) => {
            println!("{}: pretrained", "Vocoder".bold());
            println!("  checkpoint: {}", pretrained.checkpoint.display());
            println!("  device:     {}", pretrained.device);
        }
        None => {
            println!("{}", "No vocoder available for this setup".yellow());
        }
    }
    Ok(())
}
