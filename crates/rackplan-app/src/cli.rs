//! Command line interface.

use crate::app::{App, AppConfig, AppError};
use crate::shortcuts::ShortcutRegistry;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rackplan", about = "Replay a scripted rack layout session", version)]
pub struct Cli {
    /// Script of input events to replay.
    pub script: PathBuf,

    /// Engine configuration (JSON). Defaults apply when missing.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the resulting layout here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Start from a stored layout with this name.
    #[arg(long, value_name = "NAME")]
    pub load: Option<String>,

    /// Store the resulting layout under this name.
    #[arg(long, value_name = "NAME")]
    pub save: Option<String>,

    /// Directory holding stored layouts.
    #[arg(long, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Print the keyboard shortcuts understood by scripts.
    #[arg(long)]
    pub shortcuts: bool,
}

pub fn run(cli: Cli) -> Result<(), AppError> {
    if cli.shortcuts {
        ShortcutRegistry::print_all();
    }
    let print = cli.out.is_none();
    let config = AppConfig {
        script: cli.script,
        config: cli.config,
        output: cli.out,
        store_dir: cli.store_dir,
        load: cli.load,
        save: cli.save,
    };
    let json = App::run(&config)?;
    if print {
        println!("{json}");
    }
    Ok(())
}
