use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about,
    help_template(
        "{before-help}{name} {version}\n{author-with-newline}{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}"
    )
)]
pub struct Args {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "gateopt.toml")]
    pub config: PathBuf,

    /// Gate netlist template name (overrides the configuration file).
    #[arg(short, long)]
    pub gate: Option<String>,

    /// Number of training episodes (overrides the configuration file).
    #[arg(short, long)]
    pub episodes: Option<usize>,

    /// Directory to which simulator logs should be saved.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Seed for the exploration RNG (defaults to entropy).
    #[arg(long)]
    pub seed: Option<u64>,
}
