use std::fs::canonicalize;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agent::QAgent;
use crate::cli::args::Args;
use crate::config::parse_config;
use crate::opt::{optimize, OptimizeOpts};
use crate::sim::ngspice::{Ngspice, NgspiceParams};
use crate::space::DesignSpace;
use crate::Result;

pub mod args;

pub const BANNER: &str = r"
  ___   __  ____  ____  __  ____  ____
 / __) / _\(_  _)(  __)/  \(  _ \(_  _)
( (_ \/    \ )(   ) _)(  O )) __/  )(
 \___/\_/\_/(__) (____)\__/(__)   (__)

GATEOPT v0.1
";

pub fn run() -> Result<()> {
    let args = Args::parse();

    let config_path = canonicalize(&args.config)?;

    println!("{BANNER}");

    println!("Reading configuration file...\n");
    let mut config = parse_config(&config_path)?;
    if let Some(gate) = args.gate {
        config.gate = gate;
    }
    if let Some(episodes) = args.episodes {
        config.episodes = episodes;
    }

    println!("Configuration file: {:?}", &config_path);
    println!("Optimization parameters:");
    println!("\tGate: {}", config.gate);
    println!("\tGrid size: {}", config.grid_size);
    println!("\tEpisodes: {}", config.episodes);
    println!("\tSteps per episode: {}", config.steps_per_episode);

    if config.grid_size < 2 {
        anyhow::bail!("grid_size must be at least 2, got {}", config.grid_size);
    }
    if config.nmos.min >= config.nmos.max || config.pmos.min >= config.pmos.max {
        anyhow::bail!("width bounds must satisfy min < max");
    }

    let template = config.template_path();
    if !template.is_file() {
        anyhow::bail!("gate netlist template {:?} not found", template);
    }

    let work_dir = args.output_dir.unwrap_or_else(|| PathBuf::from("build"));
    std::fs::create_dir_all(&work_dir)?;
    let work_dir = canonicalize(work_dir)?;

    let sim = Ngspice::new(
        NgspiceParams::builder()
            .template(template)
            .param_file(config.param_file())
            .work_dir(work_dir)
            .command(config.command.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .vdd(config.vdd)
            .length(config.length)
            .build()?,
    );

    let mut env = DesignSpace::new(
        sim,
        config.nmos,
        config.pmos,
        config.initial,
        config.grid_size,
    );
    let mut agent = match args.seed {
        Some(seed) => QAgent::seeded(env.num_states(), seed),
        None => QAgent::new(env.num_states()),
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };

    let opts = OptimizeOpts {
        episodes: config.episodes,
        steps_per_episode: config.steps_per_episode,
        reset_every: config.reset_every,
    };

    let pb = ProgressBar::new(opts.episodes as u64);
    pb.set_style(ProgressStyle::with_template(
        "[{bar:40}] {pos}/{len} episodes {msg}",
    )?);
    let summary = optimize(&mut env, &mut agent, &opts, &mut rng, Some(&pb));
    pb.finish_and_clear();

    println!("\n{}", "=".repeat(60));
    println!(
        "{}",
        format!("Optimization complete: {}", config.gate.to_uppercase()).bold()
    );
    println!("{}", "=".repeat(60));

    match &summary.best {
        Some(best) => {
            println!("{}", "Best sizing found:".green().bold());
            println!("\tWn: {:.3} um", best.sizing.w_n * 1e6);
            println!("\tWp: {:.3} um", best.sizing.w_p * 1e6);
            println!("Electrical performance:");
            println!("\tAverage delay: {:.2} ps", best.record.avg_delay() * 1e12);
            println!("\tDynamic power: {:.2} uW", best.record.dynamic_power * 1e6);
            println!("\tStatic power: {:.2} nW", best.record.static_power * 1e9);
            println!("\tReward: {:.2}", best.reward);
        }
        None => println!("No simulation data available."),
    }
    println!("Distinct simulations: {}", summary.simulations);

    let fallbacks = env.evaluator().fallback_count();
    if fallbacks > 0 {
        println!(
            "{}",
            format!(
                "Warning: {fallbacks} evaluation(s) used fallback metrics; \
                 check that `{}` is installed and the netlist deck is valid.",
                config.command
            )
            .yellow()
        );
    }

    Ok(())
}
