use clap::Parser;
use erin_cli::cli::{Cli, Commands};
use erin_cli::commands;
use erin_cli::common::init_logging;
use tracing::{error, Level};

/// Each `-v` drops the effective log level by one step (info -> debug ->
/// trace), never going past trace.
fn bump_verbosity(level: Level, verbose: u8) -> Level {
    let steps = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];
    let current = steps.iter().position(|&l| l == level).unwrap_or(2);
    steps[(current + verbose as usize).min(steps.len() - 1)]
}

fn main() {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Commands::Run { verbose, .. } => *verbose,
        _ => 0,
    };
    init_logging(bump_verbosity(cli.log_level, verbose));

    let result = match &cli.command {
        Commands::Run { toml_file, events, stats, step_h, verbose: _, no_aggregate, reliability_curves } => {
            let _ = step_h;
            commands::run(toml_file, events.as_deref(), stats.as_deref(), *no_aggregate, *reliability_curves)
        }
        Commands::Graph { toml_file, out, stats } => commands::graph(toml_file, out.as_deref(), *stats),
        Commands::Check { toml_file } => commands::check(toml_file),
        Commands::Update { in_toml, out_toml, summary } => {
            commands::update(in_toml, out_toml.as_deref(), *summary)
        }
        Commands::PackLoads { toml_file, out } => commands::pack_loads(toml_file, out.as_deref()),
        Commands::Version => {
            commands::version();
            Ok(())
        }
        Commands::Limits => {
            commands::limits();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
