use anyhow::Context;
use clap::Parser;
use rtprep_config::RtPrepConfig;

mod cli;
mod commands;
mod output;
mod progress;
mod report;
mod ui;

fn main() {
    if let Err(error) = run() {
        eprintln!("rtprep error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    ui::init(&flags);

    let mut config = RtPrepConfig::load_with_dotenv().context("failed to load rtprep configuration")?;
    if let Some(workdir) = &flags.workdir {
        anyhow::ensure!(
            workdir.is_dir(),
            "invalid --workdir '{}': directory does not exist",
            workdir.display()
        );
        config.workspace.folder.clone_from(workdir);
    }

    match &cli.command {
        cli::Commands::Run(args) => commands::run::handle(args, &config, &flags),
        cli::Commands::Config => commands::config::handle(&config, &flags),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("RTPREP_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
