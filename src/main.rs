use clap::Parser;
use grafana_datasource_state::{
    Args, Command, config, metrics,
    runner::{Runner, ensure_succeeded},
    state::State,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup tracing, stdout is reserved for results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    // Register metrics
    if args.metrics_file.is_some() {
        metrics::register_metrics()?;
    }

    // Parse config
    let config = config::Config::from_file(&args.config)?;
    let runner = Runner::new(config, args.test);

    let outcome = run(&runner, args.command).await;

    if let Some(path) = &args.metrics_file {
        metrics::process::record_run_finished();
        metrics::write_textfile(path)?;
    }

    outcome
}

async fn run(runner: &Runner, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Present(present) => {
            let ret = runner.apply(&State::Present(present)).await?;
            println!("{}", serde_json::to_string_pretty(&ret)?);
        }
        Command::Absent(absent) => {
            let ret = runner.apply(&State::Absent(absent)).await?;
            println!("{}", serde_json::to_string_pretty(&ret)?);
        }
        Command::Apply { states } => {
            let results = runner.apply_file(&states).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);

            ensure_succeeded(&results)?;
        }
    }

    Ok(())
}
