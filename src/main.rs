use anyhow::Context;
use clap::Parser;

use codegauge::app::GaugeApp;
use codegauge::cli::{Cli, Commands};
use codegauge::config::TomlConfigProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    // RUST_LOG still wins over the flags
    env_logger::Builder::new()
        .filter_level(verbosity.log_level())
        .parse_default_env()
        .init();

    let mut provider = TomlConfigProvider::new();
    if let Some(path) = &cli.config {
        provider = provider.with_config_file(path.clone());
    }

    let app = GaugeApp::new(provider).with_verbosity(verbosity);

    match cli.command {
        Commands::Analyze(args) => {
            let (_, rendered) = app
                .analyze(&args)
                .await
                .with_context(|| format!("analysis of {} failed", args.path.display()))?;

            if args.output.is_none() {
                println!("{}", rendered);
            }
        }
        Commands::Tools(args) => {
            let cwd = std::env::current_dir().context("cannot read current directory")?;
            let listing = app.tools(&cwd, &args).await?;
            println!("{}", listing.trim_end());
        }
    }

    Ok(())
}
