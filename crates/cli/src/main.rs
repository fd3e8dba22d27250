use anyhow::Result;
use clap::{Parser, Subcommand};
use listing_pulse_core::ConfigLoader;
use listing_pulse_scheduler::{PipelineOutcome, PublicationPipeline, PublicationScheduler};
use tracing::info;

#[derive(Parser)]
#[command(name = "listing-pulse")]
#[command(about = "Listing price-change reporting and channel publication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the publication scheduler (daemon mode)
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Run one publication immediately
    Publish {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Render the report without sending it
    Report {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let config = ConfigLoader::load_from(&config)?;
            PublicationScheduler::new(config).start().await
        }
        Commands::Publish { config } => {
            let config = ConfigLoader::load_from(&config)?;
            let pipeline = PublicationPipeline::new(config);
            match pipeline.run_once().await? {
                PipelineOutcome::NoData => {
                    info!("nothing to publish");
                    Ok(())
                }
                PipelineOutcome::Published(delivery) => {
                    info!(
                        delivered = delivery.delivered_count(),
                        failed = delivery.failed_count(),
                        "publication finished"
                    );
                    Ok(())
                }
            }
        }
        Commands::Report { config, output } => {
            let config = ConfigLoader::load_from(&config)?;
            let pipeline = PublicationPipeline::new(config);
            match pipeline.render_report().await? {
                None => {
                    info!("no price-change data available");
                    Ok(())
                }
                Some(report) => {
                    if let Some(path) = output {
                        std::fs::write(&path, &report)?;
                        info!("report written to {path}");
                    } else {
                        println!("{report}");
                    }
                    Ok(())
                }
            }
        }
    }
}
