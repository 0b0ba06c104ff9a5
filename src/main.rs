use beacon::config::ConfigLoader;
use beacon::engine::LighthouseEngine;
use beacon::ledger::RunLedger;
use beacon::orchestrator::{BatchOptions, Orchestrator};
use beacon::status::{RunState, StatusChannel, StatusEvent};
use beacon::{normalize, report, seeds, Crawler};
use clap::{Parser, Subcommand};
use futures::stream::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;

#[derive(Parser)]
#[command(name = "beacon")]
#[command(version = "0.1.0")]
#[command(about = "Batch page-performance auditor with crawl discovery", long_about = None)]
struct Cli {
    /// Path to the configuration file (JSON/YAML/TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit every URL in the seed list and record the batch
    Run {
        /// Show progress bars (stderr)
        #[arg(short, long, default_value_t = true)]
        progress: bool,
    },
    /// Discover target URLs for a site
    Crawl {
        /// Root URL to discover from
        #[arg(short, long)]
        url: String,

        /// Write the discovered URLs to the seed file (keeps a .bak)
        #[arg(short, long)]
        save: bool,
    },
    /// Restore the seed file from its .bak copy
    Revert,
    /// Empty the run history and regenerate the index page
    Clean,
    /// Validate the configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    let cli = Cli::parse();
    let logger = env_logger::Builder::from_default_env().build();
    let multi = Arc::new(indicatif::MultiProgress::new());

    match cli.command {
        Commands::Run { progress } => {
            if progress {
                indicatif_log_bridge::LogWrapper::new((*multi).clone(), logger)
                    .try_init()
                    .unwrap();
            } else {
                log::set_boxed_logger(Box::new(logger)).unwrap();
                log::set_max_level(log::LevelFilter::Info);
            }

            let config = ConfigLoader::load(cli.config.as_ref())?;
            log::info!("Reading seed list from {:?}", config.seed_file);
            let targets = seeds::load(&config.seed_file).await?;
            if targets.is_empty() {
                anyhow::bail!("Seed list {:?} contains no URLs", config.seed_file);
            }

            let state = Arc::new(RunState::default());
            let channel = StatusChannel::new(config.channel_capacity, state.clone());
            let engine = Arc::new(LighthouseEngine::new(
                &config.lighthouse_bin,
                config.chrome_flags.clone(),
            ));
            let orchestrator = Orchestrator::new(
                engine,
                channel.clone(),
                RunLedger::new(config.ledger_file()),
                state,
                BatchOptions {
                    results_dir: config.results_dir.clone(),
                    audit_timeout: config.audit_timeout(),
                },
            );

            let mut progress_task = None;
            if progress {
                let pb = multi.add(ProgressBar::new(targets.len() as u64));
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
                        .progress_chars("#>-"),
                );

                let mut events = BroadcastStream::new(channel.subscribe());
                progress_task = Some((pb.clone(), tokio::spawn(async move {
                    while let Some(Ok(event)) = events.next().await {
                        match event {
                            StatusEvent::TestStart { url, index, .. } => {
                                pb.set_position(index as u64);
                                pb.set_message(url);
                            }
                            StatusEvent::TestDuration { .. } => pb.inc(1),
                            StatusEvent::BatchFinished { .. } => break,
                            _ => {}
                        }
                    }
                })));
            }

            log::info!("Starting audit batch...");
            let run = orchestrator.run_batch(targets).await?;

            if let Some((pb, task)) = progress_task {
                task.abort();
                pb.finish_with_message("Completed");
            }

            let runs = RunLedger::new(config.ledger_file()).load().await?;
            report::write_index(&config.index_file(), &runs).await?;

            println!("\n✅ Batch Completed:");
            println!("   Pages Audited: {}", run.tests_count());
            println!("   Failures: {}", run.error_count());
            println!("   Domains: {}", run.unique_domains().join(", "));
            println!("   Artifacts: {}", run.report_dir.display());
        }
        Commands::Crawl { url, save } => {
            log::set_boxed_logger(Box::new(logger)).unwrap();
            log::set_max_level(log::LevelFilter::Info);

            let config = ConfigLoader::load(cli.config.as_ref())?;
            let root = normalize::parse_base(&url)?;
            let crawler = Crawler::new(config.http_timeout(), &config.user_agent);

            log::info!("Discovering pages under {root}");
            let targets = crawler.discover(&root).await?;
            println!("Discovered {} pages:", targets.len());
            for target in &targets {
                println!("   {target}");
            }

            if save {
                let content = targets
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
                    + "\n";
                seeds::save_with_backup(&config.seed_file, &content).await?;
                println!("Saved to {:?} (previous list kept as .bak)", config.seed_file);
            }
        }
        Commands::Revert => {
            let config = ConfigLoader::load(cli.config.as_ref())?;
            seeds::revert(&config.seed_file).await?;
            println!("Restored {:?} from backup", config.seed_file);
        }
        Commands::Clean => {
            let config = ConfigLoader::load(cli.config.as_ref())?;
            let ledger = RunLedger::new(config.ledger_file());
            ledger.clear().await?;
            report::write_index(&config.index_file(), &[]).await?;
            println!("Past runs cleaned.");
        }
        Commands::Check => match ConfigLoader::load(cli.config.as_ref()) {
            Ok(config) => {
                println!("✅ Config is valid:");
                println!("   Seed file: {:?}", config.seed_file);
                println!("   Results dir: {:?}", config.results_dir);
                println!("   Audit timeout: {}s", config.audit_timeout_secs);
                println!("   Engine: {}", config.lighthouse_bin);
            }
            Err(e) => {
                eprintln!("❌ Config error: {e}");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
