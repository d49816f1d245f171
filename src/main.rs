//! # POS Bridge CLI
//!
//! Runs the local hardware bridge, or exercises the printer adapter
//! directly.
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP API (and polling, if configured)
//! posbridge
//! posbridge serve --config /etc/posbridge/config.json
//!
//! # List printers the OS knows about
//! posbridge printers
//!
//! # Print a local PDF
//! posbridge print invoice.pdf --printer Receipt
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use posbridge::{
    BridgeError,
    artifact::ArtifactStore,
    backend::HttpBackend,
    config::{self, BridgeConfig},
    dispatch::JobDispatcher,
    display::DisplayHub,
    kiosk,
    printer::{CommandPrinter, Platform, PrintAdapter},
    scheduler::PollScheduler,
    server::{self, AppState},
};

/// POS Bridge - local printer, drawer and display bridge
#[derive(Parser, Debug)]
#[command(name = "posbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to config.json next to the executable)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API and the job poller (default)
    Serve {
        /// Listen address, overriding the configured port
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// List available printers
    Printers,

    /// Print a PDF file
    Print {
        /// PDF file to print
        file: PathBuf,

        /// Printer name
        #[arg(long)]
        printer: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    std::panic::set_hook(Box::new(|panic| {
        error!(%panic, "panic");
    }));

    if let Err(e) = run().await {
        error!(error = %e, "fatal");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BridgeError> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = BridgeConfig::load(&config_path);

    let adapter: Arc<dyn PrintAdapter> = Arc::new(CommandPrinter::system(
        Platform::detect(config.sumatra_path.clone()),
        config.print_timeout,
    ));

    match cli.command.unwrap_or(Commands::Serve { listen: None }) {
        Commands::Serve { listen } => serve(config, adapter, listen).await,

        Commands::Printers => {
            for name in adapter.list_printers().await? {
                println!("{}", name);
            }
            Ok(())
        }

        Commands::Print { file, printer } => {
            adapter.print_file(&file, &printer).await?;
            println!("Sent {} to {}", file.display(), printer);
            Ok(())
        }
    }
}

async fn serve(
    config: BridgeConfig,
    adapter: Arc<dyn PrintAdapter>,
    listen: Option<String>,
) -> Result<(), BridgeError> {
    let store = match &config.temp_dir {
        Some(dir) => ArtifactStore::new(dir.clone(), config.cleanup_delay),
        None => ArtifactStore::in_temp_dir(config.cleanup_delay),
    };
    let dispatcher = Arc::new(JobDispatcher::new(store, adapter));
    let display = DisplayHub::new();

    let polling = match &config.polling {
        Some(polling) => match HttpBackend::new(&polling.backend_url, config.http_timeout) {
            Ok(backend) => {
                let scheduler =
                    PollScheduler::new(Arc::new(backend), Arc::clone(&dispatcher), polling.interval)
                        .with_display(display.clone(), config.alert_sound_enabled);
                Arc::new(scheduler).spawn();
                true
            }
            Err(e) => {
                warn!(error = %e, "backend polling disabled");
                false
            }
        },
        None => {
            info!("no backend URL configured, polling disabled");
            false
        }
    };

    let listen_addr = listen.unwrap_or_else(|| config.listen_addr());
    let listener = server::bind(&listen_addr).await?;
    let bound = listener.local_addr()?;

    kiosk::launch_customer_view(&config.customer_view, bound);

    let state = Arc::new(
        AppState::new(config, dispatcher)
            .with_display(display)
            .with_polling(polling),
    );
    server::serve(state, listener).await
}
