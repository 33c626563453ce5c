//! chatline terminal client.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use chatline_client::runtime::{self, ClientConfig};

#[derive(Debug, Parser)]
#[command(name = "chatline", about = "Terminal chat client")]
struct Args {
    /// Server address (`host:port`, or a full `ws://` URL).
    addr: String,

    /// Upgrade path on the server.
    #[arg(long, default_value = "/chat")]
    path: String,

    /// Write logs here. The terminal belongs to the UI, so logging is off without it.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        match std::fs::File::create(path) {
            Ok(file) => fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init(),
            Err(e) => {
                eprintln!("chatline: cannot open log file {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let mut terminal = ratatui::init();
    let result = runtime::run(ClientConfig::new(&args.addr, &args.path), &mut terminal).await;
    ratatui::restore();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("chatline: {e}");
            ExitCode::FAILURE
        }
    }
}
