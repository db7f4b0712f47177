//! NRF binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::error;

use rs_5gc::config::{self, NrfConfig};
use rs_5gc::nrf::{self, NrfState};
use rs_5gc::{logging, sbi};

#[derive(Parser, Debug)]
#[command(author, version, about = "NF repository function (service registry)")]
struct Args {
    /// Path to the NRF YAML configuration
    #[arg(long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config: NrfConfig = match config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(1);
        }
    };
    logging::init(&config.log_level);

    let cancel = CancellationToken::new();
    sbi::server::cancel_on_ctrl_c(cancel.clone());

    let state = NrfState::new();
    nrf::spawn_sweeper(
        state.clone(),
        Duration::from_secs(config.sweep_interval_secs),
        cancel.clone(),
    );

    match sbi::server::serve(nrf::handlers::router(state), config.bind_addr, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "NRF terminated");
            ExitCode::from(2)
        }
    }
}
