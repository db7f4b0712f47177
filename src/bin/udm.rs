//! UDM binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use rs_5gc::config::{self, UdmConfig};
use rs_5gc::sbi::nrf::{base_profile, register_and_heartbeat, NrfClient};
use rs_5gc::types::NfType;
use rs_5gc::udm::store::SubscriberStore;
use rs_5gc::udm::{self, UdmState};
use rs_5gc::{logging, sbi};

#[derive(Parser, Debug)]
#[command(author, version, about = "Unified data management (vector service)")]
struct Args {
    /// Path to the UDM YAML configuration
    #[arg(long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config: UdmConfig = match config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(1);
        }
    };
    logging::init(&config.log_level);

    let store = SubscriberStore::default();
    for entry in &config.subscribers {
        match entry.to_subscription() {
            Ok(sub) => store.insert(sub),
            Err(err) => {
                eprintln!("configuration error in subscriber {}: {err}", entry.supi);
                return ExitCode::from(1);
            }
        }
    }

    let cancel = CancellationToken::new();
    sbi::server::cancel_on_ctrl_c(cancel.clone());

    if let Some(nrf_uri) = &config.nrf_uri {
        let profile = base_profile(
            config.nf_instance_id,
            NfType::Udm,
            &format!("http://{}", config.bind_addr),
            config.heartbeat_timer,
            &["nudm-ueau"],
        );
        let nrf = Arc::new(NrfClient::new(nrf_uri.clone()));
        if let Err(err) = register_and_heartbeat(nrf, profile, cancel.clone()).await {
            warn!(error = %err, "NRF registration failed; continuing without registry");
        }
    }

    let state = UdmState::new(store, config.sqn_step);
    match sbi::server::serve(udm::handlers::router(state), config.bind_addr, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "UDM terminated");
            ExitCode::from(2)
        }
    }
}
