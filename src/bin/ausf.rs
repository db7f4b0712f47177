//! AUSF binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use rs_5gc::ausf::handlers::AusfState;
use rs_5gc::ausf::{self, AusfService};
use rs_5gc::config::{self, AusfConfig};
use rs_5gc::sbi::nrf::{base_profile, register_and_heartbeat, NrfClient};
use rs_5gc::types::NfType;
use rs_5gc::{logging, sbi};

#[derive(Parser, Debug)]
#[command(author, version, about = "Authentication server function (5G-AKA)")]
struct Args {
    /// Path to the AUSF YAML configuration
    #[arg(long)]
    config: PathBuf,
}

/// NRF discovery first, configured URI as fallback.
async fn resolve_udm(config: &AusfConfig) -> String {
    if let Some(nrf_uri) = &config.nrf_uri {
        let nrf = NrfClient::new(nrf_uri.clone());
        match nrf.discover(NfType::Udm).await {
            Ok(profiles) => {
                if let Some(base) = profiles
                    .iter()
                    .flat_map(|p| p.nf_services.iter())
                    .find_map(|svc| svc.api_prefix.clone())
                {
                    info!(udm = %base, "UDM discovered via NRF");
                    return base;
                }
            }
            Err(err) => warn!(error = %err, "UDM discovery failed; using configured URI"),
        }
    }
    config.udm_uri.clone()
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config: AusfConfig = match config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(1);
        }
    };
    logging::init(&config.log_level);

    let cancel = CancellationToken::new();
    sbi::server::cancel_on_ctrl_c(cancel.clone());

    let udm_base = resolve_udm(&config).await;
    let service = Arc::new(AusfService::new(
        udm_base,
        Duration::from_secs(config.context_ttl_secs),
        config.hashed_res_star,
    ));
    ausf::spawn_janitor(service.contexts().clone(), cancel.clone());

    if let Some(nrf_uri) = &config.nrf_uri {
        let profile = base_profile(
            config.nf_instance_id,
            NfType::Ausf,
            &format!("http://{}", config.bind_addr),
            config.heartbeat_timer,
            &["nausf-auth"],
        );
        let nrf = Arc::new(NrfClient::new(nrf_uri.clone()));
        if let Err(err) = register_and_heartbeat(nrf, profile, cancel.clone()).await {
            warn!(error = %err, "NRF registration failed; continuing without registry");
        }
    }

    let state = AusfState { service };
    match sbi::server::serve(ausf::handlers::router(state), config.bind_addr, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "AUSF terminated");
            ExitCode::from(2)
        }
    }
}
