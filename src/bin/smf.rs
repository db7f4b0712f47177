//! SMF binary.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use rs_5gc::config::{self, SmfConfig};
use rs_5gc::sbi::nrf::{base_profile, register_and_heartbeat, NrfClient};
use rs_5gc::smf::ip_pool::IpPool;
use rs_5gc::smf::pfcp_client::PfcpClient;
use rs_5gc::smf::session::SmfService;
use rs_5gc::smf::{self, SmfState};
use rs_5gc::types::{NfInfo, NfType, SmfInfo, Snssai, SnssaiSmfInfoItem};
use rs_5gc::{logging, sbi};

#[derive(Parser, Debug)]
#[command(author, version, about = "Session management function")]
struct Args {
    /// Path to the SMF YAML configuration
    #[arg(long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config: SmfConfig = match config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(1);
        }
    };
    logging::init(&config.log_level);

    let mut pools = HashMap::new();
    for pool in &config.dnn_pools {
        match IpPool::new(&pool.cidr) {
            Ok(p) => {
                pools.insert(pool.dnn.clone(), p);
            }
            Err(err) => {
                eprintln!("configuration error in pool {}: {err}", pool.dnn);
                return ExitCode::from(1);
            }
        }
    }

    let cancel = CancellationToken::new();
    sbi::server::cancel_on_ctrl_c(cancel.clone());

    let pfcp = match PfcpClient::connect(config.upf_n4_addr, config.node_addr, cancel.clone()).await
    {
        Ok(client) => Arc::new(client),
        Err(err) => {
            error!(error = %err, "cannot open PFCP socket");
            return ExitCode::from(2);
        }
    };

    // The UPF may come up after us; keep trying until associated.
    loop {
        match pfcp.associate().await {
            Ok(()) => {
                info!(upf = %config.upf_n4_addr, "PFCP association established");
                break;
            }
            Err(err) => {
                warn!(error = %err, "PFCP association failed; retrying in 5s");
                tokio::select! {
                    _ = cancel.cancelled() => return ExitCode::SUCCESS,
                    _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                }
            }
        }
    }

    if let Some(nrf_uri) = &config.nrf_uri {
        let mut profile = base_profile(
            config.nf_instance_id,
            NfType::Smf,
            &format!("http://{}", config.bind_addr),
            config.heartbeat_timer,
            &["nsmf-pdusession"],
        );
        profile.nf_info = Some(NfInfo::SmfInfo(SmfInfo {
            sm_info_list: vec![SnssaiSmfInfoItem {
                s_nssai: Snssai::new(1),
                dnn_list: config.dnn_pools.iter().map(|p| p.dnn.clone()).collect(),
            }],
            tai_list: vec![],
        }));
        let nrf = Arc::new(NrfClient::new(nrf_uri.clone()));
        if let Err(err) = register_and_heartbeat(nrf, profile, cancel.clone()).await {
            warn!(error = %err, "NRF registration failed; continuing without registry");
        }
    }

    let service = Arc::new(SmfService::new(
        pfcp,
        pools,
        config.ambr_uplink_bps,
        config.ambr_downlink_bps,
    ));
    let state = SmfState { service };
    match sbi::server::serve(smf::handlers::router(state), config.bind_addr, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "SMF terminated");
            ExitCode::from(2)
        }
    }
}
