//! AMF binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use rs_5gc::amf::registration::{AmfPolicy, AmfService};
use rs_5gc::amf::{self, AmfState};
use rs_5gc::config::{self, AmfConfig};
use rs_5gc::sbi::nrf::{base_profile, register_and_heartbeat, NrfClient};
use rs_5gc::types::{AmfInfo, Guami, NfInfo, NfType, Tai};
use rs_5gc::{logging, sbi};

#[derive(Parser, Debug)]
#[command(author, version, about = "Access and mobility management function")]
struct Args {
    /// Path to the AMF YAML configuration
    #[arg(long)]
    config: PathBuf,
}

async fn resolve_ausf(config: &AmfConfig) -> String {
    if let Some(nrf_uri) = &config.nrf_uri {
        let nrf = NrfClient::new(nrf_uri.clone());
        match nrf.discover(NfType::Ausf).await {
            Ok(profiles) => {
                if let Some(base) = profiles
                    .iter()
                    .flat_map(|p| p.nf_services.iter())
                    .find_map(|svc| svc.api_prefix.clone())
                {
                    info!(ausf = %base, "AUSF discovered via NRF");
                    return base;
                }
            }
            Err(err) => warn!(error = %err, "AUSF discovery failed; using configured URI"),
        }
    }
    config.ausf_uri.clone()
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config: AmfConfig = match config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(1);
        }
    };
    if let Err(err) = config.plmn.validate() {
        eprintln!("configuration error: {err}");
        return ExitCode::from(1);
    }
    logging::init(&config.log_level);

    let cancel = CancellationToken::new();
    sbi::server::cancel_on_ctrl_c(cancel.clone());

    let guami = Guami {
        plmn_id: config.plmn.clone(),
        amf_region_id: config.amf_region_id.clone(),
        amf_set_id: config.amf_set_id.clone(),
        amf_pointer: config.amf_pointer.clone(),
    };
    let tai = Tai {
        plmn_id: config.plmn.clone(),
        tac: config.tac.clone(),
    };
    let policy = AmfPolicy {
        guami: guami.clone(),
        tai: tai.clone(),
        supported_nssai: config.supported_nssai.clone(),
        default_nssai: config.default_nssai.clone(),
        integrity_order: config.integrity_order.clone(),
        ciphering_order: config.ciphering_order.clone(),
        t3512_secs: config.t3512_secs,
    };

    let ausf_base = resolve_ausf(&config).await;
    let service = Arc::new(AmfService::new(
        ausf_base,
        config.plmn.serving_network_name(),
        policy,
    ));

    if let Some(nrf_uri) = &config.nrf_uri {
        let mut profile = base_profile(
            config.nf_instance_id,
            NfType::Amf,
            &format!("http://{}", config.bind_addr),
            config.heartbeat_timer,
            &["namf-comm"],
        );
        profile.plmn_id = Some(config.plmn.clone());
        profile.s_nssais = config.supported_nssai.clone();
        profile.nf_info = Some(NfInfo::AmfInfo(AmfInfo {
            amf_set_id: config.amf_set_id.clone(),
            amf_region_id: config.amf_region_id.clone(),
            guami_list: vec![guami],
            tai_list: vec![tai],
        }));
        let nrf = Arc::new(NrfClient::new(nrf_uri.clone()));
        if let Err(err) = register_and_heartbeat(nrf, profile, cancel.clone()).await {
            warn!(error = %err, "NRF registration failed; continuing without registry");
        }
    }

    let state = AmfState { service };
    match sbi::server::serve(amf::handlers::router(state), config.bind_addr, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "AMF terminated");
            ExitCode::from(2)
        }
    }
}
