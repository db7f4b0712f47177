//! UPF binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::error;

use rs_5gc::config::{self, UpfConfig};
use rs_5gc::logging;
use rs_5gc::sbi;
use rs_5gc::upf::forwarder::{self, ForwarderCore};
use rs_5gc::upf::{pfcp_server, UpfState};

#[derive(Parser, Debug)]
#[command(author, version, about = "User plane function (PFCP + GTP-U)")]
struct Args {
    /// Path to the UPF YAML configuration
    #[arg(long)]
    config: PathBuf,
}

async fn bind(addr: std::net::SocketAddr, what: &str) -> Result<Arc<UdpSocket>, ExitCode> {
    match UdpSocket::bind(addr).await {
        Ok(socket) => Ok(Arc::new(socket)),
        Err(err) => {
            error!(%addr, error = %err, "cannot bind {what} socket");
            Err(ExitCode::from(2))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config: UpfConfig = match config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(1);
        }
    };
    logging::init(&config.log_level);

    let cancel = CancellationToken::new();
    sbi::server::cancel_on_ctrl_c(cancel.clone());

    let n4_socket = match bind(config.n4_bind, "N4").await {
        Ok(socket) => socket,
        Err(code) => return code,
    };
    let n3_socket = match bind(config.n3_bind, "N3").await {
        Ok(socket) => socket,
        Err(code) => return code,
    };
    let n6_socket = match bind(config.n6_bind, "N6").await {
        Ok(socket) => socket,
        Err(code) => return code,
    };

    let state = UpfState::new(config.n3_addr);
    let core = ForwarderCore::new(state.sessions.clone(), state.stats.clone());

    pfcp_server::spawn_heartbeat(
        state.clone(),
        n4_socket.clone(),
        Duration::from_secs(config.heartbeat_interval_secs),
        cancel.clone(),
    );

    let n4 = pfcp_server::run(state.clone(), n4_socket, cancel.clone());
    let n3 = forwarder::run_n3(
        core.clone(),
        n3_socket.clone(),
        n6_socket.clone(),
        config.n6_peer,
        cancel.clone(),
    );
    let n6 = forwarder::run_n6(core, n3_socket, n6_socket, cancel.clone());

    match tokio::try_join!(n4, n3, n6) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "UPF terminated");
            ExitCode::from(2)
        }
    }
}
