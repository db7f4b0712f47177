//! # rs-5gc
//!
//! A Rust implementation of the control-plane core of a 5G Service-Based
//! Architecture: a federation of Network Functions that authenticate
//! subscribers, register UEs, establish PDU sessions, and program a
//! user-plane forwarder.
//!
//! The crate hosts six NF roles, each runnable as its own binary:
//!
//! - **NRF**: service registry with heartbeat liveness, discovery, and
//!   change notifications (`nnrf-nfm` / `nnrf-disc`).
//! - **UDM**: MILENAGE authentication vector generation with per-SUPI SQN
//!   management (`nudm-ueau`).
//! - **AUSF**: two-phase 5G-AKA orchestration with expiring auth contexts
//!   (`nausf-auth`).
//! - **AMF**: UE context store and security-gated registration state
//!   machine.
//! - **SMF**: PDU session lifecycle, DNN IP pools, and PFCP session
//!   programming (`nsmf-pdusession`).
//! - **UPF**: PFCP (N4) server and GTP-U (N3) forwarder with PDR/FAR/QER
//!   rule evaluation.
//!
//! The NFs talk over three planes: SBI (HTTP/JSON, [`sbi`]), N4
//! (PFCP/UDP, [`pfcp`]), and N3 (GTP-U/UDP, [`gtpu`]). All state is held in
//! memory; a restart resets registry, contexts, and sessions.
//!
//! ## Module Organization
//!
//! - [`pfcp`] - PFCP header, Information Elements, and messages (N4)
//! - [`gtpu`] - GTP-U header codec and forwarding primitives (N3)
//! - [`crypto`] - MILENAGE (TS 35.206) and the 5G key-derivation functions
//! - [`types`] - shared SBA data model (PLMN, S-NSSAI, GUAMI, NF profiles)
//! - [`sbi`] - HTTP client/server plumbing shared by every NF
//! - [`nrf`], [`udm`], [`ausf`], [`amf`], [`smf`], [`upf`] - the NF cores

pub mod amf;
pub mod ausf;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gtpu;
pub mod logging;
pub mod nrf;
pub mod pfcp;
pub mod sbi;
pub mod smf;
pub mod types;
pub mod udm;
pub mod upf;

pub use error::{Error, Result};
