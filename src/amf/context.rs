//! UE context store.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Guami, Snssai, Tai};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationState {
    Deregistered,
    Registered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Idle,
    Connected,
}

/// NAS security state installed after a successful authentication.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    pub kseaf: [u8; 32],
    pub kamf: [u8; 32],
    pub integrity_alg: String,
    pub ciphering_alg: String,
    pub uplink_nas_count: u32,
    pub downlink_nas_count: u32,
    pub nas_security_established: bool,
}

/// What the AMF remembers about one of a UE's PDU sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PduSessionSummary {
    pub pdu_session_id: u8,
    pub dnn: String,
    pub s_nssai: Snssai,
}

#[derive(Debug, Clone)]
pub struct UeContext {
    pub supi: String,
    pub suci: Option<String>,
    pub registration_state: RegistrationState,
    pub connection_state: ConnectionState,
    pub tai: Option<Tai>,
    pub guami: Option<Guami>,
    pub security: Option<SecurityContext>,
    /// AUSF context id of the in-flight authentication, if any.
    pub auth_ctx_id: Option<String>,
    pub allowed_nssai: Vec<Snssai>,
    pub configured_nssai: Vec<Snssai>,
    pub pdu_sessions: HashMap<u8, PduSessionSummary>,
}

impl UeContext {
    pub fn new(supi: impl Into<String>) -> Self {
        UeContext {
            supi: supi.into(),
            suci: None,
            registration_state: RegistrationState::Deregistered,
            connection_state: ConnectionState::Idle,
            tai: None,
            guami: None,
            security: None,
            auth_ctx_id: None,
            allowed_nssai: Vec::new(),
            configured_nssai: Vec::new(),
            pdu_sessions: HashMap::new(),
        }
    }

    pub fn nas_security_established(&self) -> bool {
        self.security
            .as_ref()
            .is_some_and(|sec| sec.nas_security_established)
    }
}

#[derive(Default)]
pub struct UeContextStore {
    ues: RwLock<HashMap<String, UeContext>>,
}

impl UeContextStore {
    pub fn get(&self, supi: &str) -> Option<UeContext> {
        self.ues.read().get(supi).cloned()
    }

    /// Runs `f` with exclusive access, creating the context on first use.
    /// Per-UE operations serialize on the store's write lock.
    pub fn with_ue<T>(&self, supi: &str, f: impl FnOnce(&mut UeContext) -> T) -> T {
        let mut guard = self.ues.write();
        let ue = guard
            .entry(supi.to_string())
            .or_insert_with(|| UeContext::new(supi));
        f(ue)
    }

    /// Like [`with_ue`] but failing when the context does not exist.
    ///
    /// [`with_ue`]: UeContextStore::with_ue
    pub fn with_existing_ue<T>(
        &self,
        supi: &str,
        f: impl FnOnce(&mut UeContext) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.ues.write();
        let ue = guard
            .get_mut(supi)
            .ok_or_else(|| Error::NotFound(format!("UE context {supi}")))?;
        f(ue)
    }

    pub fn remove(&self, supi: &str) -> Option<UeContext> {
        self.ues.write().remove(supi)
    }

    pub fn len(&self) -> usize {
        self.ues.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ues.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_start_deregistered_and_idle() {
        let ue = UeContext::new("imsi-001010000000001");
        assert_eq!(ue.registration_state, RegistrationState::Deregistered);
        assert_eq!(ue.connection_state, ConnectionState::Idle);
        assert!(!ue.nas_security_established());
    }

    #[test]
    fn with_ue_creates_on_first_use() {
        let store = UeContextStore::default();
        store.with_ue("imsi-001010000000001", |ue| {
            ue.connection_state = ConnectionState::Connected;
        });
        assert_eq!(
            store.get("imsi-001010000000001").unwrap().connection_state,
            ConnectionState::Connected
        );
    }

    #[test]
    fn with_existing_ue_requires_presence() {
        let store = UeContextStore::default();
        let err = store
            .with_existing_ue("imsi-001010000000001", |_| Ok(()))
            .unwrap_err();
        assert_eq!(err.status(), 404);
    }
}
