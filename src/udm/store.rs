//! In-memory authentication subscription store.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// Maximum 48-bit sequence number.
pub const SQN_MAX: u64 = 0xffff_ffff_ffff;

/// Per-SUPI credentials and sequence state.
#[derive(Debug, Clone)]
pub struct AuthSubscription {
    pub supi: String,
    /// Permanent key K.
    pub k: [u8; 16],
    /// Operator variant key, already derived.
    pub opc: [u8; 16],
    /// Authentication management field.
    pub amf: [u8; 2],
    /// Current 48-bit SQN; strictly increasing across vector generations.
    pub sqn: u64,
}

impl AuthSubscription {
    pub fn sqn_bytes(&self) -> [u8; 6] {
        self.sqn.to_be_bytes()[2..8].try_into().unwrap()
    }
}

#[derive(Default)]
pub struct SubscriberStore {
    subscribers: RwLock<HashMap<String, AuthSubscription>>,
}

impl SubscriberStore {
    pub fn insert(&self, sub: AuthSubscription) {
        self.subscribers.write().insert(sub.supi.clone(), sub);
    }

    pub fn get(&self, supi: &str) -> Option<AuthSubscription> {
        self.subscribers.read().get(supi).cloned()
    }

    /// Runs `f` with exclusive access to one subscriber. SQN mutation stays
    /// atomic per SUPI this way, even across concurrent vector requests.
    pub fn with_subscriber<T>(
        &self,
        supi: &str,
        f: impl FnOnce(&mut AuthSubscription) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.subscribers.write();
        let sub = guard
            .get_mut(supi)
            .ok_or_else(|| Error::NotFound(format!("subscriber {supi}")))?;
        f(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn sample() -> AuthSubscription {
        AuthSubscription {
            supi: "imsi-001010000000001".into(),
            k: hex!("465b5ce8b199b49faa5f0a2ee238a6bc"),
            opc: hex!("cd63cb71954a9f4e48a5994e37a02baf"),
            amf: hex!("b9b9"),
            sqn: 0x000000000001,
        }
    }

    #[test]
    fn sqn_bytes_are_the_low_48_bits() {
        let mut sub = sample();
        sub.sqn = 0xff9bb4d0b607;
        assert_eq!(sub.sqn_bytes(), hex!("ff9bb4d0b607"));
    }

    #[test]
    fn with_subscriber_mutates_in_place() {
        let store = SubscriberStore::default();
        store.insert(sample());
        store
            .with_subscriber("imsi-001010000000001", |sub| {
                sub.sqn += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(store.get("imsi-001010000000001").unwrap().sqn, 2);
    }

    #[test]
    fn unknown_supi_is_not_found() {
        let store = SubscriberStore::default();
        let err = store.with_subscriber("imsi-999", |_| Ok(())).unwrap_err();
        assert_eq!(err.status(), 404);
    }
}
