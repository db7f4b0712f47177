//! Vector generation with per-SUPI SQN management.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::crypto::kdf;
use crate::crypto::milenage::Milenage;
use crate::error::{Error, Result};
use crate::udm::store::{SubscriberStore, SQN_MAX};

/// AUTS carried by a resynchronisation request: (SQN_MS XOR AK*) || MAC-S.
#[derive(Debug, Clone, Copy)]
pub struct ResyncInfo {
    pub rand: [u8; 16],
    pub auts: [u8; 14],
}

/// One generated 5G-AKA vector, home-network side.
#[derive(Debug, Clone)]
pub struct GeneratedVector {
    pub rand: [u8; 16],
    pub autn: [u8; 16],
    pub hxres_star: [u8; 16],
    pub kausf: [u8; 32],
}

pub struct VectorService {
    store: Arc<SubscriberStore>,
    sqn_step: u64,
}

impl VectorService {
    pub fn new(store: Arc<SubscriberStore>, sqn_step: u64) -> Self {
        VectorService {
            store,
            sqn_step: sqn_step.max(1),
        }
    }

    pub fn store(&self) -> &SubscriberStore {
        &self.store
    }

    /// Generates a vector for `supi`, bound to `serving_network`.
    ///
    /// Resynchronisation (TS 33.102 Annex C) runs first when supplied:
    /// recover SQN_MS with f5*, verify MAC-S with f1* over the all-zero
    /// resync AMF, and reset the stored SQN. The increment and vector
    /// computation happen under the subscriber lock, so SQN values are
    /// strictly increasing per SUPI across concurrent requests.
    pub fn generate(
        &self,
        supi: &str,
        serving_network: &str,
        resync: Option<ResyncInfo>,
    ) -> Result<GeneratedVector> {
        let mut rand_bytes = [0u8; 16];
        OsRng.fill_bytes(&mut rand_bytes);

        self.store.with_subscriber(supi, |sub| {
            let milenage = Milenage::new(&sub.k, &sub.opc)?;

            if let Some(resync) = resync {
                sub.sqn = recover_sqn(&milenage, &resync)?;
            }

            sub.sqn += self.sqn_step;
            if sub.sqn > SQN_MAX {
                return Err(Error::Internal(format!("SQN wrapped for {supi}")));
            }

            let vector = milenage.generate(&rand_bytes, &sub.sqn_bytes(), &sub.amf)?;
            let sqn_xor_ak: [u8; 6] = vector.autn[0..6].try_into().unwrap();

            let res_star =
                kdf::derive_res_star(&vector.ck, &vector.ik, serving_network, &rand_bytes, &vector.res);
            let hxres_star = kdf::derive_hxres_star(&rand_bytes, &res_star);
            let kausf = kdf::derive_kausf(&vector.ck, &vector.ik, serving_network, &sqn_xor_ak);

            Ok(GeneratedVector {
                rand: rand_bytes,
                autn: vector.autn,
                hxres_star,
                kausf,
            })
        })
    }
}

/// The resynchronisation AMF is all zeros per TS 33.102 C.2.2.
const RESYNC_AMF: [u8; 2] = [0, 0];

fn recover_sqn(milenage: &Milenage, resync: &ResyncInfo) -> Result<u64> {
    let ak_star = milenage.f5_star(&resync.rand)?;
    let mut sqn_ms = [0u8; 6];
    for i in 0..6 {
        sqn_ms[i] = resync.auts[i] ^ ak_star[i];
    }
    let expected_mac = milenage.f1_star(&resync.rand, &sqn_ms, &RESYNC_AMF)?;
    if expected_mac.ct_eq(&resync.auts[6..14]).unwrap_u8() != 1 {
        return Err(Error::InvalidInput("AUTS MAC-S verification failed".into()));
    }
    let mut wide = [0u8; 8];
    wide[2..8].copy_from_slice(&sqn_ms);
    Ok(u64::from_be_bytes(wide))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udm::store::AuthSubscription;
    use hex_literal::hex;

    const SNN: &str = "5G:mnc001.mcc001.3gppnetwork.org";

    fn service() -> VectorService {
        let store = SubscriberStore::default();
        store.insert(AuthSubscription {
            supi: "imsi-001010000000001".into(),
            k: hex!("465b5ce8b199b49faa5f0a2ee238a6bc"),
            opc: hex!("cd63cb71954a9f4e48a5994e37a02baf"),
            amf: hex!("b9b9"),
            sqn: 0x20,
        });
        VectorService::new(Arc::new(store), 1)
    }

    #[test]
    fn sqn_strictly_increases_across_generations() {
        let service = service();
        service.generate("imsi-001010000000001", SNN, None).unwrap();
        let after_one = service.store().get("imsi-001010000000001").unwrap().sqn;
        service.generate("imsi-001010000000001", SNN, None).unwrap();
        let after_two = service.store().get("imsi-001010000000001").unwrap().sqn;
        assert_eq!(after_one, 0x21);
        assert_eq!(after_two, 0x22);
    }

    #[test]
    fn unknown_subscriber_is_404() {
        let service = service();
        let err = service.generate("imsi-000000000000000", SNN, None).unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn vectors_differ_between_calls() {
        // Fresh RAND every call; identical SQN inputs never recur.
        let service = service();
        let a = service.generate("imsi-001010000000001", SNN, None).unwrap();
        let b = service.generate("imsi-001010000000001", SNN, None).unwrap();
        assert_ne!(a.rand, b.rand);
        assert_ne!(a.autn, b.autn);
    }

    #[test]
    fn resync_resets_sqn_from_auts() {
        let service = service();
        let milenage = Milenage::new(
            &hex!("465b5ce8b199b49faa5f0a2ee238a6bc"),
            &hex!("cd63cb71954a9f4e48a5994e37a02baf"),
        )
        .unwrap();

        // UE-side AUTS for SQN_MS = 0x10 using the resync AMF.
        let rand = hex!("23553cbe9637a89d218ae64dae47bf35");
        let sqn_ms = hex!("000000000010");
        let ak_star = milenage.f5_star(&rand).unwrap();
        let mac_s = milenage.f1_star(&rand, &sqn_ms, &RESYNC_AMF).unwrap();
        let mut auts = [0u8; 14];
        for i in 0..6 {
            auts[i] = sqn_ms[i] ^ ak_star[i];
        }
        auts[6..14].copy_from_slice(&mac_s);

        service
            .generate(
                "imsi-001010000000001",
                SNN,
                Some(ResyncInfo { rand, auts }),
            )
            .unwrap();
        // SQN_MS recovered (0x10) plus one step.
        assert_eq!(service.store().get("imsi-001010000000001").unwrap().sqn, 0x11);
    }

    #[test]
    fn resync_with_bad_mac_is_rejected() {
        let service = service();
        let rand = hex!("23553cbe9637a89d218ae64dae47bf35");
        let auts = [0u8; 14];
        let err = service
            .generate("imsi-001010000000001", SNN, Some(ResyncInfo { rand, auts }))
            .unwrap_err();
        assert_eq!(err.status(), 400);
        // SQN untouched on failure.
        assert_eq!(service.store().get("imsi-001010000000001").unwrap().sqn, 0x20);
    }
}
