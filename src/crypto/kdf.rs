//! 5G key-derivation functions (3GPP TS 33.501 Annex A).
//!
//! All derivations share the generic KDF of TS 33.220: HMAC-SHA-256 over
//! `FC || P0 || len(P0) || P1 || len(P1) || ...` with two-byte big-endian
//! lengths. The key hierarchy walked here is
//! CK||IK -> KAUSF -> KSEAF -> KAMF, plus RES*/HXRES* for the challenge.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// FC values from TS 33.501 Annex A.
const FC_KAUSF: u8 = 0x6a;
const FC_RES_STAR: u8 = 0x6b;
const FC_KSEAF: u8 = 0x6c;
const FC_KAMF: u8 = 0x6d;

/// Generic TS 33.220 KDF: HMAC-SHA-256(key, FC || (Pi || Li)*).
pub fn kdf(key: &[u8], fc: u8, params: &[&[u8]]) -> [u8; 32] {
    let mut s = Vec::with_capacity(1 + params.iter().map(|p| p.len() + 2).sum::<usize>());
    s.push(fc);
    for p in params {
        s.extend_from_slice(p);
        s.extend_from_slice(&(p.len() as u16).to_be_bytes());
    }
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(&s);
    mac.finalize().into_bytes().into()
}

/// KAUSF from CK||IK, bound to the serving network name and SQN XOR AK
/// (Annex A.2).
pub fn derive_kausf(ck: &[u8; 16], ik: &[u8; 16], snn: &str, sqn_xor_ak: &[u8; 6]) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(ck);
    key[16..].copy_from_slice(ik);
    kdf(&key, FC_KAUSF, &[snn.as_bytes(), sqn_xor_ak])
}

/// RES* from CK||IK, bound to the serving network name, RAND, and RES
/// (Annex A.4). The 16-byte RES* is the low half of the KDF output.
pub fn derive_res_star(
    ck: &[u8; 16],
    ik: &[u8; 16],
    snn: &str,
    rand: &[u8; 16],
    res: &[u8; 8],
) -> [u8; 16] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(ck);
    key[16..].copy_from_slice(ik);
    let out = kdf(&key, FC_RES_STAR, &[snn.as_bytes(), rand, res]);
    out[16..32].try_into().unwrap()
}

/// HXRES* = high 16 bytes of SHA-256(RAND || XRES*) (Annex A.5).
pub fn derive_hxres_star(rand: &[u8; 16], res_star: &[u8; 16]) -> [u8; 16] {
    let mut hasher = Sha256::new();
    hasher.update(rand);
    hasher.update(res_star);
    let digest = hasher.finalize();
    digest[0..16].try_into().unwrap()
}

/// KSEAF from KAUSF, bound to the serving network name (Annex A.6).
pub fn derive_kseaf(kausf: &[u8; 32], snn: &str) -> [u8; 32] {
    kdf(kausf, FC_KSEAF, &[snn.as_bytes()])
}

/// KAMF from KSEAF, bound to the SUPI and the ABBA parameter (Annex A.7).
pub fn derive_kamf(kseaf: &[u8; 32], supi: &str, abba: &[u8]) -> [u8; 32] {
    kdf(kseaf, FC_KAMF, &[supi.as_bytes(), abba])
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const CK: [u8; 16] = hex!("b40ba9a3c58b2a05bbf0d987b21bf8cb");
    const IK: [u8; 16] = hex!("f769bcd751044604127672711c6d3441");
    const RAND: [u8; 16] = hex!("23553cbe9637a89d218ae64dae47bf35");
    const RES: [u8; 8] = hex!("a54211d5e3ba50bf");
    const SNN: &str = "5G:mnc001.mcc001.3gppnetwork.org";

    #[test]
    fn kdf_is_deterministic() {
        let a = kdf(b"key", 0x6a, &[b"p0", b"p1"]);
        let b = kdf(b"key", 0x6a, &[b"p0", b"p1"]);
        assert_eq!(a, b);
    }

    #[test]
    fn kdf_length_encoding_separates_params() {
        // ("ab", "c") and ("a", "bc") must not collide.
        let a = kdf(b"key", 0x6a, &[b"ab", b"c"]);
        let b = kdf(b"key", 0x6a, &[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn kausf_binds_serving_network() {
        let sqn_xor_ak = hex!("55f328b43577");
        let a = derive_kausf(&CK, &IK, SNN, &sqn_xor_ak);
        let b = derive_kausf(&CK, &IK, "5G:mnc002.mcc001.3gppnetwork.org", &sqn_xor_ak);
        assert_ne!(a, b);
        assert_eq!(a, derive_kausf(&CK, &IK, SNN, &sqn_xor_ak));
    }

    #[test]
    fn res_star_binds_rand_and_res() {
        let a = derive_res_star(&CK, &IK, SNN, &RAND, &RES);
        let other_rand = hex!("00000000000000000000000000000000");
        let b = derive_res_star(&CK, &IK, SNN, &other_rand, &RES);
        assert_ne!(a, b);
    }

    #[test]
    fn hxres_star_is_the_high_half_of_the_hash() {
        let res_star = derive_res_star(&CK, &IK, SNN, &RAND, &RES);
        let hxres = derive_hxres_star(&RAND, &res_star);

        let mut hasher = Sha256::new();
        hasher.update(RAND);
        hasher.update(res_star);
        let digest = hasher.finalize();
        assert_eq!(hxres, digest[0..16]);
    }

    #[test]
    fn key_hierarchy_chains() {
        let sqn_xor_ak = hex!("55f328b43577");
        let kausf = derive_kausf(&CK, &IK, SNN, &sqn_xor_ak);
        let kseaf = derive_kseaf(&kausf, SNN);
        let kamf = derive_kamf(&kseaf, "imsi-001010000000001", &[0x00, 0x00]);
        assert_ne!(kausf, kseaf);
        assert_ne!(kseaf, kamf);
    }
}
