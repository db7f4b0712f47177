//! MILENAGE algorithm set (3GPP TS 35.206).
//!
//! Implements f1 (MAC-A), f1* (MAC-S), f2 (RES), f3 (CK), f4 (IK), f5 (AK),
//! f5* (AK for resynchronisation), and OPc derivation, all over AES-128 as
//! the kernel function. Input sizes are contractually fixed: K 16, OP/OPc 16,
//! RAND 16, SQN 6, AMF 2 bytes; any deviation is rejected before any
//! computation. The functions are constant-shape: no data-dependent early
//! returns.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;

use crate::error::{Error, Result};

/// Rotation amounts r1..r5 in bytes (64, 0, 32, 64, 96 bits).
const ROTATES: [usize; 5] = [8, 0, 4, 8, 12];

/// XOR constants c1..c5: all-zero except the final byte (0, 1, 2, 4, 8).
const CONSTANTS: [u8; 5] = [0, 1, 2, 4, 8];

fn aes_encrypt(key: &[u8; 16], block: &[u8; 16]) -> [u8; 16] {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut out = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut out);
    out.into()
}

fn xor16(a: &[u8; 16], b: &[u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for i in 0..16 {
        out[i] = a[i] ^ b[i];
    }
    out
}

fn rotate(block: &[u8; 16], bytes: usize) -> [u8; 16] {
    let mut out = [0u8; 16];
    for i in 0..16 {
        out[i] = block[(i + bytes) % 16];
    }
    out
}

fn fixed<const N: usize>(what: &str, data: &[u8]) -> Result<[u8; N]> {
    data.try_into()
        .map_err(|_| Error::invalid_length(what, N, data.len()))
}

/// `OPc = AES_K(OP) XOR OP`.
pub fn compute_opc(k: &[u8], op: &[u8]) -> Result<[u8; 16]> {
    let k = fixed::<16>("K", k)?;
    let op = fixed::<16>("OP", op)?;
    Ok(xor16(&aes_encrypt(&k, &op), &op))
}

/// A MILENAGE instance bound to one subscriber's (K, OPc).
#[derive(Debug, Clone)]
pub struct Milenage {
    k: [u8; 16],
    opc: [u8; 16],
}

/// The output of one full vector computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilenageVector {
    pub rand: [u8; 16],
    pub res: [u8; 8],
    pub ck: [u8; 16],
    pub ik: [u8; 16],
    pub ak: [u8; 6],
    pub mac_a: [u8; 8],
    /// `AUTN = (SQN XOR AK) || AMF || MAC-A`, 16 bytes.
    pub autn: [u8; 16],
}

impl Milenage {
    pub fn new(k: &[u8], opc: &[u8]) -> Result<Self> {
        Ok(Milenage {
            k: fixed::<16>("K", k)?,
            opc: fixed::<16>("OPc", opc)?,
        })
    }

    /// Derives OPc from OP on the fly.
    pub fn from_op(k: &[u8], op: &[u8]) -> Result<Self> {
        let opc = compute_opc(k, op)?;
        Milenage::new(k, &opc)
    }

    /// TEMP = AES_K(RAND XOR OPc), the shared intermediate of f1-f5*.
    fn temp(&self, rand: &[u8; 16]) -> [u8; 16] {
        aes_encrypt(&self.k, &xor16(rand, &self.opc))
    }

    /// OUT1 = AES_K(TEMP XOR rot(IN1 XOR OPc, r1) XOR c1) XOR OPc where
    /// IN1 = SQN || AMF || SQN || AMF. MAC-A is the high half, MAC-S the low.
    fn f1_block(&self, rand: &[u8; 16], sqn: &[u8; 6], amf: &[u8; 2]) -> [u8; 16] {
        let mut in1 = [0u8; 16];
        in1[0..6].copy_from_slice(sqn);
        in1[6..8].copy_from_slice(amf);
        in1[8..14].copy_from_slice(sqn);
        in1[14..16].copy_from_slice(amf);

        let mut block = rotate(&xor16(&in1, &self.opc), ROTATES[0]);
        block[15] ^= CONSTANTS[0];
        let out = aes_encrypt(&self.k, &xor16(&self.temp(rand), &block));
        xor16(&out, &self.opc)
    }

    /// OUTn = AES_K(rot(TEMP XOR OPc, rn) XOR cn) XOR OPc for n in 2..=5.
    fn fn_block(&self, rand: &[u8; 16], n: usize) -> [u8; 16] {
        let mut block = rotate(&xor16(&self.temp(rand), &self.opc), ROTATES[n - 1]);
        block[15] ^= CONSTANTS[n - 1];
        xor16(&aes_encrypt(&self.k, &block), &self.opc)
    }

    /// f1: network authentication code MAC-A.
    pub fn f1(&self, rand: &[u8], sqn: &[u8], amf: &[u8]) -> Result<[u8; 8]> {
        let rand = fixed::<16>("RAND", rand)?;
        let sqn = fixed::<6>("SQN", sqn)?;
        let amf = fixed::<2>("AMF", amf)?;
        let out = self.f1_block(&rand, &sqn, &amf);
        Ok(out[0..8].try_into().unwrap())
    }

    /// f1*: resynchronisation code MAC-S.
    pub fn f1_star(&self, rand: &[u8], sqn: &[u8], amf: &[u8]) -> Result<[u8; 8]> {
        let rand = fixed::<16>("RAND", rand)?;
        let sqn = fixed::<6>("SQN", sqn)?;
        let amf = fixed::<2>("AMF", amf)?;
        let out = self.f1_block(&rand, &sqn, &amf);
        Ok(out[8..16].try_into().unwrap())
    }

    /// f2 and f5 share OUT2: RES is its low half, AK its first 6 bytes.
    pub fn f2345(&self, rand: &[u8]) -> Result<([u8; 8], [u8; 16], [u8; 16], [u8; 6])> {
        let rand = fixed::<16>("RAND", rand)?;
        let out2 = self.fn_block(&rand, 2);
        let ck = self.fn_block(&rand, 3);
        let ik = self.fn_block(&rand, 4);
        let res = out2[8..16].try_into().unwrap();
        let ak = out2[0..6].try_into().unwrap();
        Ok((res, ck, ik, ak))
    }

    /// f5*: anonymity key used only for SQN resynchronisation.
    pub fn f5_star(&self, rand: &[u8]) -> Result<[u8; 6]> {
        let rand = fixed::<16>("RAND", rand)?;
        let out5 = self.fn_block(&rand, 5);
        Ok(out5[0..6].try_into().unwrap())
    }

    /// Computes the full vector and assembles AUTN.
    pub fn generate(&self, rand: &[u8], sqn: &[u8], amf: &[u8]) -> Result<MilenageVector> {
        let mac_a = self.f1(rand, sqn, amf)?;
        let (res, ck, ik, ak) = self.f2345(rand)?;

        let sqn: [u8; 6] = fixed("SQN", sqn)?;
        let amf: [u8; 2] = fixed("AMF", amf)?;
        let mut autn = [0u8; 16];
        for i in 0..6 {
            autn[i] = sqn[i] ^ ak[i];
        }
        autn[6..8].copy_from_slice(&amf);
        autn[8..16].copy_from_slice(&mac_a);

        Ok(MilenageVector {
            rand: fixed("RAND", rand)?,
            res,
            ck,
            ik,
            ak,
            mac_a,
            autn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // TS 35.207 Test Set 1.
    const K: [u8; 16] = hex!("465b5ce8b199b49faa5f0a2ee238a6bc");
    const OP: [u8; 16] = hex!("cdc202d5123e20f62b6d676ac72cb318");
    const OPC: [u8; 16] = hex!("cd63cb71954a9f4e48a5994e37a02baf");
    const RAND: [u8; 16] = hex!("23553cbe9637a89d218ae64dae47bf35");
    const SQN: [u8; 6] = hex!("ff9bb4d0b607");
    const AMF: [u8; 2] = hex!("b9b9");

    #[test]
    fn opc_derivation_matches_test_set_1() {
        assert_eq!(compute_opc(&K, &OP).unwrap(), OPC);
    }

    #[test]
    fn f1_matches_test_set_1() {
        let m = Milenage::new(&K, &OPC).unwrap();
        assert_eq!(m.f1(&RAND, &SQN, &AMF).unwrap(), hex!("4a9ffac354dfafb3"));
    }

    #[test]
    fn f1_star_matches_test_set_1() {
        let m = Milenage::new(&K, &OPC).unwrap();
        assert_eq!(
            m.f1_star(&RAND, &SQN, &AMF).unwrap(),
            hex!("01cfaf9ec4e871e9")
        );
    }

    #[test]
    fn f2345_matches_test_set_1() {
        let m = Milenage::new(&K, &OPC).unwrap();
        let (res, ck, ik, ak) = m.f2345(&RAND).unwrap();
        assert_eq!(res, hex!("a54211d5e3ba50bf"));
        assert_eq!(ck, hex!("b40ba9a3c58b2a05bbf0d987b21bf8cb"));
        assert_eq!(ik, hex!("f769bcd751044604127672711c6d3441"));
        assert_eq!(ak, hex!("aa689c648370"));
    }

    #[test]
    fn f5_star_matches_test_set_1() {
        let m = Milenage::new(&K, &OPC).unwrap();
        assert_eq!(m.f5_star(&RAND).unwrap(), hex!("451e8beca43b"));
    }

    #[test]
    fn autn_assembly() {
        let m = Milenage::from_op(&K, &OP).unwrap();
        let v = m.generate(&RAND, &SQN, &AMF).unwrap();
        // SQN XOR AK || AMF || MAC-A
        assert_eq!(&v.autn[0..6], hex!("55f328b43577"));
        assert_eq!(&v.autn[6..8], AMF);
        assert_eq!(&v.autn[8..16], v.mac_a);
    }

    #[test]
    fn identical_inputs_yield_identical_vectors() {
        let m = Milenage::new(&K, &OPC).unwrap();
        let a = m.generate(&RAND, &SQN, &AMF).unwrap();
        let b = m.generate(&RAND, &SQN, &AMF).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_input_sizes_are_rejected() {
        assert!(Milenage::new(&K[..15], &OPC).is_err());
        assert!(Milenage::new(&K, &OPC[..8]).is_err());
        assert!(compute_opc(&K, &OP[..12]).is_err());

        let m = Milenage::new(&K, &OPC).unwrap();
        assert!(m.f1(&RAND[..15], &SQN, &AMF).is_err());
        assert!(m.f1(&RAND, &SQN[..5], &AMF).is_err());
        assert!(m.f1(&RAND, &SQN, &AMF[..1]).is_err());
        assert!(m.f2345(&RAND[..10]).is_err());
    }
}
