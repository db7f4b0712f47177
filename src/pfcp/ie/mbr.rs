//! MBR IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// Maximum bit rate per direction, in bits per second on the API surface
/// and kbit/s in the 40-bit wire fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mbr {
    pub uplink_bps: u64,
    pub downlink_bps: u64,
}

impl Mbr {
    pub fn new(uplink_bps: u64, downlink_bps: u64) -> Self {
        Mbr {
            uplink_bps,
            downlink_bps,
        }
    }

    pub fn marshal(&self) -> [u8; 10] {
        let mut data = [0u8; 10];
        let ul_kbps = (self.uplink_bps / 1000).min(0xff_ffff_ffff);
        let dl_kbps = (self.downlink_bps / 1000).min(0xff_ffff_ffff);
        data[0..5].copy_from_slice(&ul_kbps.to_be_bytes()[3..8]);
        data[5..10].copy_from_slice(&dl_kbps.to_be_bytes()[3..8]);
        data
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        if data.len() < 10 {
            return Err(Error::Protocol("MBR needs 10 bytes".into()));
        }
        let wide = |b: &[u8]| {
            let mut buf = [0u8; 8];
            buf[3..8].copy_from_slice(b);
            u64::from_be_bytes(buf)
        };
        Ok(Mbr {
            uplink_bps: wide(&data[0..5]) * 1000,
            downlink_bps: wide(&data[5..10]) * 1000,
        })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::Mbr, self.marshal().to_vec())
    }
}
