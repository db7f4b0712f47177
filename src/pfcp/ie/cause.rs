//! Cause Information Element.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CauseValue {
    RequestAccepted = 1,
    RequestRejected = 2,
    SessionContextNotFound = 3,
    MandatoryIeMissing = 4,
    InvalidLength = 6,
    NoEstablishedPfcpAssociation = 10,
    NoResourcesAvailable = 13,
    SystemFailure = 15,
    Unknown = 0,
}

impl From<u8> for CauseValue {
    fn from(v: u8) -> Self {
        match v {
            1 => CauseValue::RequestAccepted,
            2 => CauseValue::RequestRejected,
            3 => CauseValue::SessionContextNotFound,
            4 => CauseValue::MandatoryIeMissing,
            6 => CauseValue::InvalidLength,
            10 => CauseValue::NoEstablishedPfcpAssociation,
            13 => CauseValue::NoResourcesAvailable,
            15 => CauseValue::SystemFailure,
            _ => CauseValue::Unknown,
        }
    }
}

impl CauseValue {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CauseValue::RequestAccepted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cause {
    pub value: CauseValue,
}

impl Cause {
    pub fn new(value: CauseValue) -> Self {
        Cause { value }
    }

    pub fn marshal(&self) -> [u8; 1] {
        [self.value as u8]
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let first = data
            .first()
            .ok_or_else(|| Error::Protocol("empty Cause payload".into()))?;
        Ok(Cause {
            value: CauseValue::from(*first),
        })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::Cause, self.marshal().to_vec())
    }
}
