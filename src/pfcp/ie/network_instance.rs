//! Network Instance IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// Identifies the data network a rule belongs to; this core uses the DNN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkInstance(pub String);

impl NetworkInstance {
    pub fn new(name: impl Into<String>) -> Self {
        NetworkInstance(name.into())
    }

    pub fn marshal(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let name = std::str::from_utf8(data)
            .map_err(|_| Error::Protocol("Network Instance is not UTF-8".into()))?;
        Ok(NetworkInstance(name.to_string()))
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::NetworkInstance, self.marshal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let ni = NetworkInstance::new("internet");
        assert_eq!(NetworkInstance::unmarshal(&ni.marshal()).unwrap(), ni);
    }
}
