// src/contracts/trust_registry.rs
//! Issuer trust lookups.

use super::TrustRegistry;
use crate::blockchain::EthClient;
use crate::error::LedgerError;
use async_trait::async_trait;
use ethers::types::Address;
use std::collections::HashSet;
use std::sync::Arc;

const ABI: &[u8] = include_bytes!("abi/TrustRegistry.json");

/// On-chain `isTrusted(address)` registry.
#[derive(Clone)]
pub struct OnChainTrustRegistry {
    client: Arc<EthClient>,
    address: Address,
}

impl OnChainTrustRegistry {
    pub fn new(client: Arc<EthClient>, address: Address) -> Self {
        OnChainTrustRegistry { client, address }
    }
}

#[async_trait]
impl TrustRegistry for OnChainTrustRegistry {
    async fn is_trusted(&self, issuer: Address) -> Result<bool, LedgerError> {
        self.client
            .query_contract(self.address, ABI, "isTrusted", issuer)
            .await
    }
}

/// Fixed set of trusted issuers from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTrustList {
    trusted: HashSet<Address>,
}

impl StaticTrustList {
    pub fn new(trusted: impl IntoIterator<Item = Address>) -> Self {
        StaticTrustList {
            trusted: trusted.into_iter().collect(),
        }
    }
}

#[async_trait]
impl TrustRegistry for StaticTrustList {
    async fn is_trusted(&self, issuer: Address) -> Result<bool, LedgerError> {
        Ok(self.trusted.contains(&issuer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_list_membership() {
        let list = StaticTrustList::new([Address::repeat_byte(1)]);
        assert!(list.is_trusted(Address::repeat_byte(1)).await.unwrap());
        assert!(!list.is_trusted(Address::repeat_byte(2)).await.unwrap());
    }
}
