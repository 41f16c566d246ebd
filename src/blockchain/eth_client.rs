// src/blockchain/eth_client.rs
//! Ethereum JSON-RPC client.
//!
//! Provides a high-level interface for contract interactions: signed
//! transactions through a local wallet and read-only `eth_call` queries.

use crate::error::LedgerError;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers_contract::{BaseContract, Contract};
use ethers_core::{
    abi::{Abi, Detokenize, Tokenize},
    types::{Address, H256, U256},
};
use log::{debug, info};
use std::sync::Arc;

type SignedProvider = SignerMiddleware<Arc<Provider<Http>>, LocalWallet>;

/// Blockchain client for wallet and contract interactions.
///
/// Read calls go straight through the provider; write calls require the
/// client to have been created with a private key.
#[derive(Clone)]
pub struct EthClient {
    /// JSON-RPC provider
    provider: Arc<Provider<Http>>,
    /// Signing middleware, absent for read-only deployments
    signer: Option<Arc<SignedProvider>>,
}

impl EthClient {
    /// Creates a read-only client.
    pub fn read_only(rpc_url: &str) -> Result<Self, LedgerError> {
        let provider = Provider::<Http>::try_from(rpc_url).map_err(|e| LedgerError::Provider(e.to_string()))?;
        Ok(Self {
            provider: Arc::new(provider),
            signer: None,
        })
    }

    /// Creates a client that can send transactions.
    ///
    /// # Arguments
    /// * `rpc_url` - RPC endpoint URL
    /// * `private_key` - Hex-encoded private key (with or without 0x prefix)
    ///
    /// # Errors
    /// Returns error if the RPC URL or private key is invalid, or the chain ID
    /// cannot be retrieved.
    pub async fn with_signer(rpc_url: &str, private_key: &str) -> Result<Self, LedgerError> {
        let mut client = Self::read_only(rpc_url)?;
        let wallet: LocalWallet = private_key
            .trim()
            .trim_start_matches("0x")
            .parse()
            .map_err(|e: ethers::signers::WalletError| LedgerError::InvalidInput(e.to_string()))?;

        let chain_id = client
            .provider
            .get_chainid()
            .await
            .map_err(|e| LedgerError::Provider(e.to_string()))?
            .as_u64();
        let wallet = wallet.with_chain_id(chain_id);
        info!("signer {:?} ready on chain {}", wallet.address(), chain_id);

        client.signer = Some(Arc::new(SignerMiddleware::new(client.provider.clone(), wallet)));
        Ok(client)
    }

    /// Address of the signing wallet, if any.
    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    fn load_abi(abi: &[u8]) -> Result<BaseContract, LedgerError> {
        let abi = Abi::load(abi).map_err(|e| LedgerError::Abi(e.to_string()))?;
        Ok(BaseContract::from(abi))
    }

    /// Sends a transaction to a smart contract and waits for it to be mined.
    ///
    /// # Returns
    /// Transaction hash of the sent transaction
    pub async fn send_transaction(
        &self,
        contract_address: Address,
        abi: &[u8],
        method: &str,
        params: impl Tokenize,
    ) -> Result<H256, LedgerError> {
        let signer = self.signer.clone().ok_or(LedgerError::MissingSigner)?;
        let contract = Contract::new(contract_address, Self::load_abi(abi)?, signer);

        let call = contract
            .method::<_, H256>(method, params)
            .map_err(|e| LedgerError::Abi(e.to_string()))?;
        let pending = call
            .send()
            .await
            .map_err(|e| LedgerError::Contract(e.to_string()))?;
        let tx_hash = pending.tx_hash();
        debug!("{} submitted as {:?}", method, tx_hash);

        let receipt = pending
            .await
            .map_err(|e| LedgerError::Provider(e.to_string()))?;
        match receipt {
            Some(r) if r.status.map_or(true, |s| s.as_u64() == 1) => Ok(tx_hash),
            Some(_) => Err(LedgerError::Contract(format!("{} reverted in {:?}", method, tx_hash))),
            None => Err(LedgerError::Provider(format!("{:?} dropped from mempool", tx_hash))),
        }
    }

    /// Queries a smart contract (read-only operation).
    pub async fn query_contract<R: Detokenize>(
        &self,
        contract_address: Address,
        abi: &[u8],
        method: &str,
        params: impl Tokenize,
    ) -> Result<R, LedgerError> {
        let contract = Contract::new(contract_address, Self::load_abi(abi)?, self.provider.clone());

        contract
            .method::<_, R>(method, params)
            .map_err(|e| LedgerError::Abi(e.to_string()))?
            .call()
            .await
            .map_err(|e| LedgerError::Contract(e.to_string()))
    }
}

/// Parses a `0x` contract or account address.
pub fn parse_address(raw: &str) -> Result<Address, LedgerError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| LedgerError::InvalidAddress(raw.to_string()))
}

/// Narrows a contract `uint256` to `u64`; out-of-range values are rejected.
pub fn to_u64(field: &str, value: U256) -> Result<u64, LedgerError> {
    u64::try_from(value).map_err(|_| LedgerError::InvalidInput(format!("{} out of range: {}", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_addresses() {
        let addr = parse_address(" 0x1111111111111111111111111111111111111111 ").unwrap();
        assert_eq!(addr, Address::repeat_byte(0x11));
        assert!(matches!(parse_address("0x123"), Err(LedgerError::InvalidAddress(_))));
    }

    #[test]
    fn narrows_uint256_without_truncating() {
        assert_eq!(to_u64("issuedAt", U256::from(1_700_000_000u64)).unwrap(), 1_700_000_000);
        assert_eq!(to_u64("issuedAt", U256::from(u64::MAX)).unwrap(), u64::MAX);
        let too_big = U256::from(u64::MAX) + U256::one();
        assert!(matches!(to_u64("issuedAt", too_big), Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn read_only_client_has_no_signer() {
        let client = EthClient::read_only("http://localhost:8545").unwrap();
        assert!(client.address().is_none());
    }

    #[tokio::test]
    async fn writes_require_a_signer() {
        let client = EthClient::read_only("http://localhost:8545").unwrap();
        let abi = br#"[{"name":"ping","type":"function","stateMutability":"nonpayable","inputs":[],"outputs":[]}]"#;
        let result = client.send_transaction(Address::zero(), abi, "ping", ()).await;
        assert!(matches!(result, Err(LedgerError::MissingSigner)));
    }
}
