// src/contracts/interaction_hub.rs
//! Interaction hub contract: claim requests and attestations between addresses.

use super::InteractionHub;
use crate::blockchain::EthClient;
use crate::error::LedgerError;
use crate::models::interaction::{Attestation, ClaimRequest};
use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use futures::future::try_join_all;
use std::sync::Arc;

const ABI: &[u8] = include_bytes!("abi/InteractionHub.json");

type RequestTuple = (U256, Address, Address, Vec<String>, String, bool, U256);
type AttestationTuple = (Address, Address, String, U256);

#[derive(Clone)]
pub struct InteractionHubContract {
    client: Arc<EthClient>,
    address: Address,
}

impl InteractionHubContract {
    pub fn new(client: Arc<EthClient>, address: Address) -> Self {
        InteractionHubContract { client, address }
    }

    async fn claim_request(&self, id: U256) -> Result<ClaimRequest, LedgerError> {
        let tuple: RequestTuple = self
            .client
            .query_contract(self.address, ABI, "claimRequests", id)
            .await?;
        ClaimRequest::from_tuple(tuple)
    }
}

#[async_trait]
impl InteractionHub for InteractionHubContract {
    async fn create_claim_request(
        &self,
        target: Address,
        fields: Vec<String>,
        reason: &str,
    ) -> Result<H256, LedgerError> {
        self.client
            .send_transaction(self.address, ABI, "createClaimRequest", (target, fields, reason.to_string()))
            .await
    }

    async fn fulfill_claim_request(&self, request_id: u64) -> Result<H256, LedgerError> {
        self.client
            .send_transaction(self.address, ABI, "fulfillClaimRequest", U256::from(request_id))
            .await
    }

    async fn create_attestation(&self, target: Address, text: &str) -> Result<H256, LedgerError> {
        self.client
            .send_transaction(self.address, ABI, "createAttestation", (target, text.to_string()))
            .await
    }

    async fn requests_for_user(&self, user: Address) -> Result<Vec<ClaimRequest>, LedgerError> {
        let ids: Vec<U256> = self
            .client
            .query_contract(self.address, ABI, "getRequestsForUser", user)
            .await?;
        try_join_all(ids.into_iter().map(|id| self.claim_request(id))).await
    }

    async fn attestations_for(&self, user: Address) -> Result<Vec<Attestation>, LedgerError> {
        let tuples: Vec<AttestationTuple> = self
            .client
            .query_contract(self.address, ABI, "getAttestations", user)
            .await?;
        tuples.into_iter().map(Attestation::from_tuple).collect()
    }
}
