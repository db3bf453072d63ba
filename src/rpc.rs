// Fair Launch Client - RPC collaborator contract
use async_trait::async_trait;
use solana_program::{instruction::Instruction, pubkey::Pubkey};
use solana_sdk::{
    commitment_config::CommitmentConfig, signature::Signature, transaction::TransactionError,
};

use crate::error::RpcError;

/// Status of a submitted transaction as reported by the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    /// Whether the transaction reached the requested commitment
    pub confirmed: bool,
    /// Execution error, if the transaction landed and failed
    pub err: Option<TransactionError>,
}

/// Network operations the client core relies on. Implementations own the
/// transport and the participant's signing key; the core only builds
/// instructions and interprets results.
#[async_trait]
pub trait FairLaunchRpc: Send + Sync {
    /// Lamport balance of an address
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcError>;

    /// Raw token amount held by a token account, `None` when the account does not exist
    async fn get_token_account_balance(&self, token_account: &Pubkey)
        -> Result<Option<u64>, RpcError>;

    /// Raw account data, `None` when the account does not exist
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, RpcError>;

    /// Signs the instructions as a single transaction paid by the participant and submits it
    async fn send_instructions(&self, instructions: &[Instruction]) -> Result<Signature, RpcError>;

    /// Current status of a signature, `None` while the cluster has not seen it
    async fn get_signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<Option<SignatureStatus>, RpcError>;
}
