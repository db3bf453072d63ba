// Fair Launch Client - Confirmation polling
use solana_sdk::{commitment_config::CommitmentConfig, signature::Signature, transaction::TransactionError};
use std::{sync::Arc, time::Duration};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::rpc::FairLaunchRpc;

/// Terminal result of waiting on a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationResult {
    /// Reached the requested commitment without error
    Confirmed,
    /// Landed and failed on-chain
    Failed(TransactionError),
    /// No terminal status within the deadline; the transaction may still land
    Timeout,
}

/// Polls signature status until a terminal status or the deadline
pub struct ConfirmationWatcher<R: FairLaunchRpc + ?Sized> {
    rpc: Arc<R>,
    poll_interval: Duration,
}

impl<R: FairLaunchRpc + ?Sized> ConfirmationWatcher<R> {
    pub fn new(rpc: Arc<R>, poll_interval: Duration) -> Self {
        Self { rpc, poll_interval }
    }

    pub async fn await_confirmation(
        &self,
        signature: &Signature,
        deadline: Duration,
        commitment: CommitmentConfig,
    ) -> ConfirmationResult {
        match timeout(deadline, self.poll(signature, commitment)).await {
            Ok(result) => {
                info!("Transaction {} settled: {:?}", signature, result);
                result
            }
            Err(_) => {
                warn!("Transaction {} not confirmed within {:?}", signature, deadline);
                ConfirmationResult::Timeout
            }
        }
    }

    async fn poll(&self, signature: &Signature, commitment: CommitmentConfig) -> ConfirmationResult {
        loop {
            match self.rpc.get_signature_status(signature, commitment).await {
                Ok(Some(status)) => {
                    // A failed transaction is final whatever its commitment
                    if let Some(err) = status.err {
                        return ConfirmationResult::Failed(err);
                    }
                    if status.confirmed {
                        return ConfirmationResult::Confirmed;
                    }
                    debug!("Transaction {} seen, awaiting {:?}", signature, commitment.commitment);
                }
                Ok(None) => debug!("Transaction {} not seen yet", signature),
                Err(e) => warn!("Problem polling status of {}: {}", signature, e),
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use crate::rpc::SignatureStatus;
    use async_trait::async_trait;
    use solana_program::{instruction::Instruction, instruction::InstructionError, pubkey::Pubkey};
    use std::sync::Mutex;

    /// Replays a scripted list of statuses, repeating the last one
    struct ScriptedStatus {
        script: Mutex<Vec<Result<Option<SignatureStatus>, RpcError>>>,
        polls: Mutex<u32>,
    }

    impl ScriptedStatus {
        fn new(mut script: Vec<Result<Option<SignatureStatus>, RpcError>>) -> Arc<Self> {
            script.reverse();
            Arc::new(Self {
                script: Mutex::new(script),
                polls: Mutex::new(0),
            })
        }

        fn polls(&self) -> u32 {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl FairLaunchRpc for ScriptedStatus {
        async fn get_balance(&self, _: &Pubkey) -> Result<u64, RpcError> {
            unimplemented!()
        }

        async fn get_token_account_balance(&self, _: &Pubkey) -> Result<Option<u64>, RpcError> {
            unimplemented!()
        }

        async fn get_account_data(&self, _: &Pubkey) -> Result<Option<Vec<u8>>, RpcError> {
            unimplemented!()
        }

        async fn send_instructions(&self, _: &[Instruction]) -> Result<Signature, RpcError> {
            unimplemented!()
        }

        async fn get_signature_status(
            &self,
            _: &Signature,
            _: CommitmentConfig,
        ) -> Result<Option<SignatureStatus>, RpcError> {
            *self.polls.lock().unwrap() += 1;
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop().unwrap()
            } else {
                script.last().cloned().unwrap_or(Ok(None))
            }
        }
    }

    fn status(confirmed: bool, err: Option<TransactionError>) -> Result<Option<SignatureStatus>, RpcError> {
        Ok(Some(SignatureStatus { confirmed, err }))
    }

    fn watcher(rpc: Arc<ScriptedStatus>) -> ConfirmationWatcher<ScriptedStatus> {
        ConfirmationWatcher::new(rpc, Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_after_a_few_polls() {
        let rpc = ScriptedStatus::new(vec![Ok(None), status(false, None), status(true, None)]);
        let result = watcher(rpc.clone())
            .await_confirmation(&Signature::default(), Duration::from_secs(30), CommitmentConfig::confirmed())
            .await;
        assert_eq!(result, ConfirmationResult::Confirmed);
        assert_eq!(rpc.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_program_error_is_terminal() {
        let err = TransactionError::InstructionError(0, InstructionError::Custom(311));
        let rpc = ScriptedStatus::new(vec![status(false, Some(err.clone()))]);
        let result = watcher(rpc.clone())
            .await_confirmation(&Signature::default(), Duration::from_secs(30), CommitmentConfig::confirmed())
            .await;
        assert_eq!(result, ConfirmationResult::Failed(err));
        assert_eq!(rpc.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_never_seen() {
        let rpc = ScriptedStatus::new(vec![Ok(None)]);
        let result = watcher(rpc.clone())
            .await_confirmation(&Signature::default(), Duration::from_secs(29), CommitmentConfig::confirmed())
            .await;
        assert_eq!(result, ConfirmationResult::Timeout);
        // Polls at 0, 2, .., 28 seconds
        assert_eq!(rpc.polls(), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_keep_polling() {
        let rpc = ScriptedStatus::new(vec![
            Err(RpcError::Transport("connection reset".to_string())),
            Err(RpcError::Transport("connection reset".to_string())),
            status(true, None),
        ]);
        let result = watcher(rpc)
            .await_confirmation(&Signature::default(), Duration::from_secs(30), CommitmentConfig::confirmed())
            .await;
        assert_eq!(result, ConfirmationResult::Confirmed);
    }
}
