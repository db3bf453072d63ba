// Fair Launch Client - Configuration
use solana_program::{pubkey, pubkey::Pubkey};
use solana_sdk::commitment_config::CommitmentConfig;
use std::time::Duration;

use crate::error::ConfigError;

/// Fair launch program on mainnet
pub const FAIR_LAUNCH_PROGRAM_ID: Pubkey = pubkey!("faircnAB9k59Y4TXmLabBULeuTLgV7TkGMGNkjnA15j");
/// Candy machine program on mainnet
pub const CANDY_MACHINE_PROGRAM_ID: Pubkey = pubkey!("cndyAnrLdpjq1Ssp1z8xxDsB8dxe7u4HL5Nxi2K5WXZ");
/// Token metadata program on mainnet
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Client-side settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub fair_launch_program_id: Pubkey,
    pub candy_machine_program_id: Pubkey,
    pub token_metadata_program_id: Pubkey,
    /// Commitment a transaction must reach to count as confirmed
    pub commitment: CommitmentConfig,
    /// How long to wait for a confirmation before reporting a timeout
    pub tx_timeout: Duration,
    /// Delay between two signature status polls
    pub poll_interval: Duration,
    /// Lamports kept aside for transaction fees when checking a bid
    pub bid_safety_margin: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            fair_launch_program_id: FAIR_LAUNCH_PROGRAM_ID,
            candy_machine_program_id: CANDY_MACHINE_PROGRAM_ID,
            token_metadata_program_id: TOKEN_METADATA_PROGRAM_ID,
            commitment: CommitmentConfig::confirmed(),
            tx_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
            bid_safety_margin: 10_000_000, // 0.01 SOL
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.poll_interval > self.tx_timeout {
            return Err(ConfigError::PollIntervalExceedsTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(ClientConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_poll_interval() {
        let zero = ClientConfig {
            poll_interval: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert_eq!(zero.validate(), Err(ConfigError::ZeroPollInterval));

        let slow = ClientConfig {
            poll_interval: Duration::from_secs(60),
            ..ClientConfig::default()
        };
        assert_eq!(slow.validate(), Err(ConfigError::PollIntervalExceedsTimeout));
    }
}
