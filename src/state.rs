// Fair Launch Client - On-chain account layouts
use arrayref::{array_ref, array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, hash::hash, pubkey::Pubkey};

use crate::error::{LotteryError, SnapshotError};

/// Size of the Anchor account discriminator
pub const DISCRIMINATOR_LEN: usize = 8;

/// Computes the Anchor discriminator for an account type name
pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = hash(format!("account:{}", name).as_bytes());
    let mut discriminator = [0u8; DISCRIMINATOR_LEN];
    discriminator.copy_from_slice(&digest.to_bytes()[..DISCRIMINATOR_LEN]);
    discriminator
}

/// Accounts that carry an Anchor discriminator followed by a borsh body
pub trait AnchorAccount: BorshDeserialize + BorshSerialize {
    const NAME: &'static str;

    /// Decodes an account, ignoring trailing allocation padding
    fn decode(data: &[u8]) -> Result<Self, SnapshotError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(SnapshotError::AccountTooShort {
                account: Self::NAME,
                len: data.len(),
                expected: DISCRIMINATOR_LEN,
            });
        }
        let (discriminator, mut body) = data.split_at(DISCRIMINATOR_LEN);
        if discriminator != account_discriminator(Self::NAME) {
            return Err(SnapshotError::DiscriminatorMismatch { account: Self::NAME });
        }
        Self::deserialize(&mut body).map_err(|e| SnapshotError::Deserialize {
            account: Self::NAME,
            reason: e.to_string(),
        })
    }

    /// Encodes an account with its discriminator
    fn encode(&self) -> Vec<u8> {
        let mut data = account_discriminator(Self::NAME).to_vec();
        // Writing into a Vec cannot fail
        let _ = self.serialize(&mut data);
        data
    }
}

/// Anti-rug reserve settings fixed at raffle creation
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AntiRugSetting {
    /// Share of the treasury held back, in basis points
    pub reserve_bp: u16,
    /// Number of unminted tokens at or below which the reserve is released
    pub token_requirement: u64,
    /// Time after which participants may claim a refund
    pub self_destruct_date: UnixTimestamp,
}

/// Immutable raffle settings
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct FairLaunchData {
    pub uuid: String,
    pub price_range_start: u64,
    pub price_range_end: u64,
    pub phase_one_start: UnixTimestamp,
    pub phase_one_end: UnixTimestamp,
    pub phase_two_end: UnixTimestamp,
    pub lottery_duration: UnixTimestamp,
    pub tick_size: u64,
    pub number_of_tokens: u64,
    pub fee: u64,
    pub anti_rug_setting: Option<AntiRugSetting>,
}

/// The raffle account
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct FairLaunch {
    pub token_mint: Pubkey,
    pub treasury: Pubkey,
    pub treasury_mint: Option<Pubkey>,
    pub authority: Pubkey,
    pub bump: u8,
    pub treasury_bump: u8,
    pub token_mint_bump: u8,
    pub data: FairLaunchData,
    pub number_tickets_un_seqed: u64,
    pub number_tickets_sold: u64,
    pub number_tickets_dropped: u64,
    pub number_tickets_punched: u64,
    pub number_tokens_burned_for_refunds: u64,
    pub number_tokens_preminted: u64,
    pub phase_three_started: bool,
    pub treasury_snapshot: Option<u64>,
    pub current_eligible_holders: u64,
    /// Zero until the first eligible bid is counted
    pub current_median: u64,
    pub counts_at_each_tick: Vec<u64>,
}

impl AnchorAccount for FairLaunch {
    const NAME: &'static str = "FairLaunch";
}

/// State tag of a ticket
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FairLaunchTicketState {
    /// Placeholder tag the program never stores on a live ticket
    NoSequenceStruct,
    Unpunched,
    Punched,
    Withdrawn,
}

/// A participant's bid record
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct FairLaunchTicket {
    pub fair_launch: Pubkey,
    pub buyer: Pubkey,
    pub amount: u64,
    pub state: FairLaunchTicketState,
    pub bump: u8,
    pub seq: u64,
}

impl AnchorAccount for FairLaunchTicket {
    const NAME: &'static str = "FairLaunchTicket";
}

/// Candy machine settings
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CandyMachineData {
    pub uuid: String,
    pub price: u64,
    pub items_available: u64,
    pub go_live_date: Option<UnixTimestamp>,
}

/// The downstream mint account
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CandyMachine {
    pub authority: Pubkey,
    pub wallet: Pubkey,
    pub token_mint: Option<Pubkey>,
    pub config: Pubkey,
    pub data: CandyMachineData,
    pub items_redeemed: u64,
    pub bump: u8,
}

impl AnchorAccount for CandyMachine {
    const NAME: &'static str = "CandyMachine";
}

/// Lottery bitmap account name, used for its discriminator
pub const LOTTERY_BITMAP_NAME: &str = "FairLaunchLotteryBitmap";

/// Fixed header of the lottery bitmap: discriminator, raffle reference, bump
pub const LOTTERY_HEADER_LEN: usize = DISCRIMINATOR_LEN + 32 + 1;

/// Parsed fixed header of the lottery bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotteryBitmapHeader {
    pub discriminator: [u8; DISCRIMINATOR_LEN],
    pub fair_launch: Pubkey,
    pub bump: u8,
}

impl LotteryBitmapHeader {
    pub fn unpack(data: &[u8]) -> Result<Self, LotteryError> {
        if data.len() < LOTTERY_HEADER_LEN {
            return Err(LotteryError::HeaderTooShort(data.len()));
        }
        let src = array_ref![data, 0, LOTTERY_HEADER_LEN];
        let (discriminator, fair_launch, bump) = array_refs![src, DISCRIMINATOR_LEN, 32, 1];
        Ok(Self {
            discriminator: *discriminator,
            fair_launch: Pubkey::new_from_array(*fair_launch),
            bump: bump[0],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ticket() -> FairLaunchTicket {
        FairLaunchTicket {
            fair_launch: Pubkey::new_unique(),
            buyer: Pubkey::new_unique(),
            amount: 1_500_000_000,
            state: FairLaunchTicketState::Unpunched,
            bump: 254,
            seq: 9,
        }
    }

    #[test]
    fn test_decode_ignores_trailing_padding() {
        let ticket = sample_ticket();
        let mut data = ticket.encode();
        data.extend_from_slice(&[0u8; 64]);
        assert_eq!(FairLaunchTicket::decode(&data).unwrap(), ticket);
    }

    #[test]
    fn test_decode_rejects_foreign_discriminator() {
        let mut data = sample_ticket().encode();
        data[0] ^= 0xff;
        assert_eq!(
            FairLaunchTicket::decode(&data),
            Err(SnapshotError::DiscriminatorMismatch { account: "FairLaunchTicket" })
        );
    }

    #[test]
    fn test_decode_rejects_short_account() {
        assert!(matches!(
            CandyMachine::decode(&[1, 2, 3]),
            Err(SnapshotError::AccountTooShort { len: 3, .. })
        ));
    }

    #[test]
    fn test_lottery_header_layout() {
        let fair_launch = Pubkey::new_unique();
        let mut data = account_discriminator(LOTTERY_BITMAP_NAME).to_vec();
        data.extend_from_slice(fair_launch.as_ref());
        data.push(253);
        data.extend_from_slice(&[0b1000_0000, 0]);

        let header = LotteryBitmapHeader::unpack(&data).unwrap();
        assert_eq!(LOTTERY_HEADER_LEN, 41);
        assert_eq!(header.fair_launch, fair_launch);
        assert_eq!(header.bump, 253);
        assert_eq!(
            LotteryBitmapHeader::unpack(&data[..40]),
            Err(LotteryError::HeaderTooShort(40))
        );
    }
}
