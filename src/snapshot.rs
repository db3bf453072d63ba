// Fair Launch Client - Account snapshot
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};
use spl_associated_token_account::get_associated_token_address;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{LotteryError, SnapshotError};
use crate::lottery;
use crate::phase::{resolve_phase, Phase};
use crate::rpc::FairLaunchRpc;
use crate::state::{
    account_discriminator, AnchorAccount, AntiRugSetting, CandyMachine, FairLaunch,
    FairLaunchData, FairLaunchTicket, FairLaunchTicketState, LotteryBitmapHeader,
    LOTTERY_BITMAP_NAME,
};
use crate::utils::{anti_rug_reserve, find_lottery_address, find_ticket_address};

/// Raffle settings fixed at creation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaffleConfig {
    pub price_range_start: u64,
    pub price_range_end: u64,
    pub tick_size: u64,
    /// Flat fee charged on a bid, in lamports
    pub fee: u64,
    pub number_of_tokens: u64,
    pub phase_one_start: Option<UnixTimestamp>,
    pub phase_one_end: Option<UnixTimestamp>,
    pub phase_two_end: Option<UnixTimestamp>,
    pub lottery_duration: Option<UnixTimestamp>,
    pub anti_rug: Option<AntiRugSetting>,
}

impl From<&FairLaunchData> for RaffleConfig {
    fn from(data: &FairLaunchData) -> Self {
        Self {
            price_range_start: data.price_range_start,
            price_range_end: data.price_range_end,
            tick_size: data.tick_size,
            fee: data.fee,
            number_of_tokens: data.number_of_tokens,
            phase_one_start: Some(data.phase_one_start),
            phase_one_end: Some(data.phase_one_end),
            phase_two_end: Some(data.phase_two_end),
            lottery_duration: Some(data.lottery_duration),
            anti_rug: data.anti_rug_setting,
        }
    }
}

/// Mutable raffle counters, read-only to the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaffleRuntime {
    /// `None` until a median exists
    pub current_median: Option<u64>,
    pub number_tickets_sold: u64,
    pub number_tickets_punched: u64,
    pub number_tickets_dropped: u64,
    pub current_eligible_holders: u64,
    /// Lamports held by the treasury account
    pub treasury_lamports: Option<u64>,
    pub treasury_snapshot: Option<u64>,
    pub phase_three_started: bool,
}

impl RaffleRuntime {
    fn from_account(fair_launch: &FairLaunch, treasury_lamports: Option<u64>) -> Self {
        Self {
            current_median: Some(fair_launch.current_median).filter(|median| *median > 0),
            number_tickets_sold: fair_launch.number_tickets_sold,
            number_tickets_punched: fair_launch.number_tickets_punched,
            number_tickets_dropped: fair_launch.number_tickets_dropped,
            current_eligible_holders: fair_launch.current_eligible_holders,
            treasury_lamports,
            treasury_snapshot: fair_launch.treasury_snapshot,
            phase_three_started: fair_launch.phase_three_started,
        }
    }
}

/// State tag of a live ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TicketState {
    Unpunched,
    Punched,
    Withdrawn,
}

impl TicketState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TicketState::Unpunched)
    }
}

impl TryFrom<FairLaunchTicketState> for TicketState {
    type Error = SnapshotError;

    fn try_from(state: FairLaunchTicketState) -> Result<Self, Self::Error> {
        match state {
            FairLaunchTicketState::Unpunched => Ok(TicketState::Unpunched),
            FairLaunchTicketState::Punched => Ok(TicketState::Punched),
            FairLaunchTicketState::Withdrawn => Ok(TicketState::Withdrawn),
            FairLaunchTicketState::NoSequenceStruct => Err(SnapshotError::InvalidTicketState(0)),
        }
    }
}

/// A participant's ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub address: Pubkey,
    /// Position of the ticket in the lottery bitmap
    pub seq: u64,
    pub amount: u64,
    pub state: TicketState,
}

/// Raw lottery bitmap account data, header included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotteryBitmask {
    data: Vec<u8>,
}

impl LotteryBitmask {
    pub fn decode(data: Vec<u8>) -> Result<Self, SnapshotError> {
        let header = LotteryBitmapHeader::unpack(&data)?;
        if header.discriminator != account_discriminator(LOTTERY_BITMAP_NAME) {
            return Err(SnapshotError::DiscriminatorMismatch {
                account: LOTTERY_BITMAP_NAME,
            });
        }
        Ok(Self { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Downstream mint, evaluated at capture time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintState {
    pub address: Pubkey,
    pub go_live: Option<UnixTimestamp>,
    pub is_active: bool,
    pub is_sold_out: bool,
    pub account: CandyMachine,
}

impl MintState {
    pub fn from_account(address: Pubkey, account: CandyMachine, now: UnixTimestamp) -> Self {
        let go_live = account.data.go_live_date;
        let is_sold_out = account.items_redeemed >= account.data.items_available;
        let is_active = !is_sold_out && go_live.map_or(false, |go_live| go_live <= now);
        Self {
            address,
            go_live,
            is_active,
            is_sold_out,
            account,
        }
    }
}

/// Addresses the client derives once the raffle account is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FairLaunchAddresses {
    pub fair_launch: Pubkey,
    pub token_mint: Pubkey,
    pub treasury: Pubkey,
    pub ticket: Pubkey,
    pub ticket_bump: u8,
    pub lottery: Pubkey,
    /// The wallet's associated token account for the raffle token
    pub buyer_token_account: Pubkey,
}

impl FairLaunchAddresses {
    pub fn derive(program_id: &Pubkey, fair_launch: &Pubkey, account: &FairLaunch, wallet: &Pubkey) -> Self {
        let (ticket, ticket_bump) = find_ticket_address(program_id, fair_launch, wallet);
        let (lottery, _) = find_lottery_address(program_id, fair_launch);
        Self {
            fair_launch: *fair_launch,
            token_mint: account.token_mint,
            treasury: account.treasury,
            ticket,
            ticket_bump,
            lottery,
            buyer_token_account: get_associated_token_address(wallet, &account.token_mint),
        }
    }
}

/// Raw inputs of one refresh cycle
#[derive(Debug, Clone, Default)]
pub struct RawAccounts {
    pub fair_launch: Option<Vec<u8>>,
    pub ticket: Option<Vec<u8>>,
    pub lottery: Option<Vec<u8>>,
    pub candy_machine: Option<(Pubkey, Vec<u8>)>,
    pub wallet_balance: Option<u64>,
    pub treasury_balance: Option<u64>,
    pub held_token_balance: Option<u64>,
}

/// Typed view of every account the client reads, captured at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub captured_at: UnixTimestamp,
    pub wallet: Pubkey,
    pub fair_launch: Pubkey,
    pub addresses: Option<FairLaunchAddresses>,
    pub config: Option<RaffleConfig>,
    pub runtime: Option<RaffleRuntime>,
    pub ticket: Option<Ticket>,
    pub lottery: Option<LotteryBitmask>,
    pub mint: Option<MintState>,
    /// Lamports in the participant's wallet
    pub wallet_balance: Option<u64>,
    /// Raffle tokens held; `None` when the token account does not exist
    pub held_token_balance: Option<u64>,
}

impl AccountSnapshot {
    /// Decodes one refresh cycle's raw account data
    pub fn decode(
        program_id: &Pubkey,
        fair_launch: &Pubkey,
        wallet: &Pubkey,
        raw: RawAccounts,
        captured_at: UnixTimestamp,
    ) -> Result<Self, SnapshotError> {
        let account = raw.fair_launch.as_deref().map(FairLaunch::decode).transpose()?;
        let addresses = account
            .as_ref()
            .map(|account| FairLaunchAddresses::derive(program_id, fair_launch, account, wallet));

        let ticket = match (raw.ticket, addresses) {
            (Some(data), Some(addresses)) => {
                let decoded = FairLaunchTicket::decode(&data)?;
                Some(Ticket {
                    address: addresses.ticket,
                    seq: decoded.seq,
                    amount: decoded.amount,
                    state: TicketState::try_from(decoded.state)?,
                })
            }
            _ => None,
        };

        let mint = raw
            .candy_machine
            .map(|(address, data)| {
                CandyMachine::decode(&data)
                    .map(|account| MintState::from_account(address, account, captured_at))
            })
            .transpose()?;

        Ok(Self {
            captured_at,
            wallet: *wallet,
            fair_launch: *fair_launch,
            addresses,
            config: account.as_ref().map(|account| RaffleConfig::from(&account.data)),
            runtime: account
                .as_ref()
                .map(|account| RaffleRuntime::from_account(account, raw.treasury_balance)),
            ticket,
            lottery: raw.lottery.map(LotteryBitmask::decode).transpose()?,
            mint,
            wallet_balance: raw.wallet_balance,
            held_token_balance: raw.held_token_balance,
        })
    }

    /// Reads every account for one refresh cycle and decodes it
    pub async fn fetch<R>(
        rpc: &R,
        settings: &ClientConfig,
        fair_launch: &Pubkey,
        candy_machine: Option<&Pubkey>,
        wallet: &Pubkey,
        captured_at: UnixTimestamp,
    ) -> Result<Self, SnapshotError>
    where
        R: FairLaunchRpc + ?Sized,
    {
        let mut raw = RawAccounts {
            wallet_balance: Some(rpc.get_balance(wallet).await?),
            ..RawAccounts::default()
        };

        raw.fair_launch = rpc.get_account_data(fair_launch).await?;
        if let Some(data) = raw.fair_launch.as_deref() {
            let account = FairLaunch::decode(data)?;
            let addresses =
                FairLaunchAddresses::derive(&settings.fair_launch_program_id, fair_launch, &account, wallet);

            raw.ticket = rpc.get_account_data(&addresses.ticket).await?;
            raw.lottery = rpc.get_account_data(&addresses.lottery).await?;
            raw.treasury_balance = Some(rpc.get_balance(&addresses.treasury).await?);
            // Only a missing token account may read as zero tokens
            raw.held_token_balance = rpc
                .get_token_account_balance(&addresses.buyer_token_account)
                .await?;
        } else {
            debug!("Raffle account {} does not exist", fair_launch);
        }

        if let Some(address) = candy_machine {
            match rpc.get_account_data(address).await {
                Ok(Some(data)) => raw.candy_machine = Some((*address, data)),
                Ok(None) => debug!("Mint account {} does not exist", address),
                Err(e) => warn!("Problem getting mint state: {}", e),
            }
        }

        Self::decode(&settings.fair_launch_program_id, fair_launch, wallet, raw, captured_at)
    }

    /// Phase at the capture instant
    pub fn phase(&self) -> Phase {
        self.phase_at(self.captured_at)
    }

    pub fn phase_at(&self, now: UnixTimestamp) -> Phase {
        resolve_phase(
            self.config.as_ref(),
            self.runtime.as_ref(),
            self.mint.as_ref().and_then(|mint| mint.go_live),
            now,
        )
    }

    /// Raffle tokens held, with a missing token account counting as none
    pub fn held_tokens(&self) -> u64 {
        self.held_token_balance.unwrap_or(0)
    }

    pub fn is_winner(&self) -> Result<bool, LotteryError> {
        lottery::is_winner(
            self.lottery.as_ref().map(LotteryBitmask::as_bytes),
            self.ticket.as_ref().map(|ticket| ticket.seq),
            self.config.as_ref().map(|config| config.number_of_tokens),
            self.held_tokens(),
            self.runtime.as_ref().map_or(false, |runtime| runtime.phase_three_started),
        )
    }

    /// Bid suggested to the participant: the median, or the range start before one exists
    pub fn suggested_bid(&self) -> Option<u64> {
        let config = self.config.as_ref()?;
        Some(
            self.runtime
                .as_ref()
                .and_then(|runtime| runtime.current_median)
                .unwrap_or(config.price_range_start),
        )
    }

    /// Lamports locked by the anti-rug policy, if the raffle has one
    pub fn anti_rug_reserve(&self) -> Option<u64> {
        let setting = self.config.as_ref()?.anti_rug?;
        let treasury = self.runtime.as_ref()?.treasury_lamports?;
        Some(anti_rug_reserve(treasury, setting.reserve_bp))
    }

    /// Whether the mint went live before the grace period ended
    pub fn mint_predates_raffle(&self) -> bool {
        let go_live = self.mint.as_ref().and_then(|mint| mint.go_live);
        let phase_two_end = self.config.as_ref().and_then(|config| config.phase_two_end);
        matches!((go_live, phase_two_end), (Some(go_live), Some(end)) if go_live < end)
    }
}
