// Fair Launch Client - Transaction orchestration
use solana_program::{
    clock::UnixTimestamp, instruction::Instruction, program_error::ProgramError, pubkey::Pubkey,
};
use solana_sdk::signature::Signature;
use std::{fmt, sync::Arc};
use tracing::{info, warn};

use crate::classify::{classify, ErrorKind, RawFailure};
use crate::config::ClientConfig;
use crate::confirmation::{ConfirmationResult, ConfirmationWatcher};
use crate::error::{LotteryError, ValidationError};
use crate::instruction::{
    adjust_ticket, create_buyer_token_account, create_exchange_mint, mint_nft, punch_ticket,
    purchase_ticket, receive_refund, MintNftAccounts,
};
use crate::phase::Phase;
use crate::rpc::FairLaunchRpc;
use crate::snapshot::{AccountSnapshot, FairLaunchAddresses, RaffleConfig};
use crate::ticket::{Action, TicketLedger, TicketStatus};

/// The five mutating operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    PlaceBid,
    PunchTicket,
    WithdrawTicket,
    ClaimAntiRugRefund,
    MintExchange,
}

impl Operation {
    /// Operations whose on-chain effect cannot be undone
    pub fn is_irreversible(self) -> bool {
        matches!(
            self,
            Operation::PunchTicket | Operation::WithdrawTicket | Operation::ClaimAntiRugRefund
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::PlaceBid => "place bid",
            Operation::PunchTicket => "punch ticket",
            Operation::WithdrawTicket => "withdraw ticket",
            Operation::ClaimAntiRugRefund => "claim anti-rug refund",
            Operation::MintExchange => "mint exchange",
        };
        f.write_str(name)
    }
}

/// Confirmed transactions of a successful operation, in submission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub operation: Operation,
    pub signatures: Vec<Signature>,
}

/// A classified failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub operation: Operation,
    pub kind: ErrorKind,
    /// Program error code, when the cluster reported one
    pub code: Option<u32>,
    /// Raw message, kept for display
    pub message: String,
    /// Transaction that failed or timed out, if one was submitted
    pub signature: Option<Signature>,
    /// Earlier steps of the same operation that were confirmed
    pub landed: Vec<Signature>,
}

/// Result of an orchestrator operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Receipt),
    Failure(Failure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Whether cached snapshot state is stale after this outcome
    pub fn requires_refresh(&self) -> bool {
        match self {
            Outcome::Success(_) => true,
            Outcome::Failure(failure) => failure.kind.requires_refresh() || !failure.landed.is_empty(),
        }
    }
}

/// Reasons an operation stops before anything is submitted
#[derive(Debug)]
enum Rejection {
    Validation(ValidationError),
    Lottery(LotteryError),
    Build(ProgramError),
}

impl From<ValidationError> for Rejection {
    fn from(e: ValidationError) -> Self {
        Rejection::Validation(e)
    }
}

impl From<LotteryError> for Rejection {
    fn from(e: LotteryError) -> Self {
        Rejection::Lottery(e)
    }
}

impl From<ProgramError> for Rejection {
    fn from(e: ProgramError) -> Self {
        Rejection::Build(e)
    }
}

impl Rejection {
    fn into_failure(self, operation: Operation) -> Failure {
        let (kind, message) = match self {
            Rejection::Validation(e) => (ErrorKind::from(&e), e.to_string()),
            Rejection::Lottery(e) => (ErrorKind::Unknown, e.to_string()),
            Rejection::Build(e) => (ErrorKind::Unknown, e.to_string()),
        };
        warn!("Rejected {}: {}", operation, message);
        Failure {
            operation,
            kind,
            code: None,
            message,
            signature: None,
            landed: Vec::new(),
        }
    }
}

/// Builds, submits and confirms the participant's transactions.
///
/// Every operation validates against the snapshot passed in, captured
/// before the call, and folds every failure into an [`Outcome`]. Operations
/// borrow the orchestrator mutably, so at most one is in flight at a time.
/// Nothing is retried.
pub struct TransactionOrchestrator<R: FairLaunchRpc + ?Sized> {
    rpc: Arc<R>,
    settings: ClientConfig,
    watcher: ConfirmationWatcher<R>,
}

impl<R: FairLaunchRpc + ?Sized> TransactionOrchestrator<R> {
    pub fn new(rpc: Arc<R>, settings: ClientConfig) -> Self {
        let watcher = ConfirmationWatcher::new(rpc.clone(), settings.poll_interval);
        Self {
            rpc,
            settings,
            watcher,
        }
    }

    pub fn settings(&self) -> &ClientConfig {
        &self.settings
    }

    /// Inserts a ticket or adjusts the existing one to `amount` lamports.
    /// An amount of zero withdraws the existing ticket.
    pub async fn place_or_update_bid(
        &mut self,
        snapshot: &AccountSnapshot,
        amount: u64,
        now: UnixTimestamp,
    ) -> Outcome {
        let operation = Operation::PlaceBid;
        match self.plan_bid(snapshot, amount, now) {
            Ok(instructions) => self.run(operation, vec![instructions]).await,
            Err(rejection) => Outcome::Failure(rejection.into_failure(operation)),
        }
    }

    pub async fn punch_ticket(&mut self, snapshot: &AccountSnapshot, now: UnixTimestamp) -> Outcome {
        let operation = Operation::PunchTicket;
        match self.plan_punch(snapshot, now) {
            Ok(instructions) => self.run(operation, vec![instructions]).await,
            Err(rejection) => Outcome::Failure(rejection.into_failure(operation)),
        }
    }

    pub async fn withdraw_ticket(&mut self, snapshot: &AccountSnapshot, now: UnixTimestamp) -> Outcome {
        let operation = Operation::WithdrawTicket;
        match self.plan_withdraw(snapshot, now) {
            Ok(instructions) => self.run(operation, vec![instructions]).await,
            Err(rejection) => Outcome::Failure(rejection.into_failure(operation)),
        }
    }

    pub async fn claim_anti_rug_refund(
        &mut self,
        snapshot: &AccountSnapshot,
        now: UnixTimestamp,
    ) -> Outcome {
        let operation = Operation::ClaimAntiRugRefund;
        match self.plan_refund(snapshot, now) {
            Ok(instructions) => self.run(operation, vec![instructions]).await,
            Err(rejection) => Outcome::Failure(rejection.into_failure(operation)),
        }
    }

    /// Exchanges the raffle token for a fresh mint at `new_mint`, whose
    /// keypair the RPC collaborator signs with. An unpunched winning ticket
    /// is punched first in its own transaction.
    pub async fn mint_exchange(
        &mut self,
        snapshot: &AccountSnapshot,
        new_mint: &Pubkey,
        now: UnixTimestamp,
    ) -> Outcome {
        let operation = Operation::MintExchange;
        match self.plan_mint(snapshot, new_mint, now) {
            Ok(steps) => self.run(operation, steps).await,
            Err(rejection) => Outcome::Failure(rejection.into_failure(operation)),
        }
    }

    fn plan_bid(
        &self,
        snapshot: &AccountSnapshot,
        amount: u64,
        now: UnixTimestamp,
    ) -> Result<Vec<Instruction>, Rejection> {
        let (config, addresses) = loaded(snapshot)?;
        let phase = snapshot.phase_at(now);
        if !phase.accepts_bids() {
            return Err(ValidationError::WrongPhase(phase).into());
        }

        if amount == 0 {
            return self.plan_withdraw(snapshot, now);
        }

        gate(snapshot, phase, Action::PlaceBid)?;
        let existing = snapshot.ticket.as_ref().map(|ticket| ticket.amount);

        check_bid_schedule(config, amount)?;

        let balance = snapshot.wallet_balance.ok_or(ValidationError::BalanceUnknown)?;
        let available = balance.saturating_add(existing.unwrap_or(0));
        let required = amount
            .saturating_add(config.fee)
            .saturating_add(self.settings.bid_safety_margin);
        if required > available {
            return Err(ValidationError::InsufficientFunds {
                required,
                available,
            }
            .into());
        }

        let program_id = &self.settings.fair_launch_program_id;
        Ok(vec![match existing {
            None => purchase_ticket(
                program_id,
                &addresses.ticket,
                &addresses.fair_launch,
                &addresses.treasury,
                &snapshot.wallet,
                addresses.ticket_bump,
                amount,
            ),
            Some(_) => adjust_ticket(
                program_id,
                &addresses.ticket,
                &addresses.fair_launch,
                &addresses.lottery,
                &addresses.treasury,
                &snapshot.wallet,
                amount,
            ),
        }])
    }

    fn plan_withdraw(&self, snapshot: &AccountSnapshot, now: UnixTimestamp) -> Result<Vec<Instruction>, Rejection> {
        let (_, addresses) = loaded(snapshot)?;
        gate(snapshot, snapshot.phase_at(now), Action::Withdraw)?;

        Ok(vec![adjust_ticket(
            &self.settings.fair_launch_program_id,
            &addresses.ticket,
            &addresses.fair_launch,
            &addresses.lottery,
            &addresses.treasury,
            &snapshot.wallet,
            0,
        )])
    }

    fn plan_punch(&self, snapshot: &AccountSnapshot, now: UnixTimestamp) -> Result<Vec<Instruction>, Rejection> {
        let (_, addresses) = loaded(snapshot)?;
        let phase = snapshot.phase_at(now);
        if !phase.lottery_resolved() {
            return Err(ValidationError::WrongPhase(phase).into());
        }
        gate(snapshot, phase, Action::Punch)?;
        Ok(self.punch_instructions(snapshot, addresses))
    }

    fn punch_instructions(&self, snapshot: &AccountSnapshot, addresses: &FairLaunchAddresses) -> Vec<Instruction> {
        let mut instructions = Vec::with_capacity(2);
        if snapshot.held_token_balance.is_none() {
            instructions.push(create_buyer_token_account(
                &snapshot.wallet,
                &snapshot.wallet,
                &addresses.token_mint,
            ));
        }
        instructions.push(punch_ticket(
            &self.settings.fair_launch_program_id,
            &addresses.ticket,
            &addresses.fair_launch,
            &addresses.lottery,
            &snapshot.wallet,
            &addresses.buyer_token_account,
            &addresses.token_mint,
        ));
        instructions
    }

    fn plan_refund(&self, snapshot: &AccountSnapshot, now: UnixTimestamp) -> Result<Vec<Instruction>, Rejection> {
        let (config, addresses) = loaded(snapshot)?;
        let anti_rug = config.anti_rug.ok_or(ValidationError::NoAntiRugPolicy)?;
        // The refund burns the raffle token, so a spent one reads as claimed
        gate(snapshot, snapshot.phase_at(now), Action::RugRefund)?;
        if now < anti_rug.self_destruct_date {
            return Err(ValidationError::RefundNotYetAvailable {
                available_at: anti_rug.self_destruct_date,
            }
            .into());
        }

        Ok(vec![receive_refund(
            &self.settings.fair_launch_program_id,
            &addresses.fair_launch,
            &addresses.treasury,
            &snapshot.wallet,
            &addresses.buyer_token_account,
            &addresses.token_mint,
        )])
    }

    /// One instruction batch per transaction, submitted in order
    fn plan_mint(
        &self,
        snapshot: &AccountSnapshot,
        new_mint: &Pubkey,
        now: UnixTimestamp,
    ) -> Result<Vec<Vec<Instruction>>, Rejection> {
        let (_, addresses) = loaded(snapshot)?;
        let phase = snapshot.phase_at(now);
        if phase != Phase::Live {
            return Err(ValidationError::WrongPhase(phase).into());
        }
        let mint = snapshot.mint.as_ref().ok_or(ValidationError::NoMint)?;
        if mint.is_sold_out {
            return Err(ValidationError::SoldOut.into());
        }
        if !mint.is_active {
            return Err(ValidationError::MintInactive.into());
        }

        let mut steps = Vec::with_capacity(2);
        if gate(snapshot, phase, Action::Mint)? == TicketStatus::WinnerUnpunched {
            steps.push(self.punch_instructions(snapshot, addresses));
        }

        let mut exchange = create_exchange_mint(&snapshot.wallet, new_mint)?;
        exchange.push(mint_nft(
            &self.settings.candy_machine_program_id,
            &self.settings.token_metadata_program_id,
            MintNftAccounts {
                candy_machine: &mint.address,
                config: &mint.account.config,
                wallet: &mint.account.wallet,
                payer: &snapshot.wallet,
                mint: new_mint,
                fair_launch: &addresses.fair_launch,
                buyer_token_account: &addresses.buyer_token_account,
                token_mint: &addresses.token_mint,
            },
        ));
        steps.push(exchange);
        Ok(steps)
    }

    /// Submits each batch as one transaction and waits for it before the next
    async fn run(&self, operation: Operation, steps: Vec<Vec<Instruction>>) -> Outcome {
        let mut landed = Vec::with_capacity(steps.len());
        for instructions in steps {
            let signature = match self.rpc.send_instructions(&instructions).await {
                Ok(signature) => signature,
                Err(e) => {
                    warn!("Problem submitting {}: {}", operation, e);
                    return Outcome::Failure(failure(operation, RawFailure::from(&e), None, landed));
                }
            };
            info!("Submitted {} as {}", operation, signature);

            let result = self
                .watcher
                .await_confirmation(&signature, self.settings.tx_timeout, self.settings.commitment)
                .await;
            match result {
                ConfirmationResult::Confirmed => landed.push(signature),
                ConfirmationResult::Failed(err) => {
                    return Outcome::Failure(failure(operation, RawFailure::from(&err), Some(signature), landed))
                }
                ConfirmationResult::Timeout => {
                    return Outcome::Failure(failure(operation, RawFailure::TimedOut, Some(signature), landed))
                }
            }
        }

        info!("Completed {}", operation);
        Outcome::Success(Receipt {
            operation,
            signatures: landed,
        })
    }
}

fn failure(operation: Operation, raw: RawFailure, signature: Option<Signature>, landed: Vec<Signature>) -> Failure {
    let kind = classify(&raw);
    let message = raw
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| "Transaction not confirmed in time; it may still land".to_string());
    warn!("{} failed as {:?}: {}", operation, kind, message);
    Failure {
        operation,
        kind,
        code: raw.code(),
        message,
        signature,
        landed,
    }
}

fn loaded(snapshot: &AccountSnapshot) -> Result<(&RaffleConfig, &FairLaunchAddresses), ValidationError> {
    match (snapshot.config.as_ref(), snapshot.addresses.as_ref()) {
        (Some(config), Some(addresses)) => Ok((config, addresses)),
        _ => Err(ValidationError::RaffleNotLoaded),
    }
}

/// Derives the ticket status and refuses actions it does not permit
fn gate(snapshot: &AccountSnapshot, phase: Phase, action: Action) -> Result<TicketStatus, Rejection> {
    let status = TicketLedger::status(snapshot, phase)?;
    TicketLedger::check(status, phase, action)?;
    Ok(status)
}

fn check_bid_schedule(config: &RaffleConfig, amount: u64) -> Result<(), ValidationError> {
    if amount < config.price_range_start || amount > config.price_range_end {
        return Err(ValidationError::BidOutOfRange {
            amount,
            min: config.price_range_start,
            max: config.price_range_end,
        });
    }
    if config.tick_size > 0 && (amount - config.price_range_start) % config.tick_size != 0 {
        return Err(ValidationError::BidOffTick {
            amount,
            tick_size: config.tick_size,
        });
    }
    Ok(())
}
