// Fair Launch Client - Ticket status derivation
use crate::error::{LotteryError, SnapshotError, ValidationError};
use crate::phase::Phase;
use crate::snapshot::{AccountSnapshot, Ticket, TicketState};

/// Semantic status of a participant's ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    /// The wallet never bid
    NoBid,
    /// Bid at or above the median, or no median yet
    ActiveBid,
    /// Below the median while bids can still be raised
    BelowMedianPending,
    /// Below the median after bidding closed; left out of the lottery
    BelowMedianExcluded,
    Withdrawn,
    WinnerUnpunched,
    /// Punched, raffle token not yet exchanged. Also covers a wallet holding
    /// raffle tokens without a ticket of its own.
    WinnerPunched,
    /// Punched and the raffle token has been exchanged
    WinnerClaimed,
    /// Lost the lottery; the bid can be withdrawn
    LoserEligibleForRefund,
}

impl TicketStatus {
    /// No later snapshot can move a ticket out of these
    pub fn is_terminal(self) -> bool {
        matches!(self, TicketStatus::Withdrawn | TicketStatus::WinnerClaimed)
    }
}

/// The five mutating actions a participant may take
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    PlaceBid,
    Punch,
    Withdraw,
    RugRefund,
    Mint,
}

/// Derives ticket status from a snapshot
pub struct TicketLedger;

impl TicketLedger {
    pub fn status(snapshot: &AccountSnapshot, phase: Phase) -> Result<TicketStatus, LotteryError> {
        let ticket = match snapshot.ticket.as_ref() {
            Some(ticket) => ticket,
            // Raffle tokens only come out of a punch
            None if snapshot.held_tokens() > 0 => return Ok(TicketStatus::WinnerPunched),
            None => return Ok(TicketStatus::NoBid),
        };

        match ticket.state {
            TicketState::Withdrawn => return Ok(TicketStatus::Withdrawn),
            TicketState::Punched if snapshot.held_tokens() == 0 => {
                return Ok(TicketStatus::WinnerClaimed)
            }
            TicketState::Punched => return Ok(TicketStatus::WinnerPunched),
            TicketState::Unpunched => {}
        }

        let below_median = snapshot
            .runtime
            .as_ref()
            .and_then(|runtime| runtime.current_median)
            .map_or(false, |median| ticket.amount < median);

        Ok(match phase {
            Phase::Bidding | Phase::Grace if below_median => TicketStatus::BelowMedianPending,
            Phase::LotteryPending | Phase::PostLottery | Phase::Live if below_median => {
                TicketStatus::BelowMedianExcluded
            }
            Phase::PostLottery | Phase::Live => {
                if snapshot.is_winner()? {
                    TicketStatus::WinnerUnpunched
                } else {
                    TicketStatus::LoserEligibleForRefund
                }
            }
            _ => TicketStatus::ActiveBid,
        })
    }

    /// Whether `action` may be attempted for a ticket in `status` during `phase`.
    /// Checks that need more than the status (funds, dates, mint flags) are
    /// left to the orchestrator.
    pub fn allows(status: TicketStatus, phase: Phase, action: Action) -> bool {
        use TicketStatus::*;

        match action {
            Action::PlaceBid => match phase {
                Phase::Bidding => matches!(status, NoBid | ActiveBid | BelowMedianPending),
                Phase::Grace => matches!(status, ActiveBid | BelowMedianPending),
                _ => false,
            },
            Action::Punch => phase.lottery_resolved() && status == WinnerUnpunched,
            Action::Withdraw => match phase {
                Phase::Bidding | Phase::Grace => matches!(status, ActiveBid | BelowMedianPending),
                Phase::PostLottery | Phase::Live => {
                    matches!(status, LoserEligibleForRefund | BelowMedianExcluded)
                }
                _ => false,
            },
            Action::RugRefund => status == WinnerPunched,
            Action::Mint => phase == Phase::Live && matches!(status, WinnerUnpunched | WinnerPunched),
        }
    }

    /// Same decision as [`TicketLedger::allows`], naming the reason on refusal
    pub fn check(status: TicketStatus, phase: Phase, action: Action) -> Result<(), ValidationError> {
        use TicketStatus::*;

        if Self::allows(status, phase, action) {
            return Ok(());
        }
        Err(match (status, action) {
            (NoBid, Action::PlaceBid) if phase == Phase::Grace => ValidationError::NewBidDuringGrace,
            (NoBid, _) => ValidationError::NoTicket,
            (Withdrawn, _) => ValidationError::TicketWithdrawn,
            (WinnerClaimed, Action::RugRefund | Action::Mint) => ValidationError::AlreadyClaimed,
            (WinnerPunched | WinnerClaimed, _) => ValidationError::TicketPunched,
            (_, Action::RugRefund) => ValidationError::TicketNotPunched,
            (WinnerUnpunched, Action::Withdraw) => ValidationError::WinnerMustPunch,
            (LoserEligibleForRefund | BelowMedianExcluded, Action::Punch | Action::Mint) => {
                ValidationError::NotAWinner
            }
            _ => ValidationError::WrongPhase(phase),
        })
    }

    /// Rejects a refreshed snapshot whose ticket left a terminal state
    pub fn check_progression(previous: &AccountSnapshot, next: &AccountSnapshot) -> Result<(), SnapshotError> {
        let (before, after) = match (previous.ticket.as_ref(), next.ticket.as_ref()) {
            (Some(before), after) => (before, after),
            (None, _) => return Ok(()),
        };
        if !before.state.is_terminal() {
            return Ok(());
        }
        match after {
            Some(Ticket { state, .. }) if *state == before.state => Ok(()),
            _ => Err(SnapshotError::TerminalRegression {
                ticket: before.address,
            }),
        }
    }
}
