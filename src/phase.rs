// Fair Launch Client - Phase resolution
use solana_program::clock::UnixTimestamp;

use crate::snapshot::{RaffleConfig, RaffleRuntime};

/// Discrete phase of the raffle, derived from account data and the clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Bidding has not opened yet
    Anticipation,
    /// Bids may be placed and adjusted
    Bidding,
    /// Existing bids may be adjusted or withdrawn
    Grace,
    /// Bidding is over and the lottery has not been resolved on-chain
    LotteryPending,
    /// Lottery resolved, mint not live
    PostLottery,
    /// Lottery resolved and the mint has gone live
    Live,
    /// Account data did not allow any phase to be established
    Unknown,
}

impl Phase {
    /// Position along the raffle timeline. PostLottery and Live share a rank
    /// since either can follow LotteryPending.
    pub fn ordinal(self) -> Option<u8> {
        match self {
            Phase::Anticipation => Some(0),
            Phase::Bidding => Some(1),
            Phase::Grace => Some(2),
            Phase::LotteryPending => Some(3),
            Phase::PostLottery | Phase::Live => Some(4),
            Phase::Unknown => None,
        }
    }

    pub fn accepts_bids(self) -> bool {
        matches!(self, Phase::Bidding | Phase::Grace)
    }

    pub fn lottery_resolved(self) -> bool {
        matches!(self, Phase::PostLottery | Phase::Live)
    }
}

/// Resolves the phase at `now`. The first matching rule wins; a missing
/// timestamp never matches its rule.
pub fn resolve_phase(
    config: Option<&RaffleConfig>,
    runtime: Option<&RaffleRuntime>,
    mint_go_live: Option<UnixTimestamp>,
    now: UnixTimestamp,
) -> Phase {
    let phase_one_start = config.and_then(|c| c.phase_one_start);
    let phase_one_end = config.and_then(|c| c.phase_one_end);
    let phase_two_end = config.and_then(|c| c.phase_two_end);

    if phase_one_start.map_or(false, |start| now < start) {
        return Phase::Anticipation;
    }
    if phase_one_end.map_or(false, |end| now <= end) {
        return Phase::Bidding;
    }
    if phase_two_end.map_or(false, |end| now <= end) {
        return Phase::Grace;
    }

    // Resolution is an on-chain event, so elapsed time alone never ends LotteryPending
    let phase_three_started = match runtime {
        Some(runtime) => runtime.phase_three_started,
        // An unloaded raffle stays visible as Unknown instead of reading as LotteryPending
        None => return Phase::Unknown,
    };
    if !phase_three_started {
        return Phase::LotteryPending;
    }
    match mint_go_live {
        Some(go_live) if now > go_live => Phase::Live,
        _ => Phase::PostLottery,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: UnixTimestamp = 1_000;
    const ONE_END: UnixTimestamp = 2_000;
    const TWO_END: UnixTimestamp = 3_000;

    fn config() -> RaffleConfig {
        RaffleConfig {
            phase_one_start: Some(START),
            phase_one_end: Some(ONE_END),
            phase_two_end: Some(TWO_END),
            ..RaffleConfig::default()
        }
    }

    fn runtime(phase_three_started: bool) -> RaffleRuntime {
        RaffleRuntime {
            phase_three_started,
            ..RaffleRuntime::default()
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let config = config();
        let pending = runtime(false);
        let at = |now| resolve_phase(Some(&config), Some(&pending), None, now);

        assert_eq!(at(START - 1), Phase::Anticipation);
        assert_eq!(at(START), Phase::Bidding);
        assert_eq!(at(ONE_END), Phase::Bidding);
        assert_eq!(at(ONE_END + 1), Phase::Grace);
        assert_eq!(at(TWO_END), Phase::Grace);
        assert_eq!(at(TWO_END + 1), Phase::LotteryPending);
        assert_eq!(at(TWO_END + 1_000_000), Phase::LotteryPending);
    }

    #[test]
    fn test_grace_is_checked_before_lottery_flag() {
        // The flag is already set, but the Grace window still wins
        let config = config();
        let resolved = runtime(true);
        assert_eq!(
            resolve_phase(Some(&config), Some(&resolved), Some(0), TWO_END),
            Phase::Grace
        );
        assert_eq!(
            resolve_phase(Some(&config), Some(&runtime(false)), None, TWO_END),
            Phase::Grace
        );
    }

    #[test]
    fn test_post_lottery_and_live() {
        let config = config();
        let resolved = runtime(true);
        let go_live = TWO_END + 500;

        assert_eq!(resolve_phase(Some(&config), Some(&resolved), None, go_live + 10), Phase::PostLottery);
        assert_eq!(resolve_phase(Some(&config), Some(&resolved), Some(go_live), go_live), Phase::PostLottery);
        assert_eq!(resolve_phase(Some(&config), Some(&resolved), Some(go_live), go_live + 1), Phase::Live);
    }

    #[test]
    fn test_missing_timestamps_are_not_reached() {
        let partial = RaffleConfig {
            phase_one_start: None,
            phase_one_end: None,
            phase_two_end: Some(TWO_END),
            ..RaffleConfig::default()
        };
        assert_eq!(resolve_phase(Some(&partial), Some(&runtime(false)), None, 0), Phase::Grace);
        assert_eq!(resolve_phase(None, Some(&runtime(false)), None, 0), Phase::LotteryPending);
        assert_eq!(resolve_phase(None, None, None, 0), Phase::Unknown);
    }

    #[test]
    fn test_phase_never_moves_backwards() {
        let config = config();
        for phase_three_started in [false, true] {
            let runtime = runtime(phase_three_started);
            let mut previous = 0;
            for now in (START - 10..TWO_END + 600).step_by(7) {
                let phase = resolve_phase(Some(&config), Some(&runtime), Some(TWO_END + 300), now);
                let rank = phase.ordinal().unwrap();
                assert!(rank >= previous, "phase went backwards at {}", now);
                previous = rank;
            }
        }
    }
}
