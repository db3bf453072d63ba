// Fair Launch Client - Lottery winner lookup
use crate::error::LotteryError;
use crate::state::LOTTERY_HEADER_LEN;

/// Byte index and bit position of a sequence number inside the bitmap account.
/// Flags are packed most-significant bit first.
pub fn bit_location(sequence: u64) -> (usize, u8) {
    let byte_index = LOTTERY_HEADER_LEN + (sequence / 8) as usize;
    let bit_position = 7 - (sequence % 8) as u8;
    (byte_index, bit_position)
}

/// Decides whether a ticket won the lottery.
///
/// Holding any raffle token is conclusive on its own. Otherwise the raw bitmap
/// account data, the ticket's sequence number, the raffle's token count, and a
/// resolved lottery are all required; without them the result is not yet known
/// and reads as `false`. Only sequences below the token count carry a flag, so
/// anything at or past it is an error rather than a loss, as is a sequence
/// that maps past the end of the bitmap.
pub fn is_winner(
    bitmask: Option<&[u8]>,
    sequence: Option<u64>,
    token_count: Option<u64>,
    held_token_balance: u64,
    phase_three_started: bool,
) -> Result<bool, LotteryError> {
    if held_token_balance > 0 {
        return Ok(true);
    }
    let (bitmask, sequence, token_count) = match (bitmask, sequence, token_count) {
        (Some(bitmask), Some(sequence), Some(token_count))
            if !bitmask.is_empty() && phase_three_started =>
        {
            (bitmask, sequence, token_count)
        }
        _ => return Ok(false),
    };

    // Trailing bytes past the last token are padding
    if sequence >= token_count {
        return Err(LotteryError::SequenceOutOfRange {
            sequence,
            token_count,
        });
    }

    let (byte_index, bit_position) = bit_location(sequence);
    let byte = bitmask
        .get(byte_index)
        .ok_or(LotteryError::BitmaskTooShort {
            sequence,
            byte_index,
            len: bitmask.len(),
        })?;
    Ok(byte & (1u8 << bit_position) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(flags: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; LOTTERY_HEADER_LEN];
        data.extend_from_slice(flags);
        data
    }

    #[test]
    fn test_first_sequence_is_most_significant_bit() {
        let (byte_index, bit_position) = bit_location(0);
        assert_eq!(byte_index, 41);
        assert_eq!(1u8 << bit_position, 0b1000_0000);
    }

    #[test]
    fn test_sequence_nine_in_second_byte() {
        assert_eq!(bit_location(9), (42, 6));

        let winning = bitmap(&[0, 0b0100_0000]);
        assert_eq!(is_winner(Some(&winning[..]), Some(9), Some(16), 0, true), Ok(true));

        let losing = bitmap(&[0, 0b1011_1111]);
        assert_eq!(is_winner(Some(&losing[..]), Some(9), Some(16), 0, true), Ok(false));
    }

    #[test]
    fn test_each_sequence_has_its_own_bit() {
        let mut seen = std::collections::HashSet::new();
        let full = bitmap(&[0xff; 8]);
        for sequence in 0..64u64 {
            let location = bit_location(sequence);
            assert!(seen.insert(location), "sequence {} collides", sequence);
            assert_eq!(is_winner(Some(&full[..]), Some(sequence), Some(64), 0, true), Ok(true));
        }
        assert_eq!(seen.len(), 64);
    }

    #[test]
    fn test_held_balance_short_circuits() {
        assert_eq!(is_winner(None, None, None, 5, false), Ok(true));
        assert_eq!(is_winner(Some(&[][..]), Some(1_000_000), Some(8), 5, true), Ok(true));
    }

    #[test]
    fn test_unresolved_inputs_are_not_winners() {
        let full = bitmap(&[0xff]);
        assert_eq!(is_winner(Some(&full[..]), Some(0), Some(8), 0, false), Ok(false));
        assert_eq!(is_winner(Some(&full[..]), None, Some(8), 0, true), Ok(false));
        assert_eq!(is_winner(Some(&full[..]), Some(0), None, 0, true), Ok(false));
        assert_eq!(is_winner(None, Some(0), Some(8), 0, true), Ok(false));
        assert_eq!(is_winner(Some(&[][..]), Some(0), Some(8), 0, true), Ok(false));
    }

    #[test]
    fn test_out_of_range_sequence_is_an_error() {
        let data = bitmap(&[0xff, 0xff]);
        assert_eq!(
            is_winner(Some(&data[..]), Some(16), Some(16), 0, true),
            Err(LotteryError::SequenceOutOfRange {
                sequence: 16,
                token_count: 16
            })
        );
        assert_eq!(
            is_winner(Some(&data[..]), Some(16), Some(24), 0, true),
            Err(LotteryError::BitmaskTooShort {
                sequence: 16,
                byte_index: 43,
                len: 43
            })
        );
    }

    #[test]
    fn test_padding_past_token_count_is_not_read() {
        // 16 tokens fill two flag bytes, the account carries 8 more
        let mut flags = vec![0u8, 0u8];
        flags.extend_from_slice(&[0xff; 8]);
        let data = bitmap(&flags);

        assert_eq!(is_winner(Some(&data[..]), Some(15), Some(16), 0, true), Ok(false));
        assert_eq!(
            is_winner(Some(&data[..]), Some(40), Some(16), 0, true),
            Err(LotteryError::SequenceOutOfRange {
                sequence: 40,
                token_count: 16
            })
        );
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let data = bitmap(&[0b1010_0101, 0b0101_1010]);
        for sequence in 0..16u64 {
            let first = is_winner(Some(&data[..]), Some(sequence), Some(64), 0, true);
            let second = is_winner(Some(&data[..]), Some(sequence), Some(64), 0, true);
            assert_eq!(first, second);
        }
    }
}
