// Fair Launch Client - Utility Functions
use solana_program::pubkey::Pubkey;

/// Seed prefix shared by every fair launch PDA
pub const PREFIX: &[u8] = b"fair_launch";
pub const LOTTERY: &[u8] = b"lottery";
pub const METADATA: &[u8] = b"metadata";
pub const EDITION: &[u8] = b"edition";

/// Find the program derived address of a participant's ticket
pub fn find_ticket_address(program_id: &Pubkey, fair_launch: &Pubkey, buyer: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PREFIX, fair_launch.as_ref(), buyer.as_ref()], program_id)
}

/// Find the program derived address of the lottery bitmap
pub fn find_lottery_address(program_id: &Pubkey, fair_launch: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PREFIX, fair_launch.as_ref(), LOTTERY], program_id)
}

/// Find the metadata account of a freshly minted token
pub fn find_metadata_address(metadata_program_id: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[METADATA, metadata_program_id.as_ref(), mint.as_ref()],
        metadata_program_id,
    )
    .0
}

/// Find the master edition account of a freshly minted token
pub fn find_master_edition_address(metadata_program_id: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[METADATA, metadata_program_id.as_ref(), mint.as_ref(), EDITION],
        metadata_program_id,
    )
    .0
}

/// Lamports held back by an anti-rug policy
pub fn anti_rug_reserve(treasury_lamports: u64, reserve_bp: u16) -> u64 {
    (treasury_lamports as u128 * reserve_bp as u128 / 10_000) as u64
}
