// Fair Launch Client - Instructions
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::{clock, rent},
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use spl_token::state::Mint;

use crate::utils::{find_master_edition_address, find_metadata_address};

/// Size of the Anchor instruction sighash
pub const SIGHASH_LEN: usize = 8;

/// Computes the Anchor sighash of a global instruction
pub fn sighash(name: &str) -> [u8; SIGHASH_LEN] {
    let digest = hash(format!("global:{}", name).as_bytes());
    let mut out = [0u8; SIGHASH_LEN];
    out.copy_from_slice(&digest.to_bytes()[..SIGHASH_LEN]);
    out
}

#[derive(Clone, Debug, PartialEq)]
pub enum FairLaunchInstruction {
    /// Insert a new ticket
    ///
    /// Accounts expected:
    /// 0. `[writable]` The ticket account (PDA)
    /// 1. `[writable]` The fair launch account
    /// 2. `[writable]` The treasury
    /// 3. `[signer, writable]` The buyer
    /// 4. `[signer, writable]` The payer
    /// 5. `[]` The system program
    /// 6. `[]` The rent sysvar
    /// 7. `[]` The clock sysvar
    PurchaseTicket {
        /// Bump of the ticket PDA
        bump: u8,
        /// Bid in lamports
        amount: u64,
    },

    /// Update the amount of an existing ticket. An amount of zero withdraws it.
    ///
    /// Accounts expected:
    /// 0. `[writable]` The ticket account
    /// 1. `[writable]` The fair launch account
    /// 2. `[]` The lottery bitmap
    /// 3. `[writable]` The treasury
    /// 4. `[signer, writable]` The buyer
    /// 5. `[]` The system program
    /// 6. `[]` The clock sysvar
    AdjustTicket {
        /// New bid in lamports
        amount: u64,
    },

    /// Claim a winning ticket, minting one raffle token to the buyer
    ///
    /// Accounts expected:
    /// 0. `[writable]` The ticket account
    /// 1. `[writable]` The fair launch account
    /// 2. `[]` The lottery bitmap
    /// 3. `[signer, writable]` The payer
    /// 4. `[writable]` The buyer's raffle token account
    /// 5. `[writable]` The raffle token mint
    /// 6. `[]` The token program
    PunchTicket {},

    /// Burn a raffle token against the anti-rug reserve
    ///
    /// Accounts expected:
    /// 0. `[writable]` The fair launch account
    /// 1. `[writable]` The treasury
    /// 2. `[signer, writable]` The buyer
    /// 3. `[writable]` The buyer's raffle token account
    /// 4. `[writable]` The raffle token mint
    /// 5. `[]` The token program
    /// 6. `[]` The system program
    /// 7. `[]` The clock sysvar
    ReceiveRefund {},
}

impl FairLaunchInstruction {
    fn name(&self) -> &'static str {
        match self {
            Self::PurchaseTicket { .. } => "purchase_ticket",
            Self::AdjustTicket { .. } => "adjust_ticket",
            Self::PunchTicket {} => "punch_ticket",
            Self::ReceiveRefund {} => "receive_refund",
        }
    }

    /// Packs a FairLaunchInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = sighash(self.name()).to_vec();
        match *self {
            Self::PurchaseTicket { bump, amount } => {
                buf.push(bump);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::AdjustTicket { amount } => buf.extend_from_slice(&amount.to_le_bytes()),
            Self::PunchTicket {} | Self::ReceiveRefund {} => {}
        }
        buf
    }

    /// Unpacks a byte buffer into a FairLaunchInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        if input.len() < SIGHASH_LEN {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (tag, mut rest) = input.split_at(SIGHASH_LEN);

        Ok(if tag == sighash("purchase_ticket") {
            let (bump, amount) = <(u8, u64)>::deserialize(&mut rest)
                .map_err(|_| ProgramError::InvalidInstructionData)?;
            Self::PurchaseTicket { bump, amount }
        } else if tag == sighash("adjust_ticket") {
            let amount =
                u64::deserialize(&mut rest).map_err(|_| ProgramError::InvalidInstructionData)?;
            Self::AdjustTicket { amount }
        } else if tag == sighash("punch_ticket") {
            Self::PunchTicket {}
        } else if tag == sighash("receive_refund") {
            Self::ReceiveRefund {}
        } else {
            return Err(ProgramError::InvalidInstructionData);
        })
    }
}

/// Candy machine mint, burning one raffle token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintNft;

impl MintNft {
    pub fn pack(&self) -> Vec<u8> {
        sighash("mint_nft").to_vec()
    }
}

/// Create purchase_ticket instruction
pub fn purchase_ticket(
    program_id: &Pubkey,
    ticket: &Pubkey,
    fair_launch: &Pubkey,
    treasury: &Pubkey,
    buyer: &Pubkey,
    bump: u8,
    amount: u64,
) -> Instruction {
    let data = FairLaunchInstruction::PurchaseTicket { bump, amount }.pack();

    let accounts = vec![
        AccountMeta::new(*ticket, false),
        AccountMeta::new(*fair_launch, false),
        AccountMeta::new(*treasury, false),
        AccountMeta::new(*buyer, true),
        AccountMeta::new(*buyer, true),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(rent::id(), false),
        AccountMeta::new_readonly(clock::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create adjust_ticket instruction
pub fn adjust_ticket(
    program_id: &Pubkey,
    ticket: &Pubkey,
    fair_launch: &Pubkey,
    lottery: &Pubkey,
    treasury: &Pubkey,
    buyer: &Pubkey,
    amount: u64,
) -> Instruction {
    let data = FairLaunchInstruction::AdjustTicket { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*ticket, false),
        AccountMeta::new(*fair_launch, false),
        AccountMeta::new_readonly(*lottery, false),
        AccountMeta::new(*treasury, false),
        AccountMeta::new(*buyer, true),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(clock::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create punch_ticket instruction
pub fn punch_ticket(
    program_id: &Pubkey,
    ticket: &Pubkey,
    fair_launch: &Pubkey,
    lottery: &Pubkey,
    payer: &Pubkey,
    buyer_token_account: &Pubkey,
    token_mint: &Pubkey,
) -> Instruction {
    let data = FairLaunchInstruction::PunchTicket {}.pack();

    let accounts = vec![
        AccountMeta::new(*ticket, false),
        AccountMeta::new(*fair_launch, false),
        AccountMeta::new_readonly(*lottery, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new(*buyer_token_account, false),
        AccountMeta::new(*token_mint, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create receive_refund instruction
pub fn receive_refund(
    program_id: &Pubkey,
    fair_launch: &Pubkey,
    treasury: &Pubkey,
    buyer: &Pubkey,
    buyer_token_account: &Pubkey,
    token_mint: &Pubkey,
) -> Instruction {
    let data = FairLaunchInstruction::ReceiveRefund {}.pack();

    let accounts = vec![
        AccountMeta::new(*fair_launch, false),
        AccountMeta::new(*treasury, false),
        AccountMeta::new(*buyer, true),
        AccountMeta::new(*buyer_token_account, false),
        AccountMeta::new(*token_mint, false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(clock::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Accounts of the candy machine side of a mint exchange
pub struct MintNftAccounts<'a> {
    pub candy_machine: &'a Pubkey,
    pub config: &'a Pubkey,
    pub wallet: &'a Pubkey,
    pub payer: &'a Pubkey,
    /// Fresh mint account; its keypair is held by the signing collaborator
    pub mint: &'a Pubkey,
    pub fair_launch: &'a Pubkey,
    pub buyer_token_account: &'a Pubkey,
    pub token_mint: &'a Pubkey,
}

/// Create mint_nft instruction
///
/// Accounts expected:
/// 0. `[]` The candy machine config
/// 1. `[writable]` The candy machine
/// 2. `[signer, writable]` The payer
/// 3. `[writable]` The candy machine wallet
/// 4. `[writable]` The metadata account of the new mint
/// 5. `[writable]` The new mint
/// 6. `[signer]` The mint authority
/// 7. `[signer]` The update authority
/// 8. `[writable]` The master edition of the new mint
/// 9. `[]` The token metadata program
/// 10. `[]` The token program
/// 11. `[]` The system program
/// 12. `[]` The rent sysvar
/// 13. `[]` The clock sysvar
/// 14. `[writable]` The buyer's raffle token account, burned
/// 15. `[signer]` The burn authority
/// 16. `[]` The fair launch account
/// 17. `[writable]` The raffle token mint
pub fn mint_nft(
    program_id: &Pubkey,
    metadata_program_id: &Pubkey,
    accounts: MintNftAccounts<'_>,
) -> Instruction {
    let data = MintNft.pack();
    let metadata = find_metadata_address(metadata_program_id, accounts.mint);
    let master_edition = find_master_edition_address(metadata_program_id, accounts.mint);

    let accounts = vec![
        AccountMeta::new_readonly(*accounts.config, false),
        AccountMeta::new(*accounts.candy_machine, false),
        AccountMeta::new(*accounts.payer, true),
        AccountMeta::new(*accounts.wallet, false),
        AccountMeta::new(metadata, false),
        AccountMeta::new(*accounts.mint, false),
        AccountMeta::new_readonly(*accounts.payer, true),
        AccountMeta::new_readonly(*accounts.payer, true),
        AccountMeta::new(master_edition, false),
        AccountMeta::new_readonly(*metadata_program_id, false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(rent::id(), false),
        AccountMeta::new_readonly(clock::id(), false),
        AccountMeta::new(*accounts.buyer_token_account, false),
        AccountMeta::new_readonly(*accounts.payer, true),
        AccountMeta::new_readonly(*accounts.fair_launch, false),
        AccountMeta::new(*accounts.token_mint, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create the raffle token account of `wallet` when it does not exist yet
pub fn create_buyer_token_account(payer: &Pubkey, wallet: &Pubkey, token_mint: &Pubkey) -> Instruction {
    create_associated_token_account(payer, wallet, token_mint, &spl_token::id())
}

/// Create and fund the fresh mint received in a mint exchange.
///
/// The mint is created with zero decimals, `payer` as mint and freeze
/// authority, and a single token minted to the payer's associated account.
pub fn create_exchange_mint(payer: &Pubkey, mint: &Pubkey) -> Result<Vec<Instruction>, ProgramError> {
    let lamports = Rent::default().minimum_balance(Mint::LEN);
    let token_account = get_associated_token_address(payer, mint);

    Ok(vec![
        system_instruction::create_account(payer, mint, lamports, Mint::LEN as u64, &spl_token::id()),
        spl_token::instruction::initialize_mint(&spl_token::id(), mint, payer, Some(payer), 0)?,
        create_associated_token_account(payer, payer, mint, &spl_token::id()),
        spl_token::instruction::mint_to(&spl_token::id(), mint, &token_account, payer, &[], 1)?,
    ])
}
