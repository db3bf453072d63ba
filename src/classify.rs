// Fair Launch Client - Failure classification
use solana_program::instruction::InstructionError;
use solana_sdk::transaction::TransactionError;

use crate::error::{RpcError, ValidationError};

/// Closed set of failure kinds reported to callers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A local precondition failed; nothing was sent
    Validation,
    InsufficientFunds,
    SoldOut,
    NotStartedYet,
    AlreadyClaimed,
    /// The request failed in transport before any on-chain effect
    Network,
    /// No confirmation within the deadline; the transaction may still land
    Timeout,
    Unknown,
}

impl ErrorKind {
    /// Only transport failures are known to have had no on-chain effect
    pub fn is_retry_safe(self) -> bool {
        self == ErrorKind::Network
    }

    /// Cached phase and ticket state should be re-read before acting again
    pub fn requires_refresh(self) -> bool {
        matches!(self, ErrorKind::SoldOut | ErrorKind::AlreadyClaimed | ErrorKind::Timeout)
    }
}

/// Low-level failure signal, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFailure {
    /// The program or runtime refused the transaction
    Program { code: Option<u32>, message: Option<String> },
    Transport(String),
    TimedOut,
}

impl RawFailure {
    pub fn message(&self) -> Option<&str> {
        match self {
            RawFailure::Program { message, .. } => message.as_deref(),
            RawFailure::Transport(message) => Some(message),
            RawFailure::TimedOut => None,
        }
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            RawFailure::Program { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<&TransactionError> for RawFailure {
    fn from(err: &TransactionError) -> Self {
        let code = match err {
            TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(*code),
            _ => None,
        };
        RawFailure::Program {
            code,
            message: Some(err.to_string()),
        }
    }
}

impl From<&RpcError> for RawFailure {
    fn from(err: &RpcError) -> Self {
        match err {
            RpcError::Transport(message) => RawFailure::Transport(message.clone()),
            RpcError::Rejected { code, message } => RawFailure::Program {
                code: *code,
                message: Some(message.clone()),
            },
        }
    }
}

/// Program error codes the fair launch and candy machine programs emit for
/// the bid, punch, withdraw, refund and mint paths
const PROGRAM_ERROR_CODES: &[(u32, ErrorKind)] = &[
    (309, ErrorKind::InsufficientFunds),
    (311, ErrorKind::SoldOut),
    (312, ErrorKind::NotStartedYet),
];

/// Markers looked up in lowercased messages that carry no structured code
const MESSAGE_MARKERS: &[(&str, ErrorKind)] = &[
    ("0x135", ErrorKind::InsufficientFunds),
    ("0x137", ErrorKind::SoldOut),
    ("0x138", ErrorKind::NotStartedYet),
    ("insufficient funds", ErrorKind::InsufficientFunds),
    ("insufficient lamports", ErrorKind::InsufficientFunds),
];

/// Maps a raw failure onto the closed error taxonomy
pub fn classify(raw: &RawFailure) -> ErrorKind {
    let (code, message) = match raw {
        RawFailure::Transport(_) => return ErrorKind::Network,
        RawFailure::TimedOut => return ErrorKind::Timeout,
        RawFailure::Program { code, message } => (*code, message.as_deref()),
    };

    if let Some(code) = code {
        return PROGRAM_ERROR_CODES
            .iter()
            .find(|(known, _)| *known == code)
            .map_or(ErrorKind::Unknown, |(_, kind)| *kind);
    }

    let message = match message {
        Some(message) => message.to_lowercase(),
        None => return ErrorKind::Timeout,
    };
    MESSAGE_MARKERS
        .iter()
        .find(|(marker, _)| message.contains(*marker))
        .map_or(ErrorKind::Unknown, |(_, kind)| *kind)
}

impl From<&ValidationError> for ErrorKind {
    fn from(err: &ValidationError) -> Self {
        match err {
            ValidationError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            ValidationError::SoldOut => ErrorKind::SoldOut,
            ValidationError::AlreadyClaimed => ErrorKind::AlreadyClaimed,
            _ => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(code: Option<u32>, message: Option<&str>) -> RawFailure {
        RawFailure::Program {
            code,
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_structured_codes() {
        assert_eq!(classify(&program(Some(311), None)), ErrorKind::SoldOut);
        assert_eq!(classify(&program(Some(312), Some("whatever"))), ErrorKind::NotStartedYet);
        assert_eq!(classify(&program(Some(309), None)), ErrorKind::InsufficientFunds);
        assert_eq!(classify(&program(Some(6000), Some("0x137"))), ErrorKind::Unknown);
    }

    #[test]
    fn test_message_markers() {
        assert_eq!(
            classify(&program(None, Some("custom program error: 0x137"))),
            ErrorKind::SoldOut
        );
        assert_eq!(
            classify(&program(None, Some("custom program error: 0x138"))),
            ErrorKind::NotStartedYet
        );
        assert_eq!(classify(&program(None, Some("Insufficient funds for fee"))), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_marker_at_start_of_message() {
        assert_eq!(classify(&program(None, Some("0x135 returned"))), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(classify(&program(None, None)), ErrorKind::Timeout);
        assert_eq!(classify(&program(None, Some("account in use"))), ErrorKind::Unknown);
        assert_eq!(classify(&RawFailure::TimedOut), ErrorKind::Timeout);
        assert_eq!(classify(&RawFailure::Transport("connection reset".into())), ErrorKind::Network);
    }

    #[test]
    fn test_transaction_error_carries_custom_code() {
        let err = TransactionError::InstructionError(0, InstructionError::Custom(311));
        let raw = RawFailure::from(&err);
        assert_eq!(raw.code(), Some(311));
        assert_eq!(classify(&raw), ErrorKind::SoldOut);

        let fee = RawFailure::from(&TransactionError::InsufficientFundsForFee);
        assert_eq!(fee.code(), None);
        assert_eq!(classify(&fee), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_retry_and_refresh_hints() {
        assert!(ErrorKind::Network.is_retry_safe());
        assert!(!ErrorKind::Timeout.is_retry_safe());
        assert!(ErrorKind::Timeout.requires_refresh());
        assert!(ErrorKind::SoldOut.requires_refresh());
        assert!(!ErrorKind::Validation.requires_refresh());
    }
}
