//! Ticket errors.

use chrono::{DateTime, Utc};

use crate::domain::{Money, TicketId};

/// A ticket journal could not be written or read back.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode journal entry: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("journal line {line} is corrupt: {source}")]
    Corrupt {
        line: usize,
        source: serde_json::Error,
    },

    /// An earlier sync failed, so what the file holds is unknown until it
    /// is replayed
    #[error("journal refused the write after an earlier sync failure")]
    Poisoned,

    /// A replayed event refers to a ticket that was never issued
    #[error("journal refers to unknown ticket {0}")]
    UnknownTicket(TicketId),
}

/// A ticket operation was refused.
///
/// Terminal outcomes (`AlreadyUsed`, `Expired`, `Void`) are stable: repeating
/// the operation returns the same error and never writes to the journal.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("ticket {id} was already used at {used_at}")]
    AlreadyUsed {
        id: TicketId,
        used_at: DateTime<Utc>,
    },

    #[error("ticket {0} has expired")]
    Expired(TicketId),

    #[error("ticket {0} has been voided")]
    Void(TicketId),

    #[error("ticket {id} is not valid until {valid_from}")]
    NotYetValid {
        id: TicketId,
        valid_from: DateTime<Utc>,
    },

    /// The QR payload is malformed, its tag does not verify, or it does not
    /// match the stored ticket
    #[error("invalid ticket signature")]
    InvalidTicketSignature,

    #[error("unknown ticket {0}")]
    UnknownTicket(TicketId),

    #[error("payment has not been confirmed")]
    PaymentNotConfirmed,

    #[error("payment of {received} does not match quoted total {expected}")]
    PaymentMismatch { expected: Money, received: Money },

    #[error("passenger is not eligible: {0}")]
    IneligiblePassenger(&'static str),

    #[error("a journey with no segments cannot be ticketed")]
    EmptyJourney,

    #[error(transparent)]
    Journal(#[from] JournalError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn error_display() {
        let id = TicketId::parse("AB12CD34EF56").unwrap();

        assert_eq!(
            TicketError::Expired(id).to_string(),
            "ticket AB12CD34EF56 has expired"
        );
        assert_eq!(
            TicketError::InvalidTicketSignature.to_string(),
            "invalid ticket signature"
        );

        let err = TicketError::PaymentMismatch {
            expected: Money::new(dec!(44.00), Currency::THB),
            received: Money::new(dec!(40.00), Currency::THB),
        };
        assert_eq!(
            err.to_string(),
            "payment of 40.00 THB does not match quoted total 44.00 THB"
        );
    }
}
