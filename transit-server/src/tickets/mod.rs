//! Ticket issuance, validation and consumption.
//!
//! Every ticket moves through
//! `issued → active → used`, or ends early in `expired` or `void`. Each
//! transition is written to a [`TicketJournal`] before it takes effect, and
//! a ticket can be consumed exactly once no matter how many gates scan it
//! at the same moment.

mod config;
mod error;
mod journal;
mod manager;
mod qr;
mod ticket;

pub use config::{ActivationPolicy, TicketConfig};
pub use error::{JournalError, TicketError};
pub use journal::{FileJournal, MemoryJournal, TicketJournal};
pub use manager::{PaymentConfirmation, TicketManager};
pub use qr::{BadSignature, InvalidSigningKey, NONCE_LEN, QrPayload, QrSigner};
pub use ticket::{Ticket, TicketEvent, TicketSegment, TicketState, TicketStatusSnapshot};

#[cfg(test)]
pub(crate) use ticket::tests as fixtures;
