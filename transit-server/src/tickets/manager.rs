//! Ticket lifecycle manager.
//!
//! Tickets live in an arena keyed by identity, each behind its own mutex.
//! The arena lock is held only long enough to find or insert a slot; every
//! transition runs with the ticket's mutex held, writes its event to the
//! journal, and is applied in memory only once the write succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ticket::Issuance;
use super::{
    ActivationPolicy, JournalError, NONCE_LEN, QrSigner, Ticket, TicketConfig, TicketError,
    TicketEvent, TicketJournal, TicketState, TicketStatusSnapshot,
};
use crate::domain::{Money, PassengerDetails, PassengerType, TicketId};
use crate::fares::PricedJourney;

/// Confirmation from the payment provider that a journey was paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    /// Provider reference. Issuance is idempotent on this value.
    pub reference: String,
    pub amount: Money,
    pub confirmed: bool,
}

type Slot = Arc<Mutex<Ticket>>;

/// Issues, validates and consumes tickets.
pub struct TicketManager {
    tickets: RwLock<HashMap<TicketId, Slot>>,
    /// Payment reference to the ticket it paid for. Also serializes issuance.
    payments: Mutex<HashMap<String, TicketId>>,
    journal: Arc<dyn TicketJournal>,
    signer: QrSigner,
    config: TicketConfig,
}

impl TicketManager {
    /// Create an empty manager.
    pub fn new(config: TicketConfig, signer: QrSigner, journal: Arc<dyn TicketJournal>) -> Self {
        Self {
            tickets: RwLock::new(HashMap::new()),
            payments: Mutex::new(HashMap::new()),
            journal,
            signer,
            config,
        }
    }

    /// Rebuild a manager from previously journalled events.
    ///
    /// Events are applied in order without being written again; new
    /// transitions go to `journal`.
    pub fn restore(
        config: TicketConfig,
        signer: QrSigner,
        journal: Arc<dyn TicketJournal>,
        events: impl IntoIterator<Item = TicketEvent>,
    ) -> Result<Self, JournalError> {
        let mut tickets: HashMap<TicketId, Ticket> = HashMap::new();
        let mut payments = HashMap::new();

        for event in events {
            match event {
                TicketEvent::Issued { ticket } => {
                    payments.insert(ticket.payment_reference().to_string(), ticket.id());
                    tickets.insert(ticket.id(), *ticket);
                }
                other => {
                    let id = other.ticket_id();
                    tickets
                        .get_mut(&id)
                        .ok_or(JournalError::UnknownTicket(id))?
                        .apply(&other);
                }
            }
        }

        info!(tickets = tickets.len(), "Restored tickets from journal");

        Ok(Self {
            tickets: RwLock::new(
                tickets
                    .into_iter()
                    .map(|(id, ticket)| (id, Arc::new(Mutex::new(ticket))))
                    .collect(),
            ),
            payments: Mutex::new(payments),
            journal,
            signer,
            config,
        })
    }

    pub fn config(&self) -> &TicketConfig {
        &self.config
    }

    /// Number of tickets held.
    pub fn len(&self) -> usize {
        self.tickets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.read().is_empty()
    }

    /// A copy of a ticket as it is now.
    pub fn get(&self, id: TicketId) -> Option<Ticket> {
        self.slot(id).ok().map(|slot| slot.lock().clone())
    }

    /// Issue a ticket for a priced journey.
    ///
    /// A retry carrying a payment reference that already produced a ticket
    /// returns that ticket rather than issuing another.
    pub fn issue(
        &self,
        priced: &PricedJourney,
        passenger_type: &PassengerType,
        passenger: PassengerDetails,
        payment: &PaymentConfirmation,
        now: DateTime<Utc>,
    ) -> Result<Ticket, TicketError> {
        let mut payments = self.payments.lock();

        if let Some(&existing) = payments.get(&payment.reference) {
            debug!(reference = %payment.reference, ticket = %existing, "Payment already ticketed");
            return self
                .get(existing)
                .ok_or(TicketError::UnknownTicket(existing));
        }

        if !payment.confirmed || payment.reference.trim().is_empty() {
            return Err(TicketError::PaymentNotConfirmed);
        }
        if payment.amount != priced.total {
            return Err(TicketError::PaymentMismatch {
                expected: priced.total,
                received: payment.amount,
            });
        }
        if priced.journey.segment_count() == 0 {
            return Err(TicketError::EmptyJourney);
        }
        passenger_type
            .check_eligibility(&passenger)
            .map_err(|reason| TicketError::IneligiblePassenger(reason.reason()))?;

        let mut rng = rand::thread_rng();
        let id = loop {
            let candidate = TicketId::generate(&mut rng);
            if !self.tickets.read().contains_key(&candidate) {
                break candidate;
            }
        };
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill(&mut nonce);

        let valid_until = now + self.config.validity();
        let ticket = Ticket::issue(
            priced,
            Issuance {
                id,
                passenger,
                payment_reference: payment.reference.clone(),
                issued_at: now,
                valid_until,
                nonce,
                qr_payload: self.signer.sign(id, valid_until, &nonce),
            },
        );

        self.journal.append(&TicketEvent::Issued {
            ticket: Box::new(ticket.clone()),
        })?;

        self.tickets
            .write()
            .insert(id, Arc::new(Mutex::new(ticket.clone())));
        payments.insert(payment.reference.clone(), id);

        info!(ticket = %id, total = %ticket.total(), %valid_until, "Issued ticket");
        Ok(ticket)
    }

    /// Check a scanned QR payload.
    ///
    /// The signature is verified before anything else. A ticket scanned
    /// inside its window becomes active; one scanned after it is recorded as
    /// expired. Used, expired and void tickets are reported as they are.
    pub fn validate(
        &self,
        qr_payload: &str,
        now: DateTime<Utc>,
    ) -> Result<TicketStatusSnapshot, TicketError> {
        let payload = self
            .signer
            .verify(qr_payload)
            .map_err(|_| TicketError::InvalidTicketSignature)?;
        let slot = self.slot(payload.id)?;
        let mut ticket = slot.lock();

        // A genuine signature over stale fields is still not this ticket
        if ticket.nonce() != &payload.nonce
            || ticket.valid_until().timestamp() != payload.valid_until
        {
            warn!(ticket = %payload.id, "QR payload does not match stored ticket");
            return Err(TicketError::InvalidTicketSignature);
        }

        let state = match ticket.state() {
            terminal if terminal.is_terminal() => terminal,
            _ if now >= ticket.valid_until() => {
                self.record(&mut ticket, TicketEvent::Expired { id: payload.id, at: now })?;
                TicketState::Expired
            }
            TicketState::Issued if ticket.in_window(now) => {
                // Under AtValidFrom the window itself is the activation
                if self.config.activation == ActivationPolicy::OnFirstScan {
                    self.record(&mut ticket, TicketEvent::Activated { id: payload.id, at: now })?;
                }
                TicketState::Active
            }
            state => state,
        };

        debug!(ticket = %payload.id, state = state.as_str(), "Validated ticket");
        Ok(TicketStatusSnapshot::of(&ticket, state, now))
    }

    /// Mark a ticket used. Exactly one of any number of concurrent attempts
    /// succeeds; the rest see [`TicketError::AlreadyUsed`].
    pub fn consume(&self, id: TicketId, now: DateTime<Utc>) -> Result<Ticket, TicketError> {
        let slot = self.slot(id)?;
        let mut ticket = slot.lock();

        self.check_open(&mut ticket, now)?;
        if now < ticket.valid_from() {
            return Err(TicketError::NotYetValid {
                id,
                valid_from: ticket.valid_from(),
            });
        }

        self.record(&mut ticket, TicketEvent::Used { id, at: now })?;
        info!(ticket = %id, "Consumed ticket");
        Ok(ticket.clone())
    }

    /// Void a ticket that is not yet used or expired.
    pub fn void(
        &self,
        id: TicketId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Ticket, TicketError> {
        let slot = self.slot(id)?;
        let mut ticket = slot.lock();

        self.check_open(&mut ticket, now)?;
        self.record(
            &mut ticket,
            TicketEvent::Voided {
                id,
                at: now,
                reason: reason.to_string(),
            },
        )?;
        info!(ticket = %id, reason, "Voided ticket");
        Ok(ticket.clone())
    }

    /// The state of a ticket at `now`, without recording anything.
    pub fn status(
        &self,
        id: TicketId,
        now: DateTime<Utc>,
    ) -> Result<TicketStatusSnapshot, TicketError> {
        let slot = self.slot(id)?;
        let ticket = slot.lock();
        let state = ticket.effective_state(now, self.config.activation);
        Ok(TicketStatusSnapshot::of(&ticket, state, now))
    }

    fn slot(&self, id: TicketId) -> Result<Slot, TicketError> {
        self.tickets
            .read()
            .get(&id)
            .cloned()
            .ok_or(TicketError::UnknownTicket(id))
    }

    /// Fails with the terminal outcome if the ticket is closed, recording a
    /// due expiry first. Must be called with the ticket's lock held.
    fn check_open(&self, ticket: &mut Ticket, now: DateTime<Utc>) -> Result<(), TicketError> {
        let id = ticket.id();
        match ticket.state() {
            TicketState::Used => Err(TicketError::AlreadyUsed {
                id,
                used_at: ticket.used_at().unwrap_or(now),
            }),
            TicketState::Expired => Err(TicketError::Expired(id)),
            TicketState::Void => Err(TicketError::Void(id)),
            TicketState::Issued | TicketState::Active if now >= ticket.valid_until() => {
                self.record(ticket, TicketEvent::Expired { id, at: now })?;
                Err(TicketError::Expired(id))
            }
            TicketState::Issued | TicketState::Active => Ok(()),
        }
    }

    /// Write an event, then apply it. Must be called with the ticket's lock
    /// held.
    fn record(&self, ticket: &mut Ticket, event: TicketEvent) -> Result<(), TicketError> {
        self.journal.append(&event)?;
        ticket.apply(&event);
        Ok(())
    }
}
