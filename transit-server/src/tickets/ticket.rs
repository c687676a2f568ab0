//! Tickets, their states, and the events that move them between states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActivationPolicy, NONCE_LEN};
use crate::domain::{
    LineId, Money, PassengerDetails, PassengerTypeId, SegmentKind, StationCode, StationId,
    TicketId,
};
use crate::fares::PricedJourney;

/// Lifecycle state of a ticket.
///
/// `Used`, `Expired` and `Void` are terminal: no event moves a ticket out of
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    Issued,
    Active,
    Used,
    Expired,
    Void,
}

impl TicketState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Used | Self::Expired | Self::Void)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Active => "active",
            Self::Used => "used",
            Self::Expired => "expired",
            Self::Void => "void",
        }
    }
}

/// One segment of a ticketed journey with the fare resolved for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSegment {
    /// The line ridden, or `None` for an interchange walk.
    pub line: Option<LineId>,
    pub from: StationId,
    pub from_code: StationCode,
    pub to: StationId,
    pub to_code: StationCode,
    /// `None` for a free walk.
    pub fare: Option<Money>,
}

/// A ticket.
///
/// Fields are read through accessors; state only changes by applying a
/// [`TicketEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    id: TicketId,
    state: TicketState,
    segments: Vec<TicketSegment>,
    total: Money,
    passenger_type: PassengerTypeId,
    passenger: PassengerDetails,
    payment_reference: String,
    issued_at: DateTime<Utc>,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    activated_at: Option<DateTime<Utc>>,
    used_at: Option<DateTime<Utc>>,
    expired_at: Option<DateTime<Utc>>,
    voided_at: Option<DateTime<Utc>>,
    void_reason: Option<String>,
    nonce: [u8; NONCE_LEN],
    qr_payload: String,
}

/// What issuing a ticket needs besides the priced journey.
pub(crate) struct Issuance {
    pub id: TicketId,
    pub passenger: PassengerDetails,
    pub payment_reference: String,
    pub issued_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub nonce: [u8; NONCE_LEN],
    pub qr_payload: String,
}

impl Ticket {
    /// A freshly issued ticket for a priced journey.
    pub(crate) fn issue(priced: &PricedJourney, issuance: Issuance) -> Self {
        let segments = priced
            .journey
            .segments()
            .iter()
            .zip(&priced.segments)
            .filter_map(|(segment, fare)| {
                let from = segment.origin()?;
                let to = segment.destination()?;
                let line = match &segment.kind {
                    SegmentKind::Ride(ride) => Some(ride.line),
                    SegmentKind::Walk(_) => None,
                };
                Some(TicketSegment {
                    line,
                    from: from.id,
                    from_code: from.code.clone(),
                    to: to.id,
                    to_code: to.code.clone(),
                    fare: fare.price,
                })
            })
            .collect();

        Ticket {
            id: issuance.id,
            state: TicketState::Issued,
            segments,
            total: priced.total,
            passenger_type: priced.passenger_type,
            passenger: issuance.passenger,
            payment_reference: issuance.payment_reference,
            issued_at: issuance.issued_at,
            valid_from: issuance.issued_at,
            valid_until: issuance.valid_until,
            activated_at: None,
            used_at: None,
            expired_at: None,
            voided_at: None,
            void_reason: None,
            nonce: issuance.nonce,
            qr_payload: issuance.qr_payload,
        }
    }

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn state(&self) -> TicketState {
        self.state
    }

    pub fn segments(&self) -> &[TicketSegment] {
        &self.segments
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn passenger_type(&self) -> PassengerTypeId {
        self.passenger_type
    }

    pub fn passenger(&self) -> &PassengerDetails {
        &self.passenger
    }

    pub fn payment_reference(&self) -> &str {
        &self.payment_reference
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    pub fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated_at
    }

    pub fn used_at(&self) -> Option<DateTime<Utc>> {
        self.used_at
    }

    pub fn expired_at(&self) -> Option<DateTime<Utc>> {
        self.expired_at
    }

    pub fn voided_at(&self) -> Option<DateTime<Utc>> {
        self.voided_at
    }

    pub fn void_reason(&self) -> Option<&str> {
        self.void_reason.as_deref()
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// The signed payload to render as a QR code.
    pub fn qr_payload(&self) -> &str {
        &self.qr_payload
    }

    /// True if `at` is inside [valid_from, valid_until).
    pub fn in_window(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && at < self.valid_until
    }

    /// The state the ticket is in at `at`, counting transitions that are
    /// due but not yet recorded (expiry, and activation under
    /// [`ActivationPolicy::AtValidFrom`]).
    pub fn effective_state(&self, at: DateTime<Utc>, policy: ActivationPolicy) -> TicketState {
        match self.state {
            TicketState::Issued | TicketState::Active if at >= self.valid_until => {
                TicketState::Expired
            }
            TicketState::Issued
                if policy == ActivationPolicy::AtValidFrom && at >= self.valid_from =>
            {
                TicketState::Active
            }
            state => state,
        }
    }

    /// Applies an event. Events for other tickets, and events that would
    /// leave a terminal state, are ignored.
    pub(crate) fn apply(&mut self, event: &TicketEvent) {
        if event.ticket_id() != self.id || self.state.is_terminal() {
            return;
        }

        match event {
            TicketEvent::Issued { .. } => {}
            TicketEvent::Activated { at, .. } => {
                self.state = TicketState::Active;
                self.activated_at = Some(*at);
            }
            TicketEvent::Used { at, .. } => {
                self.state = TicketState::Used;
                self.used_at = Some(*at);
            }
            TicketEvent::Expired { at, .. } => {
                self.state = TicketState::Expired;
                self.expired_at = Some(*at);
            }
            TicketEvent::Voided { at, reason, .. } => {
                self.state = TicketState::Void;
                self.voided_at = Some(*at);
                self.void_reason = Some(reason.clone());
            }
        }
    }
}

/// A recorded ticket transition. These are what the journal stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TicketEvent {
    Issued {
        ticket: Box<Ticket>,
    },
    Activated {
        id: TicketId,
        at: DateTime<Utc>,
    },
    Used {
        id: TicketId,
        at: DateTime<Utc>,
    },
    Expired {
        id: TicketId,
        at: DateTime<Utc>,
    },
    Voided {
        id: TicketId,
        at: DateTime<Utc>,
        reason: String,
    },
}

impl TicketEvent {
    pub fn ticket_id(&self) -> TicketId {
        match self {
            Self::Issued { ticket } => ticket.id,
            Self::Activated { id, .. }
            | Self::Used { id, .. }
            | Self::Expired { id, .. }
            | Self::Voided { id, .. } => *id,
        }
    }
}

/// The outcome of a validation scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketStatusSnapshot {
    pub id: TicketId,
    pub state: TicketState,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub checked_at: DateTime<Utc>,
    /// True if a consume at `checked_at` would succeed.
    pub can_consume: bool,
}

impl TicketStatusSnapshot {
    pub(crate) fn of(ticket: &Ticket, state: TicketState, at: DateTime<Utc>) -> Self {
        Self {
            id: ticket.id,
            state,
            valid_from: ticket.valid_from,
            valid_until: ticket.valid_until,
            checked_at: at,
            can_consume: !state.is_terminal() && ticket.in_window(at),
        }
    }
}
