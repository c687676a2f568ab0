//! Domain types for the rail network.
//!
//! This module contains the validated newtypes (identities, station codes,
//! currencies, ticket identities), the snapshot records handed in by the data
//! layer, and the journey model produced by the planner. Newtypes enforce
//! their invariants at construction time, so code that receives them can
//! trust their validity.

mod currency;
mod error;
mod ids;
mod journey;
mod network;
mod passenger;
mod station;
mod ticket_id;

pub use currency::{Currency, InvalidCurrency, Money};
pub use error::DomainError;
pub use ids::{FareRuleId, LineId, OperatorId, PassengerTypeId, StationId};
pub use journey::{Journey, Ride, Segment, SegmentKind, Stop, Walk};
pub use network::{Connection, Interchange, Line, NetworkSnapshot, Operator, Station};
pub use passenger::{Ineligibility, PassengerDetails, PassengerType};
pub use station::{InvalidStationCode, StationCode};
pub use ticket_id::{InvalidTicketId, TICKET_ID_LEN, TicketId};
