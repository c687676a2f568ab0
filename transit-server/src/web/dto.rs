//! Data transfer objects for web requests and responses.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cache::QuoteId;
use crate::domain::{
    Journey, LineId, Money, PassengerDetails, PassengerTypeId, Ride, SegmentKind, StationId,
    Stop, Walk,
};
use crate::fares::{FareMatrixRow, PricedJourney, PricedSegment};
use crate::network::{Connectivity, NetworkGraph};
use crate::tickets::{PaymentConfirmation, Ticket, TicketSegment, TicketState};

/// Query for journey search.
#[derive(Debug, Deserialize)]
pub struct JourneysQuery {
    /// Origin station code
    pub from: String,

    /// Destination station code
    pub to: String,

    /// How many journeys to return
    pub max_results: Option<usize>,
}

/// Response for journey search.
#[derive(Debug, Serialize)]
pub struct JourneysResponse {
    /// Found journeys, best first
    pub journeys: Vec<JourneyResult>,
}

/// A journey option.
#[derive(Debug, Serialize)]
pub struct JourneyResult {
    pub segments: Vec<SegmentResult>,

    /// Total travel time in minutes
    pub duration_mins: i64,

    pub distance_km: f64,

    /// Number of changes of line or onto foot
    pub transfers: usize,

    /// Search weight: travel time plus transfer penalties
    pub weight_mins: i64,
}

/// A segment of a journey.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentResult {
    Ride(RideResult),
    Walk(WalkResult),
}

/// A ride on one line.
#[derive(Debug, Serialize)]
pub struct RideResult {
    pub line: LineId,
    pub line_name: String,

    /// Every stop, boarding and alighting included
    pub stops: Vec<StationInfo>,

    pub duration_mins: i64,
    pub distance_km: f64,
}

/// An interchange walk.
#[derive(Debug, Serialize)]
pub struct WalkResult {
    pub from: StationInfo,
    pub to: StationInfo,
    pub duration_mins: i64,

    /// Charge for the interchange, if any
    pub cost: Option<Money>,
}

/// Station information for display.
#[derive(Debug, Serialize)]
pub struct StationInfo {
    pub id: StationId,
    pub code: String,
    pub name: String,
}

/// Request to price a journey.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    /// Origin station code
    pub from: String,

    /// Destination station code
    pub to: String,

    /// Which of the ranked journeys to price (0 is the best)
    #[serde(default)]
    pub option: usize,

    pub passenger_type: PassengerTypeId,

    /// When the journey is made (defaults to now)
    pub at: Option<DateTime<Utc>>,
}

/// A price quote that can be booked by id.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote_id: QuoteId,
    pub journey: JourneyResult,
    pub passenger_type: PassengerTypeId,
    pub priced_at: DateTime<Utc>,
    pub peak: bool,

    /// One entry per journey segment
    pub segments: Vec<PricedSegment>,

    pub total: Money,
    pub discount_percentage: Decimal,
}

/// Request to issue a ticket for a quote.
#[derive(Debug, Deserialize)]
pub struct IssueTicketRequest {
    pub quote_id: QuoteId,

    #[serde(default)]
    pub passenger: PassengerDetails,

    pub payment: PaymentConfirmation,
}

/// A ticket as shown to its holder.
#[derive(Debug, Serialize)]
pub struct TicketResult {
    pub id: String,
    pub state: TicketState,
    pub segments: Vec<TicketSegment>,
    pub total: Money,
    pub passenger_type: PassengerTypeId,
    pub issued_at: DateTime<Utc>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,

    /// Signed payload to render as a QR code
    pub qr_payload: String,
}

/// Request to validate a scanned QR payload.
#[derive(Debug, Deserialize)]
pub struct ValidateTicketRequest {
    pub qr_payload: String,
}

/// Request to void a ticket.
#[derive(Debug, Deserialize)]
pub struct VoidTicketRequest {
    pub reason: String,
}

/// Response for the connectivity report.
#[derive(Debug, Serialize)]
pub struct ConnectivityResponse {
    pub connected: bool,

    /// Components, largest first
    pub components: Vec<Vec<StationId>>,
}

/// Query for a line's fares.
#[derive(Debug, Deserialize)]
pub struct FareMatrixQuery {
    /// Local date (defaults to today)
    pub date: Option<NaiveDate>,
}

/// Response for a line's fares.
#[derive(Debug, Serialize)]
pub struct FareMatrixResponse {
    pub line: LineId,
    pub date: NaiveDate,
    pub fares: Vec<FareMatrixRow>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl StationInfo {
    fn from_stop(graph: &NetworkGraph, stop: &Stop) -> Self {
        Self {
            id: stop.id,
            code: stop.code.as_str().to_string(),
            name: graph
                .station(stop.id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| stop.code.as_str().to_string()),
        }
    }
}

impl JourneyResult {
    /// Create from a domain Journey, naming stations from `graph`.
    pub fn from_journey(graph: &NetworkGraph, journey: &Journey) -> Self {
        let segments = journey
            .segments()
            .iter()
            .map(|s| {
                let duration_mins = s.duration.num_minutes();
                match &s.kind {
                    SegmentKind::Ride(ride) => SegmentResult::Ride(RideResult::from_ride(
                        graph,
                        ride,
                        duration_mins,
                        s.distance_km,
                    )),
                    SegmentKind::Walk(walk) => {
                        SegmentResult::Walk(WalkResult::from_walk(graph, walk, duration_mins))
                    }
                }
            })
            .collect();

        Self {
            segments,
            duration_mins: journey.total_duration().num_minutes(),
            distance_km: journey.total_distance_km(),
            transfers: journey.transfer_count(),
            weight_mins: journey.weight_mins(),
        }
    }
}

impl RideResult {
    fn from_ride(graph: &NetworkGraph, ride: &Ride, duration_mins: i64, distance_km: f64) -> Self {
        Self {
            line: ride.line,
            line_name: graph
                .line(ride.line)
                .map(|l| l.name.clone())
                .unwrap_or_default(),
            stops: ride
                .stops
                .iter()
                .map(|stop| StationInfo::from_stop(graph, stop))
                .collect(),
            duration_mins,
            distance_km,
        }
    }
}

impl WalkResult {
    fn from_walk(graph: &NetworkGraph, walk: &Walk, duration_mins: i64) -> Self {
        Self {
            from: StationInfo::from_stop(graph, &walk.from),
            to: StationInfo::from_stop(graph, &walk.to),
            duration_mins,
            cost: walk.cost,
        }
    }
}

impl QuoteResponse {
    pub fn new(graph: &NetworkGraph, quote_id: QuoteId, priced: &PricedJourney) -> Self {
        Self {
            quote_id,
            journey: JourneyResult::from_journey(graph, &priced.journey),
            passenger_type: priced.passenger_type,
            priced_at: priced.priced_at,
            peak: priced.peak,
            segments: priced.segments.clone(),
            total: priced.total,
            discount_percentage: priced.discount_percentage,
        }
    }
}

impl From<&Ticket> for TicketResult {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id().to_string(),
            state: ticket.state(),
            segments: ticket.segments().to_vec(),
            total: ticket.total(),
            passenger_type: ticket.passenger_type(),
            issued_at: ticket.issued_at(),
            valid_from: ticket.valid_from(),
            valid_until: ticket.valid_until(),
            used_at: ticket.used_at(),
            void_reason: ticket.void_reason().map(str::to_string),
            qr_payload: ticket.qr_payload().to_string(),
        }
    }
}

impl From<Connectivity> for ConnectivityResponse {
    fn from(connectivity: Connectivity) -> Self {
        Self {
            connected: connectivity.is_connected(),
            components: connectivity.components().to_vec(),
        }
    }
}
