//! The transit service: journeys, prices and tickets behind one facade.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::domain::{
    Journey, LineId, NetworkSnapshot, PassengerDetails, PassengerTypeId, StationCode, StationId,
    TicketId,
};
use crate::fares::{
    FareData, FareEngine, FareError, FareMatrixRow, FareTable, FareTableError, PricedJourney,
};
use crate::network::{Connectivity, GraphIntegrityError, NetworkGraph, NetworkRegistry};
use crate::planner::{Planner, SearchError, SearchRequest};
use crate::tickets::{
    PaymentConfirmation, Ticket, TicketError, TicketManager, TicketStatusSnapshot,
};

/// Any error the facade can return.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Fare(#[from] FareError),

    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error(transparent)]
    Graph(#[from] GraphIntegrityError),

    #[error(transparent)]
    FareTable(#[from] FareTableError),

    /// No station has the given code
    #[error("unknown station code {0}")]
    UnknownStationCode(StationCode),

    #[error("unknown line {0}")]
    UnknownLine(LineId),
}

/// Wires the network registry, planner, fare engine and ticket manager
/// together.
///
/// Searches run against whichever graph is published when they start; a
/// concurrent [`publish_network`](Self::publish_network) never disturbs them.
pub struct TransitService {
    registry: NetworkRegistry,
    planner: Planner,
    fares: FareEngine,
    fare_table: RwLock<Arc<FareTable>>,
    tickets: TicketManager,
    clock: Arc<dyn Clock>,
}

impl TransitService {
    pub fn new(
        registry: NetworkRegistry,
        planner: Planner,
        fares: FareEngine,
        fare_table: FareTable,
        tickets: TicketManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            planner,
            fares,
            fare_table: RwLock::new(Arc::new(fare_table)),
            tickets,
            clock,
        }
    }

    /// The current instant according to the service clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The network's local calendar date at an instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        self.fares.config().local(at).date()
    }

    /// The graph currently serving queries.
    pub fn graph(&self) -> Arc<NetworkGraph> {
        self.registry.current()
    }

    /// The fare table currently in force.
    pub fn fare_table(&self) -> Arc<FareTable> {
        Arc::clone(&self.fare_table.read())
    }

    pub fn tickets(&self) -> &TicketManager {
        &self.tickets
    }

    /// Resolve a station code against the current graph.
    pub fn station_id(&self, code: &StationCode) -> Result<StationId, ServiceError> {
        self.graph()
            .station_by_code(code)
            .map(|station| station.id)
            .ok_or_else(|| ServiceError::UnknownStationCode(code.clone()))
    }

    /// Up to `max_results` journeys between two stations, best first.
    pub fn find_journeys(
        &self,
        origin: StationId,
        destination: StationId,
        max_results: Option<usize>,
    ) -> Result<Vec<Journey>, ServiceError> {
        let published = self.registry.published();
        let mut request = SearchRequest::new(origin, destination);
        request.max_results = max_results;

        let result = self.planner.find_journeys(&published.graph, &request)?;
        debug!(
            %origin,
            %destination,
            generation = published.generation,
            journeys = result.journeys.len(),
            explored = result.routes_explored,
            "Found journeys"
        );
        Ok(result.journeys)
    }

    /// Price a journey for a passenger type at an instant. A journey with
    /// nothing to charge is totalled in its origin operator's currency.
    pub fn price_journey(
        &self,
        journey: &Journey,
        passenger_type: PassengerTypeId,
        at: DateTime<Utc>,
    ) -> Result<PricedJourney, ServiceError> {
        let table = self.fare_table();
        let fallback = self
            .graph()
            .station_currency(journey.origin().id)
            .unwrap_or(self.fares.config().default_currency);
        Ok(self
            .fares
            .price_in(&table, journey, passenger_type, at, fallback)?)
    }

    /// Issue a ticket for a priced journey, stamped with the current time.
    pub fn issue_ticket(
        &self,
        priced: &PricedJourney,
        passenger: PassengerDetails,
        payment: &PaymentConfirmation,
    ) -> Result<Ticket, ServiceError> {
        let table = self.fare_table();
        let passenger_type = table
            .passenger_type(priced.passenger_type)
            .ok_or(FareError::UnknownPassengerType(priced.passenger_type))?;

        Ok(self
            .tickets
            .issue(priced, passenger_type, passenger, payment, self.now())?)
    }

    /// Check a scanned QR payload.
    pub fn validate_ticket(
        &self,
        qr_payload: &str,
        at: DateTime<Utc>,
    ) -> Result<TicketStatusSnapshot, ServiceError> {
        Ok(self.tickets.validate(qr_payload, at)?)
    }

    /// Mark a ticket used.
    pub fn consume_ticket(&self, id: TicketId, at: DateTime<Utc>) -> Result<Ticket, ServiceError> {
        Ok(self.tickets.consume(id, at)?)
    }

    pub fn void_ticket(
        &self,
        id: TicketId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<Ticket, ServiceError> {
        Ok(self.tickets.void(id, reason, at)?)
    }

    pub fn ticket_status(
        &self,
        id: TicketId,
        at: DateTime<Utc>,
    ) -> Result<TicketStatusSnapshot, ServiceError> {
        Ok(self.tickets.status(id, at)?)
    }

    /// Connected components of the current network.
    pub fn connectivity(&self) -> Connectivity {
        self.graph().connectivity()
    }

    /// Every authored fare on a line on a date.
    pub fn fare_matrix(
        &self,
        line: LineId,
        date: NaiveDate,
    ) -> Result<Vec<FareMatrixRow>, ServiceError> {
        if self.graph().line(line).is_none() {
            return Err(ServiceError::UnknownLine(line));
        }
        Ok(self.fare_table().matrix(line, date))
    }

    /// Build and publish a new network. The old one keeps serving on failure.
    pub fn publish_network(&self, snapshot: NetworkSnapshot) -> Result<u64, ServiceError> {
        Ok(self.registry.publish(snapshot)?)
    }

    /// Replace the fare table. The old one stays in force on failure.
    pub fn publish_fares(&self, data: FareData) -> Result<(), ServiceError> {
        let table = FareTable::build(data)?;
        let rules = table.len();
        *self.fare_table.write() = Arc::new(table);
        info!(rules, "Published fare table");
        Ok(())
    }
}
