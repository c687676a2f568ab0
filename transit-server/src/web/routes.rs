//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::domain::{LineId, StationCode, TicketId};
use crate::fares::FareError;
use crate::planner::SearchError;
use crate::service::{ServiceError, TransitService};
use crate::tickets::{TicketError, TicketStatusSnapshot};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/journeys", get(find_journeys))
        .route("/quotes", post(create_quote))
        .route("/tickets", post(issue_ticket))
        .route("/tickets/validate", post(validate_ticket))
        .route("/tickets/:id", get(ticket_status))
        .route("/tickets/:id/consume", post(consume_ticket))
        .route("/tickets/:id/void", post(void_ticket))
        .route("/network/connectivity", get(connectivity))
        .route("/lines/:id/fares", get(fare_matrix))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

fn parse_code(code: &str) -> Result<StationCode, AppError> {
    StationCode::parse_normalized(code).map_err(|_| AppError::BadRequest {
        message: format!("Invalid station code: {code}"),
    })
}

fn parse_ticket_id(id: &str) -> Result<TicketId, AppError> {
    TicketId::parse(id).map_err(|_| AppError::BadRequest {
        message: format!("Invalid ticket id: {id}"),
    })
}

/// Run a service call on the blocking pool. Ticket transitions hold a
/// per-ticket lock across a synced journal write.
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    F: FnOnce(&TransitService) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Ticket task failed: {e}"),
        })?
        .map_err(AppError::from)
}

/// Ranked journeys between two station codes.
async fn find_journeys(
    State(state): State<AppState>,
    Query(req): Query<JourneysQuery>,
) -> Result<Json<JourneysResponse>, AppError> {
    let origin = state.service.station_id(&parse_code(&req.from)?)?;
    let destination = state.service.station_id(&parse_code(&req.to)?)?;

    let graph = state.service.graph();
    let journeys = state
        .service
        .find_journeys(origin, destination, req.max_results)?
        .iter()
        .map(|j| JourneyResult::from_journey(&graph, j))
        .collect();

    Ok(Json(JourneysResponse { journeys }))
}

/// Price one of the ranked journeys and hold the price as a quote.
async fn create_quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let origin = state.service.station_id(&parse_code(&req.from)?)?;
    let destination = state.service.station_id(&parse_code(&req.to)?)?;

    let graph = state.service.graph();
    let wanted = req.option.checked_add(1).ok_or_else(|| AppError::BadRequest {
        message: format!("Invalid option: {}", req.option),
    })?;
    let journeys = state
        .service
        .find_journeys(origin, destination, Some(wanted))?;
    let journey = journeys.get(req.option).ok_or_else(|| AppError::NotFound {
        message: format!("Only {} journeys found", journeys.len()),
    })?;

    let at = req.at.unwrap_or_else(|| state.service.now());
    let priced = state.service.price_journey(journey, req.passenger_type, at)?;
    let quote_id = state.quotes.insert(priced.clone()).await;
    debug!(quote = %quote_id, total = %priced.total, "Created quote");

    Ok(Json(QuoteResponse::new(&graph, quote_id, &priced)))
}

/// Issue a ticket for a quote.
async fn issue_ticket(
    State(state): State<AppState>,
    Json(req): Json<IssueTicketRequest>,
) -> Result<(StatusCode, Json<TicketResult>), AppError> {
    let priced = state
        .quotes
        .get(&req.quote_id)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: format!("Quote {} not found or expired", req.quote_id),
        })?;

    let ticket = blocking(&state, move |service| {
        service.issue_ticket(&priced, req.passenger, &req.payment)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(TicketResult::from(&ticket))))
}

/// Check a scanned QR payload.
async fn validate_ticket(
    State(state): State<AppState>,
    Json(req): Json<ValidateTicketRequest>,
) -> Result<Json<TicketStatusSnapshot>, AppError> {
    let snapshot = blocking(&state, move |service| {
        service.validate_ticket(&req.qr_payload, service.now())
    })
    .await?;
    Ok(Json(snapshot))
}

/// Current state of a ticket. Records nothing.
async fn ticket_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TicketStatusSnapshot>, AppError> {
    let id = parse_ticket_id(&id)?;
    let snapshot =
        blocking(&state, move |service| service.ticket_status(id, service.now())).await?;
    Ok(Json(snapshot))
}

/// Mark a ticket used.
async fn consume_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TicketResult>, AppError> {
    let id = parse_ticket_id(&id)?;
    let ticket =
        blocking(&state, move |service| service.consume_ticket(id, service.now())).await?;
    Ok(Json(TicketResult::from(&ticket)))
}

/// Void a ticket.
async fn void_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VoidTicketRequest>,
) -> Result<Json<TicketResult>, AppError> {
    let id = parse_ticket_id(&id)?;
    let ticket = blocking(&state, move |service| {
        service.void_ticket(id, &req.reason, service.now())
    })
    .await?;
    Ok(Json(TicketResult::from(&ticket)))
}

/// Connected components of the network.
async fn connectivity(State(state): State<AppState>) -> Json<ConnectivityResponse> {
    Json(state.service.connectivity().into())
}

/// Every authored fare on a line.
async fn fare_matrix(
    State(state): State<AppState>,
    Path(line): Path<u64>,
    Query(req): Query<FareMatrixQuery>,
) -> Result<Json<FareMatrixResponse>, AppError> {
    let line = LineId(line);
    let date = req
        .date
        .unwrap_or_else(|| state.service.local_date(state.service.now()));
    let fares = state.service.fare_matrix(line, date)?;

    Ok(Json(FareMatrixResponse { line, date, fares }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Internal { message: String },
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        let message = e.to_string();
        match e {
            ServiceError::Search(
                SearchError::UnknownStation(_) | SearchError::NoRouteFound { .. },
            )
            | ServiceError::Fare(FareError::FareNotFound { .. })
            | ServiceError::Ticket(TicketError::UnknownTicket(_))
            | ServiceError::UnknownStationCode(_)
            | ServiceError::UnknownLine(_) => AppError::NotFound { message },

            ServiceError::Ticket(
                TicketError::AlreadyUsed { .. }
                | TicketError::Expired(_)
                | TicketError::Void(_)
                | TicketError::NotYetValid { .. },
            ) => AppError::Conflict { message },

            ServiceError::Search(SearchError::InvalidRequest(_))
            | ServiceError::Fare(FareError::UnknownPassengerType(_))
            | ServiceError::Ticket(
                TicketError::InvalidTicketSignature
                | TicketError::PaymentNotConfirmed
                | TicketError::PaymentMismatch { .. }
                | TicketError::IneligiblePassenger(_)
                | TicketError::EmptyJourney,
            )
            | ServiceError::Graph(_)
            | ServiceError::FareTable(_) => AppError::BadRequest { message },

            ServiceError::Search(SearchError::InvalidJourney(_))
            | ServiceError::Fare(FareError::CurrencyMismatch { .. } | FareError::PriceOverflow)
            | ServiceError::Ticket(TicketError::Journal(_)) => AppError::Internal { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        } else {
            warn!(%status, %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
