use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::api::{
    require, ApiData, ApiError, CancelRequest, CancelResponse, EndorseRequest, EndorseResponse,
    ReportRequest, ReportResponse, SeasonResetRequest, SeasonResetResponse,
    SessionCompleteRequest, SessionCompleteResponse,
};
use lfg_reputation::{MemoryStore, ReputationCalculator, ReputationConfig, ReputationError};

#[derive(Clone)]
struct AppState {
    calculator: Arc<ReputationCalculator<MemoryStore>>,
}

type Rejection = (StatusCode, Json<ApiError>);

pub async fn serve(args: crate::ServeArgs) -> Result<(), String> {
    let (config, config_path) =
        ReputationConfig::load(args.config.clone()).map_err(|err| err.to_string())?;
    if let Some(path) = config_path.as_ref().filter(|path| path.exists()) {
        info!(path = %path.display(), "loaded reputation config");
    }

    let store = match args.snapshot.clone() {
        Some(path) => MemoryStore::load(path).map_err(|err| err.to_string())?,
        None => MemoryStore::new(),
    };

    let state = AppState {
        calculator: Arc::new(ReputationCalculator::new(Arc::new(store), config)),
    };

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/reputation/:user_id", get(get_reputation))
        .route("/api/reputation/session-complete", post(session_complete))
        .route("/api/reputation/endorse", post(endorse))
        .route("/api/reputation/report", post(report))
        .route("/api/reputation/cancel", post(cancel))
        .route("/api/reputation/season-reset", post(season_reset))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;
    info!(%addr, "reputation engine listening");

    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| format!("failed to bind server: {}", err))?,
        app,
    )
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn get_reputation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiData<lfg_reputation::ReputationDisplay>>, Rejection> {
    let display = state
        .calculator
        .reputation_display(&user_id)
        .map_err(reject)?;
    Ok(Json(ApiData::new(display)))
}

async fn session_complete(
    State(state): State<AppState>,
    Json(request): Json<SessionCompleteRequest>,
) -> Result<Json<ApiData<SessionCompleteResponse>>, Rejection> {
    require(&request.user_id, "user_id").map_err(reject)?;
    require(&request.session_id, "session_id").map_err(reject)?;
    let outcome = request.outcome().map_err(reject)?;

    let score_change = state
        .calculator
        .record_session_completion(&request.user_id, &request.session_id, &outcome)
        .map_err(reject)?;
    let reputation = state
        .calculator
        .reputation_display(&request.user_id)
        .map_err(reject)?;

    Ok(Json(ApiData::new(SessionCompleteResponse {
        score_change,
        reputation,
    })))
}

async fn endorse(
    State(state): State<AppState>,
    Json(request): Json<EndorseRequest>,
) -> Result<Json<ApiData<EndorseResponse>>, Rejection> {
    require(&request.giver_id, "giver_id").map_err(reject)?;
    require(&request.receiver_id, "receiver_id").map_err(reject)?;

    let endorsement = state
        .calculator
        .record_endorsement(
            &request.giver_id,
            &request.receiver_id,
            request.session_id.as_deref(),
        )
        .map_err(reject)?;
    let reputation = state
        .calculator
        .reputation_display(&request.receiver_id)
        .map_err(reject)?;

    Ok(Json(ApiData::new(EndorseResponse {
        endorsement,
        reputation,
    })))
}

async fn report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ApiData<ReportResponse>>, Rejection> {
    require(&request.reporter_id, "reporter_id").map_err(reject)?;
    require(&request.reported_id, "reported_id").map_err(reject)?;
    let reason = request.parsed_reason().map_err(reject)?;

    let report = state
        .calculator
        .record_report(
            &request.reporter_id,
            &request.reported_id,
            reason,
            request.details.clone(),
            request.session_id.as_deref(),
        )
        .map_err(reject)?;
    let reputation = state
        .calculator
        .reputation_display(&request.reported_id)
        .map_err(reject)?;

    Ok(Json(ApiData::new(ReportResponse { report, reputation })))
}

async fn cancel(
    State(state): State<AppState>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<ApiData<CancelResponse>>, Rejection> {
    require(&request.user_id, "user_id").map_err(reject)?;
    require(&request.session_id, "session_id").map_err(reject)?;

    let hours_before_start =
        (request.session_start_time - Utc::now()).num_seconds() as f64 / 3600.0;
    if hours_before_start < 0.0 {
        return Err(reject(ReputationError::Validation(
            "cannot cancel a session that has already started".to_string(),
        )));
    }

    let penalty_applied = state
        .calculator
        .record_cancellation(&request.user_id, &request.session_id, hours_before_start)
        .map_err(reject)?;
    let reputation = state
        .calculator
        .reputation_display(&request.user_id)
        .map_err(reject)?;

    Ok(Json(ApiData::new(CancelResponse {
        hours_before_start,
        penalty_applied,
        reputation,
    })))
}

async fn season_reset(
    State(state): State<AppState>,
    Json(request): Json<SeasonResetRequest>,
) -> Result<Json<ApiData<SeasonResetResponse>>, Rejection> {
    require(&request.user_id, "user_id").map_err(reject)?;

    let drift_factor = request
        .drift_factor
        .unwrap_or(state.calculator.config().seasonal.drift_factor);
    let new_score = state
        .calculator
        .apply_seasonal_reset(&request.user_id, drift_factor)
        .map_err(reject)?;
    let reputation = state
        .calculator
        .reputation_display(&request.user_id)
        .map_err(reject)?;

    Ok(Json(ApiData::new(SeasonResetResponse {
        new_score,
        reputation,
    })))
}

fn reject(err: ReputationError) -> Rejection {
    let status = match err {
        ReputationError::Validation(_) | ReputationError::Precondition(_) => {
            StatusCode::BAD_REQUEST
        }
        ReputationError::DuplicateEndorsement => StatusCode::CONFLICT,
        ReputationError::NotFound(_) => StatusCode::NOT_FOUND,
        ReputationError::Config(_) | ReputationError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiError::new(err.to_string())))
}
