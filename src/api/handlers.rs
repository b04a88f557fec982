use crate::api::responses::{
    ApiErrorCode, ApiErrorResponse, HealthBody, HealthStatus, HistoryPoint,
    HistorySuccessResponse, MetricsSuccessResponse, PresenceStatus,
};
use crate::metrics::format::format_duration;
use crate::state::{DashboardState, TickStatus};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::error;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const NO_DATA_MESSAGE: &str = "No metrics available yet";
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

pub type SharedState = Arc<RwLock<DashboardState>>;

pub enum ApiResponse<T> {
    Success { status: StatusCode, body: T },
    Error {
        status: StatusCode,
        body: ApiErrorResponse,
    },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success { status, body } => (status, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_metrics(State(state): State<SharedState>) -> impl IntoResponse {
    build_metrics_response(&state, OffsetDateTime::now_utc())
}

pub async fn get_history(State(state): State<SharedState>) -> impl IntoResponse {
    build_history_response(&state, OffsetDateTime::now_utc())
}

pub async fn get_health(State(state): State<SharedState>) -> impl IntoResponse {
    build_health_response(&state, OffsetDateTime::now_utc())
}

fn build_metrics_response(
    state: &SharedState,
    now: OffsetDateTime,
) -> ApiResponse<MetricsSuccessResponse> {
    let Ok(guard) = state.read() else {
        return internal_error("/api/metrics", "state lock poisoned while reading snapshot");
    };
    let threshold_cm = guard.threshold_cm();
    let Some((snapshot, updated_at)) = guard.view().map(|view| (view.snapshot, view.updated_at))
    else {
        return no_data(now);
    };
    drop(guard);

    let status = if snapshot.currently_absent {
        PresenceStatus::Absent
    } else {
        PresenceStatus::Studying
    };

    ApiResponse::Success {
        status: StatusCode::OK,
        body: MetricsSuccessResponse {
            seconds_absent: snapshot.seconds_absent,
            seconds_present: snapshot.seconds_present,
            absent_display: format_duration(snapshot.seconds_absent),
            present_display: format_duration(snapshot.seconds_present),
            departure_count: snapshot.departure_count,
            current_distance_cm: snapshot.current_distance_cm,
            currently_absent: snapshot.currently_absent,
            status,
            threshold_cm,
            timestamp: format_timestamp(updated_at),
        },
    }
}

fn build_history_response(
    state: &SharedState,
    now: OffsetDateTime,
) -> ApiResponse<HistorySuccessResponse> {
    let Ok(guard) = state.read() else {
        return internal_error("/api/history", "state lock poisoned while reading history");
    };
    let threshold_cm = guard.threshold_cm();
    let Some(view) = guard.view() else {
        return no_data(now);
    };

    let points = view
        .history
        .iter()
        .map(|sample| HistoryPoint {
            timestamp: format_timestamp(sample.timestamp),
            distance_cm: sample.distance_cm,
        })
        .collect();
    let timestamp = format_timestamp(view.updated_at);
    drop(guard);

    ApiResponse::Success {
        status: StatusCode::OK,
        body: HistorySuccessResponse {
            threshold_cm,
            points,
            timestamp,
        },
    }
}

fn build_health_response(state: &SharedState, now: OffsetDateTime) -> ApiResponse<HealthBody> {
    let Ok(guard) = state.read() else {
        return internal_error("/api/health", "state lock poisoned while reading tick status");
    };
    let has_view = guard.view().is_some();
    let last_error = guard.last_error().map(str::to_string);
    let last_ok = matches!(
        guard.last_tick().map(|tick| &tick.status),
        Some(TickStatus::Ok)
    );
    drop(guard);

    let status = derive_health_status(has_view, last_ok);
    let status_code = match status {
        HealthStatus::Ko => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
    };

    ApiResponse::Success {
        status: status_code,
        body: HealthBody {
            status,
            last_error,
            timestamp: format_timestamp(now),
        },
    }
}

fn derive_health_status(has_view: bool, last_tick_ok: bool) -> HealthStatus {
    match (has_view, last_tick_ok) {
        (false, _) => HealthStatus::Ko,
        (true, true) => HealthStatus::Ok,
        (true, false) => HealthStatus::Degraded,
    }
}

fn no_data<T>(now: OffsetDateTime) -> ApiResponse<T> {
    ApiResponse::Error {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: ApiErrorResponse {
            error_code: ApiErrorCode::NoData,
            error_message: NO_DATA_MESSAGE.to_string(),
            timestamp: format_timestamp(now),
        },
    }
}

fn internal_error<T>(route: &str, reason: &str) -> ApiResponse<T> {
    error!(route, reason, "Internal error while handling request");
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ApiErrorResponse {
            error_code: ApiErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: format_timestamp(OffsetDateTime::now_utc()),
        },
    }
}

fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp.format(&Rfc3339).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format timestamp");
        FALLBACK_TIMESTAMP.to_string()
    })
}
