use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Studying,
    Absent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricsSuccessResponse {
    pub seconds_absent: f64,
    pub seconds_present: f64,
    pub absent_display: String,
    pub present_display: String,
    pub departure_count: u32,
    pub current_distance_cm: f64,
    pub currently_absent: bool,
    pub status: PresenceStatus,
    pub threshold_cm: f64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HistoryPoint {
    pub timestamp: String,
    pub distance_cm: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HistorySuccessResponse {
    pub threshold_cm: f64,
    pub points: Vec<HistoryPoint>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    NoData,
    InternalError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiErrorResponse {
    pub error_code: ApiErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Ko,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthBody {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub timestamp: String,
}
