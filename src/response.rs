use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use time::OffsetDateTime;

/// Envelope wrapped around every JSON body the API returns.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn of(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            status: status.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            status: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_all_fields() {
        let body = ApiResponse::of(StatusCode::CREATED, "Job created successfully", 7);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], 201);
        assert_eq!(json["message"], "Job created successfully");
        assert_eq!(json["data"], 7);
        assert!(json["timestamp"].as_str().is_some());
    }

    #[test]
    fn message_only_envelope_has_null_data() {
        let body = ApiResponse::<()>::message(StatusCode::NOT_FOUND, "User not found.");
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["data"].is_null());
    }
}
