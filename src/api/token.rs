use super::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

/// Canned OAuth token, identical on every call
pub const TOKEN_RESPONSE: &str = r#"{
  "access_token": "someaccesstoken",
  "token_type": "bearer",
  "id_token": "someidtoken",
  "refresh_token": "somerefreshtoken",
  "expires_in": 43199,
  "scope": "openid oauth.approvals",
  "jti": "somejti"
}"#;

/// Fake token endpoint; accepts any method and ignores the body
pub async fn token(State(state): State<AppState>) -> impl IntoResponse {
    state
        .metrics
        .record_response("token", StatusCode::OK.as_u16());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        TOKEN_RESPONSE,
    )
}
