use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::accounts::dto::{
    HealthResponse, LoginRequest, PublicUser, RegisterRequest, SearchQuery, UpdateProfileRequest,
    UserEnvelope,
};
use crate::accounts::errors::StoreError;
use crate::state::AppState;

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/update-profile", post(update_profile))
}

pub fn directory_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/search", get(search_users))
        .route("/health", get(health))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserEnvelope>, StoreError> {
    let user = state
        .store
        .register(&payload.display_name, &payload.username, &payload.password)
        .await?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Json(UserEnvelope {
        success: true,
        user,
        message: "Account created".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> Response {
    match state.store.login(&payload.username, &payload.password).await {
        Ok(user) => {
            info!(user_id = %user.id, username = %user.username, "user logged in");
            Json(UserEnvelope {
                success: true,
                user,
                message: "Login successful".into(),
            })
            .into_response()
        }
        // An unknown username answers 401 like a bad password does.
        Err(e @ StoreError::NotFound) => {
            warn!(username = %payload.username, "login for unknown username");
            (StatusCode::UNAUTHORIZED, e.envelope()).into_response()
        }
        Err(e) => e.into_response(),
    }
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<PublicUser>> {
    Json(state.store.list_users().await)
}

#[instrument(skip(state))]
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<PublicUser>> {
    Json(state.store.search_users(&query.q).await)
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserEnvelope>, StoreError> {
    let user = state.store.update_profile(&payload).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(UserEnvelope {
        success: true,
        user,
        message: "Profile updated".into(),
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "ckam-messenger",
        users: state.store.user_count().await,
        environment: state.config.environment.clone(),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: OffsetDateTime::now_utc(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn envelope_serialization() {
        let now = OffsetDateTime::now_utc();
        let envelope = UserEnvelope {
            success: true,
            user: PublicUser {
                id: Uuid::new_v4(),
                display_name: "Test".into(),
                username: "tester".into(),
                avatar: None,
                theme: "dark".into(),
                created_at: now,
                last_seen: now,
                updated_at: None,
                is_online: None,
            },
            message: "Account created".into(),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"displayName\":\"Test\""));
        assert!(!json.contains("password"));
    }

    #[test]
    fn update_profile_request_accepts_partial_bodies() {
        let json = format!(r#"{{"userId":"{}","displayName":"New Name"}}"#, Uuid::new_v4());
        let req: UpdateProfileRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.display_name.as_deref(), Some("New Name"));
        assert!(req.username.is_none());
        assert!(req.new_password.is_none());
    }
}
