use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use helpdesk_service::{AskRequest, AskResponse};

#[derive(Debug, Serialize)]
pub struct StatusBody {
	pub status: &'static str,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(root))
		.route("/health", get(health))
		.route("/ask", post(ask))
		.layer(CorsLayer::permissive())
		.with_state(state)
}

async fn root() -> Json<StatusBody> {
	Json(StatusBody { status: "Backend is running" })
}

async fn health() -> StatusCode {
	StatusCode::OK
}

/// Always answers 200; collaborator outages come back as the refusal text, not an error status.
async fn ask(State(state): State<AppState>, Json(payload): Json<AskRequest>) -> Json<AskResponse> {
	Json(state.service.ask(payload).await)
}
