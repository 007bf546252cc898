use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
	response::Response,
};
use serde_json::Value;
use tower::util::ServiceExt;

use helpdesk_api::{routes, state::AppState};
use helpdesk_service::{EMPTY_QUERY_ANSWER, REFUSAL_ANSWER, SECTION_HEADERS};
use helpdesk_testkit::{CallLog, Harness, HarnessBuilder, passages};

fn app(builder: HarnessBuilder) -> (Router, CallLog) {
	let Harness { service, log } = builder.build();

	(routes::router(AppState::from_service(service)), log)
}

async fn json_body(response: Response) -> Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&bytes).expect("Failed to parse response body.")
}

fn ask_request(body: &str) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri("/ask")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.expect("Failed to build request.")
}

#[tokio::test]
async fn root_reports_running() {
	let (app, _) = app(Harness::builder());
	let response = app
		.oneshot(Request::builder().uri("/").body(Body::empty()).expect("Failed to build request."))
		.await
		.expect("Failed to call /.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, serde_json::json!({ "status": "Backend is running" }));
}

#[tokio::test]
async fn health_ok() {
	let (app, _) = app(Harness::builder());
	let response = app
		.oneshot(
			Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn ask_returns_a_structured_answer() {
	let (app, log) = app(Harness::builder().search_results(passages(&[
		("Clear stuck jobs from the printer queue.", "kb/queue"),
		("Restart the print spooler service.", "kb/spooler"),
	])));
	let response = app
		.oneshot(ask_request(r#"{"question":"printer"}"#))
		.await
		.expect("Failed to call /ask.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;
	let answer = json["answer"].as_str().expect("answer must be a string");

	for header in SECTION_HEADERS {
		assert!(answer.contains(header), "answer is missing {header}");
	}

	assert_eq!(log.searches().len(), 1);
}

#[tokio::test]
async fn blank_question_gets_the_empty_query_message() {
	let (app, log) = app(Harness::builder());
	let response = app
		.oneshot(ask_request(r#"{"question":"   "}"#))
		.await
		.expect("Failed to call /ask.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["answer"], EMPTY_QUERY_ANSWER);
	assert!(log.calls().is_empty());
}

#[tokio::test]
async fn search_outage_still_answers_ok() {
	let (app, _) = app(Harness::builder().search_error("connection refused"));
	let response = app
		.oneshot(ask_request(r#"{"question":"wifi keeps dropping"}"#))
		.await
		.expect("Failed to call /ask.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["answer"], REFUSAL_ANSWER);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
	let (app, log) = app(Harness::builder());
	let response = app
		.oneshot(ask_request(r#"{"query":"printer"}"#))
		.await
		.expect("Failed to call /ask.");

	assert!(response.status().is_client_error());
	assert!(log.calls().is_empty());
}

#[tokio::test]
async fn browser_preflight_is_allowed() {
	let (app, log) = app(Harness::builder());
	let response = app
		.oneshot(
			Request::builder()
				.method("OPTIONS")
				.uri("/ask")
				.header(header::ORIGIN, "http://localhost:5173")
				.header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
				.header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /ask.");

	assert!(response.status().is_success(), "preflight answered {}", response.status());
	assert_eq!(
		response
			.headers()
			.get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
			.and_then(|value| value.to_str().ok()),
		Some("*")
	);
	assert!(log.calls().is_empty());
}

#[tokio::test]
async fn cross_origin_answer_carries_allow_origin() {
	let (app, _) = app(Harness::builder());
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/ask")
				.header(header::ORIGIN, "http://localhost:5173")
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from(r#"{"question":""}"#))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /ask.");

	assert_eq!(response.status(), StatusCode::OK);
	assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
