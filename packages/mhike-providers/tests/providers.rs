use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::IntoResponse,
	routing,
};
use serde_json::{Map, Value};
use tokio::{
	net::TcpListener,
	sync::{mpsc, oneshot, oneshot::Sender},
};

use mhike_config::EmbeddingProviderConfig;
use mhike_providers::{API_KEY_HEADER, embedding};

#[derive(Clone)]
struct EmbedState {
	reply: (StatusCode, Value),
	seen: mpsc::UnboundedSender<(Option<String>, Value)>,
}

async fn start_embed_server(state: EmbedState) -> (String, Sender<()>) {
	let app = Router::new()
		.route("/v1beta/models/test-embed:embedContent", routing::post(embed_handler))
		.with_state(state);
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind embed server.");
	let addr = listener.local_addr().expect("Failed to read embed server address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}/v1beta"), tx)
}

async fn embed_handler(
	State(state): State<EmbedState>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> impl IntoResponse {
	let key = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string);
	let _ = state.seen.send((key, body));
	let (status, reply) = state.reply;

	(status, Json(reply))
}

fn provider_config(api_base: String) -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "test".to_string(),
		api_base,
		api_key: "secret".to_string(),
		model: "test-embed".to_string(),
		timeout_ms: Some(5_000),
		default_headers: Map::new(),
	}
}

#[test]
fn builds_api_key_header() {
	let mut defaults = Map::new();

	defaults.insert("x-client".to_string(), Value::String("mhike".to_string()));

	let headers =
		mhike_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");

	assert_eq!(headers.get(API_KEY_HEADER).expect("Missing api key header."), "secret");
	assert_eq!(headers.get("x-client").expect("Missing default header."), "mhike");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3_i64));

	let err = mhike_providers::auth_headers("secret", &defaults)
		.expect_err("Expected invalid header config.");

	assert_eq!(err.to_string(), "Default header values must be strings.");
}

#[tokio::test]
async fn embeds_query_through_http() {
	let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
	let state = EmbedState {
		reply: (StatusCode::OK, serde_json::json!({ "embedding": { "values": [0.25, 0.75] } })),
		seen: seen_tx,
	};
	let (api_base, shutdown) = start_embed_server(state).await;
	let cfg = provider_config(api_base);
	let client = mhike_providers::http_client(cfg.timeout_ms).expect("Failed to build client.");
	let vector =
		embedding::embed(&client, &cfg, "lakeside picnic").await.expect("Embedding failed.");

	assert_eq!(vector, vec![0.25, 0.75]);

	let (key, body) = seen_rx.recv().await.expect("Embed server saw no request.");

	assert_eq!(key.as_deref(), Some("secret"));
	assert_eq!(body["model"], "models/test-embed");
	assert_eq!(body["content"]["parts"][0]["text"], "lakeside picnic");

	let _ = shutdown.send(());
}

#[tokio::test]
async fn non_success_status_is_an_error() {
	let (seen_tx, _seen_rx) = mpsc::unbounded_channel();
	let state = EmbedState {
		reply: (
			StatusCode::TOO_MANY_REQUESTS,
			serde_json::json!({ "error": { "message": "quota exhausted" } }),
		),
		seen: seen_tx,
	};
	let (api_base, shutdown) = start_embed_server(state).await;
	let cfg = provider_config(api_base);
	let client = mhike_providers::http_client(None).expect("Failed to build client.");
	let err = embedding::embed(&client, &cfg, "anything").await.expect_err("Expected failure.");
	let message = err.to_string();

	assert!(message.contains("429"), "Unexpected error message: {message}");
	assert!(message.contains("quota exhausted"), "Unexpected error message: {message}");

	let _ = shutdown.send(());
}

#[tokio::test]
async fn unexpected_shape_is_an_error() {
	let (seen_tx, _seen_rx) = mpsc::unbounded_channel();
	let state = EmbedState {
		reply: (StatusCode::OK, serde_json::json!({ "candidates": [] })),
		seen: seen_tx,
	};
	let (api_base, shutdown) = start_embed_server(state).await;
	let cfg = provider_config(api_base);
	let client = mhike_providers::http_client(None).expect("Failed to build client.");
	let err = embedding::embed(&client, &cfg, "anything").await.expect_err("Expected failure.");

	assert!(err.to_string().starts_with("Unexpected embedding response format"));

	let _ = shutdown.send(());
}
