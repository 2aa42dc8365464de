use axum::{
	Json, Router,
	extract::{Query, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing,
};
use serde::Deserialize;
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use mhike_storage::{
	DocumentStore, Error, firestore::FirestoreStore, memory::MemoryStore, models::Document,
};

const HIKES_PATH: &str = "/v1/projects/m-hike/databases/(default)/documents/users/u1/hikes";
const OBSERVATIONS_PATH: &str =
	"/v1/projects/m-hike/databases/(default)/documents/users/u1/hikes/7/observations";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
	page_size: Option<u32>,
	page_token: Option<String>,
}

async fn start_firestore_server() -> (String, Sender<()>) {
	let app = Router::new()
		.route(HIKES_PATH, routing::get(list_hikes))
		.route(OBSERVATIONS_PATH, routing::get(list_observations))
		.route(
			"/v1/projects/m-hike/databases/(default)/documents/users/broken/hikes",
			routing::get(broken),
		)
		.with_state("Bearer test-token");
	let listener =
		TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind Firestore server.");
	let addr = listener.local_addr().expect("Failed to read Firestore server address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}/v1"), tx)
}

fn authorized(expected: &str, headers: &HeaderMap) -> bool {
	headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(expected)
}

async fn list_hikes(
	State(expected): State<&'static str>,
	headers: HeaderMap,
	Query(params): Query<ListParams>,
) -> Response {
	if !authorized(expected, &headers) {
		return StatusCode::UNAUTHORIZED.into_response();
	}

	assert_eq!(params.page_size, Some(1));

	let body = match params.page_token.as_deref() {
		None => serde_json::json!({
			"documents": [{
				"name": "projects/m-hike/databases/(default)/documents/users/u1/hikes/7",
				"fields": {
					"name": { "stringValue": "Ben Nevis" },
					"embedding_vector": {
						"arrayValue": { "values": [{ "doubleValue": 0.6 }, { "doubleValue": 0.8 }] }
					}
				}
			}],
			"nextPageToken": "page-2"
		}),
		Some("page-2") => serde_json::json!({
			"documents": [{
				"name": "projects/m-hike/databases/(default)/documents/users/u1/hikes/trail-x",
				"fields": { "name": { "stringValue": "Unembedded" } }
			}]
		}),
		Some(_) => return StatusCode::BAD_REQUEST.into_response(),
	};

	Json(body).into_response()
}

async fn list_observations(State(expected): State<&'static str>, headers: HeaderMap) -> Response {
	if !authorized(expected, &headers) {
		return StatusCode::UNAUTHORIZED.into_response();
	}

	Json(serde_json::json!({})).into_response()
}

async fn broken() -> Response {
	(StatusCode::SERVICE_UNAVAILABLE, "backend unavailable").into_response()
}

fn store_config(api_base: String, access_token: &str) -> mhike_config::Firestore {
	mhike_config::Firestore {
		api_base,
		project_id: "m-hike".to_string(),
		database: "(default)".to_string(),
		service_account_path: None,
		access_token: access_token.to_string(),
		page_size: 1,
		timeout_ms: Some(5_000),
	}
}

#[tokio::test]
async fn lists_every_page_of_a_collection() {
	let (api_base, shutdown) = start_firestore_server().await;
	let store =
		FirestoreStore::new(&store_config(api_base, "test-token")).expect("Failed to build store.");
	let hikes = store.list_hikes("u1").await.expect("Failed to list hikes.");

	assert_eq!(hikes.len(), 2);
	assert_eq!(hikes[0].key, "7");
	assert_eq!(hikes[0].str_field("name"), Some("Ben Nevis"));
	assert_eq!(hikes[0].field("embedding_vector"), Some(&serde_json::json!([0.6, 0.8])));
	assert_eq!(hikes[1].key, "trail-x");
	assert!(hikes[1].field("embedding_vector").is_none());

	let observations = store.list_observations("u1", "7").await.expect("Failed to list.");

	assert!(observations.is_empty());

	let _ = shutdown.send(());
}

#[tokio::test]
async fn error_status_is_unavailable() {
	let (api_base, shutdown) = start_firestore_server().await;
	let store =
		FirestoreStore::new(&store_config(api_base, "test-token")).expect("Failed to build store.");
	let err = store.list_hikes("broken").await.expect_err("Expected store failure.");

	assert!(matches!(err, Error::Unavailable(_)), "Unexpected error: {err:?}");
	assert!(err.to_string().contains("503"), "Unexpected error: {err}");

	let _ = shutdown.send(());
}

#[tokio::test]
async fn rejected_credentials_fail_the_listing() {
	let (api_base, shutdown) = start_firestore_server().await;
	let store =
		FirestoreStore::new(&store_config(api_base, "wrong")).expect("Failed to build store.");
	let err = store.list_hikes("u1").await.expect_err("Expected auth failure.");

	assert!(err.to_string().contains("401"), "Unexpected error: {err}");

	let _ = shutdown.send(());
}

#[tokio::test]
async fn memory_store_hides_missing_parent_hikes() {
	let store = MemoryStore::new()
		.with_hike("u1", Document::new("1", Default::default()))
		.with_observation("u1", "1", Document::new("a", Default::default()))
		.with_observation("u1", "ghost", Document::new("b", Default::default()));
	let hikes = store.list_hikes("u1").await.expect("Failed to list hikes.");

	assert_eq!(hikes.iter().map(|hike| hike.key.as_str()).collect::<Vec<_>>(), vec!["1"]);
	assert_eq!(store.list_observations("u1", "1").await.expect("list").len(), 1);
	assert_eq!(store.list_observations("u1", "ghost").await.expect("list").len(), 1);
	assert!(store.list_hikes("nobody").await.expect("list").is_empty());
}
