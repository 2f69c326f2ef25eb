use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use bilemo::application::auth::{TokenAuthenticator, hash_secret};
use bilemo::application::repos::{ClientsWriteRepo, PhonesWriteRepo};
use bilemo::cache::{CacheConfig, MemoryTagStore, ReadThroughCache, TagAwareStore, TagInvalidator};
use bilemo::config::{PaginationSettings, TokenSettings};
use bilemo::domain::entities::{ClientDraft, PhoneDraft};
use bilemo::domain::roles::Role;
use bilemo::infra::http::{self, ApiState, Repositories};
use bilemo::infra::memory::InMemoryRepositories;

const ADMIN_TOKEN: &str = "admin-secret";
const USER_TOKEN: &str = "user-secret";
const CLIENT_TOKEN: &str = "client-one-secret";

fn token(name: &str, secret: &str, role: Role, client_id: Option<i64>) -> TokenSettings {
    TokenSettings {
        name: name.to_string(),
        sha256: hash_secret(secret),
        role,
        client_id,
    }
}

async fn seeded_app(clients: usize, phones: usize) -> (Router, InMemoryRepositories) {
    let repos = InMemoryRepositories::new();
    for n in 1..=clients {
        repos
            .create_client(ClientDraft::new(&format!("Client {n}")).unwrap())
            .await
            .unwrap();
    }
    for n in 1..=phones {
        repos
            .create_phone(PhoneDraft::new(&format!("Phone {n}"), Some("Acme"), None, None).unwrap())
            .await
            .unwrap();
    }

    let config = CacheConfig::default();
    let store: Arc<dyn TagAwareStore> = Arc::new(MemoryTagStore::new(&config));
    let authenticator = TokenAuthenticator::new(&[
        token("admin", ADMIN_TOKEN, Role::Admin, None),
        token("reader", USER_TOKEN, Role::User, None),
        token("client-one", CLIENT_TOKEN, Role::Client, Some(1)),
    ]);
    let state = ApiState::new(
        Repositories::shared(Arc::new(repos.clone())),
        ReadThroughCache::new(store.clone(), &config),
        TagInvalidator::new(store),
        authenticator,
        PaginationSettings {
            default_page: NonZeroU32::MIN,
            default_limit: NonZeroU32::new(3).unwrap(),
        },
        None,
    );

    (http::build_router(state), repos)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be json")
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(USER_TOKEN), None).await
}

#[tokio::test]
async fn listing_defaults_to_first_page_of_three() {
    let (app, _) = seeded_app(7, 0).await;

    let (status, body) = get(&app, "/api/clients").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
    assert_eq!(body["items"][0]["name"], "Client 1");
    assert_eq!(
        body["pagination"],
        json!({"totalItems": 7, "totalPages": 3, "page": 1, "limit": 3})
    );

    let (status, body) = get(&app, "/api/clients?page=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([{"id": 7, "name": "Client 7"}]));
}

#[tokio::test]
async fn invalid_pagination_is_bad_request() {
    let (app, _) = seeded_app(7, 0).await;

    for uri in [
        "/api/clients?page=0",
        "/api/clients?limit=0",
        "/api/clients?page=-2&limit=3",
        "/api/clients?page=abc",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["code"], "invalid_parameters", "{uri}");
    }
}

#[tokio::test]
async fn page_beyond_the_last_is_not_found() {
    let (app, _) = seeded_app(7, 0).await;

    let (status, body) = get(&app, "/api/clients?page=4&limit=3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "page_not_found");
}

#[tokio::test]
async fn empty_collection_serves_any_page() {
    let (app, _) = seeded_app(0, 0).await;

    let (status, body) = get(&app, "/api/phones?page=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["pagination"]["totalPages"], 0);
}

#[tokio::test]
async fn requests_without_valid_token_are_unauthorized() {
    let (app, _) = seeded_app(1, 0).await;

    let (status, body) = send(&app, Method::GET, "/api/clients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, body) = send(&app, Method::GET, "/api/clients", Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Invalid API token");

    let request = Request::builder()
        .uri("/api/clients")
        .header("x-api-key", USER_TOKEN)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_needs_no_token() {
    let (app, _) = seeded_app(0, 0).await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "storage": "memory"}));
}

#[tokio::test]
async fn reader_cannot_write() {
    let (app, _) = seeded_app(1, 1).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/phones",
        Some(USER_TOKEN),
        Some(json!({"name": "Pixel 9"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");

    let (status, _) = send(&app, Method::DELETE, "/api/clients/1", Some(USER_TOKEN), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn creating_a_client_refreshes_listings() {
    let (app, _) = seeded_app(7, 0).await;

    let (_, before) = get(&app, "/api/clients?page=3").await;
    assert_eq!(before["items"].as_array().unwrap().len(), 1);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/clients",
        Some(ADMIN_TOKEN),
        Some(json!({"name": "Orange"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 8);

    let (_, after) = get(&app, "/api/clients?page=3").await;
    assert_eq!(after["items"].as_array().unwrap().len(), 2);
    assert_eq!(after["pagination"]["totalItems"], 8);
}

#[tokio::test]
async fn deleting_a_client_refreshes_listings() {
    let (app, _) = seeded_app(7, 0).await;

    let (_, before) = get(&app, "/api/clients?page=2&limit=3").await;
    assert_eq!(before["items"][0]["id"], 4);
    assert_eq!(before["pagination"]["totalPages"], 3);

    let (status, body) = send(&app, Method::DELETE, "/api/clients/1", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, after) = get(&app, "/api/clients?page=2&limit=3").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = after["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![5, 6, 7]);
    assert_eq!(
        after["pagination"],
        json!({"totalItems": 6, "totalPages": 2, "page": 2, "limit": 3})
    );

    let (status, _) = get(&app, "/api/clients/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn phone_writes_refresh_listings() {
    let (app, _) = seeded_app(0, 4).await;

    let (_, before) = get(&app, "/api/phones?page=2").await;
    assert_eq!(before["items"][0]["name"], "Phone 4");

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/api/phones/4",
        Some(ADMIN_TOKEN),
        Some(json!({"name": "Phone 4 Pro", "screenSize": "6.7"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["screenSize"], "6.7");

    let (_, renamed) = get(&app, "/api/phones?page=2").await;
    assert_eq!(renamed["items"][0]["name"], "Phone 4 Pro");

    let (status, body) = send(&app, Method::DELETE, "/api/phones/4", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = get(&app, "/api/phones?page=2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "page_not_found");
}

#[tokio::test]
async fn client_principal_manages_only_its_own_customers() {
    let (app, _) = seeded_app(2, 0).await;
    let customer = json!({
        "email": "jane@example.com",
        "firstName": "Jane",
        "lastName": "Doe"
    });

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/clients/2/customers",
        Some(CLIENT_TOKEN),
        Some(customer.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, empty) = get(&app, "/api/clients/1/customers").await;
    assert_eq!(empty["pagination"]["totalItems"], 0);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/clients/1/customers",
        Some(CLIENT_TOKEN),
        Some(customer.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["clientId"], 1);
    assert_eq!(created["roles"], json!(["ROLE_USER"]));

    let (_, listed) = get(&app, "/api/clients/1/customers").await;
    assert_eq!(listed["pagination"]["totalItems"], 1);
    let (_, all) = get(&app, "/api/customers").await;
    assert_eq!(all["items"][0]["email"], "jane@example.com");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/clients/1/customers",
        Some(ADMIN_TOKEN),
        Some(customer),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "duplicate");

    let (status, _) = get(&app, "/api/clients/2/customers/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/clients/1/customers/1",
        Some(CLIENT_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = get(&app, "/api/clients/1/customers").await;
    assert_eq!(listed["pagination"]["totalItems"], 0);
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
    let (app, _) = seeded_app(1, 0).await;

    let (status, body) = get(&app, "/api/clients/99/customers").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = get(&app, "/api/phones/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/phones/99", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/api/clients/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn invalid_bodies_are_rejected() {
    let (app, _) = seeded_app(1, 0).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/clients/1/customers",
        Some(ADMIN_TOKEN),
        Some(json!({"email": "not-an-email", "firstName": "A", "lastName": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
    assert!(body["error"]["hint"].as_str().unwrap().starts_with("email"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/clients",
        Some(ADMIN_TOKEN),
        Some(json!({"title": "wrong field"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}
