pub mod auth;
pub mod bids;
pub mod evaluation;
pub mod health;
pub mod me;
pub mod tenders;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/tenders", get(tenders::list_open_tenders))
        .route("/tenders/:tender_id", get(tenders::get_tender))
        .route("/evaluation/:tender_id/winner", get(evaluation::winner))
        // Protected routes
        .route("/me", get(me::get_me))
        // Tenders
        .route("/tenders", post(tenders::create_tender))
        .route("/tenders/:tender_id", put(tenders::update_tender))
        .route("/tenders/:tender_id", delete(tenders::delete_tender))
        // Bids (nested under tenders)
        .route("/tenders/:tender_id/bids", post(bids::submit_bid))
        .route("/tenders/:tender_id/bids", get(bids::list_bids_for_tender))
        .route("/bids/my", get(bids::my_bids))
        .route("/bids/:id", get(bids::get_bid_details))
        // Evaluation
        .route("/evaluation/:tender_id/lowest", get(evaluation::lowest))
        .route("/evaluation/:tender_id/award", post(evaluation::award))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::app::{create_app, AppState};
    use crate::auth::{Claims, Role, TokenVerifier};
    use crate::config::{Environment, Settings, StoreBackend};
    use crate::engine::{BidAdmission, Evaluation};
    use crate::store::{MemoryStore, RecordStore};

    const SECRET: &str = "test-secret";
    const ISSUER: &str = "tenderdesk-identity";
    const AUDIENCE: &str = "tenderdesk";

    fn settings() -> Settings {
        Settings {
            env: Environment::Dev,
            server_addr: "127.0.0.1:0".to_string(),
            store_backend: StoreBackend::Memory,
            database_url: None,
            database_max_connections: 1,
            cors_allow_origins: vec!["http://localhost:3000".to_string()],
            jwt_secret: SECRET.to_string(),
            jwt_issuer: ISSUER.to_string(),
            jwt_audience: AUDIENCE.to_string(),
            identity_service_url: "http://identity:8081".to_string(),
            identity_timeout_seconds: 1,
            award_requires_lowest: false,
        }
    }

    fn state() -> Arc<AppState> {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        AppState::new(
            store.clone(),
            BidAdmission::new(store.clone()),
            Evaluation::new(store, false),
            TokenVerifier::new(SECRET, ISSUER, AUDIENCE),
            settings(),
            reqwest::Client::new(),
        )
    }

    fn token(user_id: Uuid, role: Role) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            aud: AUDIENCE.to_string(),
            iss: ISSUER.to_string(),
            iat: now,
            exp: now + 3600,
            email: format!("{role}@example.com"),
            role: role.as_str().to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn tender_body(deadline_offset: Duration) -> Value {
        json!({
            "title": "Water network extension",
            "description": "Phase two of the municipal network",
            "budget": "150000",
            "deadline": Utc::now() + deadline_offset,
            "category": "infrastructure",
            "location": "Zarqa",
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = create_app(state());
        let (status, body) = send(&app, request("GET", "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "ok");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = create_app(state());
        let (status, body) = send(
            &app,
            request("POST", "/tenders", None, Some(tender_body(Duration::hours(1)))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn tender_creation_is_officer_only() {
        let app = create_app(state());
        let bidder = token(Uuid::new_v4(), Role::Bidder);
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/tenders",
                Some(&bidder),
                Some(tender_body(Duration::hours(1))),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn submission_flow_over_http() {
        let app = create_app(state());
        let officer = token(Uuid::new_v4(), Role::Officer);
        let bidder = token(Uuid::new_v4(), Role::Bidder);
        let evaluator = token(Uuid::new_v4(), Role::Evaluator);

        // Officer publishes a tender with an hour of bidding time left.
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/tenders",
                Some(&officer),
                Some(tender_body(Duration::hours(1))),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let tender_id = body["data"]["id"].as_str().unwrap().to_string();

        // It shows up in the open listing.
        let (status, body) = send(&app, request("GET", "/tenders", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        // Bidder submits once, then trips the duplicate rule.
        let bid_body = json!({"proposal": "Done in 30 days", "price": "100"});
        let uri = format!("/tenders/{tender_id}/bids");
        let (status, body) = send(
            &app,
            request("POST", &uri, Some(&bidder), Some(bid_body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let bid_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            request("POST", &uri, Some(&bidder), Some(bid_body)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE_BID");

        // Officer sees the bid list; the bidder may read their own bid.
        let (status, body) = send(&app, request("GET", &uri, Some(&officer), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["id"], bid_id.as_str());

        let (status, body) = send(
            &app,
            request("GET", &format!("/bids/{bid_id}"), Some(&bidder), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["proposal"], "Done in 30 days");

        // Another bidder may not.
        let other = token(Uuid::new_v4(), Role::Bidder);
        let (status, _) = send(
            &app,
            request("GET", &format!("/bids/{bid_id}"), Some(&other), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Awarding while the window is open is refused.
        let (status, body) = send(
            &app,
            request(
                "POST",
                &format!("/evaluation/{tender_id}/award"),
                Some(&evaluator),
                Some(json!({"bid_id": bid_id})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "WINDOW_STILL_OPEN");
    }

    #[tokio::test]
    async fn late_submission_is_window_closed() {
        let app = create_app(state());
        let officer = token(Uuid::new_v4(), Role::Officer);
        let bidder = token(Uuid::new_v4(), Role::Bidder);

        // Deadline already passed when the tender is published.
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/tenders",
                Some(&officer),
                Some(tender_body(Duration::seconds(-1))),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let tender_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            request(
                "POST",
                &format!("/tenders/{tender_id}/bids"),
                Some(&bidder),
                Some(json!({"price": "50"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "WINDOW_CLOSED");

        // And the expired tender is absent from the open listing.
        let (_, body) = send(&app, request("GET", "/tenders", None, None)).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }
}
