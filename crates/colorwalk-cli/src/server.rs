//! ColorWalk HTTP server
//!
//! A small JSON API over one [`ColorWalkStore`] and one
//! [`RecommendationService`]:
//!
//! ```text
//! GET    /healthz
//! GET    /places                 POST /places
//! GET    /places/{id}            DELETE /places/{id}
//! POST   /members
//! POST   /walks/start            POST /walks/points
//! PUT    /walks/{id}/finish
//! GET    /walks                  GET  /walks/{id}
//! GET    /walks/members/{id}
//! POST   /walks/recommend
//! ```
//!
//! Errors are returned as `{"error": <code>, "message": <text>}`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use bytes::Bytes;
use colorwalk_recommend::{RecommendError, RecommendationRequest, RecommendationService};
use colorwalk_storage::{
    ColorWalkStore, PlaceCreateRequest, RegisterMemberRequest, StartWalkRequest, StoreError,
    WalkingPointRequest, WalkingPointResponse,
};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub ready_file: Option<PathBuf>,
}

pub struct ServerState {
    pub store: Arc<ColorWalkStore>,
    pub recommender: RecommendationService,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    fn route_not_found(method: &Method, path: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no route for {method} {path}"),
        )
    }

    fn body(&self) -> Value {
        json!({ "error": self.code, "message": self.message })
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            e if e.is_not_found() => Self::new(StatusCode::NOT_FOUND, "not_found", message),
            StoreError::InvalidRequest(_) => Self::bad_request("invalid_request", message),
            StoreError::WalkFinished(_) => Self::bad_request("walk_finished", message),
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message),
        }
    }
}

impl From<RecommendError> for ApiError {
    fn from(err: RecommendError) -> Self {
        let message = err.to_string();
        match err {
            RecommendError::InvalidRequest(_) => Self::bad_request("invalid_request", message),
            RecommendError::UnknownMember(_) => {
                Self::new(StatusCode::NOT_FOUND, "not_found", message)
            }
            RecommendError::Catalog(_) | RecommendError::CandidateSet(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
            }
        }
    }
}

type ApiResult = Result<(StatusCode, Value), ApiError>;

fn ok<T: Serialize>(status: StatusCode, value: &T) -> ApiResult {
    serde_json::to_value(value)
        .map(|v| (status, v))
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string()))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request("invalid_json", e.to_string()))
}

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("invalid_id", format!("`{raw}` is not a numeric id")))
}

// ============================================================================
// Routing
// ============================================================================

/// Route one request to the store or the recommender
pub async fn dispatch(state: &ServerState, method: &Method, path: &str, body: &[u8]) -> ApiResult {
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let store = &state.store;

    match (method, segments.as_slice()) {
        (&Method::GET, ["healthz"]) => Ok((StatusCode::OK, json!({ "status": "ok" }))),

        (&Method::GET, ["places"]) => ok(StatusCode::OK, &store.places()),
        (&Method::POST, ["places"]) => {
            let request: PlaceCreateRequest = parse_body(body)?;
            ok(StatusCode::CREATED, &store.create_place(request)?)
        }
        (&Method::GET, ["places", id]) => ok(StatusCode::OK, &store.place(parse_id(id)?)?),
        (&Method::DELETE, ["places", id]) => {
            let id = parse_id(id)?;
            store.delete_place(id)?;
            Ok((StatusCode::OK, json!({ "deleted": id })))
        }

        (&Method::POST, ["members"]) => {
            let request: RegisterMemberRequest = parse_body(body)?;
            ok(StatusCode::CREATED, &store.register_member(request)?)
        }

        (&Method::GET, ["walks"]) => ok(StatusCode::OK, &store.all_walks()),
        (&Method::POST, ["walks", "start"]) => {
            let request: StartWalkRequest = parse_body(body)?;
            ok(StatusCode::CREATED, &store.start_walk(request)?)
        }
        (&Method::POST, ["walks", "points"]) => {
            let request: WalkingPointRequest = parse_body(body)?;
            let point = store.record_point(request)?;
            ok(StatusCode::CREATED, &WalkingPointResponse::from(&point))
        }
        (&Method::POST, ["walks", "recommend"]) => {
            let request: RecommendationRequest = parse_body(body)?;
            let recommendation = state.recommender.recommend(&request).await?;
            ok(StatusCode::OK, &recommendation)
        }
        (&Method::GET, ["walks", "members", id]) => {
            ok(StatusCode::OK, &store.member_walks(parse_id(id)?)?)
        }
        (&Method::PUT, ["walks", id, "finish"]) => {
            ok(StatusCode::OK, &store.finish_walk(parse_id(id)?)?)
        }
        (&Method::GET, ["walks", id]) => ok(StatusCode::OK, &store.walk(parse_id(id)?)?),

        _ => Err(ApiError::route_not_found(method, path)),
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let body = req.into_body().collect().await?.to_bytes();

    let resp = match dispatch(&state, &method, &path, &body).await {
        Ok((status, value)) => json_response(status, &value),
        Err(err) => {
            if err.status.is_server_error() {
                tracing::error!(%method, %path, error = %err.message, "request failed");
            } else {
                tracing::debug!(%method, %path, code = err.code, "request rejected");
            }
            json_response(err.status, &err.body())
        }
    };

    Ok(resp)
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{\"error\":\"serialize\"}".to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{\"error\":\"internal\"}"))))
}

// ============================================================================
// Accept loop
// ============================================================================

pub fn serve(config: ServerConfig, state: ServerState) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;

    rt.block_on(async move { serve_async(config, Arc::new(state)).await })
}

async fn serve_async(config: ServerConfig, state: Arc<ServerState>) -> Result<()> {
    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|e| anyhow!("serve: failed to bind {}: {e}", config.listen))?;
    let bound = listener
        .local_addr()
        .map_err(|e| anyhow!("serve: failed to read bound addr: {e}"))?;

    tracing::info!(addr = %bound, "listening");
    if let Some(path) = config.ready_file.as_ref() {
        let payload = json!({
            "addr": bound.to_string(),
            "pid": std::process::id(),
        });
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(path, serde_json::to_string_pretty(&payload).unwrap_or_default()) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write ready file");
        }
    }

    loop {
        let (stream, _peer) = listener
            .accept()
            .await
            .map_err(|e| anyhow!("serve: accept failed: {e}"))?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, state.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(error = %e, "connection error");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorwalk_recommend::oracle::StaticOracle;

    fn state_with_oracle(text: &str) -> ServerState {
        let store = Arc::new(ColorWalkStore::in_memory());
        let recommender =
            RecommendationService::new(store.clone(), Arc::new(StaticOracle::new(text)));
        ServerState { store, recommender }
    }

    async fn call(state: &ServerState, method: Method, path: &str, body: Value) -> (StatusCode, Value) {
        let bytes = serde_json::to_vec(&body).unwrap();
        match dispatch(state, &method, path, &bytes).await {
            Ok(reply) => reply,
            Err(err) => (err.status, err.body()),
        }
    }

    async fn add_place(state: &ServerState, name: &str, lat: f64, lon: f64) -> u64 {
        let (status, body) = call(
            state,
            Method::POST,
            "/places",
            json!({ "name": name, "latitude": lat, "longitude": lon, "category": "PARK" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_u64().unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let state = state_with_oracle("");
        let (status, body) = call(&state, Method::GET, "/healthz", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_place_routes() {
        let state = state_with_oracle("");
        let id = add_place(&state, "Seoul Forest", 37.5444, 127.0374).await;

        let (status, body) = call(&state, Method::GET, &format!("/places/{id}"), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Seoul Forest");
        assert_eq!(body["category"], "PARK");

        let (_, list) = call(&state, Method::GET, "/places", Value::Null).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = call(&state, Method::DELETE, &format!("/places/{id}"), Value::Null).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&state, Method::GET, &format!("/places/{id}"), Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_bad_input_is_400() {
        let state = state_with_oracle("");

        let (status, body) = call(&state, Method::GET, "/places/abc", Value::Null).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_id");

        let (status, body) = call(&state, Method::POST, "/places", json!({ "name": "x" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_json");

        let (status, body) = call(
            &state,
            Method::POST,
            "/places",
            json!({ "name": "Pole", "latitude": 95.0, "longitude": 0.0, "category": "NATURE" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let state = state_with_oracle("");
        let (status, body) = call(&state, Method::PATCH, "/places", Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("PATCH /places"));
    }

    #[tokio::test]
    async fn test_walk_routes() {
        let state = state_with_oracle("");
        let (status, member) = call(
            &state,
            Method::POST,
            "/members",
            json!({ "username": "jiwoo", "email": "jiwoo@example.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let member_id = member["id"].as_u64().unwrap();

        let (status, walk) = call(
            &state,
            Method::POST,
            "/walks/start",
            json!({ "memberId": member_id, "title": "Lunch loop", "colorTheme": "blue" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(walk["colorTheme"], "BLUE");
        let walk_id = walk["walkId"].as_u64().unwrap();

        for (lat, lon) in [(37.5663, 126.9779), (37.5759, 126.9768)] {
            let (status, point) = call(
                &state,
                Method::POST,
                "/walks/points",
                json!({ "walkId": walk_id, "latitude": lat, "longitude": lon }),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert!(point["pointId"].is_u64());
        }

        let (status, done) =
            call(&state, Method::PUT, &format!("/walks/{walk_id}/finish"), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert!(done["endTime"].is_string());
        assert!(done["totalDistance"].as_f64().unwrap() > 1000.0);
        assert_eq!(done["walkingPoints"].as_array().unwrap().len(), 2);

        let (status, body) =
            call(&state, Method::PUT, &format!("/walks/{walk_id}/finish"), Value::Null).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "walk_finished");

        let (_, mine) = call(
            &state,
            Method::GET,
            &format!("/walks/members/{member_id}"),
            Value::Null,
        )
        .await;
        assert_eq!(mine.as_array().unwrap().len(), 1);

        let (status, _) = call(&state, Method::GET, "/walks/members/999", Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recommend_route() {
        let state = state_with_oracle("1. [2] Naksan Park - City wall at sunset");
        let (_, member) = call(
            &state,
            Method::POST,
            "/members",
            json!({ "username": "jiwoo", "email": "jiwoo@example.com" }),
        )
        .await;
        let first = add_place(&state, "Seoul Forest", 37.5444, 127.0374).await;
        let second = add_place(&state, "Naksan Park", 37.5806, 127.0075).await;

        let (status, body) = call(
            &state,
            Method::POST,
            "/walks/recommend",
            json!({
                "memberId": member["id"],
                "currentLatitude": 37.5665,
                "currentLongitude": 126.9780,
                "maxDistance": 10.0
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let places = body["recommendedPlaces"].as_array().unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0]["placeId"].as_u64(), Some(second));
        assert_eq!(places[0]["aiRecommendationReason"], "City wall at sunset");
        assert_eq!(places[1]["placeId"].as_u64(), Some(first));
        assert!(places[0]["distanceFromUser"].as_f64().unwrap() > 0.0);

        let (status, body) = call(
            &state,
            Method::POST,
            "/walks/recommend",
            json!({ "memberId": 4242 }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = call(
            &state,
            Method::POST,
            "/walks/recommend",
            json!({ "memberId": member["id"], "maxDistance": 80.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
