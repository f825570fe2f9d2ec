//! HTTP surface of the record service.
//!
//! | Method | Path            | Success                                  |
//! |--------|-----------------|------------------------------------------|
//! | POST   | `/records`      | `201 {"id": <id>}`                       |
//! | GET    | `/records/{id}` | `200 {"id": <id>, "fields": {...}}`      |
//! | PATCH  | `/records/{id}` | `200 {"status": "success"}`              |
//! | DELETE | `/records/{id}` | `200 {"status": "success"}`              |
//!
//! Every error response has the body `{"status": "error", "description": ...}`.
use crate::metrics_defs::API_ERRORS;
use crate::service::{Record, RecordService, ServiceError};
use crate::store::RecordId;
use aggregator::Fields;
use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Deserializer, Serialize, de};
use shared::counter;
use std::future::Future;
use tokio::net::TcpListener;

pub fn router(service: RecordService) -> Router {
    Router::new()
        .route("/records", post(create_record))
        .route(
            "/records/{id}",
            get(read_record).patch(patch_record).delete(delete_record),
        )
        .route("/health", get(health))
        .fallback(no_route)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(service)
}

/// Serves the API until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    service: RecordService,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateRequest {
    #[serde(rename = "ID", deserialize_with = "person_id")]
    pub person_id: u64,
}

/// Accepts the person id as a JSON number or as a numeric string.
fn person_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PersonId {
        Number(u64),
        Text(String),
    }

    match PersonId::deserialize(deserializer)? {
        PersonId::Number(id) => Ok(id),
        PersonId::Text(text) => text.parse().map_err(|_| {
            de::Error::custom(format!("person id must be an integer, got {text:?}"))
        }),
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct CreatedResponse {
    pub id: RecordId,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn success() -> Self {
        StatusResponse {
            status: "success".into(),
        }
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    status: &'static str,
    description: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("invalid record id: {0}")]
    InvalidId(String),

    #[error("no route for {method} {path}")]
    NoRoute { method: Method, path: String },

    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidId(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(ServiceError::RecordNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Service(ServiceError::PersonNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Service(ServiceError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Service(ServiceError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            // Only numeric ids are routed
            ApiError::InvalidId(_) => StatusCode::NOT_FOUND,
            ApiError::NoRoute { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        counter!(API_ERRORS, "status" => status.as_u16().to_string()).increment(1);

        let body = Json(ApiErrorResponse {
            status: "error",
            description: self.to_string(),
        });

        (status, body).into_response()
    }
}

async fn create_record(
    State(service): State<RecordService>,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(request) = body?;
    let id = service.create(request.person_id).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn read_record(
    State(service): State<RecordService>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<Record>, ApiError> {
    let Path(id) = id?;
    Ok(Json(service.read(id).await?))
}

async fn patch_record(
    State(service): State<RecordService>,
    id: Result<Path<RecordId>, PathRejection>,
    body: Result<Json<Fields>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Path(id) = id?;
    let Json(partial) = body?;
    service.patch(id, partial).await?;
    Ok(Json(StatusResponse::success()))
}

async fn delete_record(
    State(service): State<RecordService>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Path(id) = id?;
    service.delete(id).await?;
    Ok(Json(StatusResponse::success()))
}

async fn health() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".into(),
    })
}

async fn no_route(method: Method, uri: Uri) -> ApiError {
    ApiError::NoRoute {
        method,
        path: uri.path().to_string(),
    }
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

#[cfg(test)]
mod tests {
    use crate::client::{ClientError, ErrorMessage, RecordsClient};
    use crate::testutils::TestApp;
    use aggregator::testutils::test_client;
    use serde_json::json;

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let app = TestApp::spawn().await;
        let client = app.client();

        let id = client.create(1).await.unwrap();
        let record = client.read(id).await.unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.fields["homeworld"], "Tatooine");
        assert_eq!(record.fields["species"], "");
        assert!(!record.fields.contains_key("url"));

        let films = record.fields["films"].as_str().unwrap();
        assert_eq!(films.split(", ").count(), 4);

        let patch = json!({"k": "v"}).as_object().unwrap().clone();
        client.patch(id, &patch).await.unwrap();
        let patched = client.read(id).await.unwrap();
        assert_eq!(patched.fields["k"], "v");
        assert_eq!(patched.fields["films"], record.fields["films"]);

        client.delete(id).await.unwrap();
        let err = client.read(id).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        let err = client.delete(id).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_create_unknown_person() {
        let app = TestApp::spawn().await;
        let client = app.client();

        match client.create(17).await {
            Err(ClientError::Http { status, message }) => {
                assert_eq!(status, 404);
                let ErrorMessage::Json(body) = message else {
                    panic!("expected a JSON error body");
                };
                assert_eq!(body["status"], "error");
                assert_eq!(body["description"], "person 17 not found upstream");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert_eq!(client.read(1).await.unwrap_err().status(), Some(404));
    }

    #[tokio::test]
    async fn test_create_upstream_failure() {
        let app = TestApp::spawn().await;
        let err = app.client().create(90).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
    }

    #[tokio::test]
    async fn test_created_status_and_body() {
        let app = TestApp::spawn().await;
        let response = app
            .http()
            .post(format!("{}/records", app.base_url()))
            .json(&json!({"ID": 2}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 201);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["id"].is_i64());
    }

    #[tokio::test]
    async fn test_create_accepts_numeric_string_id() {
        let app = TestApp::spawn().await;
        let http = app.http();
        let url = format!("{}/records", app.base_url());

        let response = http
            .post(&url)
            .json(&json!({"ID": "2"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let body: serde_json::Value = response.json().await.unwrap();
        let id = body["id"].as_i64().unwrap();
        let record = app.client().read(id).await.unwrap();
        assert_eq!(record.fields["name"], "C-3PO");

        for bad in [json!({"ID": "two"}), json!({"ID": -1}), json!({"ID": null})] {
            let response = http.post(&url).json(&bad).send().await.unwrap();
            assert_eq!(response.status(), 400, "{bad}");
        }
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let app = TestApp::spawn().await;
        let http = app.http();
        let base = app.base_url();

        let cases = [
            (http.post(format!("{base}/records")).body("not json"), 400),
            (http.post(format!("{base}/records")).json(&json!({"id": 1})), 400),
            (http.patch(format!("{base}/records/1")).json(&json!(["k", "v"])), 400),
            (http.delete(format!("{base}/records/1")), 404),
            (http.get(format!("{base}/records/abc")), 404),
            (http.get(format!("{base}/people/1")), 404),
            (http.put(format!("{base}/records/1")), 405),
        ];

        for (request, expected) in cases {
            let response = request.send().await.unwrap();
            assert_eq!(response.status(), expected);
            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body["status"], "error");
            assert!(body["description"].is_string());
        }
    }

    #[tokio::test]
    async fn test_patch_requires_object() {
        let app = TestApp::spawn().await;
        let client = app.client();
        let id = client.create(1).await.unwrap();

        let response = app
            .http()
            .patch(format!("{}/records/{id}", app.base_url()))
            .json(&json!(["k", "v"]))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::spawn().await;
        let body: serde_json::Value = app
            .http()
            .get(format!("{}/health", app.base_url()))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_concurrent_creates() {
        let app = TestApp::spawn().await;
        let client = app.client();

        let (a, b) = tokio::join!(client.create(1), client.create(2));
        let a = client.read(a.unwrap()).await.unwrap();
        let b = client.read(b.unwrap()).await.unwrap();

        assert_eq!(a.fields["name"], "Luke Skywalker");
        assert_eq!(b.fields["name"], "C-3PO");
        assert_ne!(a.fields["films"], b.fields["films"]);
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        // Nothing listens on port 1, the call fails before any HTTP status
        let client = RecordsClient::with_client(test_client(), "http://127.0.0.1:1");
        let err = client.read(1).await.unwrap_err();
        assert_eq!(err.status(), None);
    }
}
