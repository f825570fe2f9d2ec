//! In-process mock of the upstream catalog, served by axum on an ephemeral port.
use crate::config::UpstreamConfig;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type Catalog = HashMap<(String, u64), Value>;

const SLOW_FILM_ID: u64 = 777;

/// How long the mock takes to answer for the film of person 93.
pub const SLOW_FILM_DELAY: Duration = Duration::from_secs(3);

pub struct TestUpstreamServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestUpstreamServer {
    pub async fn spawn() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let catalog = Arc::new(catalog(&format!("http://{addr}/api")));

        let app = Router::new()
            .route("/api/{kind}/{id}/", get(resource))
            .with_state(catalog);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(TestUpstreamServer { addr, handle })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn config(&self) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.base_url().parse().expect("mock URL is valid"),
            timeout_secs: 5,
        }
    }
}

impl Drop for TestUpstreamServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// HTTP client for tests, ignores proxy settings from the environment.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("build test client")
}

async fn resource(
    State(catalog): State<Arc<Catalog>>,
    Path((kind, id)): Path<(String, u64)>,
) -> Response {
    // Earlier films answer later so completion order differs from list order
    if kind == "films" && id <= 6 {
        tokio::time::sleep(Duration::from_millis((7 - id) * 15)).await;
    }
    if kind == "films" && id == SLOW_FILM_ID {
        tokio::time::sleep(SLOW_FILM_DELAY).await;
    }

    match catalog.get(&(kind, id)) {
        Some(body) => Json(body.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found"}))).into_response(),
    }
}

fn catalog(base: &str) -> Catalog {
    let url = |kind: &str, id: u64| format!("{base}/{kind}/{id}/");
    let urls = |kind: &str, ids: &[u64]| -> Vec<String> {
        ids.iter().map(|id| url(kind, *id)).collect()
    };

    let mut catalog = Catalog::new();

    catalog.insert(
        ("people".into(), 1),
        json!({
            "name": "Luke Skywalker",
            "height": "172",
            "mass": "77",
            "hair_color": "blond",
            "skin_color": "fair",
            "eye_color": "blue",
            "birth_year": "19BBY",
            "gender": "male",
            "homeworld": url("planets", 1),
            "films": urls("films", &[1, 2, 3, 6]),
            "species": [],
            "vehicles": urls("vehicles", &[14, 30]),
            "starships": urls("starships", &[12, 22]),
            "created": "2014-12-09T13:50:51.644000Z",
            "edited": "2014-12-20T21:17:56.891000Z",
            "url": url("people", 1),
        }),
    );
    catalog.insert(
        ("people".into(), 2),
        json!({
            "name": "C-3PO",
            "height": "167",
            "mass": "75",
            "hair_color": "n/a",
            "skin_color": "gold",
            "eye_color": "yellow",
            "birth_year": "112BBY",
            "gender": "n/a",
            "homeworld": url("planets", 1),
            "films": urls("films", &[4, 5, 6, 1, 2, 3]),
            "species": urls("species", &[2]),
            "vehicles": [],
            "starships": [],
            "created": "2014-12-10T15:10:51.357000Z",
            "edited": "2014-12-20T21:17:50.309000Z",
            "url": url("people", 2),
        }),
    );
    catalog.insert(
        ("people".into(), 90),
        json!({
            "name": "Broken Starship",
            "homeworld": url("planets", 1),
            "films": urls("films", &[1]),
            "species": [],
            "vehicles": [],
            "starships": urls("starships", &[12, 999]),
        }),
    );
    catalog.insert(
        ("people".into(), 91),
        json!({
            "name": "Untitled Film",
            "homeworld": url("planets", 1),
            "films": urls("films", &[100]),
            "species": [],
            "vehicles": [],
            "starships": [],
        }),
    );
    catalog.insert(
        ("people".into(), 92),
        json!({
            "name": "Many Homeworlds",
            "homeworld": urls("planets", &[1]),
            "films": [],
            "species": [],
            "vehicles": [],
            "starships": [],
        }),
    );
    catalog.insert(
        ("people".into(), 93),
        json!({
            "name": "Slow Film",
            "homeworld": url("planets", 1),
            "films": urls("films", &[SLOW_FILM_ID]),
            "species": [],
            "vehicles": [],
            "starships": [],
        }),
    );

    catalog.insert(("planets".into(), 1), json!({"name": "Tatooine"}));
    catalog.insert(("species".into(), 2), json!({"name": "Droid"}));
    catalog.insert(("starships".into(), 12), json!({"name": "X-wing"}));
    catalog.insert(("starships".into(), 22), json!({"name": "Imperial shuttle"}));
    catalog.insert(("vehicles".into(), 14), json!({"name": "Snowspeeder"}));
    catalog.insert(("vehicles".into(), 30), json!({"name": "Imperial Speeder Bike"}));
    catalog.insert(("films".into(), 100), json!({"episode_id": 0}));
    catalog.insert(("films".into(), SLOW_FILM_ID), json!({"title": "The Long Wait"}));

    let films = [
        (1, "A New Hope"),
        (2, "The Empire Strikes Back"),
        (3, "Return of the Jedi"),
        (4, "The Phantom Menace"),
        (5, "Attack of the Clones"),
        (6, "Revenge of the Sith"),
    ];
    for (id, title) in films {
        catalog.insert(("films".into(), id), json!({"title": title, "url": url("films", id)}));
    }

    catalog
}
