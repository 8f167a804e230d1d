use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use protgraph::config::GraphConfig;
use protgraph::http::router;
use protgraph::{GraphStore, InMemoryDocumentStore, ProteinService};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

fn app() -> Router {
    let service = ProteinService::new(
        GraphStore::new(),
        InMemoryDocumentStore::new(),
        GraphConfig::default(),
    );
    router(Arc::new(RwLock::new(service)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed(app: &Router) {
    for (id, name, interpro) in [
        ("P1", "KIN1_HUMAN", "IPR1;IPR2"),
        ("P2", "KIN2_HUMAN", "IPR2;IPR3"),
        ("P3", "PHO_MOUSE", "IPR3"),
    ] {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/proteins",
            Some(json!({ "id": id, "display_name": name, "interpro": interpro })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}

#[tokio::test]
async fn test_status() {
    let app = app();
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["nodes"], 3);
    assert_eq!(body["storage"]["edges"], 2);
    assert_eq!(body["storage"]["documents"], 3);
}

#[tokio::test]
async fn test_add_reports_relations() {
    let app = app();
    seed(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/proteins",
        Some(json!({ "Entry": "P4", "InterPro": "IPR1;IPR3" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"]["outcome"], "inserted");
    assert_eq!(body["graph"]["similar_count"], 3);
    assert_eq!(body["graph"]["relations"][0]["target"], "P1");
}

#[tokio::test]
async fn test_add_without_id_is_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/proteins",
        Some(json!({ "interpro": "IPR1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_neighborhood() {
    let app = app();
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/proteins/P1/neighborhood?k=1&m=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let nodes = body["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0]["id"], "P1");
    assert_eq!(nodes[0]["group"], "center");
    assert_eq!(nodes[1]["group"], "level1");
    assert_eq!(nodes[2]["group"], "level2");
    assert_eq!(body["edges"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::GET, "/api/proteins/NOPE/neighborhood", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_then_neighborhood_not_found() {
    let app = app();
    seed(&app).await;

    let (status, body) = send(&app, Method::DELETE, "/api/proteins/P2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["relations_deleted"], 2);

    let (status, _) = send(&app, Method::GET, "/api/proteins/P2/neighborhood", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, "/api/proteins/P2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::DELETE, "/api/proteins/P2", None).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_search_and_suggestions() {
    let app = app();
    seed(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({
            "filters": { "interpro": { "values": ["IPR2", "IPR3"], "mode": "AND" } },
            "page": 1,
            "per_page": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_matches"], 1);
    assert_eq!(body["results"][0]["id"], "P2");
    assert!(body["results"][0].get("sequence").is_none());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({ "filters": { "keyword": "(unclosed" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/api/suggestions?prefix=kin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, Method::GET, "/api/suggestions?prefix=k", None).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_stats() {
    let app = app();
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_proteins"], 3);
    assert_eq!(body["total_edges"], 2);
    assert_eq!(body["isolated_proteins"], 0);
}
