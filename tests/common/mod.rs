// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: a local mock of the rides API endpoints and fixture
//! builders for activities, trip details, and minimal PDFs.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Shared state backing the mock rides API.
#[derive(Default)]
pub struct MockState {
    /// `past` nodes served to successive Activities calls, in order. When
    /// exhausted, an empty page with no token is served.
    pub activity_pages: Mutex<Vec<Value>>,
    /// `getTrip` nodes keyed by trip UUID.
    pub trips: Mutex<HashMap<String, Value>>,
    /// Raw receipt bytes keyed by trip UUID.
    pub receipts: Mutex<HashMap<String, Vec<u8>>>,
    /// When set, every request answers with this HTTP status and no body.
    pub force_status: Mutex<Option<u16>>,
    pub activities_calls: AtomicUsize,
    pub trip_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
}

impl MockState {
    pub fn activities_call_count(&self) -> usize {
        self.activities_calls.load(Ordering::SeqCst)
    }

    pub fn trip_call_count(&self) -> usize {
        self.trip_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_call_count(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }
}

/// Start the mock API on an ephemeral port and return its base URL.
pub async fn spawn_mock_api(state: Arc<MockState>) -> String {
    let app = Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/trips/{uuid}/receipt", get(receipt_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    format!("http://{}", addr)
}

async fn graphql_handler(
    State(state): State<Arc<MockState>>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    if let Some(status) = *state.force_status.lock().unwrap() {
        return (
            StatusCode::from_u16(status).unwrap(),
            Json(json!({})),
        );
    }

    let operation = payload["operationName"].as_str().unwrap_or_default();
    match operation {
        "Activities" => {
            state.activities_calls.fetch_add(1, Ordering::SeqCst);
            let mut pages = state.activity_pages.lock().unwrap();
            let page = if pages.is_empty() {
                json!({ "activities": [], "nextPageToken": null })
            } else {
                pages.remove(0)
            };
            (
                StatusCode::OK,
                Json(json!({ "data": { "activities": { "past": page } } })),
            )
        }
        "GetTrip" => {
            state.trip_calls.fetch_add(1, Ordering::SeqCst);
            let uuid = payload["variables"]["tripUUID"]
                .as_str()
                .unwrap_or_default();
            let node = state.trips.lock().unwrap().get(uuid).cloned();
            (
                StatusCode::OK,
                Json(json!({ "data": { "getTrip": node } })),
            )
        }
        _ => (StatusCode::BAD_REQUEST, Json(json!({}))),
    }
}

async fn receipt_handler(
    Path(uuid): Path<String>,
    State(state): State<Arc<MockState>>,
) -> impl IntoResponse {
    if let Some(status) = *state.force_status.lock().unwrap() {
        return (StatusCode::from_u16(status).unwrap(), Vec::new());
    }

    state.receipt_calls.fetch_add(1, Ordering::SeqCst);
    match state.receipts.lock().unwrap().get(&uuid) {
        Some(bytes) => (StatusCode::OK, bytes.clone()),
        None => (StatusCode::NOT_FOUND, Vec::new()),
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// Wire-shaped activity record.
#[allow(dead_code)]
pub fn activity(uuid: &str, subtitle: &str) -> Value {
    json!({
        "uuid": uuid,
        "title": "UberX",
        "subtitle": subtitle,
        "description": "Trip fixture",
        "cardURL": format!("https://riders.example.com/trips/{}", uuid),
        "buttons": [],
        "imageURL": { "light": "https://img/l.png", "dark": "https://img/d.png" },
    })
}

/// One `past` page of the activity feed.
#[allow(dead_code)]
pub fn page(activities: Vec<Value>, next_page_token: Option<&str>) -> Value {
    json!({ "activities": activities, "nextPageToken": next_page_token })
}

/// Wire-shaped `getTrip` node for a trip.
#[allow(dead_code)]
pub fn trip_node(uuid: &str, status: &str, fare: &str, waypoints: &[&str]) -> Value {
    json!({
        "trip": {
            "uuid": uuid,
            "jobUUID": null,
            "status": status,
            "fare": fare,
            "waypoints": waypoints,
            "vehicleDisplayName": "UberX",
            "isSurgeTrip": false,
            "isScheduledRide": false,
        },
        "receipt": { "distanceLabel": "3.1 miles", "duration": 900 },
        "mapURL": null,
        "rating": null,
    })
}

/// A valid single-page PDF whose only content is `text`.
#[allow(dead_code)]
pub fn minimal_pdf(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialize pdf");
    out
}
