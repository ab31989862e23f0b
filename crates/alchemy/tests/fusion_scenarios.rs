//! The two headline scenarios, end to end against a fusion service served
//! over real HTTP.

use alchemy::engine::{Board, FusionService, HttpFusionClient};
use alchemy::protocol::{Bounds, Element, Position};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::time::Duration;

async fn fusion(State(steam): State<bool>) -> Response {
    if steam {
        Json(serde_json::json!({ "id": "steam1", "name": "steam", "icon": "💨" })).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn spawn_service(steam: bool) -> HttpFusionClient {
    let app = Router::new()
        .route(
            "/api/elements/base",
            get(|| async {
                Json(serde_json::json!([
                    { "id": "water", "name": "water", "emoji": "💧" },
                    { "id": "fire", "name": "fire", "emoji": "🔥" }
                ]))
            }),
        )
        .route("/api/fusion", get(fusion))
        .with_state(steam);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    HttpFusionClient::new(format!("http://{addr}/api"), Duration::from_secs(5)).unwrap()
}

async fn board_with_water_near_fire(client: &HttpFusionClient) -> Board {
    let mut board = Board::new();
    board.load_base(client).await.unwrap();
    board.mount(Bounds::new(800.0, 600.0));
    let water = board.place_from_panel("water", Position::new(124.0, 124.0)).unwrap();
    board.place_from_panel("fire", Position::new(324.0, 324.0)).unwrap();

    assert!(board.begin_drag(&water, Position::new(100.0, 100.0)));
    board.update_drag(Position::new(320.0, 310.0));
    board.on_frame(0);
    assert!(board.drag().hover_target().is_some());
    board
}

fn names(board: &Board) -> Vec<String> {
    board.registry().panel().iter().map(|el| el.name.clone()).collect()
}

#[tokio::test]
async fn steam_is_discovered() {
    let client = spawn_service(true).await;
    let mut board = board_with_water_near_fire(&client).await;

    let steam = board.release(Position::new(320.0, 310.0), &client).await;
    assert!(steam.is_some());
    assert_eq!(board.instances().len(), 1);
    assert_eq!(board.instances()[0].element, Element::new("steam1", "steam", "💨"));
    assert_eq!(names(&board), ["water", "fire", "steam"]);
}

#[tokio::test]
async fn not_found_changes_nothing() {
    let client = spawn_service(false).await;
    let mut board = board_with_water_near_fire(&client).await;

    assert!(board.release(Position::new(320.0, 310.0), &client).await.is_none());
    let positions: Vec<_> = board.instances().iter().map(|i| i.position).collect();
    assert_eq!(positions, [Position::new(320.0, 310.0), Position::new(300.0, 300.0)]);
    assert_eq!(names(&board), ["water", "fire"]);

    let water = &board.registry().panel()[0];
    let fire = &board.registry().panel()[1];
    assert!(client.attempt_fusion(water, fire).await.is_none());
}
