use alchemy_engine::{now_ms, Board, FusionService, FusionTicket, HttpFusionClient};
use alchemy_protocol::{
    targets, BeginDrag, BoardView, Bounds, Element, PanelDrop, Patch, PointerInput, Position,
    Swap, UiUpdate,
};
use anyhow::Context;
use axum::{
    extract::State,
    middleware,
    response::{Html, IntoResponse},
    routing::get,
    routing::post,
    Json, Router,
};
use std::net::IpAddr;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

pub mod config;
mod page;

pub use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<Mutex<Board>>,
    pub fusion: Arc<dyn FusionService>,
}

impl AppState {
    pub fn new(board: Board, fusion: Arc<dyn FusionService>) -> Self {
        Self {
            board: Arc::new(Mutex::new(board)),
            fusion,
        }
    }
}

type Shared = State<Arc<AppState>>;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/board", get(board_snapshot))
        .route("/api/canvas/mount", post(canvas_mount))
        .route("/api/canvas/unmount", post(canvas_unmount))
        .route("/api/drag/begin", post(drag_begin))
        .route("/api/drag/move", post(drag_move))
        .route("/api/drag/end", post(drag_end))
        .route("/api/panel/drop", post(panel_drop))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            axum::http::HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .route("/", get(game_page))
        .route("/health", get(health))
        .merge(api)
        .with_state(Arc::new(state))
        // Local only: loopback + Tailscale peers.
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(ip_allowlist))
                .layer(local_only_cors()),
        )
}

async fn health() -> &'static str {
    "ok"
}

async fn game_page() -> Html<&'static str> {
    Html(page::GAME_HTML)
}

/// Which HTML fragments a response should refresh besides the board payload.
#[derive(Debug, Clone)]
enum Refresh {
    None,
    Full,
    Discovered(Element),
}

fn render(board: &Board, event: &str, refresh: Refresh) -> UiUpdate {
    let view = board.view(now_ms());
    let mut patches = Vec::new();
    match refresh {
        Refresh::None => {}
        Refresh::Full => {
            patches.push(Patch {
                target: targets::PANEL_ELEMENTS.to_string(),
                swap: Swap::Replace,
                html: Some(view.panel.iter().map(panel_item_html).collect()),
                payload: None,
                trigger: None,
            });
            patches.push(instructions_patch(&view));
        }
        Refresh::Discovered(el) => {
            patches.push(Patch {
                target: targets::PANEL_ELEMENTS.to_string(),
                swap: Swap::Append,
                html: Some(panel_item_html(&el)),
                payload: None,
                trigger: None,
            });
            patches.push(Patch {
                target: targets::DISCOVERY_ALERT.to_string(),
                swap: Swap::Replace,
                html: Some(format!(
                    "{} {}",
                    html_escape::encode_text(&el.emoji),
                    html_escape::encode_text(&el.name)
                )),
                payload: None,
                trigger: Some("show".to_string()),
            });
        }
    }

    let payload = serde_json::to_value(&view).unwrap_or_default();
    UiUpdate::new(event, patches).with_payload(payload)
}

fn instructions_patch(view: &BoardView) -> Patch {
    Patch {
        target: targets::CANVAS_INSTRUCTIONS.to_string(),
        swap: Swap::Replace,
        html: None,
        payload: None,
        trigger: Some(if view.instructions_visible { "show" } else { "hide" }.to_string()),
    }
}

fn panel_item_html(el: &Element) -> String {
    format!(
        "<div class=\"item\" data-element=\"{}\"><span class=\"glyph\">{}</span><span class=\"name\">{}</span></div>",
        html_escape::encode_double_quoted_attribute(&el.id),
        html_escape::encode_text(&el.emoji),
        html_escape::encode_text(&el.name)
    )
}

async fn board_snapshot(State(state): Shared) -> Json<UiUpdate> {
    let board = state.board.lock().await;
    Json(render(&board, "board", Refresh::Full))
}

async fn canvas_mount(State(state): Shared, Json(bounds): Json<Bounds>) -> Json<UiUpdate> {
    let mut board = state.board.lock().await;
    board.mount(bounds);
    tracing::debug!(width = bounds.width, height = bounds.height, "canvas mounted");
    Json(render(&board, "canvas.mount", Refresh::Full))
}

async fn canvas_unmount(State(state): Shared) -> Json<UiUpdate> {
    let mut board = state.board.lock().await;
    board.unmount();
    Json(render(&board, "canvas.unmount", Refresh::None))
}

async fn drag_begin(State(state): Shared, Json(input): Json<BeginDrag>) -> Json<UiUpdate> {
    let mut board = state.board.lock().await;
    board.begin_drag(&input.instance_id, Position::new(input.x, input.y));
    Json(render(&board, "drag.begin", Refresh::None))
}

async fn drag_move(State(state): Shared, Json(input): Json<PointerInput>) -> Json<UiUpdate> {
    let mut board = state.board.lock().await;
    // The page already coalesces moves to one per animation frame.
    board.update_drag(input.into());
    board.on_frame(now_ms());
    Json(render(&board, "drag.move", Refresh::None))
}

async fn drag_end(State(state): Shared, Json(input): Json<PointerInput>) -> Json<UiUpdate> {
    let ticket = state.board.lock().await.end_drag(input.into());
    let Some(ticket) = ticket else {
        let board = state.board.lock().await;
        return Json(render(&board, "drag.end", Refresh::None));
    };

    // Resolution runs on its own task so the pending flags are cleared even
    // when the client goes away and this handler is dropped.
    let resolving = tokio::spawn(resolve_fusion(Arc::clone(&state), ticket));
    match resolving.await {
        Ok(update) => Json(update),
        Err(e) => {
            tracing::error!(error = %e, "fusion task failed");
            let board = state.board.lock().await;
            Json(render(&board, "fusion", Refresh::None))
        }
    }
}

/// Queries the fusion service without holding the board lock, then applies
/// the outcome.
async fn resolve_fusion(state: Arc<AppState>, ticket: FusionTicket) -> UiUpdate {
    let outcome = state.fusion.fuse(&ticket.first, &ticket.second).await;

    let mut board = state.board.lock().await;
    let known_before = board.registry().len();
    board.resolve(ticket, outcome);
    let refresh = if board.registry().len() > known_before {
        board
            .registry()
            .panel()
            .last()
            .cloned()
            .map_or(Refresh::None, Refresh::Discovered)
    } else {
        Refresh::None
    };
    render(&board, "fusion", refresh)
}

async fn panel_drop(State(state): Shared, Json(input): Json<PanelDrop>) -> Json<UiUpdate> {
    let mut board = state.board.lock().await;
    let placed = board.place_from_panel(&input.element_id, Position::new(input.x, input.y));
    let refresh = if placed.is_some() {
        Refresh::Full
    } else {
        Refresh::None
    };
    Json(render(&board, "panel.drop", refresh))
}

/// Fetches the base elements in the background; the lock is only taken to
/// apply the result.
pub fn spawn_base_load(state: &AppState) -> tokio::task::JoinHandle<()> {
    let board = Arc::clone(&state.board);
    let fusion = Arc::clone(&state.fusion);
    tokio::spawn(async move {
        let fetched = fusion.fetch_base_elements().await;
        match board.lock().await.apply_base(fetched) {
            Ok(count) => tracing::info!(count, "base elements ready"),
            Err(e) => tracing::error!(error = %format!("{e:#}"), "base elements unavailable"),
        }
    })
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;
    let fusion = HttpFusionClient::new(&config.fusion_url, config.fusion_timeout())
        .context("build fusion client")?;
    tracing::info!(fusion_url = %fusion.base_url(), "using fusion service");

    serve_listener(listener, Arc::new(fusion), async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down");
    })
    .await?;
    Ok(())
}

pub async fn serve_listener(
    listener: tokio::net::TcpListener,
    fusion: Arc<dyn FusionService>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<SocketAddr> {
    let state = AppState::new(Board::new(), fusion);
    spawn_base_load(&state);
    let app = build_router(state);
    let addr = listener.local_addr()?;
    tracing::info!("listening on http://{addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(addr)
}

async fn ip_allowlist(
    axum::extract::ConnectInfo(peer): axum::extract::ConnectInfo<SocketAddr>,
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let ip = peer.ip();
    if is_allowed_peer_ip(ip) {
        return next.run(req).await;
    }
    tracing::warn!(peer = %ip, "rejected non-local peer");
    (axum::http::StatusCode::FORBIDDEN, "forbidden").into_response()
}

fn is_allowed_peer_ip(ip: IpAddr) -> bool {
    if ip.is_loopback() {
        return true;
    }

    // Tailscale CGNAT range (100.64.0.0/10).
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            o[0] == 100 && (64..=127).contains(&o[1])
        }
        IpAddr::V6(_v6) => false,
    }
}

fn local_only_cors() -> CorsLayer {
    use axum::http::header;
    use axum::http::HeaderValue;
    use axum::http::Method;

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _req| {
            is_allowed_local_origin(origin)
        }))
}

fn is_allowed_local_origin(origin: &axum::http::HeaderValue) -> bool {
    let Ok(s) = origin.to_str() else {
        return false;
    };
    is_http_origin_for_host(s, "localhost") || is_http_origin_for_host(s, "127.0.0.1")
}

fn is_http_origin_for_host(origin: &str, host: &str) -> bool {
    for scheme in ["http://", "https://"] {
        if let Some(rest) = origin.strip_prefix(scheme) {
            if let Some(after) = rest.strip_prefix(host) {
                // scheme://host[:port] only
                return after.is_empty() || after.starts_with(':');
            }
        }
    }
    false
}
