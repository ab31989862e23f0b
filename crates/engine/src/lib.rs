pub mod board;
pub mod drag;
pub mod fusion;
pub mod registry;

pub use board::{Board, FusionTicket, DISCOVERY_NOTICE_MS, PANEL_DROP_OFFSET};
pub use drag::{DragController, FrameOutcome, FrameRequest, PlacedInstance};
pub use fusion::{FusionError, FusionService, HttpFusionClient};
pub use registry::ElementRegistry;

use alchemy_protocol::InstanceId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static ID_COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(i64::MAX)
}

/// Process-wide unique id for a placed instance.
pub fn new_instance_id() -> InstanceId {
    let c = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    InstanceId(format!("inst-{}-{c}", now_ms()))
}
