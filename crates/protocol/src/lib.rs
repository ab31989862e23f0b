use serde::{Deserialize, Serialize};

/// Glyph shown for elements the fusion service sends without `emoji` or `icon`.
pub const PLACEHOLDER_GLYPH: &str = "❓";

/// Edge length of a placed tile, in canvas pixels.
pub const TILE_SIZE: f64 = 60.0;

/// An element template: immutable once fetched or produced by a fusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub name: String,
    pub emoji: String,
}

impl Element {
    pub fn new(id: impl Into<String>, name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emoji: emoji.into(),
        }
    }
}

/// Element as the fusion service returns it. Some deployments send `icon`
/// instead of `emoji`, and older ones key elements by `uuid`.
#[derive(Debug, Clone, Deserialize)]
pub struct ElementRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    pub name: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl ElementRecord {
    /// `None` when the record carries neither `id` nor `uuid`.
    pub fn into_element(self) -> Option<Element> {
        let id = self.id.or(self.uuid)?;
        let emoji = [self.emoji, self.icon]
            .into_iter()
            .flatten()
            .find(|glyph| !glyph.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_GLYPH.to_string());
        Some(Element {
            id,
            name: self.name,
            emoji,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, origin: Position) -> Position {
        Position::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn distance_squared(self, other: Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

/// Size of the mounted canvas; the origin is its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Inclusive on every edge, matching a pointer released exactly on the border.
    pub fn contains(&self, p: Position) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Keeps a tile's top-left corner such that the whole tile stays visible.
    pub fn clamp_tile(&self, p: Position) -> Position {
        let max_x = (self.width - TILE_SIZE).max(0.0);
        let max_y = (self.height - TILE_SIZE).max(0.0);
        Position::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub String);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStatus {
    Fused,
    NoCombination,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceView {
    pub instance_id: InstanceId,
    pub element: Element,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub pending_fusion: bool,
}

/// Everything the page needs to redraw the canvas and the side panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub status: LoadState,
    pub mounted: bool,
    pub instructions_visible: bool,
    pub instances: Vec<InstanceView>,
    pub panel: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dragging: Option<InstanceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_target: Option<InstanceId>,
    /// True while a drag session holds the window-level pointer listeners.
    #[serde(default)]
    pub capture: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fusion: Option<FusionStatus>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PointerInput {
    pub x: f64,
    pub y: f64,
}

impl From<PointerInput> for Position {
    fn from(p: PointerInput) -> Self {
        Position::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BeginDrag {
    pub instance_id: InstanceId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PanelDrop {
    pub element_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Swap {
    Replace,
    Append,
}

impl Default for Swap {
    fn default() -> Self {
        Self::Replace
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub target: String,
    #[serde(default)]
    pub swap: Swap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiUpdate {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub patches: Vec<Patch>,
}

impl UiUpdate {
    pub fn new(event: impl Into<String>, patches: Vec<Patch>) -> Self {
        Self {
            event: event.into(),
            payload: None,
            patches,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

pub mod targets {
    pub const PANEL_ELEMENTS: &str = "panel.elements";
    pub const DISCOVERY_ALERT: &str = "discovery.alert";
    pub const CANVAS_INSTRUCTIONS: &str = "canvas.instructions";
}
