//! The canvas and side panel of one game.
//!
//! `Board` owns the placed instances, the discovered elements and the drag
//! controller. A fusion is split in two halves so that a caller sharing the
//! board behind a lock can release it while the request is in flight:
//! [`Board::end_drag`] hands out a [`FusionTicket`] and marks both instances
//! as pending, [`Board::resolve`] applies the service's answer.

use crate::drag::{DragController, FrameOutcome, FrameRequest, PlacedInstance};
use crate::fusion::{report_failure, FusionError, FusionService};
use crate::registry::ElementRegistry;
use crate::{new_instance_id, now_ms};
use alchemy_protocol::{
    BoardView, Bounds, Element, FusionStatus, InstanceId, InstanceView, LoadState, Position,
};
use anyhow::Context;

/// How long a fresh discovery stays announced.
pub const DISCOVERY_NOTICE_MS: i64 = 2_000;

/// Distance from the pointer to the top-left of a tile dropped from the panel.
pub const PANEL_DROP_OFFSET: f64 = 24.0;

/// An in-flight fusion between the dragged instance and its hover target.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionTicket {
    pub dragged: InstanceId,
    pub target: InstanceId,
    pub first: Element,
    pub second: Element,
}

#[derive(Debug)]
pub struct Board {
    registry: ElementRegistry,
    instances: Vec<PlacedInstance>,
    drag: DragController,
    surface: Option<Bounds>,
    status: LoadState,
    ever_placed: bool,
    discovery: Option<(Element, i64)>,
    last_fusion: Option<FusionStatus>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            registry: ElementRegistry::new(),
            instances: Vec::new(),
            drag: DragController::new(),
            surface: None,
            status: LoadState::Loading,
            ever_placed: false,
            discovery: None,
            last_fusion: None,
        }
    }

    pub fn with_base(base: Vec<Element>) -> Self {
        let mut board = Self::new();
        board.registry = ElementRegistry::with_base(base);
        board.status = LoadState::Ready;
        board
    }

    pub fn status(&self) -> LoadState {
        self.status
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn instances(&self) -> &[PlacedInstance] {
        &self.instances
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&PlacedInstance> {
        self.instances.iter().find(|i| &i.id == id)
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn last_fusion(&self) -> Option<FusionStatus> {
        self.last_fusion
    }

    /// Fetches the base elements once. A failure leaves the board empty in
    /// the `Failed` state; nothing retries.
    pub async fn load_base(&mut self, service: &dyn FusionService) -> anyhow::Result<usize> {
        let fetched = service.fetch_base_elements().await;
        self.apply_base(fetched)
    }

    pub fn apply_base(&mut self, fetched: Result<Vec<Element>, FusionError>) -> anyhow::Result<usize> {
        match fetched {
            Ok(base) => {
                let mut count = 0;
                for el in base {
                    if self.registry.discover(el) {
                        count += 1;
                    }
                }
                self.status = LoadState::Ready;
                Ok(count)
            }
            Err(e) => {
                self.status = LoadState::Failed;
                Err(e).context("load base elements")
            }
        }
    }

    pub fn mount(&mut self, surface: Bounds) {
        self.surface = Some(surface);
        for inst in &mut self.instances {
            inst.position = surface.clamp_tile(inst.position);
        }
    }

    pub fn unmount(&mut self) {
        self.drag.cancel();
        self.surface = None;
    }

    /// Drops a discovered element onto the canvas, centred under the pointer.
    /// Drops outside the canvas are discarded.
    pub fn place_from_panel(&mut self, element_id: &str, pointer: Position) -> Option<InstanceId> {
        let surface = self.surface?;
        if !surface.contains(pointer) {
            tracing::debug!(element = %element_id, x = pointer.x, y = pointer.y, "drop outside canvas");
            return None;
        }
        let Some(element) = self.registry.get(element_id).cloned() else {
            tracing::debug!(element = %element_id, "drop of undiscovered element");
            return None;
        };
        let at = Position::new(pointer.x - PANEL_DROP_OFFSET, pointer.y - PANEL_DROP_OFFSET);
        Some(self.place(element, surface.clamp_tile(at)))
    }

    fn place(&mut self, element: Element, position: Position) -> InstanceId {
        let id = new_instance_id();
        tracing::debug!(instance = %id, element = %element.id, "placed");
        self.instances.push(PlacedInstance {
            id: id.clone(),
            element,
            position,
            pending_fusion: false,
        });
        self.ever_placed = true;
        id
    }

    pub fn begin_drag(&mut self, id: &InstanceId, pointer: Position) -> bool {
        self.drag.begin(&self.instances, self.surface, id, pointer)
    }

    pub fn update_drag(&mut self, pointer: Position) -> FrameRequest {
        self.drag.update(pointer)
    }

    pub fn on_frame(&mut self, now_ms: i64) -> FrameOutcome {
        let Some(surface) = self.surface else {
            return FrameOutcome::default();
        };
        self.drag.on_frame(&mut self.instances, surface, now_ms)
    }

    /// Ends the current drag. When the dragged instance was released over a
    /// hover target both are marked pending and a ticket is returned.
    pub fn end_drag(&mut self, pointer: Position) -> Option<FusionTicket> {
        let (dragged, target) = self.drag.end(&mut self.instances, self.surface, pointer)?;

        let first = self.instance(&dragged)?.element.clone();
        let second = self.instance(&target)?.element.clone();
        for inst in &mut self.instances {
            if inst.id == dragged || inst.id == target {
                inst.pending_fusion = true;
            }
        }
        tracing::debug!(dragged = %dragged, target = %target, "fusion requested");
        Some(FusionTicket {
            dragged,
            target,
            first,
            second,
        })
    }

    pub fn resolve(
        &mut self,
        ticket: FusionTicket,
        outcome: Result<Element, FusionError>,
    ) -> Option<InstanceId> {
        let result = match outcome {
            Ok(el) => {
                self.last_fusion = Some(FusionStatus::Fused);
                Some(el)
            }
            Err(e) => {
                report_failure(&ticket.first, &ticket.second, &e);
                self.last_fusion = Some(e.status());
                None
            }
        };
        self.on_fusion_resolved(&ticket.dragged, &ticket.target, result)
    }

    /// On success replaces `a` and `b` with one instance of `result` at
    /// `b`'s position. On failure both stay where the drag left them.
    pub fn on_fusion_resolved(
        &mut self,
        a: &InstanceId,
        b: &InstanceId,
        result: Option<Element>,
    ) -> Option<InstanceId> {
        let Some(element) = result else {
            for inst in &mut self.instances {
                if &inst.id == a || &inst.id == b {
                    inst.pending_fusion = false;
                }
            }
            return None;
        };

        let at = self
            .instance(b)
            .or_else(|| self.instance(a))
            .map(|i| i.position);
        self.instances.retain(|i| &i.id != a && &i.id != b);

        if self.registry.discover(element.clone()) {
            tracing::info!(element = %element.id, name = %element.name, "new element discovered");
            self.discovery = Some((element.clone(), now_ms()));
        }
        at.map(|pos| self.place(element, pos))
    }

    /// `end_drag`, one fusion request, and `resolve` in a single call, for
    /// callers that own the board outright.
    pub async fn release(
        &mut self,
        pointer: Position,
        service: &dyn FusionService,
    ) -> Option<InstanceId> {
        let ticket = self.end_drag(pointer)?;
        let outcome = service.fuse(&ticket.first, &ticket.second).await;
        self.resolve(ticket, outcome)
    }

    pub fn view(&self, now_ms: i64) -> BoardView {
        let discovery = self
            .discovery
            .as_ref()
            .filter(|(_, at)| now_ms - at < DISCOVERY_NOTICE_MS)
            .map(|(el, _)| el.clone());
        BoardView {
            status: self.status,
            mounted: self.surface.is_some(),
            instructions_visible: !self.ever_placed,
            instances: self
                .instances
                .iter()
                .map(|i| InstanceView {
                    instance_id: i.id.clone(),
                    element: i.element.clone(),
                    x: i.position.x,
                    y: i.position.y,
                    pending_fusion: i.pending_fusion,
                })
                .collect(),
            panel: self.registry.panel().to_vec(),
            dragging: self.drag.dragging().cloned(),
            hover_target: self.drag.hover_target().cloned(),
            capture: self.drag.listeners_attached(),
            discovery,
            last_fusion: self.last_fusion,
        }
    }
}
