// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer interaction over the caption overlay.
//!
//! The controller turns raw pointer events into caption commands. It owns
//! the drag state but never touches captions; the application applies the
//! commands it emits to the document.

use crate::models::caption::CaptionId;
use crate::util::geometry::{Point, ScreenBox};

/// Which caption, if any, is following the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(CaptionId),
}

/// Pointer input relevant to the overlay, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Primary button pressed inside the container. `hit` is the topmost
    /// caption under the pointer.
    Pressed { hit: Option<CaptionId> },
    /// Pointer moved.
    Moved { pointer: Point },
    /// Primary button released anywhere, inside the container or not.
    Released,
}

/// Mutation requested from the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptionCommand {
    Select(CaptionId),
    ClearSelection,
    /// New anchor, already clamped to the container.
    Move { id: CaptionId, x: f32, y: f32 },
}

/// Drag-and-select state machine for captions.
#[derive(Debug, Default)]
pub struct InteractionController {
    drag: DragState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self, id: CaptionId) -> bool {
        self.drag == DragState::Dragging(id)
    }

    /// Feed one pointer event. `container` is the overlay container's
    /// on-screen box, or `None` if it has not been laid out.
    pub fn handle(&mut self, event: PointerEvent, container: Option<ScreenBox>) -> Option<CaptionCommand> {
        match event {
            PointerEvent::Pressed { hit: Some(id) } => {
                log::debug!("Started dragging {}", id);
                self.drag = DragState::Dragging(id);
                Some(CaptionCommand::Select(id))
            }
            PointerEvent::Pressed { hit: None } => Some(CaptionCommand::ClearSelection),
            PointerEvent::Moved { pointer } => {
                let DragState::Dragging(id) = self.drag else {
                    return None;
                };
                let container = container?;
                let (x, y) = clamp_to_container(pointer, container);
                Some(CaptionCommand::Move { id, x, y })
            }
            PointerEvent::Released => {
                if let DragState::Dragging(id) = self.drag {
                    log::debug!("Stopped dragging {}", id);
                }
                self.drag = DragState::Idle;
                None
            }
        }
    }

    /// Drop any drag on a caption that no longer exists.
    pub fn forget(&mut self, id: CaptionId) {
        if self.is_dragging(id) {
            self.drag = DragState::Idle;
        }
    }
}

/// Container-relative position of the pointer, clamped to the container.
fn clamp_to_container(pointer: Point, container: ScreenBox) -> (f32, f32) {
    let x = (pointer.x - container.left).clamp(0.0, container.width.max(0.0));
    let y = (pointer.y - container.top).clamp(0.0, container.height.max(0.0));
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: ScreenBox = ScreenBox {
        left: 100.0,
        top: 40.0,
        width: 800.0,
        height: 600.0,
    };

    fn id(raw: u64) -> CaptionId {
        CaptionId::new(raw)
    }

    fn moved(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Moved { pointer: Point::new(x, y) }
    }

    #[test]
    fn test_press_on_caption_selects_and_drags() {
        let mut ctl = InteractionController::new();
        let cmd = ctl.handle(PointerEvent::Pressed { hit: Some(id(1)) }, Some(CONTAINER));
        assert_eq!(cmd, Some(CaptionCommand::Select(id(1))));
        assert!(ctl.is_dragging(id(1)));
    }

    #[test]
    fn test_press_on_empty_area_clears_selection() {
        let mut ctl = InteractionController::new();
        let cmd = ctl.handle(PointerEvent::Pressed { hit: None }, Some(CONTAINER));
        assert_eq!(cmd, Some(CaptionCommand::ClearSelection));
        assert_eq!(ctl.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_move_is_container_relative() {
        let mut ctl = InteractionController::new();
        ctl.handle(PointerEvent::Pressed { hit: Some(id(3)) }, Some(CONTAINER));
        let cmd = ctl.handle(moved(500.0, 340.0), Some(CONTAINER));
        assert_eq!(cmd, Some(CaptionCommand::Move { id: id(3), x: 400.0, y: 300.0 }));
    }

    #[test]
    fn test_drag_is_clamped_at_every_step() {
        let mut ctl = InteractionController::new();
        ctl.handle(PointerEvent::Pressed { hit: Some(id(1)) }, Some(CONTAINER));

        let path = [(-500.0, -500.0), (50.0, 700.0), (950.0, 20.0), (2000.0, 2000.0), (400.0, 300.0)];
        for (px, py) in path {
            match ctl.handle(moved(px, py), Some(CONTAINER)) {
                Some(CaptionCommand::Move { x, y, .. }) => {
                    assert!((0.0..=CONTAINER.width).contains(&x), "x={x}");
                    assert!((0.0..=CONTAINER.height).contains(&y), "y={y}");
                }
                other => panic!("expected a move, got {other:?}"),
            }
        }

        let corner = ctl.handle(moved(2000.0, -3.0), Some(CONTAINER));
        assert_eq!(corner, Some(CaptionCommand::Move { id: id(1), x: 800.0, y: 0.0 }));
    }

    #[test]
    fn test_move_without_drag_does_nothing() {
        let mut ctl = InteractionController::new();
        assert_eq!(ctl.handle(moved(10.0, 10.0), Some(CONTAINER)), None);
    }

    #[test]
    fn test_unmeasured_container_skips_moves() {
        let mut ctl = InteractionController::new();
        ctl.handle(PointerEvent::Pressed { hit: Some(id(1)) }, None);
        assert_eq!(ctl.handle(moved(10.0, 10.0), None), None);
        assert!(ctl.is_dragging(id(1)));
    }

    #[test]
    fn test_release_ends_drag() {
        let mut ctl = InteractionController::new();
        ctl.handle(PointerEvent::Pressed { hit: Some(id(1)) }, Some(CONTAINER));
        assert_eq!(ctl.handle(PointerEvent::Released, None), None);
        assert_eq!(ctl.drag_state(), DragState::Idle);
        assert_eq!(ctl.handle(moved(200.0, 200.0), Some(CONTAINER)), None);
    }

    #[test]
    fn test_only_one_caption_drags_at_a_time() {
        let mut ctl = InteractionController::new();
        let events = [
            PointerEvent::Pressed { hit: Some(id(1)) },
            moved(120.0, 60.0),
            PointerEvent::Pressed { hit: Some(id(2)) },
            moved(130.0, 70.0),
            PointerEvent::Released,
            PointerEvent::Pressed { hit: None },
            PointerEvent::Released,
        ];
        for event in events {
            ctl.handle(event, Some(CONTAINER));
            let dragging = [id(1), id(2)].iter().filter(|c| ctl.is_dragging(**c)).count();
            assert!(dragging <= 1);
        }
    }

    #[test]
    fn test_forget_cancels_drag_of_deleted_caption() {
        let mut ctl = InteractionController::new();
        ctl.handle(PointerEvent::Pressed { hit: Some(id(5)) }, Some(CONTAINER));
        ctl.forget(id(4));
        assert!(ctl.is_dragging(id(5)));
        ctl.forget(id(5));
        assert_eq!(ctl.drag_state(), DragState::Idle);
    }
}
