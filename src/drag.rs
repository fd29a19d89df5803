// ============================================================================
// DRAG CONTROLLER: pointer events -> single-guide edits
// ============================================================================
//
// Two states: `Idle` and `Dragging`. `transition` is a pure function of
// (state, event, geometry, transform) returning the next state and at most
// one guide edit. `DragController` is the thin stateful wrapper the editor
// canvas drives.

use crate::geometry::{GeometryModel, Guide, GuideKind};
use crate::transform::DisplayTransform;

/// Pick radius around a handle, along the guide's axis (display px).
pub const HANDLE_THRESHOLD: f32 = 10.0;
/// How far from the image edge a stretch handle still picks (display px).
pub const STRETCH_EDGE_REACH: f32 = 30.0;
/// Depth of the band along the top/left edge that grabs the start handle.
pub const STRETCH_BAND_DEPTH: f32 = 12.0;
/// Distance of the padding lanes from the bottom/right image edge.
pub const PAD_LANE_INSET: f32 = 8.0;
/// Pick radius around a padding lane, across the lane (display px).
pub const PAD_LANE_REACH: f32 = 12.0;

/// One endpoint of one guide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    StretchXStart,
    StretchXEnd,
    StretchYStart,
    StretchYEnd,
    PadXStart,
    PadXEnd,
    PadYStart,
    PadYEnd,
}

impl Handle {
    pub fn guide(&self) -> GuideKind {
        match self {
            Handle::StretchXStart | Handle::StretchXEnd => GuideKind::StretchX,
            Handle::StretchYStart | Handle::StretchYEnd => GuideKind::StretchY,
            Handle::PadXStart | Handle::PadXEnd => GuideKind::PadX,
            Handle::PadYStart | Handle::PadYEnd => GuideKind::PadY,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(
            self,
            Handle::StretchXStart | Handle::StretchYStart | Handle::PadXStart | Handle::PadYStart
        )
    }

    fn pair(kind: GuideKind) -> (Handle, Handle) {
        match kind {
            GuideKind::StretchX => (Handle::StretchXStart, Handle::StretchXEnd),
            GuideKind::StretchY => (Handle::StretchYStart, Handle::StretchYEnd),
            GuideKind::PadX => (Handle::PadXStart, Handle::PadXEnd),
            GuideKind::PadY => (Handle::PadYStart, Handle::PadYEnd),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { handle: Handle },
}

/// Pointer input in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up,
    /// Pointer left the tracked surface.
    Leave,
}

/// The single mutation a transition may produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuideEdit {
    pub handle: Handle,
    /// Requested image coordinate; clamped when applied.
    pub value: i64,
}

impl GuideEdit {
    pub fn apply(&self, geometry: &mut GeometryModel) {
        let kind = self.handle.guide();
        if self.handle.is_start() {
            geometry.set_start(kind, self.value);
        } else {
            geometry.set_end(kind, self.value);
        }
    }
}

/// Find the handle under a viewport point.
///
/// Priority: stretch X, stretch Y, padding X, padding Y.
pub fn hit_test(x: f32, y: f32, geometry: &GeometryModel, transform: &DisplayTransform) -> Option<Handle> {
    let (ox, oy, disp_w, disp_h) = transform.display_rect();

    // Stretch X: handles on the top edge, plus the top band itself.
    let g = geometry.h_stretch();
    let (sx, ex) = span_x(g, transform);
    if (y - oy).abs() <= STRETCH_EDGE_REACH {
        if (x - sx).abs() <= HANDLE_THRESHOLD {
            return Some(Handle::StretchXStart);
        }
        if (x - ex).abs() <= HANDLE_THRESHOLD {
            return Some(Handle::StretchXEnd);
        }
    }
    if y <= oy + STRETCH_BAND_DEPTH && x >= sx && x <= ex {
        return Some(Handle::StretchXStart);
    }

    // Stretch Y: handles on the left edge, plus the left band.
    let g = geometry.v_stretch();
    let (sy, ey) = span_y(g, transform);
    if (x - ox).abs() <= STRETCH_EDGE_REACH {
        if (y - sy).abs() <= HANDLE_THRESHOLD {
            return Some(Handle::StretchYStart);
        }
        if (y - ey).abs() <= HANDLE_THRESHOLD {
            return Some(Handle::StretchYEnd);
        }
    }
    if x <= ox + STRETCH_BAND_DEPTH && y >= sy && y <= ey {
        return Some(Handle::StretchYStart);
    }

    // Padding X: lane just inside the bottom edge.
    let lane_y = oy + disp_h - PAD_LANE_INSET;
    if (y - lane_y).abs() <= PAD_LANE_REACH {
        let (sx, ex) = span_x(geometry.h_pad(), transform);
        if let Some(hit) = pick_pair(GuideKind::PadX, x, sx, ex) {
            return Some(hit);
        }
    }

    // Padding Y: lane just inside the right edge.
    let lane_x = ox + disp_w - PAD_LANE_INSET;
    if (x - lane_x).abs() <= PAD_LANE_REACH {
        let (sy, ey) = span_y(geometry.v_pad(), transform);
        if let Some(hit) = pick_pair(GuideKind::PadY, y, sy, ey) {
            return Some(hit);
        }
    }

    None
}

// Handle positions snap to whole display pixels, as the guides are drawn.
fn span_x(g: Guide, t: &DisplayTransform) -> (f32, f32) {
    let at = |v: u32| t.offset_x + (v as f32 * t.zoom).round();
    (at(g.start), at(g.end))
}

fn span_y(g: Guide, t: &DisplayTransform) -> (f32, f32) {
    let at = |v: u32| t.offset_y + (v as f32 * t.zoom).round();
    (at(g.start), at(g.end))
}

fn pick_pair(kind: GuideKind, p: f32, start: f32, end: f32) -> Option<Handle> {
    let (h_start, h_end) = Handle::pair(kind);
    if (p - start).abs() <= HANDLE_THRESHOLD {
        Some(h_start)
    } else if (p - end).abs() <= HANDLE_THRESHOLD {
        Some(h_end)
    } else {
        None
    }
}

/// Pure state transition.
pub fn transition(
    state: DragState,
    event: PointerEvent,
    geometry: &GeometryModel,
    transform: &DisplayTransform,
) -> (DragState, Option<GuideEdit>) {
    match (state, event) {
        (_, PointerEvent::Up) | (_, PointerEvent::Leave) => (DragState::Idle, None),
        // A press while already dragging means the release was lost; start over.
        (_, PointerEvent::Down { x, y }) => match hit_test(x, y, geometry, transform) {
            Some(handle) => (DragState::Dragging { handle }, None),
            None => (DragState::Idle, None),
        },
        (DragState::Idle, PointerEvent::Move { .. }) => (DragState::Idle, None),
        // The dragged endpoint follows the pointer's image coordinate.
        (DragState::Dragging { handle }, PointerEvent::Move { x, y }) => {
            let value = if handle.guide().is_horizontal() {
                transform.display_to_image_x(x)
            } else {
                transform.display_to_image_y(y)
            };
            (state, Some(GuideEdit { handle, value: value as i64 }))
        }
    }
}

/// Holds the drag state between pointer events.
#[derive(Clone, Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn active_handle(&self) -> Option<Handle> {
        match self.state {
            DragState::Dragging { handle } => Some(handle),
            DragState::Idle => None,
        }
    }

    /// Back to `Idle` without touching any geometry.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }

    /// Feed one event. Returns `true` when the geometry changed.
    pub fn handle_event(
        &mut self,
        event: PointerEvent,
        geometry: &mut GeometryModel,
        transform: &DisplayTransform,
    ) -> bool {
        let (next, edit) = transition(self.state, event, geometry, transform);
        self.state = next;
        match edit {
            Some(edit) => {
                let before = geometry.guide(edit.handle.guide());
                edit.apply(geometry);
                before != geometry.guide(edit.handle.guide())
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: f32 = 620.0;

    // 100×100 image at zoom 1 sits at (260, 260).
    fn setup() -> (GeometryModel, DisplayTransform) {
        let g = GeometryModel::with_guides(100, 100, (40, 60), (40, 60), (10, 90), (10, 90));
        let t = DisplayTransform::new(100, 100, 1.0, VIEWPORT);
        (g, t)
    }

    #[test]
    fn hits_follow_priority_order() {
        let (g, t) = setup();
        assert_eq!(hit_test(300.0, 262.0, &g, &t), Some(Handle::StretchXStart));
        assert_eq!(hit_test(320.0, 250.0, &g, &t), Some(Handle::StretchXEnd));
        assert_eq!(hit_test(310.0, 265.0, &g, &t), Some(Handle::StretchXStart));
        assert_eq!(hit_test(262.0, 301.0, &g, &t), Some(Handle::StretchYStart));
        assert_eq!(hit_test(255.0, 318.0, &g, &t), Some(Handle::StretchYEnd));
        assert_eq!(hit_test(271.0, 352.0, &g, &t), Some(Handle::PadXStart));
        assert_eq!(hit_test(349.0, 352.0, &g, &t), Some(Handle::PadXEnd));
        assert_eq!(hit_test(352.0, 270.0, &g, &t), Some(Handle::PadYStart));
        assert_eq!(hit_test(362.0, 350.0, &g, &t), Some(Handle::PadYEnd));
    }

    #[test]
    fn miss_leaves_idle() {
        let (g, t) = setup();
        assert_eq!(hit_test(310.0, 310.0, &g, &t), None);
        let (state, edit) = transition(
            DragState::Idle,
            PointerEvent::Down { x: 310.0, y: 310.0 },
            &g,
            &t,
        );
        assert_eq!(state, DragState::Idle);
        assert_eq!(edit, None);
    }

    #[test]
    fn band_shortcut_grabs_start() {
        let (mut g, t) = setup();
        g.set_stretch_x(20, 80);
        // 30 px from both handles, inside the top band
        assert_eq!(hit_test(310.0, 264.0, &g, &t), Some(Handle::StretchXStart));
    }

    #[test]
    fn off_centre_grab_still_clamps_against_start() {
        let (mut g, t) = setup();
        let mut drag = DragController::new();
        // 8 px left of the end handle at 320
        drag.handle_event(PointerEvent::Down { x: 312.0, y: 258.0 }, &mut g, &t);
        assert_eq!(drag.active_handle(), Some(Handle::StretchXEnd));
        // image x = 37, left of start = 40
        drag.handle_event(PointerEvent::Move { x: 297.0, y: 258.0 }, &mut g, &t);
        assert_eq!(g.h_stretch(), Guide { start: 40, end: 41 });
    }

    #[test]
    fn off_centre_grab_moves_to_the_pointer() {
        let (mut g, t) = setup();
        let mut drag = DragController::new();
        drag.handle_event(PointerEvent::Down { x: 327.0, y: 258.0 }, &mut g, &t);
        assert_eq!(drag.active_handle(), Some(Handle::StretchXEnd));
        drag.handle_event(PointerEvent::Move { x: 335.0, y: 258.0 }, &mut g, &t);
        assert_eq!(g.h_stretch(), Guide { start: 40, end: 75 });
    }

    #[test]
    fn handles_sit_on_rounded_display_pixels() {
        // 100 px at zoom 1.25: start 30 lands at 37.5, drawn at 38
        let g = GeometryModel::with_guides(100, 100, (30, 60), (40, 60), (10, 90), (10, 90));
        let t = DisplayTransform::new(100, 100, 1.25, VIEWPORT);
        let (sx, _) = span_x(g.h_stretch(), &t);
        assert_eq!(sx, t.offset_x + 38.0);
        // 10.5 px right of the unrounded position, 10 from the drawn one
        assert_eq!(hit_test(sx + 10.0, t.offset_y, &g, &t), Some(Handle::StretchXStart));
    }

    #[test]
    fn end_handle_cannot_cross_start() {
        let (mut g, t) = setup();
        let mut drag = DragController::new();
        drag.handle_event(PointerEvent::Down { x: 320.0, y: 258.0 }, &mut g, &t);
        assert_eq!(drag.active_handle(), Some(Handle::StretchXEnd));
        // image x = 5, far left of start = 40
        assert!(drag.handle_event(PointerEvent::Move { x: 265.0, y: 258.0 }, &mut g, &t));
        assert_eq!(g.h_stretch(), Guide { start: 40, end: 41 });
    }

    #[test]
    fn start_handle_cannot_cross_end_or_leave_image() {
        let (mut g, t) = setup();
        let mut drag = DragController::new();
        drag.handle_event(PointerEvent::Down { x: 270.0, y: 352.0 }, &mut g, &t);
        assert_eq!(drag.active_handle(), Some(Handle::PadXStart));
        drag.handle_event(PointerEvent::Move { x: 600.0, y: 352.0 }, &mut g, &t);
        assert_eq!(g.h_pad(), Guide { start: 89, end: 90 });
        drag.handle_event(PointerEvent::Move { x: 0.0, y: 352.0 }, &mut g, &t);
        assert_eq!(g.h_pad(), Guide { start: 0, end: 90 });
    }

    #[test]
    fn moves_track_the_pointer() {
        let (mut g, t) = setup();
        let mut drag = DragController::new();
        drag.handle_event(PointerEvent::Down { x: 255.0, y: 320.0 }, &mut g, &t);
        assert_eq!(drag.active_handle(), Some(Handle::StretchYEnd));
        drag.handle_event(PointerEvent::Move { x: 255.0, y: 340.0 }, &mut g, &t);
        assert_eq!(g.v_stretch(), Guide { start: 40, end: 80 });
    }

    #[test]
    fn release_and_leave_always_return_to_idle() {
        let (mut g, t) = setup();
        let mut drag = DragController::new();
        for release in [PointerEvent::Up, PointerEvent::Leave] {
            drag.handle_event(PointerEvent::Down { x: 300.0, y: 260.0 }, &mut g, &t);
            assert!(drag.is_dragging());
            let before = g.clone();
            assert!(!drag.handle_event(release, &mut g, &t));
            assert_eq!(drag.state(), DragState::Idle);
            assert_eq!(g, before);
            // moves after release do nothing
            assert!(!drag.handle_event(PointerEvent::Move { x: 200.0, y: 260.0 }, &mut g, &t));
            assert_eq!(g, before);
        }
    }

    #[test]
    fn reset_is_safe_mid_drag() {
        let (mut g, t) = setup();
        let mut drag = DragController::new();
        drag.handle_event(PointerEvent::Down { x: 300.0, y: 260.0 }, &mut g, &t);
        drag.handle_event(PointerEvent::Move { x: 290.0, y: 260.0 }, &mut g, &t);
        let snapshot = g.clone();
        drag.reset();
        assert!(!drag.is_dragging());
        assert_eq!(g, snapshot);
    }
}
