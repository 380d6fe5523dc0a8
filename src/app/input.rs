use winit::event::MouseScrollDelta;

/// Pixels per wheel notch for touchpads reporting pixel deltas.
const PIXELS_PER_NOTCH: f32 = 100.0;

/// Tracks the primary button and cursor to turn motion into orbit drags.
#[derive(Default, Debug, Clone, Copy)]
pub struct PointerState {
    cursor: Option<(f32, f32)>,
    dragging: bool,
}

impl PointerState {
    pub fn set_primary(&mut self, pressed: bool) {
        self.dragging = pressed;
    }

    /// New cursor position. Returns the drag delta while the button is held.
    pub fn cursor_moved(&mut self, x: f32, y: f32) -> Option<(f32, f32)> {
        let previous = self.cursor.replace((x, y));
        match previous {
            Some((px, py)) if self.dragging => Some((x - px, y - py)),
            _ => None,
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
        self.dragging = false;
    }
}

/// Wheel notches, positive when scrolling toward the user.
pub fn wheel_notches(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y,
        MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32) / PIXELS_PER_NOTCH,
    }
}
