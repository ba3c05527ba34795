use glam::Vec2;

/// A pointer interaction in world coordinates.
///
/// The sandbox interprets actions according to its active manipulation mode,
/// so the same gesture pans the camera or pulls a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Pointer dragged from one world point to another.
    Drag { from: Vec2, to: Vec2 },
    /// Multiply the camera zoom by the factor.
    Zoom(f32),
    /// Put the camera back at its starting view.
    ResetCamera,
}
