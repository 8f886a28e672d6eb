//! Input events and their normalized pointer form.

use serde::{Deserialize, Serialize};

/// Phase of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    /// Touch started (finger down).
    Start,
    /// Touch moved (finger dragging).
    Move,
    /// Touch ended (finger up).
    End,
    /// Touch cancelled (e.g., palm rejection).
    Cancel,
}

/// A single touch point in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Touch identifier (for multi-touch).
    pub id: u32,
    /// X position in viewport pixels.
    pub client_x: f32,
    /// Y position in viewport pixels.
    pub client_y: f32,
}

/// A touch event with one or more touch points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// Phase of this touch event.
    pub phase: TouchPhase,
    /// All current touch points.
    pub touches: Vec<TouchPoint>,
}

impl TouchEvent {
    /// Create a new touch event.
    #[must_use]
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>) -> Self {
        Self { phase, touches }
    }

    /// Get the primary (first) touch point.
    #[must_use]
    pub fn primary_touch(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }
}

/// Raw input the host forwards from whatever device produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Touch event; the first touch drives interaction.
    Touch(TouchEvent),

    /// Mouse or pen pointer event.
    Pointer {
        /// X position in viewport pixels.
        client_x: f32,
        /// Y position in viewport pixels.
        client_y: f32,
        /// Whether this is the primary pointer.
        is_primary: bool,
    },
}

/// Device-independent pointer position consumed by the interaction
/// controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    /// X position in viewport pixels.
    pub client_x: f32,
    /// Y position in viewport pixels.
    pub client_y: f32,
    /// Whether this is the primary pointer.
    pub is_primary: bool,
}

impl PointerSample {
    /// A primary pointer at the given viewport position.
    #[must_use]
    pub fn primary(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            is_primary: true,
        }
    }

    /// Normalize an input event. Touch events use their first touch; a
    /// touch event with no points yields `None`.
    #[must_use]
    pub fn from_event(event: &InputEvent) -> Option<Self> {
        match event {
            InputEvent::Touch(touch) => touch
                .primary_touch()
                .map(|t| Self::primary(t.client_x, t.client_y)),
            InputEvent::Pointer {
                client_x,
                client_y,
                is_primary,
            } => Some(Self {
                client_x: *client_x,
                client_y: *client_y,
                is_primary: *is_primary,
            }),
        }
    }
}
