//! Stacking order operations.
//!
//! Sequence position is the only source of truth for paint order. Every
//! operation here is a no-op for unknown ids and at the stack boundaries,
//! and renumbers the cached ranks after a change.

use crate::{ElementId, Scene};

/// A reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerMove {
    /// Move to the top of the stack.
    ToFront,
    /// Move to the bottom of the stack.
    ToBack,
    /// Swap with the element directly above.
    Up,
    /// Swap with the element directly below.
    Down,
}

impl Scene {
    /// Reorder an element. Returns `true` if the sequence changed.
    pub fn reorder(&mut self, id: &ElementId, op: LayerMove) -> bool {
        let Some(index) = self.index_of(id) else {
            tracing::debug!("Reorder {:?} ignored, no element {}", op, id);
            return false;
        };
        let last = self.element_count() - 1;
        let elements = self.elements_mut();

        let changed = match op {
            LayerMove::ToFront if index < last => {
                let element = elements.remove(index);
                elements.push(element);
                true
            }
            LayerMove::ToBack if index > 0 => {
                let element = elements.remove(index);
                elements.insert(0, element);
                true
            }
            LayerMove::Up if index < last => {
                elements.swap(index, index + 1);
                true
            }
            LayerMove::Down if index > 0 => {
                elements.swap(index, index - 1);
                true
            }
            _ => false,
        };

        if changed {
            self.renumber();
            self.touch();
        }
        changed
    }

    /// Move an element to the end of the sequence (topmost).
    pub fn bring_to_front(&mut self, id: &ElementId) -> bool {
        self.reorder(id, LayerMove::ToFront)
    }

    /// Move an element to the start of the sequence (bottommost).
    pub fn send_to_back(&mut self, id: &ElementId) -> bool {
        self.reorder(id, LayerMove::ToBack)
    }

    /// Swap an element with its upper neighbor.
    pub fn move_up(&mut self, id: &ElementId) -> bool {
        self.reorder(id, LayerMove::Up)
    }

    /// Swap an element with its lower neighbor.
    pub fn move_down(&mut self, id: &ElementId) -> bool {
        self.reorder(id, LayerMove::Down)
    }
}
