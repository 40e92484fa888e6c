/// Transition reported by [`EdgeSignal::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    pub fn is_rising(self) -> bool {
        matches!(self, Edge::Rising)
    }
}

/// Boolean that reports only its transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeSignal {
    value: bool,
}

impl EdgeSignal {
    pub fn get(&self) -> bool {
        self.value
    }

    /// Stores `next` and returns the edge if the value changed.
    pub fn update(&mut self, next: bool) -> Option<Edge> {
        if self.value == next {
            return None;
        }
        self.value = next;
        Some(if next { Edge::Rising } else { Edge::Falling })
    }

    /// Forces the signal low without reporting a falling edge.
    pub fn clear(&mut self) {
        self.value = false;
    }
}
