/// Result of offering a payload to a [`PayloadSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadOutcome {
    /// New payload stored; the target has not been reached yet
    Added,

    /// New payload stored and it completed the target count
    TargetReached,

    /// Already present; nothing changed
    Duplicate,

    /// The target was already reached; the payload was not stored
    Ignored,
}

/// Ordered, deduplicated, append-only set of discovered flags
#[derive(Debug, Clone)]
pub struct PayloadSet {
    items: Vec<String>,
    target: usize,
}

impl PayloadSet {
    /// Creates an empty set that is complete once it holds `target` payloads
    pub fn new(target: usize) -> Self {
        Self {
            items: Vec::with_capacity(target),
            target,
        }
    }

    /// Appends the payload unless it is already present
    pub fn insert(&mut self, payload: &str) -> PayloadOutcome {
        if self.items.iter().any(|p| p == payload) {
            return PayloadOutcome::Duplicate;
        }
        if self.is_complete() {
            return PayloadOutcome::Ignored;
        }

        self.items.push(payload.to_string());
        if self.is_complete() {
            PayloadOutcome::TargetReached
        } else {
            PayloadOutcome::Added
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// True once the target count has been collected
    pub fn is_complete(&self) -> bool {
        self.items.len() >= self.target
    }

    /// Payloads in discovery order
    pub fn as_slice(&self) -> &[String] {
        &self.items
    }
}
