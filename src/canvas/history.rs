/// Linear undo/redo over immutable document states.
///
/// `step` points at the entry that matches what is on screen. Pushing after an
/// undo discards everything past the cursor.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    step: usize,
    limit: Option<usize>,
}

impl<T> History<T> {
    /// Create an empty history with no recorded states.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            step: 0,
            limit: None,
        }
    }

    /// Keep at most `limit` entries, dropping the oldest first.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit: limit.map(|l| l.max(1)),
            ..Self::new()
        }
    }

    /// Record a new state after the cursor and make it current.
    pub fn push(&mut self, entry: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.step + 1);
        }
        self.entries.push(entry);
        if let Some(limit) = self.limit {
            let overflow = self.entries.len().saturating_sub(limit);
            if overflow > 0 {
                self.entries.drain(..overflow);
            }
        }
        self.step = self.entries.len() - 1;
    }

    /// Step back one entry, returning the state to restore.
    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.step -= 1;
        self.entries.get(self.step)
    }

    /// Step forward one entry, returning the state to restore.
    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.step += 1;
        self.entries.get(self.step)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.step > 0
    }

    pub fn can_redo(&self) -> bool {
        self.step + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.step)
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// Forget every recorded state.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.step = 0;
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}
