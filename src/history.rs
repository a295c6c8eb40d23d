//! Branching history of generated images.
//!
//! New results are appended after the active entry, discarding anything that
//! was undone, like an editor's undo stack. Nothing is persisted.

/// Ordered list of results with one active entry.
#[derive(Debug, Clone)]
pub struct History<T> {
    items: Vec<T>,
    active: Option<usize>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            active: None,
        }
    }
}

impl<T> History<T> {
    /// An empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries after the active one, append `item` and make it active.
    pub fn push(&mut self, item: T) {
        let keep = self.active.map_or(0, |i| i + 1);
        self.items.truncate(keep);
        self.items.push(item);
        self.active = Some(self.items.len() - 1);
    }

    /// Step back one entry. Returns `false` at the first entry or when empty.
    pub fn undo(&mut self) -> bool {
        match self.active {
            Some(i) if i > 0 => {
                self.active = Some(i - 1);
                true
            }
            _ => false,
        }
    }

    /// Make `index` active. Returns `false` if it is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.active = Some(index);
            true
        } else {
            false
        }
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.items.clear();
        self.active = None;
    }

    /// The active entry.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.active.and_then(|i| self.items.get(i))
    }

    /// Index of the active entry.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
