//! Navigation history of displayed snapshots.

use dominspect_protocols::SerializedElement;

/// How an incoming snapshot changed the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryUpdate {
    /// Nothing was displayed before.
    Initial,
    /// The previous snapshot was pushed onto the back stack.
    Pushed,
    /// Same element as before; the snapshot was refreshed in place.
    Replaced,
}

/// Back stack plus the snapshot currently displayed.
#[derive(Debug, Clone, Default)]
pub struct NavigationHistory {
    stack: Vec<SerializedElement>,
    current: Option<SerializedElement>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&SerializedElement> {
        self.current.as_ref()
    }

    /// Number of snapshots `back` can return to.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn can_go_back(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Back stack, oldest first.
    pub fn entries(&self) -> &[SerializedElement] {
        &self.stack
    }

    /// Display `element`. A different path is a forward navigation and pushes
    /// the current snapshot; the same path only refreshes it.
    pub fn apply_update(&mut self, element: SerializedElement) -> HistoryUpdate {
        let update = match self.current.take() {
            None => HistoryUpdate::Initial,
            Some(previous) if previous.path == element.path => HistoryUpdate::Replaced,
            Some(previous) => {
                self.stack.push(previous);
                HistoryUpdate::Pushed
            }
        };
        self.current = Some(element);
        update
    }

    /// Pop the back stack into `current`, discarding what was displayed.
    pub fn back(&mut self) -> Option<&SerializedElement> {
        let previous = self.stack.pop()?;
        self.current = Some(previous);
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.current = None;
    }
}
