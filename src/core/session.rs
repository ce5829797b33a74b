//! Edit session: which file is selected and its working buffer

use std::collections::HashMap;
use std::sync::Arc;

use super::tree::{self, TreeNode};

/// Where the session is in its select/edit/save cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing selected
    #[default]
    Idle,
    /// A file is selected and its buffer may diverge from the stored content
    Editing,
    /// A save for the selected file is in flight
    Saving,
}

/// The single in-progress edit
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: SessionState,
    selected_id: Option<String>,
    buffer: String,
    /// Outstanding saves per file id
    pending_saves: HashMap<String, usize>,
}

impl EditSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Select a file and seed the buffer from its stored content
    pub fn open(&mut self, id: &str, content: &str) {
        self.state = if self.pending_saves.contains_key(id) {
            SessionState::Saving
        } else {
            SessionState::Editing
        };
        self.selected_id = Some(id.to_string());
        self.buffer = content.to_string();
    }

    /// Drop the selection and the buffer
    pub fn clear(&mut self) {
        self.state = SessionState::Idle;
        self.selected_id = None;
        self.buffer.clear();
    }

    /// Replace the buffer. Returns `false` when no file is selected.
    pub fn set_buffer(&mut self, text: String) -> bool {
        if self.selected_id.is_none() {
            return false;
        }
        self.buffer = text;
        true
    }

    /// Record a save of the selected file and enter `Saving`
    pub fn mark_saving(&mut self) {
        if let Some(id) = &self.selected_id {
            *self.pending_saves.entry(id.clone()).or_default() += 1;
            self.state = SessionState::Saving;
        }
    }

    /// Record that one save of `id` answered. The session leaves `Saving`
    /// once no save of the selected file is outstanding.
    pub fn finish_saving(&mut self, id: &str) {
        if let Some(count) = self.pending_saves.get_mut(id) {
            *count -= 1;
            if *count == 0 {
                self.pending_saves.remove(id);
            }
        }

        let selected = self.selected_id.as_deref() == Some(id);
        if selected && self.state == SessionState::Saving && !self.pending_saves.contains_key(id) {
            self.state = SessionState::Editing;
        }
    }

    /// Whether the buffer differs from what the forest stores for the selection
    pub fn is_dirty(&self, forest: &[Arc<TreeNode>]) -> bool {
        match self.selected_id.as_deref() {
            Some(id) => tree::find_file(forest, id)
                .map(|file| file.content != self.buffer)
                .unwrap_or(false),
            None => false,
        }
    }
}
