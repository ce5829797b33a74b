//! Document hub state: the forest, the edit session and the commands over them

use std::fmt;

use thiserror::Error;

use crate::bridge::{self, Outcome, PersistenceBridge};
use crate::core::config::PreviewConfig;
use crate::core::session::{EditSession, SessionState};
use crate::core::tree::{self, Forest, TreeError, TreeNode};
use crate::ui::preview::PreviewPane;

/// Command that needs a selected file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Save,
    Export,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileAction::Save => f.write_str("to save"),
            FileAction::Export => f.write_str("for PDF export"),
        }
    }
}

/// Recoverable, user-facing command failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("No file selected {0}.")]
    NoFileSelected(FileAction),
    #[error("Select a file before editing.")]
    NotEditing,
    #[error("Selected item is not a file.")]
    NotAFile(#[source] TreeError),
    /// Message reported by the persistence bridge, verbatim
    #[error("{0}")]
    Persistence(String),
}

/// Last command result, for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub is_error: bool,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            title: "Success".to_string(),
            message: message.into(),
            is_error: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.into(),
            is_error: true,
        }
    }
}

/// What a call to [`DocuHub::select_node`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A folder was expanded or collapsed; the edit session is unchanged
    FolderToggled { is_open: bool },
    /// A file is now being edited
    FileOpened,
    /// The id matched nothing and the selection was cleared
    Cleared,
}

/// A save captured at request time. The commit targets `file_id` no matter
/// what is selected when the bridge answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub file_id: String,
    pub content: String,
}

/// Read-only view handed to renderers
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub forest: Forest,
    pub selected_id: Option<String>,
    pub buffer: String,
    /// Buffer rendered as HTML, empty when nothing is selected
    pub html: String,
    pub state: SessionState,
    pub dirty: bool,
    pub notice: Option<Notice>,
}

/// Main application state
pub struct DocuHub<B> {
    /// Current document forest
    forest: Forest,
    /// Selection and working buffer
    session: EditSession,
    /// Backend used by save/export/publish
    bridge: B,
    /// Result of the last command
    notice: Option<Notice>,
    /// How the buffer is rendered into the snapshot
    preview: PreviewConfig,
}

impl<B: PersistenceBridge> DocuHub<B> {
    /// Create a hub over a seed forest with nothing selected
    pub fn new(forest: Forest, bridge: B) -> Self {
        Self {
            forest,
            session: EditSession::new(),
            bridge,
            notice: None,
            preview: PreviewConfig::default(),
        }
    }

    /// Use the given preview settings for snapshot HTML
    pub fn with_preview(mut self, preview: PreviewConfig) -> Self {
        self.preview = preview;
        self
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Copy of the current state for rendering
    pub fn snapshot(&self) -> Snapshot {
        let html = match self.session.selected_id() {
            Some(_) => PreviewPane::render(self.session.buffer(), self.preview.strip_frontmatter),
            None => String::new(),
        };

        Snapshot {
            forest: self.forest.clone(),
            selected_id: self.session.selected_id().map(str::to_string),
            buffer: self.session.buffer().to_string(),
            html,
            state: self.session.state(),
            dirty: self.session.is_dirty(&self.forest),
            notice: self.notice.clone(),
        }
    }

    /// Handle a click on a node.
    ///
    /// Folders are toggled without touching the session. Files replace the
    /// buffer with their stored content, dropping unsaved edits.
    pub fn select_node(&mut self, id: &str) -> Selection {
        match tree::find(&self.forest, id) {
            Some(TreeNode::Folder(_)) => {
                self.forest = tree::toggle_folder(&self.forest, id);
                let is_open = tree::find(&self.forest, id)
                    .and_then(TreeNode::as_folder)
                    .map(|folder| folder.is_open)
                    .unwrap_or(false);
                Selection::FolderToggled { is_open }
            }
            Some(TreeNode::File(file)) => {
                if self.session.is_dirty(&self.forest) {
                    tracing::warn!(
                        "Discarding unsaved edits to {}",
                        self.session.selected_id().unwrap_or_default()
                    );
                }
                self.session.open(id, &file.content);
                tracing::info!("Opened document: {}", file.path);
                Selection::FileOpened
            }
            None => {
                tracing::debug!("Selection cleared, no node {}", id);
                self.session.clear();
                Selection::Cleared
            }
        }
    }

    /// Replace the working buffer of the selected file
    pub fn edit_buffer(&mut self, text: impl Into<String>) -> Result<(), CommandError> {
        if self.session.set_buffer(text.into()) {
            Ok(())
        } else {
            Err(CommandError::NotEditing)
        }
    }

    /// Capture the selected id and buffer and enter `Saving`
    pub fn begin_save(&mut self) -> Result<PendingSave, CommandError> {
        let Some(file_id) = self.session.selected_id().map(str::to_string) else {
            return Err(self.fail(CommandError::NoFileSelected(FileAction::Save)));
        };

        let pending = PendingSave {
            file_id,
            content: self.session.buffer().to_string(),
        };
        self.session.mark_saving();
        Ok(pending)
    }

    /// Apply the bridge's answer to a save started with [`Self::begin_save`]
    pub fn finish_save(&mut self, pending: PendingSave, outcome: Outcome) -> Result<String, CommandError> {
        self.session.finish_saving(&pending.file_id);

        if outcome.success {
            self.forest = tree::set_file_content(&self.forest, &pending.file_id, &pending.content);
            tracing::info!("Saved document: {}", pending.file_id);
            Ok(self.succeed(outcome.message))
        } else {
            tracing::warn!("Failed to save {}: {}", pending.file_id, outcome.message);
            Err(self.fail(CommandError::Persistence(outcome.message)))
        }
    }

    /// Persist the buffer and commit it into the forest on success
    pub async fn request_save(&mut self) -> Result<String, CommandError> {
        let pending = self.begin_save()?;
        let outcome = bridge::guard("save", self.bridge.save(&pending.file_id, &pending.content)).await;
        self.finish_save(pending, outcome)
    }

    /// Export the selected file by its path
    pub async fn request_export(&mut self) -> Result<String, CommandError> {
        let Some(id) = self.session.selected_id().map(str::to_string) else {
            return Err(self.fail(CommandError::NoFileSelected(FileAction::Export)));
        };

        let path = match tree::find_file(&self.forest, &id).map(|file| file.path.clone()) {
            Ok(path) => path,
            Err(e) => return Err(self.fail(CommandError::NotAFile(e))),
        };

        let outcome = bridge::guard("export", self.bridge.export_document(&path)).await;
        self.conclude("export", outcome)
    }

    /// Publish the whole forest
    pub async fn request_publish(&mut self) -> Result<String, CommandError> {
        let outcome = bridge::guard("publish", self.bridge.publish_all(&self.forest)).await;
        self.conclude("publish", outcome)
    }

    fn conclude(&mut self, operation: &str, outcome: Outcome) -> Result<String, CommandError> {
        if outcome.success {
            tracing::info!("{} succeeded: {}", operation, outcome.message);
            Ok(self.succeed(outcome.message))
        } else {
            tracing::warn!("{} failed: {}", operation, outcome.message);
            Err(self.fail(CommandError::Persistence(outcome.message)))
        }
    }

    fn succeed(&mut self, message: String) -> String {
        self.notice = Some(Notice::success(message.clone()));
        message
    }

    fn fail(&mut self, error: CommandError) -> CommandError {
        self.notice = Some(Notice::error(error.to_string()));
        error
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::bridge::TRANSPORT_FAULT_MESSAGE;
    use crate::core::seed;

    /// Bridge answering every call with a fixed outcome, or a transport
    /// fault when none is set
    struct StubBridge {
        outcome: Option<Outcome>,
        calls: Mutex<Vec<String>>,
    }

    impl StubBridge {
        fn answering(outcome: Outcome) -> Self {
            Self {
                outcome: Some(outcome),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn broken() -> Self {
            Self {
                outcome: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn respond(&self, call: String) -> anyhow::Result<Outcome> {
            self.calls.lock().unwrap().push(call);
            self.outcome
                .clone()
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PersistenceBridge for StubBridge {
        async fn save(&self, file_id: &str, content: &str) -> anyhow::Result<Outcome> {
            self.respond(format!("save {file_id} {content}"))
        }

        async fn export_document(&self, path: &str) -> anyhow::Result<Outcome> {
            self.respond(format!("export {path}"))
        }

        async fn publish_all(&self, forest: &[Arc<TreeNode>]) -> anyhow::Result<Outcome> {
            self.respond(format!("publish {}", forest.len()))
        }
    }

    fn hub(bridge: StubBridge) -> DocuHub<StubBridge> {
        DocuHub::new(seed::default_forest(), bridge)
    }

    fn stored(hub: &DocuHub<StubBridge>, id: &str) -> String {
        tree::find_file(hub.forest(), id).unwrap().content.clone()
    }

    #[tokio::test]
    async fn test_save_commits_buffer() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        let original = stored(&hub, "proj-alpha-readme");

        assert_eq!(hub.select_node("proj-alpha-readme"), Selection::FileOpened);
        assert_eq!(hub.session().buffer(), original);

        hub.edit_buffer("# Changed").unwrap();
        assert!(hub.snapshot().dirty);

        assert_eq!(hub.request_save().await, Ok("ok".to_string()));
        assert_eq!(stored(&hub, "proj-alpha-readme"), "# Changed");
        assert_eq!(hub.session().state(), SessionState::Editing);
        assert_eq!(hub.session().buffer(), "# Changed");
        assert!(!hub.snapshot().dirty);
        assert_eq!(hub.bridge.calls(), vec!["save proj-alpha-readme # Changed"]);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_buffer_and_tree() {
        let mut hub = hub(StubBridge::answering(Outcome::failure("network error")));
        let original = stored(&hub, "proj-alpha-readme");

        hub.select_node("proj-alpha-readme");
        hub.edit_buffer("# Changed").unwrap();

        assert_eq!(
            hub.request_save().await,
            Err(CommandError::Persistence("network error".to_string()))
        );
        assert_eq!(stored(&hub, "proj-alpha-readme"), original);
        assert!(original.starts_with("# Project Alpha"));
        assert_eq!(hub.session().buffer(), "# Changed");
        assert_eq!(hub.session().state(), SessionState::Editing);

        let notice = hub.snapshot().notice.unwrap();
        assert!(notice.is_error);
        assert_eq!(notice.message, "network error");
    }

    #[tokio::test]
    async fn test_transport_fault_is_normalized() {
        let mut hub = hub(StubBridge::broken());
        let original = stored(&hub, "orphaned-file");

        hub.select_node("orphaned-file");
        hub.edit_buffer("lost?").unwrap();

        assert_eq!(
            hub.request_save().await,
            Err(CommandError::Persistence(TRANSPORT_FAULT_MESSAGE.to_string()))
        );
        assert_eq!(stored(&hub, "orphaned-file"), original);
        assert_eq!(hub.session().buffer(), "lost?");
    }

    #[test]
    fn test_folder_selection_leaves_session_alone() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        hub.select_node("proj-alpha-user-guide");
        hub.edit_buffer("draft").unwrap();

        assert_eq!(
            hub.select_node("proj-alpha-api"),
            Selection::FolderToggled { is_open: true }
        );
        let folder = tree::find(hub.forest(), "proj-alpha-api").unwrap();
        assert!(folder.as_folder().unwrap().is_open);
        assert_eq!(hub.session().selected_id(), Some("proj-alpha-user-guide"));
        assert_eq!(hub.session().buffer(), "draft");

        assert_eq!(
            hub.select_node("proj-alpha-api"),
            Selection::FolderToggled { is_open: false }
        );
    }

    #[test]
    fn test_folder_selection_from_idle_stays_idle() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        hub.select_node("bi-versat");
        assert_eq!(hub.session().state(), SessionState::Idle);
        assert_eq!(hub.session().selected_id(), None);
    }

    #[test]
    fn test_reselect_discards_unsaved_edits() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        let original = stored(&hub, "proj-alpha-readme");

        hub.select_node("proj-alpha-readme");
        hub.edit_buffer("unsaved").unwrap();
        hub.select_node("proj-alpha-user-guide");
        hub.select_node("proj-alpha-readme");

        assert_eq!(hub.session().buffer(), original);

        // reselecting the same file reseeds too
        hub.edit_buffer("unsaved again").unwrap();
        hub.select_node("proj-alpha-readme");
        assert_eq!(hub.session().buffer(), original);
    }

    #[test]
    fn test_unknown_id_clears_selection() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        hub.select_node("proj-alpha-readme");

        assert_eq!(hub.select_node("does-not-exist"), Selection::Cleared);
        assert_eq!(hub.session().state(), SessionState::Idle);
        assert_eq!(hub.session().selected_id(), None);
        assert_eq!(hub.session().buffer(), "");
    }

    #[test]
    fn test_edit_requires_selection() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        assert_eq!(hub.edit_buffer("text"), Err(CommandError::NotEditing));
        assert_eq!(hub.session().buffer(), "");
    }

    #[tokio::test]
    async fn test_save_without_selection() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        let before = hub.forest().clone();

        assert_eq!(
            hub.request_save().await,
            Err(CommandError::NoFileSelected(FileAction::Save))
        );
        assert_eq!(hub.snapshot().notice.unwrap().message, "No file selected to save.");
        assert!(hub.bridge.calls().is_empty());
        assert_eq!(hub.forest(), &before);
    }

    #[tokio::test]
    async fn test_export_without_selection() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));

        assert_eq!(
            hub.request_export().await,
            Err(CommandError::NoFileSelected(FileAction::Export))
        );
        assert_eq!(hub.snapshot().notice.unwrap().message, "No file selected for PDF export.");
        assert!(hub.bridge.calls().is_empty());
    }

    #[tokio::test]
    async fn test_export_uses_path() {
        let mut hub = hub(StubBridge::answering(Outcome::success("exported")));
        hub.select_node("proj-alpha-api-endpoints");
        hub.edit_buffer("draft").unwrap();
        let before = hub.forest().clone();

        assert_eq!(hub.request_export().await, Ok("exported".to_string()));
        assert_eq!(
            hub.bridge.calls(),
            vec!["export Project Alpha/API Docs/endpoints.md"]
        );
        assert_eq!(hub.session().buffer(), "draft");
        assert_eq!(hub.forest(), &before);
    }

    #[tokio::test]
    async fn test_publish_needs_no_selection() {
        let mut hub = hub(StubBridge::answering(Outcome::success("published")));

        assert_eq!(hub.request_publish().await, Ok("published".to_string()));
        assert_eq!(hub.bridge.calls(), vec!["publish 3"]);
        assert_eq!(hub.session().state(), SessionState::Idle);

        let notice = hub.snapshot().notice.unwrap();
        assert_eq!(notice.title, "Success");
        assert!(!notice.is_error);
    }

    #[test]
    fn test_save_commits_to_captured_id_after_reselect() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        let guide = stored(&hub, "proj-alpha-user-guide");

        hub.select_node("proj-alpha-readme");
        hub.edit_buffer("# Saved while away").unwrap();
        let pending = hub.begin_save().unwrap();
        assert_eq!(hub.session().state(), SessionState::Saving);

        hub.select_node("proj-alpha-user-guide");
        assert_eq!(hub.session().state(), SessionState::Editing);

        hub.finish_save(pending, Outcome::success("ok")).unwrap();

        assert_eq!(stored(&hub, "proj-alpha-readme"), "# Saved while away");
        assert_eq!(stored(&hub, "proj-alpha-user-guide"), guide);
        assert_eq!(hub.session().selected_id(), Some("proj-alpha-user-guide"));
        assert_eq!(hub.session().buffer(), guide);
    }

    #[test]
    fn test_late_save_does_not_end_other_save() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));

        hub.select_node("proj-alpha-readme");
        let first = hub.begin_save().unwrap();
        hub.select_node("orphaned-file");
        let second = hub.begin_save().unwrap();

        hub.finish_save(first, Outcome::success("ok")).unwrap();
        assert_eq!(hub.session().state(), SessionState::Saving);

        hub.finish_save(second, Outcome::success("ok")).unwrap();
        assert_eq!(hub.session().state(), SessionState::Editing);
    }

    #[test]
    fn test_overlapping_saves_keep_saving() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        hub.select_node("proj-alpha-readme");
        hub.edit_buffer("v1").unwrap();
        let first = hub.begin_save().unwrap();
        hub.edit_buffer("v2").unwrap();
        let second = hub.begin_save().unwrap();

        hub.finish_save(first, Outcome::success("ok")).unwrap();
        assert_eq!(hub.session().state(), SessionState::Saving);
        assert_eq!(stored(&hub, "proj-alpha-readme"), "v1");

        hub.finish_save(second, Outcome::failure("timeout")).unwrap_err();
        assert_eq!(hub.session().state(), SessionState::Editing);
        assert_eq!(stored(&hub, "proj-alpha-readme"), "v1");
        assert!(hub.snapshot().dirty);
    }

    #[test]
    fn test_reselect_during_save_stays_saving() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        hub.select_node("proj-alpha-readme");
        hub.edit_buffer("# In flight").unwrap();
        let pending = hub.begin_save().unwrap();

        hub.select_node("proj-alpha-readme");
        assert_eq!(hub.session().state(), SessionState::Saving);

        hub.select_node("orphaned-file");
        assert_eq!(hub.session().state(), SessionState::Editing);
        hub.select_node("proj-alpha-readme");
        assert_eq!(hub.session().state(), SessionState::Saving);

        hub.finish_save(pending, Outcome::success("ok")).unwrap();
        assert_eq!(hub.session().state(), SessionState::Editing);
        assert_eq!(stored(&hub, "proj-alpha-readme"), "# In flight");
    }

    #[tokio::test]
    async fn test_export_of_selection_that_became_a_folder() {
        let mut hub = hub(StubBridge::answering(Outcome::success("exported")));
        hub.select_node("orphaned-file");
        hub.forest = vec![Arc::new(TreeNode::folder(
            "orphaned-file",
            "standalone",
            "standalone",
            true,
            Vec::new(),
        ))];

        let err = hub.request_export().await.unwrap_err();
        assert_eq!(
            err,
            CommandError::NotAFile(TreeError::WrongNodeKind {
                id: "orphaned-file".to_string(),
                expected: tree::NodeKind::File,
                found: tree::NodeKind::Folder,
            })
        );
        assert_eq!(hub.snapshot().notice.unwrap().message, "Selected item is not a file.");
        assert!(hub.bridge.calls().is_empty());
    }

    #[test]
    fn test_snapshot_renders_buffer() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        assert_eq!(hub.snapshot().html, "");

        hub.select_node("orphaned-file");
        hub.edit_buffer("---\ntitle: Draft\n---\n# Heading").unwrap();
        let html = hub.snapshot().html;
        assert!(html.contains("<h1>Heading</h1>"));
        assert!(!html.contains("title"));

        let mut raw = hub.with_preview(PreviewConfig {
            strip_frontmatter: false,
        });
        assert!(raw.snapshot().html.contains("title: Draft"));
        raw.select_node("does-not-exist");
        assert_eq!(raw.snapshot().html, "");
    }

    #[tokio::test]
    async fn test_ids_stay_unique_across_commands() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        for id in ["proj-alpha-api", "bi-versat", "bi-versat-manual", "proj-alpha"] {
            if hub.select_node(id) == Selection::FileOpened {
                hub.edit_buffer(format!("edited {id}")).unwrap();
                hub.request_save().await.unwrap();
            }
        }

        assert!(tree::validate_unique_ids(hub.forest()).is_ok());
        assert_eq!(stored(&hub, "bi-versat-manual"), "edited bi-versat-manual");
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut hub = hub(StubBridge::answering(Outcome::success("ok")));
        hub.select_node("orphaned-file");
        let snapshot = hub.snapshot();

        hub.select_node("proj-alpha");
        hub.edit_buffer("later").unwrap();

        assert_eq!(snapshot.selected_id.as_deref(), Some("orphaned-file"));
        assert_ne!(snapshot.buffer, "later");
        assert!(snapshot.forest[0].as_folder().unwrap().is_open);
        assert!(!hub.forest()[0].as_folder().unwrap().is_open);
    }
}
