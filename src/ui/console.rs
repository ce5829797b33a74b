//! Line-oriented console: parses commands and drives the hub

use std::io::Write;
use std::str::FromStr;

use anyhow::Result;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::explorer::ExplorerView;
use crate::app::{CommandError, DocuHub, Selection};
use crate::bridge::PersistenceBridge;
use crate::core::session::SessionState;
use crate::core::tree;

const HELP: &str = "\
Commands:
  tree             Show the document tree
  select <id>      Open a file or expand/collapse a folder (alias: open)
  edit             Replace the buffer; end input with a line containing only `.`
  show             Print the buffer
  preview          Print the buffer rendered as HTML
  save             Save the buffer
  export           Export the selected file to PDF
  publish          Publish all documents
  status           Show the selection, unsaved changes and the last result
  dump             Print the document tree as JSON
  help             Show this help
  quit             Exit";

/// A console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tree,
    Select(String),
    Edit,
    Show,
    Preview,
    Save,
    Export,
    Publish,
    Status,
    Dump,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("Unknown command `{0}`, type `help` for a list")]
    Unknown(String),
    #[error("`{0}` needs a node id")]
    MissingId(String),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        let command = match word.to_lowercase().as_str() {
            "tree" | "ls" => Command::Tree,
            "select" | "open" => {
                if rest.is_empty() {
                    return Err(ParseCommandError::MissingId(word.to_string()));
                }
                Command::Select(rest.to_string())
            }
            "edit" => Command::Edit,
            "show" => Command::Show,
            "preview" => Command::Preview,
            "save" => Command::Save,
            "export" => Command::Export,
            "publish" => Command::Publish,
            "status" => Command::Status,
            "dump" => Command::Dump,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(ParseCommandError::Unknown(word.to_string())),
        };
        Ok(command)
    }
}

/// Interactive session over a [`DocuHub`]
pub struct Console<B> {
    hub: DocuHub<B>,
}

impl<B: PersistenceBridge> Console<B> {
    pub fn new(hub: DocuHub<B>) -> Self {
        Self { hub }
    }

    /// Read commands until `quit` or end of input
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        writeln!(out, "DocuHub - type `help` for commands")?;

        loop {
            write!(out, "> ")?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    writeln!(out, "{}", e)?;
                    continue;
                }
            };
            tracing::debug!("Command: {:?}", command);

            match command {
                Command::Quit => break,
                Command::Edit => {
                    if self.hub.session().selected_id().is_none() {
                        writeln!(out, "Select a file before editing.")?;
                        continue;
                    }

                    writeln!(out, "Enter content, finish with a line containing only `.`")?;
                    let mut text = Vec::new();
                    while let Some(line) = lines.next_line().await? {
                        if line == "." {
                            break;
                        }
                        text.push(line);
                    }

                    match self.hub.edit_buffer(text.join("\n")) {
                        Ok(()) => writeln!(out, "Buffer updated")?,
                        Err(e) => writeln!(out, "{}", e)?,
                    }
                }
                other => self.execute(other, out).await?,
            }
        }

        tracing::info!("Console closed");
        Ok(())
    }

    async fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Tree => {
                write!(out, "{}", ExplorerView::render(&self.hub.snapshot()))?;
            }
            Command::Select(id) => {
                let selection = self.hub.select_node(&id);
                match (selection, tree::find(self.hub.forest(), &id)) {
                    (Selection::FileOpened, Some(node)) => {
                        writeln!(out, "Editing {} ({})", node.path(), id)?
                    }
                    (Selection::FolderToggled { is_open }, Some(node)) => {
                        let verb = if is_open { "Expanded" } else { "Collapsed" };
                        writeln!(out, "{} {}", verb, node.name())?
                    }
                    _ => writeln!(out, "No node `{}`, selection cleared", id)?,
                }
            }
            Command::Show => {
                let snapshot = self.hub.snapshot();
                match snapshot.selected_id {
                    Some(_) => writeln!(out, "{}", snapshot.buffer)?,
                    None => writeln!(out, "No document selected")?,
                }
            }
            Command::Preview => {
                let snapshot = self.hub.snapshot();
                match snapshot.selected_id {
                    Some(_) => write!(out, "{}", snapshot.html)?,
                    None => writeln!(out, "No document selected")?,
                }
            }
            Command::Save => {
                let result = self.hub.request_save().await;
                Self::print_result(result, out)?;
            }
            Command::Export => {
                let result = self.hub.request_export().await;
                Self::print_result(result, out)?;
            }
            Command::Publish => {
                let result = self.hub.request_publish().await;
                Self::print_result(result, out)?;
            }
            Command::Status => {
                let snapshot = self.hub.snapshot();
                let state = match snapshot.state {
                    SessionState::Idle => "idle",
                    SessionState::Editing => "editing",
                    SessionState::Saving => "saving",
                };
                writeln!(out, "State: {}", state)?;
                if let Some(id) = snapshot.selected_id {
                    let changes = if snapshot.dirty { "unsaved changes" } else { "clean" };
                    writeln!(out, "Selected: {} ({})", id, changes)?;
                }
                if let Some(notice) = snapshot.notice {
                    writeln!(out, "Last result: [{}] {}", notice.title, notice.message)?;
                }
            }
            Command::Dump => {
                writeln!(out, "{}", serde_json::to_string_pretty(self.hub.forest())?)?;
            }
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Edit | Command::Quit => {}
        }
        Ok(())
    }

    fn print_result<W: Write>(result: Result<String, CommandError>, out: &mut W) -> Result<()> {
        match result {
            Ok(message) => writeln!(out, "[Success] {}", message)?,
            Err(e) => writeln!(out, "[Error] {}", e)?,
        }
        Ok(())
    }
}
