use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use snafu::{ResultExt, Snafu};

use crate::message::Conversation;
use crate::store::ConversationStore;

pub const EXPORT_FILE_PREFIX: &str = "astral_chats_";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ExportError {
    #[snafu(display("failed to serialize conversations on `{stage}`: {source}"))]
    Serialize {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to create export directory {path:?} on `{stage}`: {source}"))]
    CreateDirectory {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to write export file {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Read-only snapshot of every conversation of the session.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument<'a> {
    /// ISO-8601 UTC with millisecond precision.
    pub exported_at: String,
    pub conversations: &'a [Conversation],
}

impl<'a> ExportDocument<'a> {
    pub fn new(conversations: &'a [Conversation], exported_at: DateTime<Utc>) -> Self {
        Self {
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            conversations,
        }
    }

    pub fn from_store(store: &'a ConversationStore) -> Self {
        Self::new(store.conversations(), store.clock().now())
    }

    pub fn to_json_pretty(&self) -> ExportResult<String> {
        serde_json::to_string_pretty(self).context(SerializeSnafu {
            stage: "serialize-export-document",
        })
    }
}

pub fn export_file_name(exported_at: DateTime<Utc>) -> String {
    format!("{EXPORT_FILE_PREFIX}{}.json", exported_at.timestamp_millis())
}

/// Serializes the store into `directory` and returns the written path.
pub fn write_export(store: &ConversationStore, directory: &Path) -> ExportResult<PathBuf> {
    let now = store.clock().now();
    let content = ExportDocument::new(store.conversations(), now).to_json_pretty()?;

    std::fs::create_dir_all(directory).context(CreateDirectorySnafu {
        stage: "create-export-directory",
        path: directory.to_path_buf(),
    })?;

    let path = directory.join(export_file_name(now));
    std::fs::write(&path, content).context(WriteFileSnafu {
        stage: "write-export-file",
        path: path.clone(),
    })?;

    tracing::info!(
        path = %path.display(),
        conversations = store.conversations().len(),
        "exported conversations"
    );
    Ok(path)
}
