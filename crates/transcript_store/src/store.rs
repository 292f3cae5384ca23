use std::path::{Path, PathBuf};

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::TranscriptStoreError;
use crate::records::{Conversation, ConversationSummary, Role, Turn, TurnMetadata};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS conversations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL DEFAULT '',
        model TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        total_cost REAL NOT NULL DEFAULT 0.0,
        total_tokens INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS turns (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        conversation_id INTEGER NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        citations TEXT NOT NULL DEFAULT '[]',
        usage TEXT NOT NULL DEFAULT '{}',
        cost TEXT NOT NULL DEFAULT '{}',
        FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_turns_conversation
        ON turns(conversation_id);
";

/// Durable, key-ordered log of turns per conversation.
///
/// Every mutating operation is independently atomic; `append` runs its turn
/// insert and the conversation `updated_at` bump inside one transaction so
/// readers never observe partial state.
pub struct TranscriptStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl TranscriptStore {
    /// Open (or create) the database at `path`, creating parent directories
    /// as needed.
    pub fn open(path: &Path) -> Result<Self, TranscriptStoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| {
                TranscriptStoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                }
            })?;
        }

        let conn = Connection::open(path).map_err(|source| TranscriptStoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.initialize()?;
        Ok(store)
    }

    /// In-memory store for tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self, TranscriptStoreError> {
        let conn = Connection::open_in_memory().map_err(|source| TranscriptStoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        let store = Self { conn, path: None };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<(), TranscriptStoreError> {
        self.conn
            .pragma_update(None, "journal_mode", "WAL")
            .map_err(|source| TranscriptStoreError::sqlite("enabling WAL", source))?;
        self.conn
            .pragma_update(None, "foreign_keys", "ON")
            .map_err(|source| TranscriptStoreError::sqlite("enabling foreign keys", source))?;
        self.conn
            .execute_batch(SCHEMA)
            .map_err(|source| TranscriptStoreError::sqlite("creating schema", source))
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Allocate a new, empty conversation and return its id.
    pub fn create(&self, model: &str) -> Result<i64, TranscriptStoreError> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO conversations (model, created_at, updated_at) VALUES (?1, ?2, ?2)",
                params![model, now],
            )
            .map_err(|source| TranscriptStoreError::sqlite("creating conversation", source))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Append one turn and bump the conversation's `updated_at`, atomically.
    /// Running totals are untouched; see [`TranscriptStore::accumulate_cost`].
    pub fn append(
        &mut self,
        conversation_id: i64,
        role: Role,
        content: &str,
        metadata: Option<&TurnMetadata>,
    ) -> Result<i64, TranscriptStoreError> {
        let now = now_rfc3339()?;
        let (citations, usage, cost) = match metadata {
            Some(metadata) => (
                serde_json::to_string(&metadata.citations)
                    .map_err(|source| TranscriptStoreError::MetadataSerialize { source })?,
                metadata.usage.to_string(),
                metadata.cost.to_string(),
            ),
            None => ("[]".to_string(), "{}".to_string(), "{}".to_string()),
        };

        let tx = self
            .conn
            .transaction()
            .map_err(|source| TranscriptStoreError::sqlite("starting append", source))?;
        tx.execute(
            "INSERT INTO turns (conversation_id, role, content, timestamp, citations, usage, cost)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![conversation_id, role.as_str(), content, now, citations, usage, cost],
        )
        .map_err(|source| TranscriptStoreError::sqlite("inserting turn", source))?;
        let turn_id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
            params![now, conversation_id],
        )
        .map_err(|source| TranscriptStoreError::sqlite("touching conversation", source))?;
        tx.commit()
            .map_err(|source| TranscriptStoreError::sqlite("committing append", source))?;

        Ok(turn_id)
    }

    /// Remove the most recently appended turn of a conversation. Each call
    /// removes at most one turn; the next call removes the new last.
    pub fn delete_last(&self, conversation_id: i64) -> Result<bool, TranscriptStoreError> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM turns WHERE id = (
                    SELECT id FROM turns WHERE conversation_id = ?1 ORDER BY id DESC LIMIT 1
                )",
                params![conversation_id],
            )
            .map_err(|source| TranscriptStoreError::sqlite("rolling back last turn", source))?;
        Ok(removed > 0)
    }

    /// Add one exchange's cost and token count to the running totals.
    pub fn accumulate_cost(
        &self,
        conversation_id: i64,
        cost: f64,
        tokens: i64,
    ) -> Result<(), TranscriptStoreError> {
        self.conn
            .execute(
                "UPDATE conversations
                 SET total_cost = total_cost + ?1, total_tokens = total_tokens + ?2
                 WHERE id = ?3",
                params![cost, tokens, conversation_id],
            )
            .map_err(|source| TranscriptStoreError::sqlite("accumulating totals", source))?;
        Ok(())
    }

    /// Materialize one conversation with its turns in append order.
    pub fn get(&self, conversation_id: i64) -> Result<Option<Conversation>, TranscriptStoreError> {
        let header = self
            .conn
            .query_row(
                "SELECT id, name, model, created_at, updated_at, total_cost, total_tokens
                 FROM conversations WHERE id = ?1",
                params![conversation_id],
                |row| {
                    Ok(Conversation {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        model: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                        turns: Vec::new(),
                        total_cost: row.get(5)?,
                        total_tokens: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(|source| TranscriptStoreError::sqlite("reading conversation", source))?;

        let Some(mut conversation) = header else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, role, content, timestamp, citations, usage, cost
                 FROM turns WHERE conversation_id = ?1 ORDER BY id",
            )
            .map_err(|source| TranscriptStoreError::sqlite("preparing turn read", source))?;
        let turns = stmt
            .query_map(params![conversation_id], turn_from_row)
            .map_err(|source| TranscriptStoreError::sqlite("reading turns", source))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| TranscriptStoreError::sqlite("decoding turns", source))?;

        conversation.turns = turns;
        Ok(Some(conversation))
    }

    /// Most-recently-updated conversations first, with derived turn counts.
    pub fn list(&self, limit: usize) -> Result<Vec<ConversationSummary>, TranscriptStoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, model, created_at, updated_at, total_cost, total_tokens,
                        (SELECT COUNT(*) FROM turns WHERE conversation_id = conversations.id)
                 FROM conversations ORDER BY updated_at DESC, id DESC LIMIT ?1",
            )
            .map_err(|source| TranscriptStoreError::sqlite("preparing list", source))?;
        let summaries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ConversationSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    model: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                    total_cost: row.get(5)?,
                    total_tokens: row.get(6)?,
                    turn_count: row.get(7)?,
                })
            })
            .map_err(|source| TranscriptStoreError::sqlite("listing conversations", source))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| TranscriptStoreError::sqlite("decoding summaries", source))?;
        Ok(summaries)
    }

    pub fn rename(&self, conversation_id: i64, name: &str) -> Result<(), TranscriptStoreError> {
        self.conn
            .execute(
                "UPDATE conversations SET name = ?1 WHERE id = ?2",
                params![name, conversation_id],
            )
            .map_err(|source| TranscriptStoreError::sqlite("renaming conversation", source))?;
        Ok(())
    }

    /// Delete a conversation and, through the cascade, every turn it owns.
    pub fn delete(&self, conversation_id: i64) -> Result<bool, TranscriptStoreError> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM conversations WHERE id = ?1",
                params![conversation_id],
            )
            .map_err(|source| TranscriptStoreError::sqlite("deleting conversation", source))?;
        Ok(removed > 0)
    }
}

fn turn_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Turn> {
    let role_text: String = row.get(1)?;
    let role = Role::parse(&role_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown turn role '{role_text}'").into(),
        )
    })?;

    let citations_text: String = row.get(4)?;
    let usage_text: String = row.get(5)?;
    let cost_text: String = row.get(6)?;
    let metadata = decode_metadata(&citations_text, &usage_text, &cost_text);

    Ok(Turn {
        id: row.get(0)?,
        role,
        content: row.get(2)?,
        timestamp: row.get(3)?,
        metadata,
    })
}

fn decode_metadata(citations: &str, usage: &str, cost: &str) -> Option<TurnMetadata> {
    if citations == "[]" && usage == "{}" && cost == "{}" {
        return None;
    }

    Some(TurnMetadata {
        citations: serde_json::from_str(citations).unwrap_or_default(),
        usage: serde_json::from_str(usage).unwrap_or_default(),
        cost: serde_json::from_str(cost).unwrap_or_default(),
    })
}

fn now_rfc3339() -> Result<String, TranscriptStoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(TranscriptStoreError::ClockFormat)
}
