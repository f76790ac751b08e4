use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{Product, ProductCatalog, ProductDraft, ProductPatch};
use crate::history::{ChatMessage, MessageLog, NewMessage};
use crate::identity::AccountDirectory;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chat_messages (
    id          TEXT PRIMARY KEY,
    username    TEXT NOT NULL,
    message     TEXT NOT NULL,
    user_color  TEXT NOT NULL,
    created_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS chat_messages_created_at ON chat_messages (created_at DESC);

CREATE TABLE IF NOT EXISTS accounts (
    id     TEXT PRIMARY KEY,
    email  TEXT NOT NULL UNIQUE,
    role   TEXT NOT NULL DEFAULT 'user'
);

CREATE TABLE IF NOT EXISTS products (
    id           TEXT PRIMARY KEY,
    nombre       TEXT NOT NULL,
    descripcion  TEXT NOT NULL,
    precio       REAL NOT NULL,
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER NOT NULL
);
";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database connection lock poisoned")]
    Poisoned,
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// SQLite database behind the chat log, the account directory and the
/// product list.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&*conn).map_err(StoreError::from)
        })
        .await?
    }

    #[cfg(test)]
    pub async fn insert_account(
        &self,
        id: &str,
        email: &str,
        role: crate::identity::Role,
    ) -> Result<(), StoreError> {
        let (id, email) = (id.to_string(), email.to_string());
        let role = match role {
            crate::identity::Role::User => "user",
            crate::identity::Role::Admin => "admin",
        };
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO accounts (id, email, role) VALUES (?1, ?2, ?3)",
                params![id, email, role],
            )
            .map(|_| ())
        })
        .await
    }
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.get(0)?,
        username: row.get(1)?,
        message: row.get(2)?,
        user_color: row.get(3)?,
        created_at: from_millis(row.get(4)?),
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        nombre: row.get(1)?,
        descripcion: row.get(2)?,
        precio: row.get(3)?,
        created_at: from_millis(row.get(4)?),
        updated_at: from_millis(row.get(5)?),
    })
}

#[async_trait]
impl MessageLog for SqliteStore {
    async fn append(&self, message: NewMessage) -> Result<ChatMessage, StoreError> {
        let stored = ChatMessage {
            id: Uuid::new_v4().to_string(),
            username: message.username,
            message: message.message,
            user_color: message.user_color,
            created_at: from_millis(Utc::now().timestamp_millis()),
        };
        let row = stored.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO chat_messages (id, username, message, user_color, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.id,
                    row.username,
                    row.message,
                    row.user_color,
                    row.created_at.timestamp_millis()
                ],
            )
        })
        .await?;
        Ok(stored)
    }

    async fn latest(&self, limit: usize) -> Result<Vec<ChatMessage>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, message, user_color, created_at
                 FROM chat_messages
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map([limit], message_from_row)?;
            rows.collect()
        })
        .await
    }
}

#[async_trait]
impl AccountDirectory for SqliteStore {
    async fn find_email(&self, id: &str) -> Result<Option<String>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.query_row("SELECT email FROM accounts WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()
        })
        .await
    }
}

#[async_trait]
impl ProductCatalog for SqliteStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, nombre, descripcion, precio, created_at, updated_at
                 FROM products
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt.query_map([], product_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn create(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let now = from_millis(Utc::now().timestamp_millis());
        let product = Product {
            id: Uuid::new_v4().to_string(),
            nombre: draft.nombre,
            descripcion: draft.descripcion,
            precio: draft.precio,
            created_at: now,
            updated_at: now,
        };
        let row = product.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO products (id, nombre, descripcion, precio, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id,
                    row.nombre,
                    row.descripcion,
                    row.precio,
                    row.created_at.timestamp_millis(),
                    row.updated_at.timestamp_millis()
                ],
            )
        })
        .await?;
        Ok(product)
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let existing = conn
                .query_row(
                    "SELECT id, nombre, descripcion, precio, created_at, updated_at
                     FROM products WHERE id = ?1",
                    [&id],
                    product_from_row,
                )
                .optional()?;
            let Some(mut product) = existing else {
                return Ok(None);
            };

            patch.apply(&mut product);
            product.updated_at = from_millis(Utc::now().timestamp_millis());
            conn.execute(
                "UPDATE products SET nombre = ?2, descripcion = ?3, precio = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![
                    product.id,
                    product.nombre,
                    product.descripcion,
                    product.precio,
                    product.updated_at.timestamp_millis()
                ],
            )?;
            Ok(Some(product))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM products WHERE id = ?1", [id])
                .map(|deleted| deleted > 0)
        })
        .await
    }
}
