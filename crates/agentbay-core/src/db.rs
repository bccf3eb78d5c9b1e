// SQLite persistence for the local side of the storefront: sessions, account
// profiles, the bid log, search history and listing drafts.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::account::{Account, UserType};
use crate::bid::BidRequest;
use crate::listing::ListingForm;

/// A bid this client placed, as remembered locally.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedBid {
    pub bid_id: String,
    pub product_id: i64,
    pub product_title: String,
    pub user_id: String,
    pub amount: f64,
    pub placed_at: String,
}

/// A past recommendation query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRecord {
    pub mode: String,
    pub query: String,
    pub result_count: usize,
    pub searched_at: String,
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS session (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS accounts (
                email      TEXT PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name  TEXT NOT NULL,
                user_type  TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS bid_log (
                bid_id        TEXT PRIMARY KEY,
                product_id    INTEGER NOT NULL,
                product_title TEXT NOT NULL,
                user_id       TEXT NOT NULL,
                amount        REAL NOT NULL,
                placed_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS search_history (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                mode         TEXT NOT NULL,
                query        TEXT NOT NULL,
                result_count INTEGER NOT NULL,
                searched_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS listing_drafts (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                form       TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned, which only happens after another
    /// thread panicked mid-query.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Session (key-value)
    // ------------------------------------------------------------------

    const SESSION_EMAIL_KEY: &'static str = "signed_in_email";

    /// Persist an arbitrary JSON value under `key`.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO session (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM session WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query session state")?;

        json_str
            .map(|s| serde_json::from_str(&s).context("failed to deserialize state value"))
            .transpose()
    }

    pub fn delete_state(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM session WHERE key = ?1", params![key])
            .context("failed to delete state")?;
        Ok(())
    }

    /// Remember `email` as signed in across restarts.
    pub fn remember_session(&self, email: &str) -> Result<()> {
        self.save_state(
            Self::SESSION_EMAIL_KEY,
            &serde_json::Value::String(email.to_string()),
        )
    }

    /// The remembered account, if its profile still exists.
    pub fn remembered_session(&self) -> Result<Option<Account>> {
        let email = self
            .load_state(Self::SESSION_EMAIL_KEY)?
            .and_then(|v| v.as_str().map(str::to_string));
        match email {
            Some(email) => self.find_account(&email),
            None => Ok(None),
        }
    }

    pub fn forget_session(&self) -> Result<()> {
        self.delete_state(Self::SESSION_EMAIL_KEY)
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Store a new profile. Returns `false` when the email is already
    /// registered (the existing profile is left alone).
    pub fn insert_account(&self, account: &Account) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO accounts (email, first_name, last_name, user_type)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    account.email,
                    account.first_name,
                    account.last_name,
                    account.user_type.as_str(),
                ],
            )
            .context("failed to insert account")?;
        Ok(changed == 1)
    }

    pub fn find_account(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT email, first_name, last_name, user_type FROM accounts WHERE email = ?1",
            params![email.trim().to_lowercase()],
            |row| {
                let user_type: String = row.get(3)?;
                Ok(Account {
                    email: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    user_type: UserType::from_str_lossy(&user_type),
                })
            },
        )
        .optional()
        .context("failed to look up account")
    }

    // ------------------------------------------------------------------
    // Bid log
    // ------------------------------------------------------------------

    /// Remember a bid the backend accepted. Re-logging the same `bid_id` is
    /// a no-op.
    pub fn log_bid(&self, product_id: i64, product_title: &str, bid: &BidRequest) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR IGNORE INTO bid_log (bid_id, product_id, product_title, user_id, amount)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![bid.bid_id, product_id, product_title, bid.user_id, bid.amount],
            )
            .context("failed to log bid")?;
        Ok(())
    }

    /// Most recent bids first.
    pub fn recent_bids(&self, limit: usize) -> Result<Vec<LoggedBid>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT bid_id, product_id, product_title, user_id, amount, placed_at
                 FROM bid_log ORDER BY placed_at DESC, rowid DESC LIMIT ?1",
            )
            .context("failed to prepare recent_bids query")?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(LoggedBid {
                    bid_id: row.get(0)?,
                    product_id: row.get(1)?,
                    product_title: row.get(2)?,
                    user_id: row.get(3)?,
                    amount: row.get(4)?,
                    placed_at: row.get(5)?,
                })
            })
            .context("failed to query bid log")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read bid log row")?;
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Search history
    // ------------------------------------------------------------------

    pub fn record_search(&self, mode: &str, query: &str, result_count: usize) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO search_history (mode, query, result_count) VALUES (?1, ?2, ?3)",
                params![mode, query, result_count as i64],
            )
            .context("failed to record search")?;
        Ok(())
    }

    /// Most recent searches first.
    pub fn recent_searches(&self, limit: usize) -> Result<Vec<SearchRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT mode, query, result_count, searched_at
                 FROM search_history ORDER BY id DESC LIMIT ?1",
            )
            .context("failed to prepare recent_searches query")?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let count: i64 = row.get(2)?;
                Ok(SearchRecord {
                    mode: row.get(0)?,
                    query: row.get(1)?,
                    result_count: count.max(0) as usize,
                    searched_at: row.get(3)?,
                })
            })
            .context("failed to query search history")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read search history row")?;
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Listing drafts
    // ------------------------------------------------------------------

    /// Save the listing form as the current draft, replacing any earlier one.
    pub fn save_listing_draft(&self, form: &ListingForm) -> Result<()> {
        let json = serde_json::to_string(form).context("failed to serialize listing draft")?;
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM listing_drafts", [])
            .context("failed to clear previous listing draft")?;
        tx.execute("INSERT INTO listing_drafts (form) VALUES (?1)", params![json])
            .context("failed to save listing draft")?;
        tx.commit().context("failed to commit listing draft")?;
        Ok(())
    }

    pub fn load_listing_draft(&self) -> Result<Option<ListingForm>> {
        let conn = self.conn();
        let json: Option<String> = conn
            .query_row(
                "SELECT form FROM listing_drafts ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query listing draft")?;
        json.map(|s| serde_json::from_str(&s).context("failed to deserialize listing draft"))
            .transpose()
    }

    pub fn clear_listing_draft(&self) -> Result<()> {
        self.conn()
            .execute("DELETE FROM listing_drafts", [])
            .context("failed to clear listing draft")?;
        Ok(())
    }
}
