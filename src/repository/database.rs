use anyhow::{Context, Result};
use rusqlite::Connection;

pub struct Database {
    pub conn: Connection,
}

impl Database {
    /// Opens (or creates) the database at `db_path`; `sqlite:` prefixes are
    /// accepted and `:memory:` gives a private in-memory database.
    pub fn new(db_path: &str) -> Result<Self> {
        let db_path = db_path.strip_prefix("sqlite:").unwrap_or(db_path);
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(db_path)
        }
        .with_context(|| format!("Failed to open database {db_path}"))?;

        let db = Database { conn };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS wallet_checkpoints (
                wallet TEXT PRIMARY KEY,
                last_scanned_block INTEGER,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        // token_id holds 78-digit zero-padded decimals so ORDER BY is numeric
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS wallet_tokens (
                wallet TEXT NOT NULL,
                token_id TEXT NOT NULL,
                PRIMARY KEY (wallet, token_id),
                FOREIGN KEY (wallet) REFERENCES wallet_checkpoints(wallet)
            )",
            [],
        )?;

        Ok(())
    }
}
