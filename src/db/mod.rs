/// SQLite persistence for tokens, users, AI configurations and the
/// launch-attempt ledger.
use crate::logger::{self, LogTag};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

mod agents;
mod attempts;
mod tokens;
mod users;

pub use agents::{AgentRecord, CreateAgentOutcome, KnowledgeFile, NewAgent};
pub use attempts::{AttemptStatus, LaunchAttemptRecord};
pub use tokens::{NewToken, TokenRecord};
pub use users::{is_valid_username, CreateUserOutcome, UserRecord};

/// Configure a connection for concurrency and durability
fn configure_connection(connection: &Connection) -> rusqlite::Result<()> {
    connection.pragma_update(None, "journal_mode", "WAL")?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    connection.pragma_update(None, "temp_store", "memory")?;
    connection.busy_timeout(std::time::Duration::from_millis(30_000))?;
    Ok(())
}

/// Application database handle
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at the standard path
    pub fn open() -> rusqlite::Result<Self> {
        let connection = Connection::open(crate::paths::database_path())?;
        configure_connection(&connection)?;
        let db = Self {
            connection: Arc::new(Mutex::new(connection)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// In-memory database for tests
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let connection = Connection::open_in_memory()?;
        let db = Self {
            connection: Arc::new(Mutex::new(connection)),
        };
        db.init_schema()?;
        Ok(db)
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        let conn = self.conn();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mint_address TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL,
                description TEXT,
                image_url TEXT,
                creator_wallet TEXT NOT NULL,
                developer_wallet TEXT,
                initial_buy_amount REAL,
                initial_supply INTEGER NOT NULL DEFAULT 1000000000,
                decimals INTEGER NOT NULL DEFAULT 9,
                website TEXT,
                twitter TEXT,
                telegram TEXT,
                referral_wallet TEXT,
                dev_fee_percentage REAL,
                bonding_curve_type INTEGER,
                tax_tier REAL,
                mode INTEGER,
                reward_ca TEXT,
                request_id TEXT,
                visible INTEGER,
                platform TEXT NOT NULL,
                launch_status TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tokens_creator ON tokens(creator_wallet)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tokens_created_at ON tokens(created_at DESC)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wallet_address TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                profile_picture_url TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS ai_configurations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                wallet_address TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                prompt TEXT NOT NULL,
                model TEXT NOT NULL,
                tools_web_search INTEGER NOT NULL DEFAULT 0,
                tools_code_execution INTEGER NOT NULL DEFAULT 0,
                tools_image_generation INTEGER NOT NULL DEFAULT 0,
                tools_data_analysis INTEGER NOT NULL DEFAULT 0,
                knowledge_base_files TEXT NOT NULL DEFAULT '[]',
                is_public INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_ai_configs_wallet ON ai_configurations(wallet_address)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_ai_configs_name ON ai_configurations(name)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS launch_attempts (
                attempt_id TEXT PRIMARY KEY,
                platform TEXT NOT NULL,
                wallet TEXT NOT NULL,
                request_id TEXT,
                funding_wallet TEXT,
                base_fee REAL,
                user_amount REAL NOT NULL,
                signature TEXT,
                mint TEXT,
                status TEXT NOT NULL,
                error TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_attempts_status ON launch_attempts(status)",
            [],
        )?;

        // Only log on first initialization to avoid spam from test databases
        static SCHEMA_READY: std::sync::Once = std::sync::Once::new();
        SCHEMA_READY.call_once(|| {
            logger::debug(LogTag::Database, "Schema initialized");
        });

        Ok(())
    }
}

// =============================================================================
// GLOBAL DATABASE
// =============================================================================

static DATABASE: OnceCell<Database> = OnceCell::new();

/// Open and install the global database
pub fn init_database() -> rusqlite::Result<()> {
    let db = Database::open()?;
    let _ = DATABASE.set(db);
    logger::info(LogTag::Database, "Database initialized");
    Ok(())
}

/// Get the global database. Panics if init_database was never called.
pub fn get_database() -> &'static Database {
    DATABASE
        .get()
        .expect("Database not initialized - call init_database() first")
}
