/// User profile persistence
///
/// Wallet address and username are both unique; usernames must match
/// `^[a-zA-Z0-9_]+$` (enforced at the route layer and re-checked here).
use super::Database;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Invalid username regex"));

/// Validate a username against the allowed pattern
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_PATTERN.is_match(username)
}

/// Persisted user row
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub wallet_address: String,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get("id")?,
        wallet_address: row.get("wallet_address")?,
        username: row.get("username")?,
        profile_picture_url: row.get("profile_picture_url")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Outcome of a create-user request
#[derive(Debug)]
pub enum CreateUserOutcome {
    Created(UserRecord),
    AlreadyExists(UserRecord),
    UsernameTaken,
}

impl Database {
    pub fn user_by_wallet(&self, wallet: &str) -> rusqlite::Result<Option<UserRecord>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM users WHERE wallet_address = ?1 LIMIT 1",
            params![wallet],
            |row| row_to_user(row),
        )
        .optional()
    }

    /// Whether a username is free. An existing row owned by `exclude_wallet`
    /// does not count as taken (used when a user keeps their own name).
    pub fn is_username_available(
        &self,
        username: &str,
        exclude_wallet: Option<&str>,
    ) -> rusqlite::Result<bool> {
        let conn = self.conn();
        let taken: Option<i64> = match exclude_wallet {
            Some(wallet) => conn
                .query_row(
                    "SELECT id FROM users WHERE username = ?1 AND wallet_address != ?2 LIMIT 1",
                    params![username, wallet],
                    |row| row.get(0),
                )
                .optional()?,
            None => conn
                .query_row(
                    "SELECT id FROM users WHERE username = ?1 LIMIT 1",
                    params![username],
                    |row| row.get(0),
                )
                .optional()?,
        };
        Ok(taken.is_none())
    }

    /// Create a user if the wallet is unknown. Existing wallets get their
    /// current row back unchanged; a clashing username is rejected.
    pub fn create_user(
        &self,
        wallet: &str,
        username: &str,
    ) -> rusqlite::Result<CreateUserOutcome> {
        if let Some(existing) = self.user_by_wallet(wallet)? {
            return Ok(CreateUserOutcome::AlreadyExists(existing));
        }

        if !self.is_username_available(username, None)? {
            return Ok(CreateUserOutcome::UsernameTaken);
        }

        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (wallet_address, username) VALUES (?1, ?2)",
            params![wallet, username],
        )?;
        let id = conn.last_insert_rowid();
        let user = conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], |row| {
            row_to_user(row)
        })?;
        Ok(CreateUserOutcome::Created(user))
    }

    /// Update username and profile picture for an existing wallet.
    /// Returns Ok(None) when the wallet has no user row.
    pub fn update_user(
        &self,
        wallet: &str,
        username: &str,
        profile_picture_url: Option<&str>,
    ) -> rusqlite::Result<Option<UserRecord>> {
        let conn = self.conn();
        let updated = conn.execute(
            "UPDATE users
             SET username = ?1, profile_picture_url = ?2, updated_at = datetime('now')
             WHERE wallet_address = ?3",
            params![username, profile_picture_url, wallet],
        )?;

        if updated == 0 {
            return Ok(None);
        }

        conn.query_row(
            "SELECT * FROM users WHERE wallet_address = ?1",
            params![wallet],
            |row| row_to_user(row),
        )
        .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_pattern() {
        assert!(is_valid_username("Cool_Trader42"));
        assert!(is_valid_username("a"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("dash-ed"));
        assert!(!is_valid_username("émoji"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn test_create_then_fetch() {
        let db = Database::open_in_memory().unwrap();
        let outcome = db.create_user("walletA", "SwiftBuilder7").unwrap();
        assert!(matches!(outcome, CreateUserOutcome::Created(_)));

        let user = db.user_by_wallet("walletA").unwrap().unwrap();
        assert_eq!(user.username, "SwiftBuilder7");
    }

    #[test]
    fn test_existing_wallet_returns_current_row() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("walletA", "First").unwrap();
        let outcome = db.create_user("walletA", "Second").unwrap();

        match outcome {
            CreateUserOutcome::AlreadyExists(user) => assert_eq!(user.username, "First"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_username_collision_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("walletA", "Taken").unwrap();
        let outcome = db.create_user("walletB", "Taken").unwrap();
        assert!(matches!(outcome, CreateUserOutcome::UsernameTaken));
    }

    #[test]
    fn test_availability_excludes_own_wallet() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("walletA", "Mine").unwrap();

        assert!(!db.is_username_available("Mine", None).unwrap());
        assert!(db.is_username_available("Mine", Some("walletA")).unwrap());
        assert!(!db.is_username_available("Mine", Some("walletB")).unwrap());
    }

    #[test]
    fn test_update_unknown_wallet_is_none() {
        let db = Database::open_in_memory().unwrap();
        let result = db.update_user("ghost", "Name", None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_update_sets_fields() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("walletA", "Old").unwrap();

        let updated = db
            .update_user("walletA", "New", Some("https://cdn/img.png"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "New");
        assert_eq!(
            updated.profile_picture_url.as_deref(),
            Some("https://cdn/img.png")
        );
    }
}
