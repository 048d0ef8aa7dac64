/// Launch-attempt ledger
///
/// One row per launch attempt, written before any funds move and updated
/// at every step. An attempt stuck between `funded` and `recorded` means
/// SOL left the wallet without a finished launch; the listing endpoint
/// makes those visible for manual reconciliation.
use super::Database;
use rusqlite::{params, Row};
use serde::Serialize;

/// Ledger states, in flow order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Preparing,
    Prepared,
    Funded,
    Confirmed,
    Finalized,
    Recorded,
    Failed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Preparing => "preparing",
            AttemptStatus::Prepared => "prepared",
            AttemptStatus::Funded => "funded",
            AttemptStatus::Confirmed => "confirmed",
            AttemptStatus::Finalized => "finalized",
            AttemptStatus::Recorded => "recorded",
            AttemptStatus::Failed => "failed",
        }
    }

    /// Terminal states need no reconciliation
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptStatus::Recorded | AttemptStatus::Failed)
    }
}

/// Persisted ledger row
#[derive(Debug, Clone, Serialize)]
pub struct LaunchAttemptRecord {
    pub attempt_id: String,
    pub platform: String,
    pub wallet: String,
    pub request_id: Option<String>,
    pub funding_wallet: Option<String>,
    pub base_fee: Option<f64>,
    pub user_amount: f64,
    pub signature: Option<String>,
    pub mint: Option<String>,
    pub status: String,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_attempt(row: &Row<'_>) -> rusqlite::Result<LaunchAttemptRecord> {
    Ok(LaunchAttemptRecord {
        attempt_id: row.get("attempt_id")?,
        platform: row.get("platform")?,
        wallet: row.get("wallet")?,
        request_id: row.get("request_id")?,
        funding_wallet: row.get("funding_wallet")?,
        base_fee: row.get("base_fee")?,
        user_amount: row.get("user_amount")?,
        signature: row.get("signature")?,
        mint: row.get("mint")?,
        status: row.get("status")?,
        error: row.get("error")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Database {
    /// Open a ledger row for a new attempt (status: preparing)
    pub fn create_attempt(
        &self,
        attempt_id: &str,
        platform: &str,
        wallet: &str,
        user_amount: f64,
    ) -> rusqlite::Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO launch_attempts (attempt_id, platform, wallet, user_amount, status)
             VALUES (?1, ?2, ?3, ?4, 'preparing')",
            params![attempt_id, platform, wallet, user_amount],
        )?;
        Ok(())
    }

    /// Record the preparation result on the ledger row
    pub fn mark_attempt_prepared(
        &self,
        attempt_id: &str,
        request_id: &str,
        funding_wallet: &str,
        base_fee: f64,
    ) -> rusqlite::Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE launch_attempts
             SET status = 'prepared', request_id = ?2, funding_wallet = ?3,
                 base_fee = ?4, updated_at = datetime('now')
             WHERE attempt_id = ?1",
            params![attempt_id, request_id, funding_wallet, base_fee],
        )?;
        Ok(())
    }

    /// Advance the ledger row to a new status, optionally attaching the
    /// funding signature or the resulting mint address
    pub fn advance_attempt(
        &self,
        attempt_id: &str,
        status: AttemptStatus,
        signature: Option<&str>,
        mint: Option<&str>,
    ) -> rusqlite::Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE launch_attempts
             SET status = ?2,
                 signature = COALESCE(?3, signature),
                 mint = COALESCE(?4, mint),
                 updated_at = datetime('now')
             WHERE attempt_id = ?1",
            params![attempt_id, status.as_str(), signature, mint],
        )?;
        Ok(())
    }

    /// Mark an attempt failed with the captured error message
    pub fn fail_attempt(&self, attempt_id: &str, error: &str) -> rusqlite::Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE launch_attempts
             SET status = 'failed', error = ?2, updated_at = datetime('now')
             WHERE attempt_id = ?1",
            params![attempt_id, error],
        )?;
        Ok(())
    }

    /// All ledger rows, newest first
    pub fn list_attempts(&self, limit: usize) -> rusqlite::Result<Vec<LaunchAttemptRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT * FROM launch_attempts ORDER BY created_at DESC, attempt_id LIMIT ?1")?;
        let rows = stmt.query_map(params![limit as i64], |row| row_to_attempt(row))?;
        rows.collect()
    }

    /// Attempts where funds moved but the flow never finished
    pub fn stuck_attempts(&self) -> rusqlite::Result<Vec<LaunchAttemptRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM launch_attempts
             WHERE status IN ('funded', 'confirmed', 'finalized')
             ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], |row| row_to_attempt(row))?;
        rows.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        db.create_attempt("a1", "meteora", "walletA", 0.1).unwrap();

        db.mark_attempt_prepared("a1", "req-1", "FundingWallet111", 0.05)
            .unwrap();
        db.advance_attempt("a1", AttemptStatus::Funded, Some("sig-1"), None)
            .unwrap();
        db.advance_attempt("a1", AttemptStatus::Confirmed, None, None)
            .unwrap();
        db.advance_attempt("a1", AttemptStatus::Finalized, None, Some("Mint111"))
            .unwrap();
        db.advance_attempt("a1", AttemptStatus::Recorded, None, None)
            .unwrap();

        let attempts = db.list_attempts(10).unwrap();
        assert_eq!(attempts.len(), 1);
        let attempt = &attempts[0];
        assert_eq!(attempt.status, "recorded");
        assert_eq!(attempt.signature.as_deref(), Some("sig-1"));
        assert_eq!(attempt.mint.as_deref(), Some("Mint111"));
        assert_eq!(attempt.base_fee, Some(0.05));
    }

    #[test]
    fn test_stuck_attempts_only_mid_flight_rows() {
        let db = Database::open_in_memory().unwrap();

        db.create_attempt("done", "meteora", "w", 0.1).unwrap();
        db.advance_attempt("done", AttemptStatus::Recorded, None, None)
            .unwrap();

        db.create_attempt("stuck", "raydium", "w", 0.5).unwrap();
        db.advance_attempt("stuck", AttemptStatus::Funded, Some("sig"), None)
            .unwrap();

        db.create_attempt("failed-early", "pumpfun", "w", 1.0).unwrap();
        db.fail_attempt("failed-early", "preparation failed").unwrap();

        let stuck = db.stuck_attempts().unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].attempt_id, "stuck");
    }

    #[test]
    fn test_failed_attempt_keeps_error() {
        let db = Database::open_in_memory().unwrap();
        db.create_attempt("a1", "pumpfun", "w", 1.0).unwrap();
        db.fail_attempt("a1", "Transaction Error: blockhash expired")
            .unwrap();

        let attempts = db.list_attempts(10).unwrap();
        assert_eq!(attempts[0].status, "failed");
        assert!(attempts[0].error.as_deref().unwrap().contains("blockhash"));
    }
}
