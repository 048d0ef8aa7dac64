/// Token persistence: one row per successfully launched token.
///
/// Rows are write-once from the launch flow; listing endpoints read them.
use super::Database;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// Payload accepted for a new token row
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewToken {
    pub mint_address: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub creator_wallet: String,
    #[serde(default)]
    pub developer_wallet: Option<String>,
    #[serde(default)]
    pub initial_buy_amount: Option<f64>,
    #[serde(default)]
    pub initial_supply: Option<i64>,
    #[serde(default)]
    pub decimals: Option<i64>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub referral_wallet: Option<String>,
    #[serde(default)]
    pub dev_fee_percentage: Option<f64>,
    #[serde(default)]
    pub bonding_curve_type: Option<i64>,
    #[serde(default)]
    pub tax_tier: Option<f64>,
    #[serde(default)]
    pub pool_tax: Option<f64>,
    #[serde(default)]
    pub mode: Option<i64>,
    #[serde(default)]
    pub reward_ca: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub visible: Option<i64>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Persisted token row
#[derive(Debug, Clone, Serialize)]
pub struct TokenRecord {
    pub id: i64,
    pub mint_address: String,
    pub name: String,
    pub symbol: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub creator_wallet: String,
    pub developer_wallet: Option<String>,
    pub initial_buy_amount: Option<f64>,
    pub initial_supply: i64,
    pub decimals: i64,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub referral_wallet: Option<String>,
    pub dev_fee_percentage: Option<f64>,
    pub bonding_curve_type: Option<i64>,
    pub tax_tier: Option<f64>,
    pub mode: Option<i64>,
    pub reward_ca: Option<String>,
    pub request_id: Option<String>,
    pub visible: Option<i64>,
    pub platform: String,
    pub launch_status: String,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_token(row: &Row<'_>) -> rusqlite::Result<TokenRecord> {
    Ok(TokenRecord {
        id: row.get("id")?,
        mint_address: row.get("mint_address")?,
        name: row.get("name")?,
        symbol: row.get("symbol")?,
        description: row.get("description")?,
        image_url: row.get("image_url")?,
        creator_wallet: row.get("creator_wallet")?,
        developer_wallet: row.get("developer_wallet")?,
        initial_buy_amount: row.get("initial_buy_amount")?,
        initial_supply: row.get("initial_supply")?,
        decimals: row.get("decimals")?,
        website: row.get("website")?,
        twitter: row.get("twitter")?,
        telegram: row.get("telegram")?,
        referral_wallet: row.get("referral_wallet")?,
        dev_fee_percentage: row.get("dev_fee_percentage")?,
        bonding_curve_type: row.get("bonding_curve_type")?,
        tax_tier: row.get("tax_tier")?,
        mode: row.get("mode")?,
        reward_ca: row.get("reward_ca")?,
        request_id: row.get("request_id")?,
        visible: row.get("visible")?,
        platform: row.get("platform")?,
        launch_status: row.get("launch_status")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Database {
    /// Insert a launched token. launch_status is always "completed": a row
    /// only exists after finalization succeeded.
    pub fn insert_token(&self, token: &NewToken, platform: &str) -> rusqlite::Result<TokenRecord> {
        let conn = self.conn();

        conn.execute(
            "INSERT INTO tokens (
                mint_address, name, symbol, description, image_url,
                creator_wallet, developer_wallet, initial_buy_amount,
                initial_supply, decimals, website, twitter, telegram,
                referral_wallet, dev_fee_percentage, bonding_curve_type,
                tax_tier, mode, reward_ca, request_id, visible, platform,
                launch_status
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, 'completed'
            )",
            params![
                token.mint_address,
                token.name,
                token.symbol,
                token.description,
                token.image_url,
                token.creator_wallet,
                token.developer_wallet,
                token.initial_buy_amount,
                token.initial_supply.unwrap_or(1_000_000_000),
                token.decimals.unwrap_or(9),
                token.website,
                token.twitter,
                token.telegram,
                token.referral_wallet,
                token.dev_fee_percentage,
                token.bonding_curve_type,
                token.tax_tier.or(token.pool_tax),
                token.mode,
                token.reward_ca,
                token.request_id,
                token.visible,
                platform,
            ],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row("SELECT * FROM tokens WHERE id = ?1", params![id], |row| {
            row_to_token(row)
        })
    }

    /// Tokens created by or developed by a wallet, newest first
    pub fn tokens_by_wallet(&self, wallet: &str) -> rusqlite::Result<Vec<TokenRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM tokens
             WHERE creator_wallet = ?1 OR developer_wallet = ?1
             ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![wallet], |row| row_to_token(row))?;
        rows.collect()
    }

    /// Most recent tokens across all wallets
    pub fn recent_tokens(&self, limit: usize) -> rusqlite::Result<Vec<TokenRecord>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT * FROM tokens ORDER BY created_at DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit as i64], |row| row_to_token(row))?;
        rows.collect()
    }

    /// Look up a token by mint address
    pub fn token_by_mint(&self, mint: &str) -> rusqlite::Result<Option<TokenRecord>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM tokens WHERE mint_address = ?1",
            params![mint],
            |row| row_to_token(row),
        )
        .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token(mint: &str) -> NewToken {
        NewToken {
            mint_address: mint.to_string(),
            name: "Test Token".to_string(),
            symbol: "TEST".to_string(),
            creator_wallet: "wallet1".to_string(),
            developer_wallet: Some("wallet1".to_string()),
            initial_buy_amount: Some(0.1),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_applies_defaults() {
        let db = Database::open_in_memory().unwrap();
        let record = db.insert_token(&sample_token("mint1"), "meteora").unwrap();

        assert_eq!(record.initial_supply, 1_000_000_000);
        assert_eq!(record.decimals, 9);
        assert_eq!(record.launch_status, "completed");
        assert_eq!(record.platform, "meteora");
    }

    #[test]
    fn test_duplicate_mint_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.insert_token(&sample_token("mint1"), "meteora").unwrap();
        assert!(db.insert_token(&sample_token("mint1"), "meteora").is_err());
    }

    #[test]
    fn test_pool_tax_falls_back_into_tax_tier() {
        let db = Database::open_in_memory().unwrap();
        let mut token = sample_token("mint2");
        token.pool_tax = Some(4.0);
        let record = db.insert_token(&token, "raydium").unwrap();
        assert_eq!(record.tax_tier, Some(4.0));
    }

    #[test]
    fn test_tokens_by_wallet_matches_creator_or_developer() {
        let db = Database::open_in_memory().unwrap();
        db.insert_token(&sample_token("mint1"), "meteora").unwrap();

        let mut other = sample_token("mint2");
        other.creator_wallet = "wallet2".to_string();
        other.developer_wallet = Some("wallet1".to_string());
        db.insert_token(&other, "pumpfun").unwrap();

        let listed = db.tokens_by_wallet("wallet1").unwrap();
        assert_eq!(listed.len(), 2);

        let listed = db.tokens_by_wallet("wallet2").unwrap();
        assert_eq!(listed.len(), 1);
    }
}
