/// AI agent configuration persistence
use super::Database;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// Descriptor of one uploaded knowledge-base file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFile {
    pub name: String,
    pub url: String,
    pub size: u64,
}

/// Payload for a new agent configuration
#[derive(Debug, Clone, Default)]
pub struct NewAgent {
    pub wallet_address: String,
    pub name: String,
    pub description: String,
    pub prompt: String,
    pub model: String,
    pub tools_web_search: bool,
    pub tools_code_execution: bool,
    pub tools_image_generation: bool,
    pub tools_data_analysis: bool,
    pub knowledge_base_files: Vec<KnowledgeFile>,
    pub is_public: bool,
}

/// Persisted agent configuration row
#[derive(Debug, Clone, Serialize)]
pub struct AgentRecord {
    pub id: i64,
    pub user_id: i64,
    pub wallet_address: String,
    pub name: String,
    pub description: String,
    pub prompt: String,
    pub model: String,
    pub tools_web_search: bool,
    pub tools_code_execution: bool,
    pub tools_image_generation: bool,
    pub tools_data_analysis: bool,
    pub knowledge_base_files: serde_json::Value,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_agent(row: &Row<'_>) -> rusqlite::Result<AgentRecord> {
    let files_raw: String = row.get("knowledge_base_files")?;
    Ok(AgentRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        wallet_address: row.get("wallet_address")?,
        name: row.get("name")?,
        description: row.get("description")?,
        prompt: row.get("prompt")?,
        model: row.get("model")?,
        tools_web_search: row.get::<_, i64>("tools_web_search")? != 0,
        tools_code_execution: row.get::<_, i64>("tools_code_execution")? != 0,
        tools_image_generation: row.get::<_, i64>("tools_image_generation")? != 0,
        tools_data_analysis: row.get::<_, i64>("tools_data_analysis")? != 0,
        knowledge_base_files: serde_json::from_str(&files_raw)
            .unwrap_or(serde_json::Value::Array(vec![])),
        is_public: row.get::<_, i64>("is_public")? != 0,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Outcome of an agent-creation request
#[derive(Debug)]
pub enum CreateAgentOutcome {
    Created(AgentRecord),
    NameTaken,
    UserNotFound,
}

impl Database {
    /// Insert an agent configuration. The name must be globally unique and
    /// the owning wallet must already have a user row.
    pub fn create_agent(&self, agent: &NewAgent) -> rusqlite::Result<CreateAgentOutcome> {
        if self.agent_by_name(&agent.name)?.is_some() {
            return Ok(CreateAgentOutcome::NameTaken);
        }

        let user = match self.user_by_wallet(&agent.wallet_address)? {
            Some(user) => user,
            None => return Ok(CreateAgentOutcome::UserNotFound),
        };

        let files_json = serde_json::to_string(&agent.knowledge_base_files)
            .unwrap_or_else(|_| "[]".to_string());

        let conn = self.conn();
        conn.execute(
            "INSERT INTO ai_configurations (
                user_id, wallet_address, name, description, prompt, model,
                tools_web_search, tools_code_execution, tools_image_generation,
                tools_data_analysis, knowledge_base_files, is_public
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                user.id,
                agent.wallet_address,
                agent.name,
                agent.description,
                agent.prompt,
                agent.model,
                agent.tools_web_search as i64,
                agent.tools_code_execution as i64,
                agent.tools_image_generation as i64,
                agent.tools_data_analysis as i64,
                files_json,
                agent.is_public as i64,
            ],
        )?;

        let id = conn.last_insert_rowid();
        let record = conn.query_row(
            "SELECT * FROM ai_configurations WHERE id = ?1",
            params![id],
            |row| row_to_agent(row),
        )?;
        Ok(CreateAgentOutcome::Created(record))
    }

    pub fn agent_by_id(&self, id: i64) -> rusqlite::Result<Option<AgentRecord>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM ai_configurations WHERE id = ?1",
            params![id],
            |row| row_to_agent(row),
        )
        .optional()
    }

    pub fn agent_by_name(&self, name: &str) -> rusqlite::Result<Option<AgentRecord>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM ai_configurations WHERE name = ?1 LIMIT 1",
            params![name],
            |row| row_to_agent(row),
        )
        .optional()
    }

    /// Agents owned by a wallet, newest first
    pub fn agents_by_wallet(&self, wallet: &str) -> rusqlite::Result<Vec<AgentRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM ai_configurations WHERE wallet_address = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![wallet], |row| row_to_agent(row))?;
        rows.collect()
    }

    /// Public agents, newest first
    pub fn public_agents(&self, limit: usize) -> rusqlite::Result<Vec<AgentRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM ai_configurations WHERE is_public = 1
             ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| row_to_agent(row))?;
        rows.collect()
    }

    /// Most recently created public agent
    pub fn latest_public_agent(&self) -> rusqlite::Result<Option<AgentRecord>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM ai_configurations WHERE is_public = 1
             ORDER BY created_at DESC, id DESC LIMIT 1",
            [],
            |row| row_to_agent(row),
        )
        .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_named(name: &str, wallet: &str) -> NewAgent {
        NewAgent {
            wallet_address: wallet.to_string(),
            name: name.to_string(),
            description: "test agent".to_string(),
            prompt: "You are helpful".to_string(),
            model: "gpt-4o-mini".to_string(),
            is_public: true,
            ..Default::default()
        }
    }

    fn db_with_user(wallet: &str) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user(wallet, "Owner1").unwrap();
        db
    }

    #[test]
    fn test_create_and_read_back() {
        let db = db_with_user("walletA");
        let outcome = db.create_agent(&agent_named("Helper", "walletA")).unwrap();

        match outcome {
            CreateAgentOutcome::Created(agent) => {
                assert_eq!(agent.name, "Helper");
                assert!(agent.is_public);
                assert_eq!(agent.knowledge_base_files, serde_json::json!([]));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_name_rejected_without_second_row() {
        let db = db_with_user("walletA");
        db.create_agent(&agent_named("Helper", "walletA")).unwrap();

        let outcome = db.create_agent(&agent_named("Helper", "walletA")).unwrap();
        assert!(matches!(outcome, CreateAgentOutcome::NameTaken));

        let listed = db.agents_by_wallet("walletA").unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_unknown_wallet_rejected() {
        let db = Database::open_in_memory().unwrap();
        let outcome = db.create_agent(&agent_named("Helper", "ghost")).unwrap();
        assert!(matches!(outcome, CreateAgentOutcome::UserNotFound));
    }

    #[test]
    fn test_public_listing_excludes_private() {
        let db = db_with_user("walletA");
        db.create_agent(&agent_named("PublicOne", "walletA")).unwrap();

        let mut private = agent_named("PrivateOne", "walletA");
        private.is_public = false;
        db.create_agent(&private).unwrap();

        let listed = db.public_agents(50).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "PublicOne");
    }

    #[test]
    fn test_knowledge_files_round_trip() {
        let db = db_with_user("walletA");
        let mut agent = agent_named("WithFiles", "walletA");
        agent.knowledge_base_files = vec![KnowledgeFile {
            name: "notes.pdf".to_string(),
            url: "https://blob/notes.pdf".to_string(),
            size: 1024,
        }];

        let outcome = db.create_agent(&agent).unwrap();
        match outcome {
            CreateAgentOutcome::Created(record) => {
                let files = record.knowledge_base_files.as_array().unwrap();
                assert_eq!(files.len(), 1);
                assert_eq!(files[0]["name"], "notes.pdf");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
