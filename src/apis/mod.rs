/// External API clients: LLM providers, the revshare statistics service,
/// and the solscan metadata proxy target.
pub mod llm;
pub mod revshare;
pub mod solscan;
