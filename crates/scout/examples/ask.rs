//! Asks the internal agent one question and prints the structured trace.
//!
//! Run with: cargo run --example ask -- "What are users saying about search?"

use scout::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Which issues affect file upload?".into());

    // Reads OPENAI_* and QDRANT_* from the environment
    let settings = Settings::from_env()?;
    let agent = build_internal_agent(&settings).await;

    let raw = agent.invoke(&query).await?;
    let messages: Vec<Message> = raw.iter().map(|m| normalize(m)).collect();
    let trace = extract_trace(&messages);

    println!("{}", serde_json::to_string_pretty(&trace)?);
    Ok(())
}
