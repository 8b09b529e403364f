//! `parley facts` — Show what the retriever finds for a query.

use super::{bootstrap, GlobalOpts};

pub async fn run(opts: &GlobalOpts, query: &str, k: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let config = bootstrap::load_config(opts)?;
    let knowledge = bootstrap::load_knowledge(&config).await?;
    let k = k.unwrap_or(config.retrieval.k);

    let facts = knowledge.retrieve(query, k).await?;

    println!("🔍 Top {} of {} facts for \"{query}\"", facts.len(), knowledge.len());
    println!();
    for (i, scored) in facts.iter().enumerate() {
        println!("  {}. [{:.3}] {}", i + 1, scored.score, scored.text());
    }
    if facts.is_empty() {
        println!("  (nothing found)");
    }

    Ok(())
}
