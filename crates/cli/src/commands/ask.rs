//! `matric ask` — Ask a single question from the terminal.

use std::sync::Arc;

use matric_config::AppConfig;
use matric_core::index::VectorIndex;
use matric_core::model::GenerativeModel;
use matric_pipeline::TutorService;

pub async fn run(question: &str, show_sources: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    config.require_credentials()?;

    let model: Arc<dyn GenerativeModel> = Arc::new(matric_clients::gemini_from_config(&config)?);
    let index: Arc<dyn VectorIndex> =
        Arc::new(matric_clients::pinecone_from_config(&config).await?);
    let service = TutorService::new(model, index, &config)?;

    eprint!("  Thinking...");
    let reply = service.respond(question).await?;
    eprint!("\r             \r");

    println!("{}", reply.text);

    if show_sources {
        println!();
        println!("  Context:  {}", reply.tags);
        if reply.sources_used.is_empty() {
            if reply.degraded {
                println!("  Sources:  none (retrieval was unavailable)");
            } else {
                println!("  Sources:  none (no relevant curriculum material)");
            }
        } else {
            println!("  Sources:  {}", reply.sources_used.join(", "));
        }
    }

    Ok(())
}
