//! `matric doctor` — Diagnose configuration and service connectivity.

use matric_config::AppConfig;
use matric_core::index::VectorIndex;
use matric_core::model::{EmbeddingRequest, GenerativeModel};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 matric doctor — Connectivity Diagnostics");
    println!("===========================================\n");

    let mut issues = 0;

    // Config file
    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("  ✅ Config file: {}", config_path.display());
    } else {
        println!(
            "  ⚠️  No config file at {} — using defaults",
            config_path.display()
        );
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!();
            println!("  ⚠️  1 issue found. Fix the configuration and re-run.");
            return Ok(());
        }
    };

    // Credentials
    let status = config.credential_status();
    for (present, name) in [
        (status.gemini_key, "GEMINI_API_KEY"),
        (status.pinecone_key, "PINECONE_API_KEY"),
        (status.index_name, "PINECONE_INDEX_NAME"),
    ] {
        if present {
            println!("  ✅ {name} set");
        } else {
            println!("  ❌ {name} missing");
            issues += 1;
        }
    }

    if !status.all_present() {
        println!();
        println!("  ⚠️  {issues} issue(s) found. Set the missing variables and re-run.");
        return Ok(());
    }

    // Gemini reachability
    let model = matric_clients::gemini_from_config(&config)?;
    match model.health_check().await {
        Ok(_) => println!("  ✅ Gemini reachable ({})", config.gemini.model),
        Err(e) => {
            println!("  ❌ Gemini check failed: {e}");
            issues += 1;
        }
    }

    // Embedding dimension
    let mut embed_dim = None;
    let request = EmbeddingRequest::query(&config.gemini.embed_model, "dimension probe");
    match model.embed(request).await {
        Ok(response) => {
            let dim = response.vectors.first().map(Vec::len).unwrap_or(0);
            println!(
                "  ✅ Embeddings working ({}, {dim} dimensions)",
                config.gemini.embed_model
            );
            embed_dim = Some(dim);
        }
        Err(e) => {
            println!("  ❌ Embedding check failed: {e}");
            issues += 1;
        }
    }

    // Vector index
    match matric_clients::pinecone_from_config(&config).await {
        Ok(index) => match index.describe().await {
            Ok(description) => {
                println!(
                    "  ✅ Index \"{}\": {} dimensions, host {}",
                    description.name, description.dimension, description.host
                );
                if let Some(dim) = embed_dim {
                    if dim == description.dimension {
                        println!("  ✅ Embedding dimension matches the index");
                    } else {
                        println!(
                            "  ❌ Dimension mismatch: embeddings produce {dim}, index expects {}",
                            description.dimension
                        );
                        issues += 1;
                    }
                }
            }
            Err(e) => {
                println!("  ❌ Index describe failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Index client failed: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
