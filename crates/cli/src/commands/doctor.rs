//! `parley doctor` — Diagnose system health.

use parley_config::AppConfig;
use parley_core::embedding::Embedder;
use parley_core::provider::Provider;
use parley_providers::{build_embedder, build_language_model};

use super::{bootstrap, GlobalOpts};

pub async fn run(opts: &GlobalOpts) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Parley Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    // Config
    let config_path = opts.config_path();
    let config = match bootstrap::load_config(opts) {
        Ok(config) => {
            if config_path.exists() {
                println!("  ✅ Config file valid ({})", config_path.display());
            } else {
                println!("  ⚠️  No config file, using defaults — run `parley config init`");
            }
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  Cannot continue without a valid configuration.");
            return Ok(());
        }
    };

    // Credential
    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else if config.provider.name == "ollama" {
        println!("  ✅ No API key needed for ollama");
    } else {
        println!("  ⚠️  No API key — set PARLEY_API_KEY; chat will run offline");
        issues += 1;
    }

    // Embedding backend
    let embedder = build_embedder(&config);
    match embedder.embed_one("ahoy").await {
        Ok(v) => println!("  ✅ Embedder {} ({} dimensions)", embedder.name(), v.len()),
        Err(e) => {
            println!("  ❌ Embedder {} failed: {e}", embedder.name());
            issues += 1;
        }
    }

    // Knowledge file
    issues += check_knowledge(&config).await;

    // Language model
    if opts.offline {
        println!("  ⚠️  Offline mode requested, skipping language model check");
    } else {
        match build_language_model(&config) {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ Language model reachable ({})", provider.name()),
                Ok(false) => {
                    println!("  ❌ Language model unreachable ({})", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Language model check failed: {e}");
                    issues += 1;
                }
            },
            None => {
                println!("  ⚠️  No language model configured, replies will be offline");
                issues += 1;
            }
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

async fn check_knowledge(config: &AppConfig) -> usize {
    match bootstrap::load_knowledge(config).await {
        Ok(store) => {
            println!(
                "  ✅ Knowledge file loaded: {} facts from {}",
                store.len(),
                config.knowledge_file().display()
            );
            0
        }
        Err(e) => {
            println!("  ❌ {e}");
            1
        }
    }
}
