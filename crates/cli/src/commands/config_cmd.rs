//! `parley config` — Configuration management commands.

use std::path::Path;

use parley_config::AppConfig;

use super::{bootstrap, GlobalOpts};

pub fn validate(opts: &GlobalOpts) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    let config = match bootstrap::load_config(opts) {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ {e}");
            return Err(e);
        }
    };
    println!("   ✅ Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Provider:   {}", config.provider.name);
    println!("   Model:      {}", config.provider.model);
    println!("   Fallbacks:  {}", config.provider.fallbacks.len());
    println!("   Embedding:  {} ({})", config.embedding.backend, config.embedding.model_name());
    println!("   Knowledge:  {}", config.knowledge_file().display());
    println!("   Memory:     {} turns", config.memory.window_size);
    println!("   Retrieval:  k = {}", config.retrieval.k);

    Ok(())
}

/// Problems that do not stop Parley from starting.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.has_api_key() && config.provider.name != "ollama" {
        warnings.push(
            "No API key set (set PARLEY_API_KEY or GEMINI_API_KEY), chat will run offline".to_string(),
        );
    }

    let knowledge = config.knowledge_file();
    if !knowledge.exists() {
        warnings.push(format!(
            "Knowledge file {} does not exist",
            knowledge.display()
        ));
    }

    if config.retrieval.k > 10 {
        warnings.push(format!(
            "retrieval.k = {} will make prompts long",
            config.retrieval.k
        ));
    }

    warnings
}

pub fn show(opts: &GlobalOpts) -> Result<(), Box<dyn std::error::Error>> {
    let config = bootstrap::load_config(opts)?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("{toml_str}");
    Ok(())
}

pub fn path(opts: &GlobalOpts) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", opts.config_path().display());
    Ok(())
}

pub fn init(opts: &GlobalOpts) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = opts.config_path();
    write_default(&config_path)?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set PARLEY_API_KEY (or add api_key to the file)");
    println!("   2. Run: parley chat");
    println!();
    Ok(())
}

/// Write the default config to `path`, refusing to overwrite.
fn write_default(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err(format!(
            "Config already exists at {}; edit it or delete it first",
            path.display()
        )
        .into());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(())
}
