//! `lariat status`, the effective-configuration report.

use lariat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Lariat status");
    println!("=============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!(
        "  Backend:      {}",
        if config.backend.base_url.is_empty() {
            "(not configured)"
        } else {
            &config.backend.base_url
        }
    );
    println!("  Locale:       {}", config.backend.locale);
    println!("  Timeout:      {} s", config.backend.request_timeout_secs);
    println!(
        "  Auth:         {}",
        if config.auth.session().is_some() {
            "token present"
        } else {
            "missing"
        }
    );
    println!(
        "  Model:        {}",
        if config.model.default.is_empty() {
            "(backend default)"
        } else {
            &config.model.default
        }
    );
    println!("  Targets:      {}", config.model.targets.len());
    println!("  Max loops:    {}", config.agent.max_loops);
    println!(
        "  Backoff:      {}-{} ms",
        config.agent.backoff_min_ms, config.agent.backoff_max_ms
    );
    println!(
        "  Browser:      {}",
        if config.agent.enable_browser_control {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Remote tools: {}",
        if config.agent.enable_remote_tools {
            config.remote_tools.url.as_deref().unwrap_or("(no url)")
        } else {
            "disabled"
        }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, run `lariat init` first");
    }

    Ok(())
}
