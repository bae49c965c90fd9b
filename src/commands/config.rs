//! `config show`: display the effective configuration.

use std::path::Path;

use owo_colors::OwoColorize;
use serde_json::json;

use crate::config::InboxConfig;
use crate::error::Result;

pub fn cmd_config_show(config: &InboxConfig, source: Option<&Path>, output_json: bool) -> Result<()> {
    let source = source
        .map(Path::to_path_buf)
        .or_else(InboxConfig::config_path);
    let source_display = source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());

    if output_json {
        let output = json!({
            "config": config,
            "config_file": source_display,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}\n", "Configuration:".cyan().bold());
    let fields = [
        ("page_size", config.page_size.to_string()),
        ("search_debounce_ms", config.search_debounce_ms.to_string()),
        ("overscan", config.overscan.to_string()),
        ("viewport_height", config.viewport_height.to_string()),
        ("view_mode", config.view_mode.to_string()),
        ("push_channel", config.push_channel.clone()),
        ("toast_ttl_ms", config.toast_ttl_ms.to_string()),
    ];
    for (key, value) in fields {
        println!("  {}: {}", key.cyan(), value);
    }
    println!("\n{}: {}", "config_file".dimmed(), source_display.dimmed());
    Ok(())
}
