use owo_colors::OwoColorize;
use serde_json::json;

use crate::config::InboxConfig;
use crate::error::Result;
use crate::inbox::window::{ViewMode, Viewport};

/// Print which rows a viewport would materialize for `count` rows at `offset`.
pub fn cmd_window(
    count: usize,
    offset: u64,
    mode: Option<ViewMode>,
    config: &InboxConfig,
    output_json: bool,
) -> Result<()> {
    let mode = mode.unwrap_or(config.view_mode);
    let mut viewport = Viewport::for_mode(mode, config.viewport_height, config.overscan);
    viewport.scroll_to(offset, count);
    let range = viewport.render_range(count);
    let placements: Vec<_> = viewport.placements(count).collect();

    if output_json {
        let output = json!({
            "view_mode": mode.as_str(),
            "item_height": viewport.item_height(),
            "viewport_height": viewport.viewport_height(),
            "scroll_offset": viewport.scroll_offset(),
            "total_extent": viewport.total_extent(count),
            "start": range.start,
            "end": range.end,
            "offsets": placements.iter().map(|p| p.offset).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} rows x {}px, viewport {}px at offset {}",
        mode.to_string().cyan().bold(),
        count,
        viewport.item_height(),
        viewport.viewport_height(),
        viewport.scroll_offset()
    );
    if range.is_empty() {
        println!("{}", "nothing to render".dimmed());
        return Ok(());
    }
    println!("materialize [{}, {}]", range.start, range.end - 1);
    for placement in placements {
        println!("  {:>6}  @ {}px", placement.index, placement.offset);
    }
    Ok(())
}
