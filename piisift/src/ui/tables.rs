// piisift/src/ui/tables.rs
//! `comfy-table` renderings of mode tables and pattern rejections.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use piisift_core::{ModeTable, PatternRejection, GLOBAL_THRESHOLD_KEY};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// One row per mode; the default mode is marked with `*`.
pub fn modes_table(modes: &ModeTable) -> Table {
    let mut table = new_table(vec![
        "Mode",
        "GLOBAL",
        "Entity thresholds",
        "Boost",
        "Min context",
        "Recognizers",
    ]);
    for mode in &modes.modes {
        let name = if mode.name == modes.default_mode {
            format!("{} *", mode.name)
        } else {
            mode.name.clone()
        };
        let entities = mode
            .thresholds
            .iter()
            .filter(|(k, _)| k.as_str() != GLOBAL_THRESHOLD_KEY)
            .map(|(k, v)| format!("{}={:.2}", k, v))
            .collect::<Vec<_>>()
            .join("\n");
        let recognizers = mode
            .recognizers
            .as_ref()
            .map_or_else(|| "all".to_string(), |r| r.join(", "));
        table.add_row(vec![
            name,
            format!("{:.2}", mode.global_threshold()),
            entities,
            format!("{:.2}", mode.context_boost_factor),
            format!("{:.2}", mode.min_context_score),
            recognizers,
        ]);
    }
    table
}

pub fn rejections_table(rejections: &[PatternRejection]) -> Table {
    let mut table = new_table(vec!["Recognizer", "Pattern", "Reason", "Detail"]);
    for r in rejections {
        table.add_row(vec![
            r.recognizer.clone(),
            r.pattern.clone(),
            r.reason.to_string(),
            r.detail.clone(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_modes_render_with_marker() {
        let modes = ModeTable::load_default_modes().unwrap();
        let rendered = modes_table(&modes).to_string();
        assert!(rendered.contains("balanced *"));
        assert!(rendered.contains("high_precision"));
        assert!(rendered.contains("PERSON=0.85"));
    }
}
