//! Table builder wrapper around comfy-table for consistent list display.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};

/// Borderless list table with upper-cased headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render the table under a count line, or a "none found" message.
pub fn render_list(entity_name: &str, table: &Table, total: usize) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let noun = if total == 1 {
        entity_name.to_string()
    } else {
        format!("{entity_name}s")
    };
    format!("{total} {noun}:\n{table}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_list() {
        let mut table = list_table(&["exercise", "weight"]);
        table.add_row(vec!["Squat", "100"]);

        let rendered = render_list("exercise", &table, 1);
        assert!(rendered.starts_with("1 exercise:"));
        assert!(rendered.contains("EXERCISE"));
        assert!(rendered.contains("Squat"));

        assert_eq!(render_list("alert", &list_table(&["id"]), 0), "No alerts found.");
    }
}
