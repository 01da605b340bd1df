use crate::diet_table::totals::CellFlag;
use crate::diet_table::{Cell, TableView};

/// Plain-text table for terminals. Dirty rows are marked `*`, the row being
/// edited `>`; flagged cells get `!` (below RDA threshold) or `!!` (above UL
/// threshold).
pub fn render_text(view: &TableView) -> String {
    let visible: Vec<usize> = view
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.hidden)
        .map(|(idx, _)| idx)
        .collect();

    let mut lines: Vec<(String, Vec<String>)> = Vec::new();
    lines.push((
        "  ".to_string(),
        visible
            .iter()
            .map(|idx| match view.columns[*idx].key.as_str() {
                "delete_action" => String::new(),
                key => key.to_string(),
            })
            .collect(),
    ));
    for row in &view.rows {
        let marker = format!(
            "{}{}",
            if row.editing { ">" } else { " " },
            if row.dirty { "*" } else { " " }
        );
        lines.push((marker, visible.iter().map(|idx| cell_text(&row.cells[*idx])).collect()));
    }
    for row in &view.summary {
        lines.push((
            "  ".to_string(),
            visible.iter().map(|idx| cell_text(&row.cells[*idx])).collect(),
        ));
    }

    let mut widths = vec![0; visible.len()];
    for (_, cells) in &lines {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut msg = format!("{}\n", view.diet_name);
    for (marker, cells) in &lines {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        msg += &format!("{} {}\n", marker, padded.join(" | ").trim_end());
    }
    if !view.status.is_empty() {
        msg += &format!("\n{}\n", view.status);
    }
    msg += &format!(
        "Save All: {}\n",
        if view.save_all_enabled { "enabled" } else { "disabled" }
    );

    msg
}

fn cell_text(cell: &Cell) -> String {
    match cell.flag {
        CellFlag::None => cell.text.clone(),
        CellFlag::Warning => format!("{}!", cell.text),
        CellFlag::Danger => format!("{}!!", cell.text),
    }
}
