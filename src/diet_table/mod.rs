pub mod render;
pub mod row_edit;
pub mod table_model;
pub mod totals;

use table_model::Column;
use totals::CellFlag;

/// Rendered state of one diet page. Cells line up with `columns`, hidden
/// columns included.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub diet_name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<RowView>,
    pub summary: Vec<SummaryRow>,
    pub save_all_enabled: bool,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub cells: Vec<Cell>,
    pub dirty: bool,
    pub editing: bool,
    pub background: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub text: String,
    pub flag: CellFlag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub kind: SummaryKind,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Totals,
    RdaValues,
    UlValues,
    RdaPercent,
    UlPercent,
}

impl SummaryKind {
    pub fn label(&self) -> &'static str {
        match self {
            SummaryKind::Totals => "Totals",
            SummaryKind::RdaValues => "RDA",
            SummaryKind::UlValues => "UL",
            SummaryKind::RdaPercent => "RDA %",
            SummaryKind::UlPercent => "UL %",
        }
    }
}

impl TableView {
    /// Text of the cell in `column` for item row `row`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c.key == column)?;
        self.rows.get(row)?.cells.get(col).map(|c| c.text.as_str())
    }

    pub fn summary_row(&self, kind: SummaryKind) -> Option<&SummaryRow> {
        self.summary.iter().find(|r| r.kind == kind)
    }
}
