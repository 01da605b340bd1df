use serde_json::Value;

use crate::constants::{
    COL_COLOR, COL_DELETE_ACTION, COL_DIET_NAME, COL_ENERGY_KCAL, COL_FDC_ID, COL_NAME,
    COL_QUANTITY, COL_SORT_ORDER, INTERNAL_COLUMNS, LEADING_COLUMNS, PAYLOAD_COLUMNS,
    ROW_COLOR_ALPHA,
};
use crate::colors::to_rgba;
use crate::data_types::settings_types::UserSettings;
use crate::diet_table::row_edit::{fmt_number, EditableRow};
use crate::diet_table::totals::{
    column_totals, is_summable, percent_of, percent_text, rda_flag, ul_flag, CellFlag,
    ReferenceMap,
};
use crate::diet_table::{Cell, RowView, SummaryKind, SummaryRow, TableView};
use crate::food_catalog::CatalogIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    DeleteAction,
    Color,
    Name,
    Quantity,
    DietName,
    FdcId,
    SortOrder,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub kind: ColumnKind,
    pub hidden: bool,
}

impl Column {
    fn new(key: &str) -> Self {
        let kind = match key {
            COL_DELETE_ACTION => ColumnKind::DeleteAction,
            COL_COLOR => ColumnKind::Color,
            COL_NAME => ColumnKind::Name,
            COL_QUANTITY => ColumnKind::Quantity,
            COL_DIET_NAME => ColumnKind::DietName,
            COL_FDC_ID => ColumnKind::FdcId,
            COL_SORT_ORDER => ColumnKind::SortOrder,
            _ => ColumnKind::Value,
        };
        Column {
            key: key.to_string(),
            kind,
            hidden: INTERNAL_COLUMNS.contains(&key),
        }
    }
}

/// Leading columns, then the selected ones in order. Internal columns stay
/// in the set as hidden so a row can always be turned back into a payload.
pub fn table_columns(selected: &[String]) -> Vec<Column> {
    let mut columns: Vec<Column> = LEADING_COLUMNS.iter().map(|c| Column::new(c)).collect();

    for key in selected {
        if !columns.iter().any(|c| &c.key == key) {
            columns.push(Column::new(key));
        }
    }
    for key in PAYLOAD_COLUMNS {
        if !columns.iter().any(|c| c.key == key) {
            columns.push(Column::new(key));
        }
    }

    columns
}

/// Everything the table is computed from.
pub struct ViewInput<'a> {
    pub diet_name: &'a str,
    pub rows: &'a [EditableRow],
    pub settings: &'a UserSettings,
    pub foods: &'a CatalogIndex,
    pub rda: &'a ReferenceMap,
    pub ul: &'a ReferenceMap,
    pub editing: Option<usize>,
    pub status: &'a str,
}

pub fn build_view(input: &ViewInput) -> TableView {
    let columns = table_columns(&input.settings.diet_columns);

    let rows = input
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| RowView {
            cells: columns
                .iter()
                .map(|col| Cell::plain(row_cell(row, col, input.foods)))
                .collect(),
            dirty: row.is_dirty(),
            editing: input.editing == Some(idx),
            background: row
                .current_color()
                .and_then(|c| to_rgba(c, ROW_COLOR_ALPHA)),
        })
        .collect();

    let summary = if input.rows.is_empty() {
        Vec::new()
    } else {
        summary_rows(&columns, input)
    };

    TableView {
        diet_name: input.diet_name.to_string(),
        columns,
        rows,
        summary,
        save_all_enabled: input.rows.iter().any(EditableRow::is_dirty),
        status: input.status.to_string(),
    }
}

fn row_cell(row: &EditableRow, column: &Column, foods: &CatalogIndex) -> String {
    match column.kind {
        ColumnKind::DeleteAction => "×".to_string(),
        ColumnKind::Color => row.current.color.clone(),
        ColumnKind::Quantity => row.current.quantity.clone(),
        ColumnKind::FdcId => row.current.fdc_id.clone(),
        ColumnKind::SortOrder => row.current.sort_order.clone(),
        ColumnKind::DietName => row.item.diet_name.clone(),
        ColumnKind::Name => row
            .current_fdc_id()
            .and_then(|id| foods.get(id))
            .map(|food| food.name.clone())
            .or_else(|| row.item.column(COL_NAME).map(|v| display_value(&v)))
            .unwrap_or_default(),
        ColumnKind::Value => row
            .item
            .column(&column.key)
            .map(|v| display_value(&v))
            .unwrap_or_default(),
    }
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(fmt_number).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

fn summary_rows(columns: &[Column], input: &ViewInput) -> Vec<SummaryRow> {
    let items: Vec<_> = input.rows.iter().map(|r| r.item.clone()).collect();
    let totals = column_totals(
        &items,
        columns
            .iter()
            .filter(|c| !c.hidden && c.kind == ColumnKind::Value)
            .map(|c| c.key.as_str()),
    );
    let summed = |col: &Column| !col.hidden && col.kind == ColumnKind::Value && is_summable(&col.key);

    let label_row = |kind: SummaryKind, cell: &dyn Fn(&Column) -> Cell| SummaryRow {
        kind,
        cells: columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                if idx == 0 {
                    Cell::plain(kind.label().to_string())
                } else if summed(col) {
                    cell(col)
                } else {
                    Cell::default()
                }
            })
            .collect(),
    };

    let mut rows = Vec::new();
    let has_energy = columns
        .iter()
        .any(|c| c.key == COL_ENERGY_KCAL && !c.hidden);
    if has_energy {
        rows.push(label_row(SummaryKind::Totals, &|col: &Column| {
            Cell::plain(format!("{:.2}", totals.get(&col.key).copied().unwrap_or(0.0)))
        }));
    }

    let settings = input.settings;
    let percent_cell = |refs: &ReferenceMap, col: &Column| -> Option<f64> {
        percent_of(
            totals.get(&col.key).copied().unwrap_or(0.0),
            refs.get(&col.key).copied(),
        )
    };

    if !settings.diet_hide_rda_ul_values {
        if !input.rda.is_empty() {
            rows.push(label_row(SummaryKind::RdaValues, &|col: &Column| {
                reference_cell(input.rda, col)
            }));
        }
        if !input.ul.is_empty() {
            rows.push(label_row(SummaryKind::UlValues, &|col: &Column| {
                reference_cell(input.ul, col)
            }));
        }
    }
    if !input.rda.is_empty() {
        rows.push(label_row(SummaryKind::RdaPercent, &|col: &Column| {
            match percent_cell(input.rda, col) {
                Some(pct) => Cell {
                    text: percent_text(pct),
                    flag: rda_flag(pct, settings.diet_rda_threshold),
                },
                None => Cell::default(),
            }
        }));
    }
    if !input.ul.is_empty() {
        rows.push(label_row(SummaryKind::UlPercent, &|col: &Column| {
            match percent_cell(input.ul, col) {
                Some(pct) => Cell {
                    text: percent_text(pct),
                    flag: ul_flag(pct, settings.diet_ul_threshold),
                },
                None => Cell::default(),
            }
        }));
    }

    rows
}

fn reference_cell(refs: &ReferenceMap, col: &Column) -> Cell {
    Cell::plain(refs.get(&col.key).map(|v| fmt_number(*v)).unwrap_or_default())
}

impl Cell {
    pub fn plain(text: String) -> Self {
        Cell {
            text,
            flag: CellFlag::None,
        }
    }
}
