use std::collections::BTreeMap;

use crate::constants::{COL_COLOR, COL_NAME, COL_QUANTITY, COL_UNIT};
use crate::data_types::{as_number, DietItem, ReferenceEntry};

/// nutrient name -> RDA or UL value
pub type ReferenceMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellFlag {
    #[default]
    None,
    Warning,
    Danger,
}

pub fn reference_map(entries: &[ReferenceEntry]) -> ReferenceMap {
    entries
        .iter()
        .map(|e| (e.nutrient.trim().to_string(), e.value))
        .collect()
}

/// Columns whose values are never added up.
pub fn is_summable(column: &str) -> bool {
    !matches!(column, COL_NAME | COL_QUANTITY | COL_COLOR | COL_UNIT)
}

/// Sum of every numeric (or numeric string) value per column.
pub fn column_totals<'a>(
    items: &[DietItem],
    columns: impl IntoIterator<Item = &'a str>,
) -> BTreeMap<String, f64> {
    columns
        .into_iter()
        .filter(|c| is_summable(c))
        .map(|column| {
            let total: f64 = items
                .iter()
                .filter_map(|item| item.column(column).as_ref().and_then(as_number))
                .sum();
            (column.to_string(), total)
        })
        .collect()
}

/// `total / reference * 100`, unrounded; `None` without a usable reference.
/// Flags are decided on this value, the table shows it rounded.
pub fn percent_of(total: f64, reference: Option<f64>) -> Option<f64> {
    let reference = reference.filter(|r| r.is_finite() && *r > 0.0)?;
    Some(total / reference * 100.0)
}

pub fn percent_text(percent: f64) -> String {
    format!("{}%", percent.round() as i64)
}

pub fn rda_flag(percent: f64, threshold: f64) -> CellFlag {
    if percent < threshold {
        CellFlag::Warning
    } else {
        CellFlag::None
    }
}

pub fn ul_flag(percent: f64, threshold: f64) -> CellFlag {
    if percent > threshold {
        CellFlag::Danger
    } else {
        CellFlag::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(protein: serde_json::Value) -> DietItem {
        serde_json::from_value(json!({
            "diet_name": "Bulk",
            "fdc_id": 1,
            "quantity": 100,
            "sort_order": 1,
            "Name": "x",
            "Unit": "grams",
            "Protein g": protein
        }))
        .unwrap()
    }

    #[test]
    fn protein_against_rda() {
        let pct = percent_of(50.0, Some(56.0)).unwrap();
        assert_eq!(percent_text(pct), "89%");
        assert_eq!(percent_of(50.0, Some(0.0)), None);
        assert_eq!(percent_of(50.0, None), None);
    }

    #[test]
    fn totals_skip_non_numeric_values() {
        let items = vec![item(json!(20.5)), item(json!("9.5")), item(json!("n/a")), item(json!(null))];
        let totals = column_totals(&items, ["Protein g", "Name", "Unit", "quantity"]);

        assert_eq!(totals.get("Protein g"), Some(&30.0));
        assert!(!totals.contains_key("Name"));
        assert!(!totals.contains_key("quantity"));
    }

    #[test]
    fn flags_follow_thresholds() {
        assert_eq!(rda_flag(89.0, 100.0), CellFlag::Warning);
        assert_eq!(rda_flag(100.0, 100.0), CellFlag::None);
        assert_eq!(ul_flag(101.0, 100.0), CellFlag::Danger);
        assert_eq!(ul_flag(100.0, 100.0), CellFlag::None);
    }

    #[test]
    fn flags_ignore_display_rounding() {
        // 99.6 % reads as 100 % but is still short of the RDA
        let short = percent_of(99.6, Some(100.0)).unwrap();
        assert_eq!(percent_text(short), "100%");
        assert_eq!(rda_flag(short, 100.0), CellFlag::Warning);

        let over = percent_of(100.4, Some(100.0)).unwrap();
        assert_eq!(percent_text(over), "100%");
        assert_eq!(ul_flag(over, 100.0), CellFlag::Danger);
    }

    #[test]
    fn reference_names_are_trimmed() {
        let map = reference_map(&[ReferenceEntry {
            id: 1,
            nutrient: " Protein g ".into(),
            value: 56.0,
        }]);
        assert_eq!(map.get("Protein g"), Some(&56.0));
    }
}
