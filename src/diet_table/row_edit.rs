use crate::data_types::{DietItem, DietItemDelete, DietItemUpdate};
use crate::errors::EditError;

/// The four editable fields of a row, as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowInputs {
    pub fdc_id: String,
    pub quantity: String,
    pub sort_order: String,
    pub color: String,
}

impl RowInputs {
    pub fn from_item(item: &DietItem) -> Self {
        RowInputs {
            fdc_id: item.fdc_id.to_string(),
            quantity: fmt_number(item.quantity),
            sort_order: item.sort_order.to_string(),
            color: item.color.clone().unwrap_or_default(),
        }
    }

    pub fn changed_fields(&self, other: &RowInputs) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.fdc_id != other.fdc_id {
            changed.push("fdc_id");
        }
        if self.quantity != other.quantity {
            changed.push("quantity");
        }
        if self.sort_order != other.sort_order {
            changed.push("sort_order");
        }
        if self.color != other.color {
            changed.push("color");
        }
        changed
    }

    fn parsed_fdc_id(&self) -> Result<i64, EditError> {
        parse_integer("fdc_id", &self.fdc_id)
    }

    fn parsed_sort_order(&self) -> Result<i64, EditError> {
        parse_integer("sort_order", &self.sort_order)
    }

    fn parsed_quantity(&self) -> Result<f64, EditError> {
        parse_number("quantity", &self.quantity)
    }
}

/// A loaded diet item plus the snapshot it was loaded with and the values
/// currently entered for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditableRow {
    pub item: DietItem,
    pub original: RowInputs,
    pub current: RowInputs,
}

impl EditableRow {
    pub fn new(item: DietItem) -> Self {
        let original = RowInputs::from_item(&item);
        EditableRow {
            current: original.clone(),
            original,
            item,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.original
    }

    /// Current fdc id if the input holds a valid one.
    pub fn current_fdc_id(&self) -> Option<i64> {
        self.current.parsed_fdc_id().ok()
    }

    pub fn current_color(&self) -> Option<&str> {
        Some(self.current.color.as_str()).filter(|c| !c.is_empty())
    }

    /// Picks `color`, or clears the color if it is already the selected one.
    pub fn toggle_color(&mut self, color: &str) {
        if self.current.color.eq_ignore_ascii_case(color) {
            self.current.color.clear();
        } else {
            self.current.color = color.to_string();
        }
    }

    pub fn update_payload(&self) -> Result<DietItemUpdate, EditError> {
        Ok(DietItemUpdate {
            diet_name: self.item.diet_name.clone(),
            fdc_id: self.current.parsed_fdc_id()?,
            quantity: self.current.parsed_quantity()?,
            sort_order: self.current.parsed_sort_order()?,
            color: self.current_color().map(str::to_string),
            original_fdc_id: self.item.fdc_id,
            original_quantity: self.item.quantity,
            original_sort_order: self.item.sort_order,
        })
    }

    /// Points the row at what the server holds after `update` was accepted
    /// without a reload. The snapshot is kept, so the row stays dirty.
    pub fn mark_stored(&mut self, update: &DietItemUpdate) {
        self.item.fdc_id = update.fdc_id;
        self.item.quantity = update.quantity;
        self.item.sort_order = update.sort_order;
        self.item.color = update.color.clone();
    }

    /// Deletes the stored row this one was loaded from.
    pub fn delete_payload(&self) -> DietItemDelete {
        DietItemDelete {
            diet_name: self.item.diet_name.clone(),
            fdc_id: Some(self.item.fdc_id),
            quantity: Some(self.item.quantity),
            sort_order: Some(self.item.sort_order),
            delete_all: false,
        }
    }

    /// True if this row was loaded from the stored row `inputs` describes.
    pub fn loaded_from(&self, inputs: &RowInputs) -> bool {
        let quantity_matches = match (inputs.parsed_quantity(), self.original.parsed_quantity()) {
            (Ok(a), Ok(b)) => a == b,
            _ => inputs.quantity == self.original.quantity,
        };
        self.original.fdc_id == inputs.fdc_id
            && self.original.sort_order == inputs.sort_order
            && quantity_matches
    }
}

pub fn any_dirty(rows: &[EditableRow]) -> bool {
    rows.iter().any(EditableRow::is_dirty)
}

/// Moves the row at `from` to position `to` and renumbers the sort order of
/// every row to `1..=N` in the new order.
pub fn move_row(rows: &mut Vec<EditableRow>, from: usize, to: usize) -> Result<(), EditError> {
    if from >= rows.len() {
        return Err(EditError::NoSuchRow(from));
    }
    if to >= rows.len() {
        return Err(EditError::NoSuchRow(to));
    }
    let row = rows.remove(from);
    rows.insert(to, row);
    renumber(rows);
    Ok(())
}

pub fn renumber(rows: &mut [EditableRow]) {
    for (idx, row) in rows.iter_mut().enumerate() {
        row.current.sort_order = (idx + 1).to_string();
    }
}

/// Integers print without a fraction, like the values the server sends.
pub fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn parse_number(field: &'static str, txt: &str) -> Result<f64, EditError> {
    txt.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| EditError::InvalidField {
            field,
            value: txt.to_string(),
        })
}

fn parse_integer(field: &'static str, txt: &str) -> Result<i64, EditError> {
    let number = parse_number(field, txt)?;
    if number.fract() != 0.0 {
        return Err(EditError::InvalidField {
            field,
            value: txt.to_string(),
        });
    }
    Ok(number as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn item(fdc_id: i64, quantity: f64, sort_order: i64) -> DietItem {
        DietItem {
            diet_name: "Bulk".into(),
            fdc_id,
            quantity,
            sort_order,
            color: None,
            fields: BTreeMap::new(),
        }
    }

    #[test]
    fn dirty_iff_editable_field_differs() {
        let mut row = EditableRow::new(item(1, 100.0, 1));
        assert!(!row.is_dirty());

        row.current.quantity = "150".into();
        assert!(row.is_dirty());
        assert_eq!(row.current.changed_fields(&row.original), ["quantity"]);

        // typing the old value back makes the row clean again
        row.current.quantity = "100".into();
        assert!(!row.is_dirty());

        // string comparison: "100.0" is not "100"
        row.current.quantity = "100.0".into();
        assert!(row.is_dirty());
    }

    #[test]
    fn color_toggles() {
        let mut row = EditableRow::new(item(1, 100.0, 1));
        row.toggle_color("#971d1f");
        assert_eq!(row.current_color(), Some("#971d1f"));
        assert!(row.is_dirty());
        row.toggle_color("#971D1F");
        assert_eq!(row.current_color(), None);
        assert!(!row.is_dirty());
    }

    #[test]
    fn payload_carries_original_identity() {
        let mut row = EditableRow::new(item(7, 100.0, 2));
        row.current.quantity = "150".into();
        row.current.fdc_id = "9".into();

        let payload = row.update_payload().unwrap();
        assert_eq!(payload.quantity, 150.0);
        assert_eq!(payload.fdc_id, 9);
        assert_eq!(payload.color, None);
        assert_eq!(payload.original_fdc_id, 7);
        assert_eq!(payload.original_quantity, 100.0);
        assert_eq!(payload.original_sort_order, 2);
    }

    #[test]
    fn accepted_write_moves_identity_only() {
        let mut row = EditableRow::new(item(7, 100.0, 2));
        row.current.quantity = "150".into();
        let payload = row.update_payload().unwrap();

        row.mark_stored(&payload);
        assert!(row.is_dirty());
        let retry = row.update_payload().unwrap();
        assert_eq!(retry.original_quantity, 150.0);
        assert_eq!(retry.quantity, 150.0);
    }

    #[test]
    fn payload_rejects_garbage() {
        let mut row = EditableRow::new(item(7, 100.0, 2));
        row.current.quantity = "lots".into();
        assert_eq!(
            row.update_payload(),
            Err(EditError::InvalidField {
                field: "quantity",
                value: "lots".into()
            })
        );

        row.current.quantity = "100".into();
        row.current.sort_order = "1.5".into();
        assert!(row.update_payload().is_err());
    }

    #[test]
    fn reorder_renumbers_contiguously() {
        let mut rows: Vec<EditableRow> = [(1, 5), (2, 9), (3, 12)]
            .into_iter()
            .map(|(id, order)| EditableRow::new(item(id, 100.0, order)))
            .collect();

        move_row(&mut rows, 2, 0).unwrap();

        let ids: Vec<i64> = rows.iter().map(|r| r.item.fdc_id).collect();
        let orders: Vec<&str> = rows.iter().map(|r| r.current.sort_order.as_str()).collect();
        assert_eq!(ids, [3, 1, 2]);
        assert_eq!(orders, ["1", "2", "3"]);
        assert!(rows.iter().all(EditableRow::is_dirty));

        assert_eq!(move_row(&mut rows, 3, 0), Err(EditError::NoSuchRow(3)));
    }

    #[test]
    fn numbers_format_like_the_server() {
        assert_eq!(fmt_number(100.0), "100");
        assert_eq!(fmt_number(150.5), "150.5");
        assert_eq!(fmt_number(-2.0), "-2");
    }
}
