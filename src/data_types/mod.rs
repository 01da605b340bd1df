pub mod settings_types;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::{COL_COLOR, COL_DIET_NAME, COL_FDC_ID, COL_QUANTITY, COL_SORT_ORDER};

/// One row of `/api/diets/{name}/nutrition`: the stored diet entry with the
/// food's nutrient columns merged in (already scaled to `quantity`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DietItem {
    pub diet_name: String,
    pub fdc_id: i64,
    #[serde(deserialize_with = "lenient_f64")]
    pub quantity: f64,
    pub sort_order: i64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl DietItem {
    /// Value of any column, including the typed ones.
    pub fn column(&self, column: &str) -> Option<Value> {
        match column {
            COL_DIET_NAME => Some(Value::from(self.diet_name.as_str())),
            COL_FDC_ID => Some(Value::from(self.fdc_id)),
            COL_QUANTITY => Some(Value::from(self.quantity)),
            COL_SORT_ORDER => Some(Value::from(self.sort_order)),
            COL_COLOR => self.color.as_deref().map(Value::from),
            _ => self.fields.get(column).cloned(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Food {
    pub fdc_id: i64,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Food {
    pub fn number(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(as_number)
    }
}

/// An RDA or UL entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub id: i64,
    pub nutrient: String,
    pub value: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DietEntry {
    pub diet_name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewDietItem {
    pub diet_name: String,
    pub fdc_id: i64,
    pub quantity: f64,
    pub sort_order: i64,
    pub color: Option<String>,
}

/// Body of `PUT /api/diet`. The `original_*` triple locates the stored row.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DietItemUpdate {
    pub diet_name: String,
    pub fdc_id: i64,
    pub quantity: f64,
    pub sort_order: i64,
    pub color: Option<String>,
    pub original_fdc_id: i64,
    pub original_quantity: f64,
    pub original_sort_order: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DietItemDelete {
    pub diet_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fdc_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    pub delete_all: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DietRename {
    pub diet_name_old: String,
    pub diet_name_new: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReferenceUpdate {
    pub value: f64,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    Rda,
    Ul,
}

/// Numbers and numeric strings count, everything else does not.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) if !s.trim().is_empty() => {
            s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    as_number(&value).ok_or_else(|| serde::de::Error::custom(format!("not a number: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diet_item_keeps_nutrient_columns() {
        let item: DietItem = serde_json::from_value(json!({
            "diet_name": "Bulk",
            "fdc_id": 1,
            "quantity": "150.5",
            "sort_order": 2,
            "color": null,
            "Name": "Oats",
            "Protein g": 12.3
        }))
        .unwrap();

        assert_eq!(item.quantity, 150.5);
        assert_eq!(item.color, None);
        assert_eq!(item.column("Name"), Some(json!("Oats")));
        assert_eq!(item.column("fdc_id"), Some(json!(1)));
        assert_eq!(item.column("Protein g"), Some(json!(12.3)));
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(as_number(&json!(3)), Some(3.0));
        assert_eq!(as_number(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(as_number(&json!("")), None);
        assert_eq!(as_number(&json!("abc")), None);
        assert_eq!(as_number(&json!(true)), None);
    }

    #[test]
    fn delete_payload_skips_identity_when_deleting_all() {
        let body = serde_json::to_value(DietItemDelete {
            diet_name: "Cut".into(),
            fdc_id: None,
            quantity: None,
            sort_order: None,
            delete_all: true,
        })
        .unwrap();
        assert_eq!(body, json!({"diet_name": "Cut", "delete_all": true}));
    }
}
