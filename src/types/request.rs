//! Menu item records submitted for profitability prediction

use serde::{Deserialize, Serialize};

/// A single menu item to be classified.
///
/// Field names on the wire match the columns of the training frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Restaurant identifier (e.g. "R003")
    #[serde(rename = "RestaurantID", alias = "restaurant_id")]
    pub restaurant_id: String,

    /// Menu category (Desserts, Main Course, Appetizers, Beverages, Salads)
    #[serde(rename = "MenuCategory", alias = "menu_category")]
    pub menu_category: String,

    /// Free-text ingredient list
    #[serde(rename = "Ingredients", alias = "ingredients")]
    pub ingredients: String,

    /// Menu item name, matched case-sensitively against the frequency table
    #[serde(rename = "MenuItem", alias = "menu_item")]
    pub menu_item: String,

    /// Price in dollars
    #[serde(rename = "Price", alias = "price")]
    pub price: f64,
}

/// Borrowed view of one request column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl InferenceRequest {
    /// Column names in training-frame order.
    pub const COLUMNS: [&'static str; 5] = [
        "RestaurantID",
        "MenuCategory",
        "Ingredients",
        "MenuItem",
        "Price",
    ];

    pub fn new(
        restaurant_id: impl Into<String>,
        menu_category: impl Into<String>,
        ingredients: impl Into<String>,
        menu_item: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
            menu_category: menu_category.into(),
            ingredients: ingredients.into(),
            menu_item: menu_item.into(),
            price,
        }
    }

    /// Look up a column by its training-frame name.
    pub fn field(&self, column: &str) -> Option<FieldValue<'_>> {
        match column {
            "RestaurantID" => Some(FieldValue::Text(&self.restaurant_id)),
            "MenuCategory" => Some(FieldValue::Text(&self.menu_category)),
            "Ingredients" => Some(FieldValue::Text(&self.ingredients)),
            "MenuItem" => Some(FieldValue::Text(&self.menu_item)),
            "Price" => Some(FieldValue::Number(self.price)),
            _ => None,
        }
    }

    /// Whether `column` names a field of this record.
    pub fn has_column(column: &str) -> bool {
        Self::COLUMNS.contains(&column)
    }
}
