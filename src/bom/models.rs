// src/bom/models.rs
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Key the row's first cell is stored under.
pub const ITEM_NAME_KEY: &str = "item_name";

/// One table row: the mandatory name plus the remaining columns in header
/// order. Columns behave as an ordered map: a repeated column name keeps its
/// first position and takes the last value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub item_name: String,
    fields: Vec<(String, String)>,
}

impl Item {
    pub fn new(item_name: impl Into<String>) -> Self {
        Self { item_name: item_name.into(), fields: Vec::new() }
    }

    /// Sets a column value. A column named `item_name` is ignored so it
    /// cannot shadow the row name.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if key == ITEM_NAME_KEY {
            return;
        }
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Columns other than the name, in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        if key == ITEM_NAME_KEY {
            return Some(&self.item_name);
        }
        self.fields().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

// Flattened into a single mapping: `item_name` first, then the columns.
impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ITEM_NAME_KEY, &self.item_name)?;
        for (key, value) in self.fields() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// The monetary value detected for one item.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CostEntry {
    pub item_name: String,
    #[serde(rename = "Cost")]
    pub cost: f64,
    #[serde(rename = "Currency")]
    pub currency: String,
}

/// All items sharing a first-column name, across every table in the document.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct MaterialGroup {
    pub items: Vec<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_table: Option<Vec<CostEntry>>,
    pub sub_total: f64,
}

/// Bill of materials. Built once by [`super::BomBuilder`], read-only after.
#[derive(Debug, Clone, PartialEq)]
pub struct Bom {
    title: Option<String>,
    groups: Vec<(String, MaterialGroup)>,
    total_cost: f64,
    currency_symbol: Option<String>,
}

impl Bom {
    pub(crate) fn new(
        title: Option<String>,
        groups: Vec<(String, MaterialGroup)>,
        total_cost: f64,
        currency_symbol: Option<String>,
    ) -> Self {
        Self { title, groups, total_cost, currency_symbol }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Groups in order of first appearance in the document.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &MaterialGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    #[cfg(test)]
    pub fn group(&self, name: &str) -> Option<&MaterialGroup> {
        self.groups
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, group)| group)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|(_, g)| g.items.len()).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Symbol of the last currency value seen anywhere in the document.
    pub fn currency_symbol(&self) -> Option<&str> {
        self.currency_symbol.as_deref()
    }
}

// Serializes as the group mapping only (`{ group: { items, cost_table, sub_total } }`),
// which is the shape templates iterate over.
impl Serialize for Bom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (name, group) in &self.groups {
            map.serialize_entry(name, group)?;
        }
        map.end()
    }
}
