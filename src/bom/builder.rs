// src/bom/builder.rs

// --- Imports ---
use crate::bom::models::{Bom, CostEntry, Item, MaterialGroup};
use crate::extractors::Table;
use crate::utils::error::BomError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

// --- Regex Patterns (Lazy Static) ---
// Symbol immediately followed by a number with an optional 1-2 digit fraction.
// Applied after thousands separators are stripped.
static CURRENCY_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([$£€])(\d+(?:\.\d{1,2})?)$")
        .expect("Failed to compile CURRENCY_VALUE_RE")
});

/// Parses a cell as a currency value, returning the symbol and the amount.
///
/// `$1,600.50` -> `("$", 1600.5)`. Anything else, including a symbol after
/// the number or more than two fractional digits, is not a currency value.
pub fn parse_currency(value: &str) -> Option<(String, f64)> {
    let value = value.replace(',', "");
    let caps = CURRENCY_VALUE_RE.captures(&value)?;
    let amount = caps[2].parse::<f64>().ok().filter(|a| a.is_finite())?;
    Some((caps[1].to_string(), amount))
}

/// Running totals threaded through a single build.
#[derive(Debug, Default)]
struct CostAccumulator {
    total_cost: f64,
    currency_symbol: Option<String>,
}

#[derive(Debug, Default)]
pub struct BomBuilder;

impl BomBuilder {
    pub fn new() -> Self { Self {} }

    /// Merges the tables into material groups and prices each group.
    ///
    /// Fails as a whole if there are no tables or a table with data has no
    /// header to group by.
    pub fn build(&self, tables: &[Table], title: Option<&str>) -> Result<Bom, BomError> {
        if tables.is_empty() {
            return Err(BomError::NoTables);
        }
        tracing::info!("Building bill of materials from {} table(s)", tables.len());

        let mut groups = self.collect_groups(tables)?;

        let mut acc = CostAccumulator::default();
        for (name, group) in groups.iter_mut() {
            self.price_group(name, group, &mut acc);
        }

        tracing::info!(
            "Built bill of materials: {} group(s), total cost {:.2} {}",
            groups.len(),
            acc.total_cost,
            acc.currency_symbol.as_deref().unwrap_or("(no currency)")
        );

        Ok(Bom::new(
            title.map(str::to_string),
            groups,
            acc.total_cost,
            acc.currency_symbol,
        ))
    }

    /// Groups every data row under its table's first column name, keeping
    /// groups in first-appearance order. Tables without data rows add nothing.
    fn collect_groups(&self, tables: &[Table]) -> Result<Vec<(String, MaterialGroup)>, BomError> {
        let mut groups: Vec<(String, MaterialGroup)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (table_idx, table) in tables.iter().enumerate() {
            if !table.has_rows() {
                tracing::debug!("Table {} has no data rows, skipping", table_idx);
                continue;
            }

            let (index, attrs) = table
                .header
                .split_first()
                .ok_or(BomError::EmptyHeader { table: table_idx })?;

            let pos = *positions.entry(index.clone()).or_insert_with(|| {
                tracing::debug!("New material group '{}'", index);
                groups.push((index.clone(), MaterialGroup::default()));
                groups.len() - 1
            });

            for (row_idx, row) in table.rows.iter().enumerate() {
                let (name, values) = row
                    .split_first()
                    .ok_or(BomError::EmptyRow { table: table_idx, row: row_idx })?;

                let mut item = Item::new(name.clone());
                for (attr, value) in attrs.iter().zip(values) {
                    item.insert(attr.clone(), value.clone());
                }
                groups[pos].1.items.push(item);
            }
        }

        Ok(groups)
    }

    /// Detects each item's currency column, fills the cost table and sub-total,
    /// and adds the sub-total to the document total.
    fn price_group(&self, name: &str, group: &mut MaterialGroup, acc: &mut CostAccumulator) {
        let mut cost_table = Vec::new();

        for item in &group.items {
            // First currency-looking column wins for each item.
            let detected = item
                .fields()
                .find_map(|(key, value)| parse_currency(value).map(|found| (key, found)));

            if let Some((key, (symbol, cost))) = detected {
                tracing::trace!("Item '{}' priced from column '{}': {}{}", item.item_name, key, symbol, cost);
                acc.currency_symbol = Some(symbol.clone());
                cost_table.push(CostEntry {
                    item_name: item.item_name.clone(),
                    cost,
                    currency: symbol,
                });
            }
        }

        if !cost_table.is_empty() {
            group.sub_total = cost_table.iter().map(|entry| entry.cost).sum();
            group.cost_table = Some(cost_table);
        }
        tracing::debug!("Group '{}' sub-total: {:.2}", name, group.sub_total);

        acc.total_cost += group.sub_total;
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn table(header: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            header.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn sample_tables() -> Vec<Table> {
        vec![
            table(&["Header1", "Header2"], &[&["Data1", "$10.00"], &["Data2", "$20.00"]]),
            table(
                &["Another Header1", "Another Header2"],
                &[&["Another Data1", "$30.00"], &["Another Data2", "$40.00"]],
            ),
            table(&["Header1", "Price"], &[&["Data1", "$10.00"], &["Data2", "$20.00"]]),
        ]
    }

    #[test]
    fn test_single_table_totals() {
        let tables = vec![table(&["Header1", "Header2"], &[&["Data1", "$10.00"], &["Data2", "$20.00"]])];
        let bom = BomBuilder::new().build(&tables, Some("Project Name")).unwrap();

        assert_eq!(bom.title(), Some("Project Name"));
        assert_eq!(bom.total_cost(), 30.0);
        assert_eq!(bom.group("Header1").unwrap().sub_total, 30.0);
        assert_eq!(bom.currency_symbol(), Some("$"));
    }

    #[test]
    fn test_tables_with_same_index_merge() {
        let bom = BomBuilder::new().build(&sample_tables(), Some("Project Name")).unwrap();

        assert_eq!(bom.total_cost(), 130.0);
        assert!(bom.group("Header1").is_some());
        assert!(bom.group("Another Header1").is_some());
        assert_eq!(bom.group_count(), 2);

        let header1 = bom.group("Header1").unwrap();
        assert_eq!(header1.items.len(), 4);
        assert_eq!(header1.sub_total, 60.0);
        assert_eq!(header1.items[2].get("Price"), Some("$10.00"));
        assert_eq!(header1.items[2].get("Header2"), None);
        assert_eq!(bom.group("Another Header1").unwrap().sub_total, 70.0);

        let names: Vec<&str> = bom.groups().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Header1", "Another Header1"]);
    }

    #[test]
    fn test_total_is_sum_of_sub_totals() {
        let bom = BomBuilder::new().build(&sample_tables(), None).unwrap();
        let sum: f64 = bom.groups().map(|(_, g)| g.sub_total).sum();
        assert_eq!(bom.total_cost(), sum);
    }

    #[test]
    fn test_no_tables_fails() {
        let result = BomBuilder::new().build(&[], Some("Empty"));
        assert!(matches!(result, Err(BomError::NoTables)));
    }

    #[test]
    fn test_header_only_table_adds_no_group() {
        let tables = vec![
            table(&["Orphan", "Price"], &[]),
            table(&["Parts", "Price"], &[&["Bolt", "$2"]]),
        ];
        let bom = BomBuilder::new().build(&tables, None).unwrap();
        assert!(bom.group("Orphan").is_none());
        assert_eq!(bom.group_count(), 1);
        assert_eq!(bom.total_cost(), 2.0);
    }

    #[test]
    fn test_empty_header_with_rows_fails() {
        let tables = vec![
            table(&["Parts", "Price"], &[&["Bolt", "$2"]]),
            table(&[], &[&[]]),
        ];
        let result = BomBuilder::new().build(&tables, None);
        assert!(matches!(result, Err(BomError::EmptyHeader { table: 1 })));
    }

    #[test]
    fn test_empty_row_fails() {
        let tables = vec![table(&["A"], &[&[]])];
        let result = BomBuilder::new().build(&tables, None);
        assert!(matches!(result, Err(BomError::EmptyRow { table: 0, row: 0 })));
    }

    #[test]
    fn test_repeated_column_keeps_last_value() {
        let tables = vec![table(&["Parts", "Price", "Price"], &[&["Bolt", "$1", "$2"]])];
        let bom = BomBuilder::new().build(&tables, None).unwrap();

        let parts = bom.group("Parts").unwrap();
        assert_eq!(parts.items[0].get("Price"), Some("$2"));
        assert_eq!(parts.items[0].fields().count(), 1);
        assert_eq!(parts.cost_table.as_ref().unwrap()[0].cost, 2.0);
        assert_eq!(bom.total_cost(), 2.0);

        let value = serde_json::to_value(&bom).unwrap();
        assert_eq!(value["Parts"]["items"][0]["Price"], "$2");
    }

    #[test]
    fn test_group_without_currency_has_no_cost_table() {
        let tables = vec![table(&["Tools", "Qty"], &[&["Hammer", "2"], &["Saw", "1"]])];
        let bom = BomBuilder::new().build(&tables, None).unwrap();

        let tools = bom.group("Tools").unwrap();
        assert!(tools.cost_table.is_none());
        assert_eq!(tools.sub_total, 0.0);
        assert_eq!(bom.total_cost(), 0.0);
        assert_eq!(bom.currency_symbol(), None);
    }

    #[test]
    fn test_first_currency_column_wins() {
        let tables = vec![table(
            &["Parts", "Qty", "Unit", "Total"],
            &[&["Bolt", "10", "$2", "$20"], &["Nut", "5", "n/a", "$5"]],
        )];
        let bom = BomBuilder::new().build(&tables, None).unwrap();

        let cost_table = bom.group("Parts").unwrap().cost_table.as_ref().unwrap();
        assert_eq!(cost_table.len(), 2);
        assert_eq!(cost_table[0].item_name, "Bolt");
        assert_eq!(cost_table[0].cost, 2.0);
        assert_eq!(cost_table[1].cost, 5.0);
        assert_eq!(bom.total_cost(), 7.0);
    }

    #[test]
    fn test_currency_symbol_is_last_seen() {
        let tables = vec![
            table(&["Wood", "Price"], &[&["Oak", "£12.50"]]),
            table(&["Metal", "Price"], &[&["Steel", "€1,000"]]),
        ];
        let bom = BomBuilder::new().build(&tables, None).unwrap();

        assert_eq!(bom.currency_symbol(), Some("€"));
        let wood = bom.group("Wood").unwrap().cost_table.as_ref().unwrap();
        assert_eq!(wood[0].currency, "£");
        assert_eq!(bom.total_cost(), 1012.5);
    }

    #[test]
    fn test_parse_currency_grammar() {
        assert_eq!(parse_currency("$1600"), Some(("$".to_string(), 1600.0)));
        assert_eq!(parse_currency("$1,600.50"), Some(("$".to_string(), 1600.5)));
        assert_eq!(parse_currency("€0.5"), Some(("€".to_string(), 0.5)));
        assert_eq!(parse_currency("£3.25"), Some(("£".to_string(), 3.25)));

        assert_eq!(parse_currency("$1.234"), None);
        assert_eq!(parse_currency("10$"), None);
        assert_eq!(parse_currency("USD 5"), None);
        assert_eq!(parse_currency("$"), None);
        assert_eq!(parse_currency("$ 5"), None);
        assert_eq!(parse_currency("$5."), None);
        assert_eq!(parse_currency("¥5"), None);
        assert_eq!(parse_currency(&format!("${}", "9".repeat(400))), None);
    }

    #[test]
    fn test_bom_serializes_as_group_mapping() {
        let tables = vec![
            table(&["Parts", "Qty", "Price"], &[&["Bolt", "10", "$2"]]),
            table(&["Tools", "Qty"], &[&["Saw", "1"]]),
        ];
        let bom = BomBuilder::new().build(&tables, None).unwrap();
        let value = serde_json::to_value(&bom).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "Parts": {
                    "items": [{ "item_name": "Bolt", "Qty": "10", "Price": "$2" }],
                    "cost_table": [{ "item_name": "Bolt", "Cost": 2.0, "Currency": "$" }],
                    "sub_total": 2.0
                },
                "Tools": {
                    "items": [{ "item_name": "Saw", "Qty": "1" }],
                    "sub_total": 0.0
                }
            })
        );
        let keys: Vec<&String> = value["Parts"]["items"][0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["item_name", "Qty", "Price"]);
    }
}
