//! Shopping-list aggregation: the sum of ingredient amounts across every
//! recipe in a user's cart, keyed by (name, measurement unit).

use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq)]
pub struct AggregatedIngredient {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Single pass over (name, unit, amount) triples. Keys are compared by exact
/// string equality; output keeps first-seen order.
pub fn aggregate(
    rows: impl IntoIterator<Item = (String, String, i32)>,
) -> Vec<AggregatedIngredient> {
    let mut items: Vec<AggregatedIngredient> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for (name, unit, amount) in rows {
        match index.get(&(name.clone(), unit.clone())) {
            Some(&i) => items[i].amount += i64::from(amount),
            None => {
                index.insert((name.clone(), unit.clone()), items.len());
                items.push(AggregatedIngredient {
                    name,
                    measurement_unit: unit,
                    amount: i64::from(amount),
                });
            }
        }
    }

    items
}

/// Renders the plain-text attachment body.
pub fn render(items: &[AggregatedIngredient]) -> String {
    let mut out = String::from("Список покупок:\n");
    for item in items {
        out.push_str(&format!(
            "• {} ({}): {}\n",
            item.name, item.measurement_unit, item.amount
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> (String, String, i32) {
        (name.to_string(), unit.to_string(), amount)
    }

    #[test]
    fn test_sums_across_recipes() {
        let items = aggregate(vec![row("flour", "g", 200), row("flour", "g", 100)]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "flour");
        assert_eq!(items[0].amount, 300);
    }

    #[test]
    fn test_same_name_different_unit_not_merged() {
        let items = aggregate(vec![row("milk", "ml", 200), row("milk", "g", 100)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_case_variants_not_merged() {
        let items = aggregate(vec![row("Flour", "g", 200), row("flour", "g", 100)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_first_seen_order() {
        let items = aggregate(vec![
            row("eggs", "pcs", 2),
            row("flour", "g", 200),
            row("eggs", "pcs", 4),
            row("salt", "g", 5),
        ]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["eggs", "flour", "salt"]);
        assert_eq!(items[0].amount, 6);
    }

    #[test]
    fn test_render_format() {
        let items = aggregate(vec![row("flour", "g", 200), row("flour", "g", 100)]);
        let text = render(&items);
        assert_eq!(text, "Список покупок:\n• flour (g): 300\n");
    }

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render(&[]), "Список покупок:\n");
    }
}
