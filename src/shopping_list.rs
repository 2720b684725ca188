use crate::models::ShoppingListEntry;

pub const SHOPPING_LIST_FILENAME: &str = "shopping-list.txt";

/// A line of the exported shopping list. `amount` is `None` for units that are not counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub amount: Option<i64>,
    pub unit: String,
}

impl From<ShoppingListEntry> for ShoppingListLine {
    fn from(
        ShoppingListEntry {
            name,
            unit,
            counted,
            total,
            ..
        }: ShoppingListEntry,
    ) -> Self {
        ShoppingListLine {
            name,
            amount: counted.then_some(total),
            unit,
        }
    }
}

impl ShoppingListLine {
    pub fn amount_label(&self) -> String {
        self.amount.map(|amount| amount.to_string()).unwrap_or_default()
    }
}

pub fn shopping_list_lines(entries: Vec<ShoppingListEntry>) -> Vec<ShoppingListLine> {
    entries.into_iter().map(ShoppingListLine::from).collect()
}

/// Renders the list as a plain-text document.
pub fn render_text(lines: &[ShoppingListLine]) -> String {
    let mut document = String::from("Shopping list\n\n");
    if lines.is_empty() {
        document.push_str("Your shopping cart is empty.\n");
        return document;
    }
    for line in lines {
        let amount = line.amount_label();
        let parts = [line.name.as_str(), amount.as_str(), line.unit.as_str()];
        let text = parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        document.push_str("- ");
        document.push_str(&text);
        document.push('\n');
    }
    document
}
