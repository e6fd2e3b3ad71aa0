//! Consolidated checklist rendering
//!
//! Produces the HTML body understood by the notes store: a title, then one
//! `<h2>` header per non-empty section followed by a checkbox list. Output is
//! a pure function of its input.

use serde::{Deserialize, Serialize};

const UNNAMED_SECTION: &str = "Uncategorized";

/// Sections of checklist items, in the order they should appear
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedLayout {
    #[serde(default)]
    pub sections: Vec<LayoutSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<LayoutItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem {
    #[serde(default)]
    pub text: String,
}

impl CategorizedLayout {
    /// Build a layout from `(section, items)` pairs
    pub fn from_pairs<S, I, T>(pairs: impl IntoIterator<Item = (S, I)>) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            sections: pairs
                .into_iter()
                .map(|(name, items)| LayoutSection {
                    name: name.into(),
                    items: items
                        .into_iter()
                        .map(|text| LayoutItem { text: text.into() })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

/// Render the checklist markup
///
/// Sections and items keep caller order. Empty sections are dropped; nothing
/// is sorted or deduplicated.
pub fn render(title: &str, layout: &CategorizedLayout) -> String {
    let mut lines = vec![format!("<div><h1>{}</h1>", escape(title)), "<br>".to_string()];

    for section in layout.sections.iter().filter(|s| !s.items.is_empty()) {
        let name = if section.name.trim().is_empty() {
            UNNAMED_SECTION
        } else {
            section.name.as_str()
        };
        lines.push(format!("<h2>{}</h2>", escape(name)));
        lines.push("<ul>".to_string());
        for item in &section.items {
            lines.push(format!("<li><div><en-todo/>{}</div></li>", escape(&item.text)));
        }
        lines.push("</ul>".to_string());
        lines.push("<br>".to_string());
    }

    lines.push("</div>".to_string());
    lines.join("\n")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_render_exact_markup() {
        let layout = CategorizedLayout::from_pairs([("Produce", vec!["Tomatoes", "Basil"])]);
        let markup = render("Groceries", &layout);
        assert_eq!(
            markup,
            "<div><h1>Groceries</h1>\n<br>\n<h2>Produce</h2>\n<ul>\n\
             <li><div><en-todo/>Tomatoes</div></li>\n<li><div><en-todo/>Basil</div></li>\n\
             </ul>\n<br>\n</div>"
        );
    }

    #[test]
    fn test_empty_section_skipped() {
        let layout = CategorizedLayout::from_pairs([
            ("Produce", vec!["Apples"]),
            ("Frozen", vec![]),
            ("Bakery", vec!["Bread"]),
        ]);
        let markup = render("Groceries", &layout);
        assert!(!markup.contains("Frozen"));
        assert!(markup.contains("<h2>Produce</h2>"));
        assert!(markup.contains("<h2>Bakery</h2>"));
    }

    #[test]
    fn test_order_preserved_no_dedup() {
        let layout = CategorizedLayout::from_pairs([
            ("Snacks & Sweets", vec!["Chips", "Chips"]),
            ("Beverages", vec!["Water"]),
        ]);
        let markup = render("Groceries", &layout);
        let snacks = markup.find("Snacks").unwrap();
        let beverages = markup.find("Beverages").unwrap();
        assert!(snacks < beverages);
        assert_eq!(markup.matches("Chips").count(), 2);
    }

    #[test]
    fn test_escaping() {
        let layout = CategorizedLayout::from_pairs([("Pantry & Dry Goods", vec!["<Rice>"])]);
        let markup = render("Groceries", &layout);
        assert!(markup.contains("<h2>Pantry &amp; Dry Goods</h2>"));
        assert!(markup.contains("&lt;Rice&gt;"));
    }

    #[test]
    fn test_unnamed_section() {
        let layout = CategorizedLayout::from_pairs([("", vec!["Mystery"])]);
        assert!(render("Groceries", &layout).contains("<h2>Uncategorized</h2>"));
    }

    #[test]
    fn test_empty_layout() {
        let markup = render("Groceries", &CategorizedLayout::default());
        assert_eq!(markup, "<div><h1>Groceries</h1>\n<br>\n</div>");
    }

    #[test]
    fn test_layout_deserialization_defaults() {
        let layout: CategorizedLayout =
            serde_json::from_str(r#"{"sections": [{"name": "Dairy & Eggs"}]}"#).unwrap();
        assert_eq!(layout.sections.len(), 1);
        assert_eq!(layout.item_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_render_is_deterministic(
            title in "[A-Za-z ]{0,12}",
            sections in proptest::collection::vec(
                ("[A-Za-z&]{0,10}", proptest::collection::vec("[A-Za-z<> ]{0,10}", 0..4)),
                0..5,
            ),
        ) {
            let layout = CategorizedLayout::from_pairs(sections);
            prop_assert_eq!(render(&title, &layout), render(&title, &layout.clone()));
        }
    }
}
