pub mod checklist;

pub use checklist::{render, CategorizedLayout, LayoutItem, LayoutSection};
