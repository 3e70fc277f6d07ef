//! Category model: named, colored tags that group ledger entries.
//!
//! # Invariants
//! - `kind` is fixed at creation; expense categories tag bills and
//!   expenses, income categories tag income entries and predictions.
//! - `color` is always `#RRGGBB`.

use super::{require_text, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub type CategoryId = Uuid;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

/// Palette offered when the user does not pick a color.
pub const DEFAULT_CATEGORY_COLORS: [&str; 16] = [
    "#EF4444", "#F97316", "#F59E0B", "#EAB308", "#84CC16", "#22C55E", "#10B981", "#14B8A6",
    "#06B6D4", "#0EA5E9", "#3B82F6", "#6366F1", "#8B5CF6", "#A855F7", "#D946EF", "#EC4899",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Expense,
    Income,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "expense" => Some(Self::Expense),
            "income" => Some(Self::Income),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
    pub kind: CategoryKind,
}

impl Category {
    pub fn new(name: impl Into<String>, color: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: color.into(),
            kind,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        if !is_valid_color(&self.color) {
            return Err(ValidationError::InvalidColor(self.color.clone()));
        }
        Ok(())
    }

    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

/// Category tag as attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
}

pub fn is_valid_color(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value)
}

/// Picks a palette color, cycling by how many categories already exist.
pub fn palette_color(existing: usize) -> &'static str {
    DEFAULT_CATEGORY_COLORS[existing % DEFAULT_CATEGORY_COLORS.len()]
}

/// Records that carry a category set.
pub trait Categorized {
    fn categories(&self) -> &[CategoryRef];

    /// True when the filter is empty or any category is in it.
    fn matches_any(&self, filter: &HashSet<CategoryId>) -> bool {
        filter.is_empty()
            || self
                .categories()
                .iter()
                .any(|category| filter.contains(&category.id))
    }

    fn has_category(&self, id: CategoryId) -> bool {
        self.categories().iter().any(|category| category.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_color, palette_color, Category, CategoryKind, DEFAULT_CATEGORY_COLORS};
    use crate::model::ValidationError;

    #[test]
    fn color_must_be_six_hex_digits() {
        assert!(is_valid_color("#3B82F6"));
        assert!(is_valid_color("#abcdef"));
        assert!(!is_valid_color("3B82F6"));
        assert!(!is_valid_color("#3B82F"));
        assert!(!is_valid_color("#GGGGGG"));
    }

    #[test]
    fn validate_rejects_blank_name_and_bad_color() {
        let blank = Category::new("  ", "#3B82F6", CategoryKind::Expense);
        assert_eq!(blank.validate(), Err(ValidationError::BlankField("name")));

        let bad_color = Category::new("Casa", "blue", CategoryKind::Expense);
        assert!(matches!(
            bad_color.validate(),
            Err(ValidationError::InvalidColor(_))
        ));
    }

    #[test]
    fn palette_wraps_around() {
        assert_eq!(palette_color(0), DEFAULT_CATEGORY_COLORS[0]);
        assert_eq!(palette_color(17), DEFAULT_CATEGORY_COLORS[1]);
    }
}
