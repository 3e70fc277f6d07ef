//! Category link tables (`*_categories`).
//!
//! Links are always replaced as a whole set: delete all rows of the
//! owner, then insert the new set. Duplicate ids collapse silently.

use super::{parse_id, RepoResult};
use crate::model::category::{CategoryId, CategoryRef};
use rusqlite::{params, Connection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkTable {
    Bill,
    Income,
    Expense,
    Prediction,
}

impl LinkTable {
    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Bill => "bill_categories",
            Self::Income => "income_categories",
            Self::Expense => "expense_categories",
            Self::Prediction => "income_prediction_categories",
        }
    }

    pub(crate) fn owner_column(self) -> &'static str {
        match self {
            Self::Bill => "bill_id",
            Self::Income => "income_id",
            Self::Expense => "expense_id",
            Self::Prediction => "prediction_id",
        }
    }
}

/// Loads the category tags of one owner row, ordered by name.
pub(crate) fn load_category_refs(
    conn: &Connection,
    link: LinkTable,
    owner_id: &str,
) -> RepoResult<Vec<CategoryRef>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT c.id, c.name, c.color
         FROM {table} l
         INNER JOIN categories c ON c.id = l.category_id
         WHERE l.{owner} = ?1
         ORDER BY c.name COLLATE NOCASE ASC, c.id ASC;",
        table = link.table(),
        owner = link.owner_column(),
    ))?;
    let mut rows = stmt.query([owner_id])?;
    let mut refs = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get(0)?;
        refs.push(CategoryRef {
            id: parse_id(&id_text, "categories.id")?,
            name: row.get(1)?,
            color: row.get(2)?,
        });
    }
    Ok(refs)
}

/// Replaces the full category set of one owner row.
///
/// Must run inside the caller's transaction.
pub(crate) fn replace_category_links<'a>(
    conn: &Connection,
    link: LinkTable,
    owner_id: &str,
    category_ids: impl IntoIterator<Item = &'a CategoryId>,
) -> RepoResult<()> {
    conn.execute(
        &format!(
            "DELETE FROM {table} WHERE {owner} = ?1;",
            table = link.table(),
            owner = link.owner_column(),
        ),
        [owner_id],
    )?;

    let mut insert = conn.prepare_cached(&format!(
        "INSERT OR IGNORE INTO {table} ({owner}, category_id) VALUES (?1, ?2);",
        table = link.table(),
        owner = link.owner_column(),
    ))?;
    for category_id in category_ids {
        insert.execute(params![owner_id, category_id.to_string()])?;
    }
    Ok(())
}
