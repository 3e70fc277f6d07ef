//! Category repository contract and SQLite implementation.
//!
//! # Invariants
//! - Listing is ordered by name (case-insensitive), then id.
//! - `kind` is written on insert only; updates touch name and color.
//! - Deleting a category cascades its links away (schema FK).

use super::{check_row, expect_changed, parse_id, RepoError, RepoResult};
use crate::model::category::{Category, CategoryId, CategoryKind};
use rusqlite::{params, Connection, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT id, name, color, kind FROM categories";

pub trait CategoryRepository {
    fn create_category(&self, category: &Category) -> RepoResult<CategoryId>;
    fn update_category(&self, category: &Category) -> RepoResult<()>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    fn list_categories(&self, kind: Option<CategoryKind>) -> RepoResult<Vec<Category>>;
    fn count_categories(&self) -> RepoResult<usize>;
    fn delete_category(&self, id: CategoryId) -> RepoResult<()>;
}

pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, category: &Category) -> RepoResult<CategoryId> {
        category.validate()?;
        self.conn.execute(
            "INSERT INTO categories (id, name, color, kind) VALUES (?1, ?2, ?3, ?4);",
            params![
                category.id.to_string(),
                category.name.trim(),
                category.color.as_str(),
                category.kind.as_str(),
            ],
        )?;
        Ok(category.id)
    }

    fn update_category(&self, category: &Category) -> RepoResult<()> {
        category.validate()?;
        let changed = self.conn.execute(
            "UPDATE categories SET name = ?2, color = ?3 WHERE id = ?1;",
            params![
                category.id.to_string(),
                category.name.trim(),
                category.color.as_str(),
            ],
        )?;
        expect_changed(changed, category.id)
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_category_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_categories(&self, kind: Option<CategoryKind>) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             WHERE (?1 IS NULL OR kind = ?1)
             ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([kind.map(CategoryKind::as_str)])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn count_categories(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories;", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn delete_category(&self, id: CategoryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1;", [id.to_string()])?;
        expect_changed(changed, id)
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let id_text: String = row.get("id")?;
    let kind_text: String = row.get("kind")?;
    let kind = CategoryKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid category kind `{kind_text}` in categories.kind"))
    })?;

    let category = Category {
        id: parse_id(&id_text, "categories.id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        kind,
    };
    check_row(category.validate(), "categories")?;
    Ok(category)
}
