//! Category use-case service.

use super::{LedgerError, LedgerResult};
use crate::model::category::{palette_color, Category, CategoryId, CategoryKind};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use log::info;
use rusqlite::Connection;

pub struct CategoryService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CategoryService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn repo(&self) -> SqliteCategoryRepository<'conn> {
        SqliteCategoryRepository::new(self.conn)
    }

    /// Creates a category; without `color`, one is taken from the default
    /// palette, cycling by the number of existing categories.
    pub fn create_category(
        &self,
        name: &str,
        color: Option<&str>,
        kind: CategoryKind,
    ) -> LedgerResult<Category> {
        let repo = self.repo();
        let color = match color {
            Some(value) => value.trim().to_string(),
            None => palette_color(repo.count_categories()?).to_string(),
        };
        let category = Category::new(name.trim(), color, kind);
        repo.create_category(&category)?;
        info!(
            "event=category_create module=service status=ok kind={}",
            kind.as_str()
        );
        Ok(category)
    }

    /// Renames and/or recolors a category. The kind never changes.
    pub fn update_category(
        &self,
        id: CategoryId,
        name: Option<&str>,
        color: Option<&str>,
    ) -> LedgerResult<Category> {
        let repo = self.repo();
        let mut category = repo.get_category(id)?.ok_or(LedgerError::NotFound(id))?;
        if let Some(name) = name {
            category.name = name.trim().to_string();
        }
        if let Some(color) = color {
            category.color = color.trim().to_string();
        }
        repo.update_category(&category)?;
        Ok(category)
    }

    pub fn get_category(&self, id: CategoryId) -> LedgerResult<Option<Category>> {
        Ok(self.repo().get_category(id)?)
    }

    /// Lists categories by name; `kind` narrows to expense or income.
    pub fn list_categories(&self, kind: Option<CategoryKind>) -> LedgerResult<Vec<Category>> {
        Ok(self.repo().list_categories(kind)?)
    }

    /// Deletes a category and, through the schema, every link to it.
    pub fn delete_category(&self, id: CategoryId) -> LedgerResult<()> {
        self.repo().delete_category(id)?;
        info!("event=category_delete module=service status=ok");
        Ok(())
    }
}
