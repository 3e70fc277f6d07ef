//! Income prediction repository contract and SQLite implementation.

use super::links::{load_category_refs, replace_category_links, LinkTable};
use super::{
    check_row, date_to_db, expect_changed, in_write_scope, parse_date, parse_id, RepoResult,
};
use crate::model::entry::{IncomePrediction, PredictionId};
use crate::model::money::Money;
use rusqlite::{params, Connection, Row};

const PREDICTION_SELECT_SQL: &str =
    "SELECT id, date, origin, value_cents, paid_at FROM income_predictions";

pub trait PredictionRepository {
    fn create_prediction(&self, prediction: &IncomePrediction) -> RepoResult<PredictionId>;
    fn update_prediction(&self, prediction: &IncomePrediction) -> RepoResult<()>;
    fn get_prediction(&self, id: PredictionId) -> RepoResult<Option<IncomePrediction>>;
    /// All predictions, `date DESC, id ASC`.
    fn list_predictions(&self) -> RepoResult<Vec<IncomePrediction>>;
    fn delete_prediction(&self, id: PredictionId) -> RepoResult<()>;
}

pub struct SqlitePredictionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePredictionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn attach_categories(&self, mut prediction: IncomePrediction) -> RepoResult<IncomePrediction> {
        prediction.categories =
            load_category_refs(self.conn, LinkTable::Prediction, &prediction.id.to_string())?;
        Ok(prediction)
    }
}

impl PredictionRepository for SqlitePredictionRepository<'_> {
    fn create_prediction(&self, prediction: &IncomePrediction) -> RepoResult<PredictionId> {
        prediction.validate()?;
        let id = prediction.id.to_string();

        in_write_scope(self.conn, || {
            self.conn.execute(
                "INSERT INTO income_predictions (id, date, origin, value_cents, paid_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id,
                    date_to_db(prediction.date),
                    prediction.origin.trim(),
                    prediction.value.cents(),
                    prediction.paid_at,
                ],
            )?;
            replace_category_links(
                self.conn,
                LinkTable::Prediction,
                &id,
                prediction.categories.iter().map(|category| &category.id),
            )
        })?;

        Ok(prediction.id)
    }

    fn update_prediction(&self, prediction: &IncomePrediction) -> RepoResult<()> {
        prediction.validate()?;
        let id = prediction.id.to_string();

        in_write_scope(self.conn, || {
            let changed = self.conn.execute(
                "UPDATE income_predictions
                 SET
                    date = ?2,
                    origin = ?3,
                    value_cents = ?4,
                    paid_at = ?5,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    id,
                    date_to_db(prediction.date),
                    prediction.origin.trim(),
                    prediction.value.cents(),
                    prediction.paid_at,
                ],
            )?;
            expect_changed(changed, prediction.id)?;
            replace_category_links(
                self.conn,
                LinkTable::Prediction,
                &id,
                prediction.categories.iter().map(|category| &category.id),
            )
        })
    }

    fn get_prediction(&self, id: PredictionId) -> RepoResult<Option<IncomePrediction>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{PREDICTION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(self.attach_categories(parse_prediction_row(row)?)?)),
            None => Ok(None),
        }
    }

    fn list_predictions(&self) -> RepoResult<Vec<IncomePrediction>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PREDICTION_SELECT_SQL} ORDER BY date DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut predictions = Vec::new();
        while let Some(row) = rows.next()? {
            predictions.push(self.attach_categories(parse_prediction_row(row)?)?);
        }
        Ok(predictions)
    }

    fn delete_prediction(&self, id: PredictionId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM income_predictions WHERE id = ?1;",
            [id.to_string()],
        )?;
        expect_changed(changed, id)
    }
}

fn parse_prediction_row(row: &Row<'_>) -> RepoResult<IncomePrediction> {
    let id_text: String = row.get("id")?;
    let date_text: String = row.get("date")?;
    let prediction = IncomePrediction {
        id: parse_id(&id_text, "income_predictions.id")?,
        date: parse_date(&date_text, "income_predictions.date")?,
        origin: row.get("origin")?,
        value: Money::from_cents(row.get("value_cents")?),
        paid_at: row.get("paid_at")?,
        categories: Vec::new(),
    };
    check_row(prediction.validate(), "income_predictions")?;
    Ok(prediction)
}
