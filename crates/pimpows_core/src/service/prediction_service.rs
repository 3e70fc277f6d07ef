//! Income prediction use-case service.
//!
//! # Invariants
//! - A prediction is "received" once `paid_at` is set; marking it again
//!   fails with `AlreadyPaid`.
//! - Boards split predictions into pending and received, each keeping the
//!   requested sort.

use super::income_service::EntryListQuery;
use super::{matches_search, resolve_categories, EntrySort, LedgerError, LedgerResult};
use crate::model::category::{Categorized, CategoryId, CategoryKind};
use crate::model::entry::{IncomePrediction, PredictionId};
use crate::model::money::Money;
use crate::repo::prediction_repo::{PredictionRepository, SqlitePredictionRepository};
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use std::cmp::Reverse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrediction {
    pub date: NaiveDate,
    pub origin: String,
    pub value: Money,
    pub category_ids: Vec<CategoryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionPatch {
    pub date: Option<NaiveDate>,
    pub origin: Option<String>,
    pub value: Option<Money>,
    pub category_ids: Option<Vec<CategoryId>>,
}

/// Predictions split by payment state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionBoard {
    pub pending: Vec<IncomePrediction>,
    pub received: Vec<IncomePrediction>,
}

impl PredictionBoard {
    pub fn pending_total(&self) -> Money {
        self.pending.iter().map(|prediction| prediction.value).sum()
    }

    pub fn received_total(&self) -> Money {
        self.received.iter().map(|prediction| prediction.value).sum()
    }
}

pub struct PredictionService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> PredictionService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn create_prediction(&self, request: &NewPrediction) -> LedgerResult<IncomePrediction> {
        let tx = self.conn.unchecked_transaction()?;
        let mut prediction =
            IncomePrediction::new(request.date, request.origin.trim(), request.value);
        prediction.categories =
            resolve_categories(&tx, &request.category_ids, CategoryKind::Income)?;
        SqlitePredictionRepository::new(&tx).create_prediction(&prediction)?;
        tx.commit()?;

        info!("event=prediction_create module=service status=ok");
        Ok(prediction)
    }

    pub fn update_prediction(
        &self,
        id: PredictionId,
        patch: &PredictionPatch,
    ) -> LedgerResult<IncomePrediction> {
        let tx = self.conn.unchecked_transaction()?;
        let repo = SqlitePredictionRepository::new(&tx);
        let mut prediction = repo.get_prediction(id)?.ok_or(LedgerError::NotFound(id))?;

        if let Some(date) = patch.date {
            prediction.date = date;
        }
        if let Some(origin) = &patch.origin {
            prediction.origin = origin.trim().to_string();
        }
        if let Some(value) = patch.value {
            prediction.value = value;
        }
        if let Some(category_ids) = &patch.category_ids {
            prediction.categories = resolve_categories(&tx, category_ids, CategoryKind::Income)?;
        }

        repo.update_prediction(&prediction)?;
        tx.commit()?;
        Ok(prediction)
    }

    /// Records that the predicted income arrived at `paid_at_ms`.
    pub fn mark_prediction_paid(
        &self,
        id: PredictionId,
        paid_at_ms: i64,
    ) -> LedgerResult<IncomePrediction> {
        let repo = SqlitePredictionRepository::new(self.conn);
        let mut prediction = repo.get_prediction(id)?.ok_or(LedgerError::NotFound(id))?;
        if prediction.is_paid() {
            return Err(LedgerError::AlreadyPaid(id));
        }
        prediction.paid_at = Some(paid_at_ms);
        repo.update_prediction(&prediction)?;

        info!("event=prediction_paid module=service status=ok");
        Ok(prediction)
    }

    /// Clears the received mark.
    pub fn unmark_prediction_paid(&self, id: PredictionId) -> LedgerResult<IncomePrediction> {
        let repo = SqlitePredictionRepository::new(self.conn);
        let mut prediction = repo.get_prediction(id)?.ok_or(LedgerError::NotFound(id))?;
        if !prediction.is_paid() {
            return Err(LedgerError::NotPaid(id));
        }
        prediction.paid_at = None;
        repo.update_prediction(&prediction)?;
        Ok(prediction)
    }

    pub fn get_prediction(&self, id: PredictionId) -> LedgerResult<Option<IncomePrediction>> {
        Ok(SqlitePredictionRepository::new(self.conn).get_prediction(id)?)
    }

    pub fn delete_prediction(&self, id: PredictionId) -> LedgerResult<()> {
        SqlitePredictionRepository::new(self.conn).delete_prediction(id)?;
        info!("event=prediction_delete module=service status=ok");
        Ok(())
    }

    /// Filters predictions by date window, categories and origin text, then
    /// splits them by payment state.
    pub fn prediction_board(&self, query: &EntryListQuery) -> LedgerResult<PredictionBoard> {
        let mut matching: Vec<IncomePrediction> = SqlitePredictionRepository::new(self.conn)
            .list_predictions()?
            .into_iter()
            .filter(|prediction| query.window.from.map_or(true, |from| prediction.date >= from))
            .filter(|prediction| query.window.to.map_or(true, |to| prediction.date <= to))
            .filter(|prediction| prediction.matches_any(&query.categories))
            .filter(|prediction| matches_search(&prediction.origin, query.search.as_deref()))
            .collect();

        if query.sort == EntrySort::ValueDesc {
            matching.sort_by_key(|prediction| {
                (Reverse(prediction.value), Reverse(prediction.date))
            });
        }

        let (received, pending): (Vec<_>, Vec<_>) =
            matching.into_iter().partition(IncomePrediction::is_paid);
        Ok(PredictionBoard { pending, received })
    }
}
