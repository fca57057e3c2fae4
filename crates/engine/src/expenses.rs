//! Expenses collection, scoped by trip.

use std::sync::Arc;

use api_types::{
    expense::{Amount, Expense, ExpenseId, ExpenseNew},
    trip::TripId,
};
use tracing::debug;

use crate::{
    EngineError, ResultEngine,
    document::{Document, FieldValue, Fields},
    provider::DocumentStore,
    session::SessionStore,
    util::required,
};

pub(crate) const COLLECTION: &str = "expenses";
pub(crate) const TRIP_FIELD: &str = "tripId";

#[derive(Debug)]
pub struct ExpenseRepository<D> {
    store: Arc<D>,
    session: SessionStore,
}

impl<D> Clone for ExpenseRepository<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            session: self.session.clone(),
        }
    }
}

impl<D: DocumentStore> ExpenseRepository<D> {
    pub fn new(store: Arc<D>, session: SessionStore) -> Self {
        Self { store, session }
    }

    /// Record an expense against `trip_id`.
    ///
    /// Not idempotent, same as trip creation.
    pub async fn create_expense(
        &self,
        trip_id: &TripId,
        title: &str,
        amount: Amount,
        category: &str,
    ) -> ResultEngine<ExpenseId> {
        if required(trip_id.as_str()).is_none() {
            return Err(EngineError::Validation("Trip is required!".to_string()));
        }
        let (Some(title), Some(category)) = (required(title), required(category)) else {
            return Err(EngineError::Validation(
                "Title and Category are required!".to_string(),
            ));
        };
        let expense = ExpenseNew {
            trip_id: trip_id.clone(),
            title: title.to_string(),
            amount,
            category: category.to_string(),
        };

        let credentials = self.session.credentials();
        let id = self
            .store
            .insert(COLLECTION, expense_fields(&expense), credentials.as_ref())
            .await
            .map_err(|err| EngineError::WriteFailed(err.to_string()))?;
        debug!("created expense {id} for trip {trip_id}");
        Ok(ExpenseId::new(id))
    }

    /// Every expense recorded against `trip_id`, in provider order.
    pub async fn list_expenses_for_trip(&self, trip_id: &TripId) -> ResultEngine<Vec<Expense>> {
        let credentials = self.session.credentials();
        let documents = self
            .store
            .query_eq(
                COLLECTION,
                TRIP_FIELD,
                FieldValue::from(trip_id.as_str()),
                credentials.as_ref(),
            )
            .await
            .map_err(|err| EngineError::ReadFailed(err.to_string()))?;
        documents.iter().map(expense_from_document).collect()
    }
}

/// Whole amounts are stored as integer values.
fn amount_value(amount: Amount) -> FieldValue {
    match amount.as_whole() {
        Some(whole) => FieldValue::Integer(whole),
        None => FieldValue::Double(amount.value()),
    }
}

fn expense_fields(expense: &ExpenseNew) -> Fields {
    Fields::from([
        (
            TRIP_FIELD.to_string(),
            FieldValue::from(expense.trip_id.as_str()),
        ),
        ("title".to_string(), FieldValue::from(expense.title.as_str())),
        ("amount".to_string(), amount_value(expense.amount)),
        (
            "category".to_string(),
            FieldValue::from(expense.category.as_str()),
        ),
    ])
}

fn expense_from_document(document: &Document) -> ResultEngine<Expense> {
    let amount = Amount::new(document.number("amount")?).map_err(|err| {
        EngineError::ReadFailed(format!("document {}: {err}", document.id))
    })?;
    Ok(Expense {
        id: ExpenseId::new(document.id.clone()),
        trip_id: TripId::new(document.string(TRIP_FIELD)?),
        title: document.string("title")?,
        amount,
        category: document.string("category")?,
    })
}
