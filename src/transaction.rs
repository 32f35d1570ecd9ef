//! Implements the operations for managing transactions and the API route
//! handlers that expose them.
//!
//! Transactions always belong to the user that created them. The category
//! reference on a transaction is weak: a reference that does not resolve is
//! silently dropped instead of failing the operation.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, auth,
    auth::Claims,
    models::{DatabaseID, Transaction, TransactionType, User},
    ownership,
    state::AppState,
    stores::{CategoryStore, TransactionStore, UserStore},
};

/// The transport representation of a [Transaction].
///
/// Alongside the category id, the record carries the category's name so that
/// clients do not need a second request to display it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionData {
    /// The ID of the transaction.
    pub id: DatabaseID,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// Whether the transaction records income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The ID of the category the transaction is labelled with, if any.
    pub category_id: Option<DatabaseID>,
    /// The name of the category the transaction is labelled with, if any.
    pub category_name: Option<String>,
}

/// The request body for creating or updating a transaction.
///
/// There is deliberately no owner field: transactions are always attributed to
/// the authenticated user making the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// A text description of what the transaction is for.
    pub description: String,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// Whether the transaction records income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The ID of the category to label the transaction with, if any.
    #[serde(default)]
    pub category_id: Option<DatabaseID>,
}

/// Resolve a category reference supplied by the client.
///
/// A reference that does not resolve yields `None` so that the transaction is
/// stored uncategorized rather than the operation failing.
fn resolve_category<C: CategoryStore>(
    category_store: &C,
    category_id: Option<DatabaseID>,
) -> Result<Option<DatabaseID>, Error> {
    match category_id {
        None => Ok(None),
        Some(category_id) => match category_store.get(category_id) {
            Ok(category) => Ok(Some(category.id)),
            Err(Error::NotFound) => Ok(None),
            Err(error) => Err(error),
        },
    }
}

/// Map a transaction to its transport representation, attaching the category
/// name where the category still resolves.
fn to_transaction_data<C: CategoryStore>(
    transaction: Transaction,
    category_store: &C,
) -> Result<TransactionData, Error> {
    let category_name = match transaction.category_id {
        None => None,
        Some(category_id) => match category_store.get(category_id) {
            Ok(category) => Some(category.name.to_string()),
            Err(Error::NotFound) => None,
            Err(error) => return Err(error),
        },
    };

    Ok(TransactionData {
        id: transaction.id,
        description: transaction.description,
        amount: transaction.amount,
        date: transaction.date,
        transaction_type: transaction.transaction_type,
        category_id: transaction.category_id,
        category_name,
    })
}

/// All transactions owned by `current_user`, most recent first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn list_transactions<T, C>(
    transaction_store: &T,
    category_store: &C,
    current_user: &User,
) -> Result<Vec<TransactionData>, Error>
where
    T: TransactionStore,
    C: CategoryStore,
{
    transaction_store
        .get_by_user(current_user.id)?
        .into_iter()
        .map(|transaction| to_transaction_data(transaction, category_store))
        .collect()
}

/// The transactions owned by `current_user` dated in the given calendar month,
/// most recent first.
///
/// `year` and `month` are taken as-is from the caller; a pair that does not
/// name a valid calendar month yields an empty list.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn list_transactions_by_month<T, C>(
    transaction_store: &T,
    category_store: &C,
    year: i32,
    month: i32,
    current_user: &User,
) -> Result<Vec<TransactionData>, Error>
where
    T: TransactionStore,
    C: CategoryStore,
{
    transaction_store
        .get_by_user_and_month(current_user.id, year, month)?
        .into_iter()
        .map(|transaction| to_transaction_data(transaction, category_store))
        .collect()
}

/// Get a transaction by its ID.
///
/// Any authenticated user may fetch any transaction by id; ownership is only
/// checked on the mutating operations.
///
/// # Errors
/// Returns [Error::NotFound] if `transaction_id` does not refer to a
/// transaction.
pub fn get_transaction<T, C>(
    transaction_store: &T,
    category_store: &C,
    transaction_id: DatabaseID,
) -> Result<TransactionData, Error>
where
    T: TransactionStore,
    C: CategoryStore,
{
    let transaction = transaction_store.get(transaction_id)?;

    to_transaction_data(transaction, category_store)
}

/// Create a new transaction owned by `current_user`.
///
/// Any owner hint in the input is ignored: the new transaction is always
/// attributed to `current_user`.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_transaction<T, C>(
    transaction_store: &mut T,
    category_store: &C,
    data: NewTransaction,
    current_user: &User,
) -> Result<TransactionData, Error>
where
    T: TransactionStore,
    C: CategoryStore,
{
    let category_id = resolve_category(category_store, data.category_id)?;

    let builder = Transaction::build(data.amount, current_user.id)
        .description(data.description)
        .date(data.date)
        .transaction_type(data.transaction_type)
        .category(category_id);

    let transaction = transaction_store.create(builder)?;

    to_transaction_data(transaction, category_store)
}

/// Overwrite the mutable fields of the transaction with `transaction_id`.
///
/// The owner of the transaction never changes.
///
/// # Errors
/// Returns [Error::NotFound] if `transaction_id` does not refer to a
/// transaction or the transaction is owned by another user.
pub fn update_transaction<T, C>(
    transaction_store: &mut T,
    category_store: &C,
    transaction_id: DatabaseID,
    data: NewTransaction,
    current_user: &User,
) -> Result<TransactionData, Error>
where
    T: TransactionStore,
    C: CategoryStore,
{
    let transaction = transaction_store.get(transaction_id)?;

    if !ownership::can_modify_transaction(&transaction, current_user.id) {
        return Err(Error::NotFound);
    }

    let category_id = resolve_category(category_store, data.category_id)?;

    let updated_transaction = Transaction {
        id: transaction.id,
        description: data.description,
        amount: data.amount,
        date: data.date,
        transaction_type: data.transaction_type,
        user_id: transaction.user_id,
        category_id,
    };

    transaction_store.update(&updated_transaction)?;

    to_transaction_data(updated_transaction, category_store)
}

/// Delete the transaction with `transaction_id`.
///
/// # Errors
/// Returns [Error::NotFound] if `transaction_id` does not refer to a
/// transaction or the transaction is owned by another user.
pub fn delete_transaction<T: TransactionStore>(
    transaction_store: &mut T,
    transaction_id: DatabaseID,
    current_user: &User,
) -> Result<(), Error> {
    let transaction = transaction_store.get(transaction_id)?;

    if !ownership::can_modify_transaction(&transaction, current_user.id) {
        return Err(Error::NotFound);
    }

    transaction_store.delete(transaction_id)
}

/// The query parameters for the monthly transactions route.
#[derive(Debug, Deserialize)]
pub struct MonthlyParams {
    /// The calendar year to list transactions for.
    pub year: i32,
    /// The one-based calendar month to list transactions for.
    pub month: i32,
}

/// A route handler for listing the acting user's transactions.
pub async fn get_transactions_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    claims: Claims,
) -> Response
where
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let current_user = match auth::resolve_user(&claims, &state.user_store) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    match list_transactions(&state.transaction_store, &state.category_store, &current_user) {
        Ok(transactions) => (StatusCode::OK, Json(transactions)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for listing the acting user's transactions for one month.
pub async fn get_monthly_transactions_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    claims: Claims,
    Query(params): Query<MonthlyParams>,
) -> Response
where
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let current_user = match auth::resolve_user(&claims, &state.user_store) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    match list_transactions_by_month(
        &state.transaction_store,
        &state.category_store,
        params.year,
        params.month,
        &current_user,
    ) {
        Ok(transactions) => (StatusCode::OK, Json(transactions)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for getting a transaction by its database ID.
///
/// This function will return the status code 404 if the requested resource
/// does not exist (e.g., not created yet).
pub async fn get_transaction_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    _claims: Claims,
    Path(transaction_id): Path<DatabaseID>,
) -> Response
where
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    match get_transaction(&state.transaction_store, &state.category_store, transaction_id) {
        Ok(transaction) => (StatusCode::OK, Json(transaction)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for creating a new transaction.
pub async fn create_transaction_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    claims: Claims,
    Json(new_transaction): Json<NewTransaction>,
) -> Response
where
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let current_user = match auth::resolve_user(&claims, &state.user_store) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    let mut transaction_store = state.transaction_store;

    match create_transaction(
        &mut transaction_store,
        &state.category_store,
        new_transaction,
        &current_user,
    ) {
        Ok(transaction) => (StatusCode::OK, Json(transaction)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for updating a transaction.
pub async fn update_transaction_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    claims: Claims,
    Path(transaction_id): Path<DatabaseID>,
    Json(new_transaction): Json<NewTransaction>,
) -> Response
where
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let current_user = match auth::resolve_user(&claims, &state.user_store) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    let mut transaction_store = state.transaction_store;

    match update_transaction(
        &mut transaction_store,
        &state.category_store,
        transaction_id,
        new_transaction,
        &current_user,
    ) {
        Ok(transaction) => (StatusCode::OK, Json(transaction)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    claims: Claims,
    Path(transaction_id): Path<DatabaseID>,
) -> Response
where
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let current_user = match auth::resolve_user(&claims, &state.user_store) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    let mut transaction_store = state.transaction_store;

    match delete_transaction(&mut transaction_store, transaction_id, &current_user) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}


#[cfg(test)]
mod transaction_endpoint_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        routes::endpoints,
        test_utils::{get_test_app_state, sign_up},
    };

    use super::TransactionData;

    #[tokio::test]
    async fn create_and_get_transaction() {
        let server = TestServer::new(crate::build_router(get_test_app_state()));
        let (_, token) = sign_up(&server, "test@test.com").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type("application/json")
            .json(&json!({
                "description": "Coffee",
                "amount": 3.50,
                "date": "2024-03-05",
                "type": "EXPENSE",
                "category_id": null,
            }))
            .await;

        response.assert_status_ok();
        let transaction = response.json::<TransactionData>();
        assert_eq!(transaction.description, "Coffee");

        let response = server
            .get(&format!("{}/{}", endpoints::TRANSACTIONS, transaction.id))
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<TransactionData>(), transaction);
    }

    #[tokio::test]
    async fn create_transaction_with_unknown_category_stores_uncategorized() {
        let server = TestServer::new(crate::build_router(get_test_app_state()));
        let (_, token) = sign_up(&server, "test@test.com").await;

        let transaction = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type("application/json")
            .json(&json!({
                "description": "Coffee",
                "amount": 3.50,
                "date": "2024-03-05",
                "type": "EXPENSE",
                "category_id": 999,
            }))
            .await
            .json::<TransactionData>();

        assert_eq!(transaction.category_id, None);
        assert_eq!(transaction.category_name, None);
    }

    #[tokio::test]
    async fn monthly_route_filters_by_year_and_month() {
        let server = TestServer::new(crate::build_router(get_test_app_state()));
        let (_, token) = sign_up(&server, "test@test.com").await;

        for (description, date) in [("In range", "2024-03-05"), ("Out of range", "2024-04-05")] {
            server
                .post(endpoints::TRANSACTIONS)
                .authorization_bearer(&token)
                .content_type("application/json")
                .json(&json!({
                    "description": description,
                    "amount": 1.0,
                    "date": date,
                    "type": "EXPENSE",
                    "category_id": null,
                }))
                .await
                .assert_status_ok();
        }

        let transactions = server
            .get(&format!(
                "{}?year=2024&month=3",
                endpoints::MONTHLY_TRANSACTIONS
            ))
            .authorization_bearer(&token)
            .await
            .json::<Vec<TransactionData>>();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].description, "In range");
    }

    #[tokio::test]
    async fn delete_transaction_by_other_user_returns_not_found() {
        let server = TestServer::new(crate::build_router(get_test_app_state()));
        let (_, owner_token) = sign_up(&server, "owner@test.com").await;
        let (_, other_token) = sign_up(&server, "other@test.com").await;

        let transaction = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&owner_token)
            .content_type("application/json")
            .json(&json!({
                "description": "Coffee",
                "amount": 3.50,
                "date": "2024-03-05",
                "type": "EXPENSE",
                "category_id": null,
            }))
            .await
            .json::<TransactionData>();

        server
            .delete(&format!("{}/{}", endpoints::TRANSACTIONS, transaction.id))
            .authorization_bearer(&other_token)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn transaction_routes_reject_missing_token() {
        let server = TestServer::new(crate::build_router(get_test_app_state()));

        server
            .get(endpoints::TRANSACTIONS)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
