//! Defines the API routes and maps them to the route handlers.

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    auth, category,
    state::AppState,
    stores::{CategoryStore, TransactionStore, UserStore},
    transaction,
};

/// The API endpoint URIs.
pub mod endpoints {
    /// The route to request a cup of coffee (experimental).
    pub const COFFEE: &str = "/api/coffee";
    /// The route for registering a new user.
    pub const REGISTER: &str = "/api/auth/register";
    /// The route for logging in a user.
    pub const LOG_IN: &str = "/api/auth/login";
    /// The route to list and create categories.
    pub const CATEGORIES: &str = "/api/categories";
    /// The route to get, update, and delete a single category.
    pub const CATEGORY: &str = "/api/categories/{category_id}";
    /// The route to list and create transactions.
    pub const TRANSACTIONS: &str = "/api/transactions";
    /// The route to list transactions for a single calendar month.
    pub const MONTHLY_TRANSACTIONS: &str = "/api/transactions/monthly";
    /// The route to get, update, and delete a single transaction.
    pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
}

/// Return a router with all the app's routes.
pub fn build_router<C, T, U>(state: AppState<C, T, U>) -> Router
where
    C: CategoryStore + Clone + Send + Sync + 'static,
    T: TransactionStore + Clone + Send + Sync + 'static,
    U: UserStore + Clone + Send + Sync + 'static,
{
    Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::REGISTER, post(auth::register_endpoint::<C, T, U>))
        .route(endpoints::LOG_IN, post(auth::log_in_endpoint::<C, T, U>))
        .route(
            endpoints::CATEGORIES,
            get(category::get_categories_endpoint::<C, T, U>)
                .post(category::create_category_endpoint::<C, T, U>),
        )
        .route(
            endpoints::CATEGORY,
            get(category::get_category_endpoint::<C, T, U>)
                .put(category::update_category_endpoint::<C, T, U>)
                .delete(category::delete_category_endpoint::<C, T, U>),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(transaction::get_transactions_endpoint::<C, T, U>)
                .post(transaction::create_transaction_endpoint::<C, T, U>),
        )
        .route(
            endpoints::MONTHLY_TRANSACTIONS,
            get(transaction::get_monthly_transactions_endpoint::<C, T, U>),
        )
        .route(
            endpoints::TRANSACTION,
            get(transaction::get_transaction_endpoint::<C, T, U>)
                .put(transaction::update_transaction_endpoint::<C, T, U>)
                .delete(transaction::delete_transaction_endpoint::<C, T, U>),
        )
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    StatusCode::IM_A_TEAPOT.into_response()
}
