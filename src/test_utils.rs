//! Helpers shared between the test modules.

use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState,
    auth::{AuthResponse, UserData},
    db::initialize,
    models::{PasswordHash, User},
    routes::endpoints,
    stores::{
        UserStore,
        sqlite::{SQLiteCategoryStore, SQLiteTransactionStore, SQLiteUserStore},
    },
};

/// The concrete state type used by the tests.
pub type TestAppState = AppState<SQLiteCategoryStore, SQLiteTransactionStore, SQLiteUserStore>;

/// Create an [AppState] backed by a fresh in-memory database.
pub fn get_test_app_state() -> TestAppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&connection).expect("Could not initialize database.");
    let connection = Arc::new(Mutex::new(connection));

    AppState::new(
        "a-test-only-secret",
        SQLiteCategoryStore::new(connection.clone()),
        SQLiteTransactionStore::new(connection.clone()),
        SQLiteUserStore::new(connection),
    )
}

/// Insert a user with `email` directly into the state's user store.
///
/// The password hash is not derived from a real password, so this user cannot
/// log in over the API. Use [sign_up] for endpoint tests.
pub fn register_test_user(state: &TestAppState, email: &str) -> User {
    state
        .user_store
        .clone()
        .create(
            email.parse().expect("Could not parse email."),
            PasswordHash::new_unchecked("hunter2"),
        )
        .expect("Could not create test user.")
}

/// Register a user with `email` through the API and return the created user
/// along with a bearer token for them.
pub async fn sign_up(server: &TestServer, email: &str) -> (UserData, String) {
    let response = server
        .post(endpoints::REGISTER)
        .content_type("application/json")
        .json(&json!({
            "email": email,
            "password": "averysafeandsecurepassword",
        }))
        .await;

    response.assert_status_ok();

    let auth_response = response.json::<AuthResponse>();

    (auth_response.user, auth_response.access_token)
}
