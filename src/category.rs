//! Implements the operations for managing categories and the API route
//! handlers that expose them.
//!
//! Categories are either owned by a single user or shared between all users.
//! The service functions take the acting user as an explicit argument, see
//! [crate::ownership] for how ownership failures are reported.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, auth,
    auth::Claims,
    models::{Category, CategoryName, CategoryType, DatabaseID, User, UserID},
    ownership,
    state::AppState,
    stores::{CategoryStore, TransactionStore, UserStore},
};

/// Whether a category is owned by the acting user or shared between all users.
///
/// The caller states their intent explicitly instead of it being inferred from
/// the presence of an owner id in the request body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryVisibility {
    /// The category is visible to and editable by every user.
    Shared,
    /// The category belongs to the acting user.
    Owned,
}

/// The transport representation of a [Category].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryData {
    /// The ID of the category.
    pub id: DatabaseID,
    /// The name of the category.
    pub name: String,
    /// An optional text description of what the category is for.
    pub description: Option<String>,
    /// Whether the category applies to income, expenses, or both.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// The ID of the user that owns the category, or `None` for a shared
    /// category.
    pub user_id: Option<UserID>,
}

impl From<Category> for CategoryData {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name.to_string(),
            description: category.description,
            category_type: category.category_type,
            user_id: category.user_id,
        }
    }
}

/// The request body for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    /// The name of the category.
    pub name: String,
    /// An optional text description of what the category is for.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the category applies to income, expenses, or both.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// Whether the category should be owned by the acting user or shared.
    pub visibility: CategoryVisibility,
}

/// The owner to store for a category with `visibility`, acting as `user_id`.
///
/// An owned category is always attributed to the acting user, never to an
/// arbitrary user id supplied by the client.
fn owner_for(visibility: CategoryVisibility, user_id: UserID) -> Option<UserID> {
    match visibility {
        CategoryVisibility::Owned => Some(user_id),
        CategoryVisibility::Shared => None,
    }
}

/// All categories owned by `current_user` plus all shared categories, in
/// insertion order.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn list_categories<C: CategoryStore>(
    category_store: &C,
    current_user: &User,
) -> Result<Vec<CategoryData>, Error> {
    let categories = category_store.get_by_user_or_shared(current_user.id)?;

    Ok(categories.into_iter().map(CategoryData::from).collect())
}

/// Get a category by its ID.
///
/// Any authenticated user may fetch any category by id; ownership is only
/// checked on the mutating operations.
///
/// # Errors
/// Returns [Error::NotFound] if `category_id` does not refer to a category.
pub fn get_category<C: CategoryStore>(
    category_store: &C,
    category_id: DatabaseID,
) -> Result<CategoryData, Error> {
    category_store.get(category_id).map(CategoryData::from)
}

/// Create a new category.
///
/// # Errors
/// Returns [Error::EmptyCategoryName] if the name is blank, or an error if
/// there is an SQL error.
pub fn create_category<C: CategoryStore>(
    category_store: &mut C,
    data: NewCategory,
    current_user: &User,
) -> Result<CategoryData, Error> {
    let name = CategoryName::new(&data.name)?;

    let builder = Category::build(name, data.category_type)
        .description(data.description)
        .owner(owner_for(data.visibility, current_user.id));

    category_store.create(builder).map(CategoryData::from)
}

/// Overwrite the category with `category_id` with the fields in `data`.
///
/// A shared category updated with [CategoryVisibility::Owned] becomes owned by
/// `current_user`.
///
/// # Errors
/// Returns [Error::NotFound] if `category_id` does not refer to a category or
/// the category is owned by another user.
pub fn update_category<C: CategoryStore>(
    category_store: &mut C,
    category_id: DatabaseID,
    data: NewCategory,
    current_user: &User,
) -> Result<CategoryData, Error> {
    let category = category_store.get(category_id)?;

    if !ownership::can_modify_category(&category, current_user.id) {
        return Err(Error::NotFound);
    }

    let name = CategoryName::new(&data.name)?;

    let updated_category = Category {
        id: category.id,
        name,
        description: data.description,
        category_type: data.category_type,
        user_id: owner_for(data.visibility, current_user.id),
    };

    category_store.update(&updated_category)?;

    Ok(CategoryData::from(updated_category))
}

/// Delete the category with `category_id`.
///
/// # Errors
/// Returns [Error::NotFound] if `category_id` does not refer to a category or
/// the category is owned by another user, or [Error::CategoryInUse] if any
/// transaction still references the category.
pub fn delete_category<C, T>(
    category_store: &mut C,
    transaction_store: &T,
    category_id: DatabaseID,
    current_user: &User,
) -> Result<(), Error>
where
    C: CategoryStore,
    T: TransactionStore,
{
    let category = category_store.get(category_id)?;

    if !ownership::can_modify_category(&category, current_user.id) {
        return Err(Error::NotFound);
    }

    if transaction_store.count_by_category(category_id)? > 0 {
        return Err(Error::CategoryInUse);
    }

    category_store.delete(category_id)
}

/// A route handler for listing the acting user's categories.
pub async fn get_categories_endpoint<C, T, U>(
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

    match list_categories(&state.category_store, &current_user) {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for getting a category by its database ID.
///
/// This function will return the status code 404 if the requested resource
/// does not exist (e.g., not created yet).
pub async fn get_category_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    _claims: Claims,
    Path(category_id): Path<DatabaseID>,
) -> Response
where
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    match get_category(&state.category_store, category_id) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for creating a new category.
pub async fn create_category_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    claims: Claims,
    Json(new_category): Json<NewCategory>,
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

    let mut category_store = state.category_store;

    match create_category(&mut category_store, new_category, &current_user) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for updating a category.
pub async fn update_category_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    claims: Claims,
    Path(category_id): Path<DatabaseID>,
    Json(new_category): Json<NewCategory>,
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

    let mut category_store = state.category_store;

    match update_category(&mut category_store, category_id, new_category, &current_user) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for deleting a category.
pub async fn delete_category_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    claims: Claims,
    Path(category_id): Path<DatabaseID>,
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

    let mut category_store = state.category_store;

    match delete_category(
        &mut category_store,
        &state.transaction_store,
        category_id,
        &current_user,
    ) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod category_service_tests {
    use crate::{
        Error,
        models::{CategoryType, Transaction, User},
        stores::TransactionStore,
        test_utils::{get_test_app_state, register_test_user, TestAppState},
    };

    use super::{
        CategoryVisibility, NewCategory, create_category, delete_category, get_category,
        list_categories, update_category,
    };

    fn new_category(name: &str, visibility: CategoryVisibility) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: None,
            category_type: CategoryType::Expense,
            visibility,
        }
    }

    fn get_state_and_users() -> (TestAppState, User, User) {
        let state = get_test_app_state();
        let user = register_test_user(&state, "test@test.com");
        let other_user = register_test_user(&state, "other@test.com");

        (state, user, other_user)
    }

    #[test]
    fn create_owned_category_is_attributed_to_current_user() {
        let (state, user, _) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Groceries", CategoryVisibility::Owned),
            &user,
        )
        .unwrap();

        assert_eq!(category.user_id, Some(user.id));
    }

    #[test]
    fn create_shared_category_has_no_owner() {
        let (state, user, _) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Utilities", CategoryVisibility::Shared),
            &user,
        )
        .unwrap();

        assert_eq!(category.user_id, None);
    }

    #[test]
    fn create_category_fails_on_blank_name() {
        let (state, user, _) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let result = create_category(
            &mut category_store,
            new_category("   ", CategoryVisibility::Owned),
            &user,
        );

        assert_eq!(result, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn created_category_round_trips_through_get() {
        let (state, user, _) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let created = create_category(
            &mut category_store,
            NewCategory {
                name: "Groceries".to_string(),
                description: Some("food and household items".to_string()),
                category_type: CategoryType::Expense,
                visibility: CategoryVisibility::Owned,
            },
            &user,
        )
        .unwrap();

        let fetched = get_category(&category_store, created.id).unwrap();

        assert_eq!(fetched, created);
    }

    #[test]
    fn get_category_does_not_check_ownership() {
        let (state, user, other_user) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Groceries", CategoryVisibility::Owned),
            &user,
        )
        .unwrap();

        // Single reads by id only require an authenticated caller.
        let fetched = get_category(&category_store, category.id);

        assert_eq!(fetched, Ok(category));
        assert_ne!(other_user.id, user.id);
    }

    #[test]
    fn list_categories_returns_own_and_shared_categories_in_insertion_order() {
        let (state, user, other_user) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let mine = create_category(
            &mut category_store,
            new_category("Mine", CategoryVisibility::Owned),
            &user,
        )
        .unwrap();
        let shared = create_category(
            &mut category_store,
            new_category("Shared", CategoryVisibility::Shared),
            &other_user,
        )
        .unwrap();
        create_category(
            &mut category_store,
            new_category("Theirs", CategoryVisibility::Owned),
            &other_user,
        )
        .unwrap();

        let categories = list_categories(&category_store, &user).unwrap();

        assert_eq!(categories, vec![mine, shared]);
    }

    #[test]
    fn update_category_succeeds_for_owner() {
        let (state, user, _) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Groceries", CategoryVisibility::Owned),
            &user,
        )
        .unwrap();

        let updated = update_category(
            &mut category_store,
            category.id,
            NewCategory {
                name: "Food".to_string(),
                description: Some("renamed".to_string()),
                category_type: CategoryType::Both,
                visibility: CategoryVisibility::Owned,
            },
            &user,
        )
        .unwrap();

        assert_eq!(updated.name, "Food");
        assert_eq!(updated.description, Some("renamed".to_string()));
        assert_eq!(updated.category_type, CategoryType::Both);
        assert_eq!(get_category(&category_store, category.id), Ok(updated));
    }

    #[test]
    fn update_category_owned_by_other_user_returns_not_found() {
        let (state, user, other_user) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Groceries", CategoryVisibility::Owned),
            &user,
        )
        .unwrap();

        let result = update_category(
            &mut category_store,
            category.id,
            new_category("Hijacked", CategoryVisibility::Owned),
            &other_user,
        );

        assert_eq!(result, Err(Error::NotFound));
        // The original category is untouched.
        assert_eq!(
            get_category(&category_store, category.id).unwrap().name,
            "Groceries"
        );
    }

    #[test]
    fn update_category_with_invalid_id_returns_not_found() {
        let (state, user, _) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let result = update_category(
            &mut category_store,
            999_999,
            new_category("Ghost", CategoryVisibility::Owned),
            &user,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn any_user_can_update_shared_category() {
        let (state, user, other_user) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Shared", CategoryVisibility::Shared),
            &user,
        )
        .unwrap();

        let updated = update_category(
            &mut category_store,
            category.id,
            new_category("Still shared", CategoryVisibility::Shared),
            &other_user,
        )
        .unwrap();

        assert_eq!(updated.name, "Still shared");
        assert_eq!(updated.user_id, None);
    }

    #[test]
    fn updating_shared_category_as_owned_claims_it_for_current_user() {
        let (state, user, other_user) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Shared", CategoryVisibility::Shared),
            &user,
        )
        .unwrap();

        let claimed = update_category(
            &mut category_store,
            category.id,
            new_category("Claimed", CategoryVisibility::Owned),
            &other_user,
        )
        .unwrap();

        assert_eq!(claimed.user_id, Some(other_user.id));

        // Once claimed, the previous editor is locked out like any other user.
        let result = update_category(
            &mut category_store,
            category.id,
            new_category("Locked out", CategoryVisibility::Owned),
            &user,
        );
        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_category_succeeds_for_owner() {
        let (state, user, _) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Groceries", CategoryVisibility::Owned),
            &user,
        )
        .unwrap();

        let result = delete_category(
            &mut category_store,
            &state.transaction_store,
            category.id,
            &user,
        );

        assert_eq!(result, Ok(()));
        assert_eq!(
            get_category(&category_store, category.id),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_category_owned_by_other_user_returns_not_found() {
        let (state, user, other_user) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Groceries", CategoryVisibility::Owned),
            &user,
        )
        .unwrap();

        let result = delete_category(
            &mut category_store,
            &state.transaction_store,
            category.id,
            &other_user,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn any_user_can_delete_shared_category() {
        let (state, user, other_user) = get_state_and_users();
        let mut category_store = state.category_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Shared", CategoryVisibility::Shared),
            &user,
        )
        .unwrap();

        let result = delete_category(
            &mut category_store,
            &state.transaction_store,
            category.id,
            &other_user,
        );

        assert_eq!(result, Ok(()));
    }

    #[test]
    fn delete_category_with_transactions_returns_category_in_use() {
        let (state, user, _) = get_state_and_users();
        let mut category_store = state.category_store.clone();
        let mut transaction_store = state.transaction_store.clone();

        let category = create_category(
            &mut category_store,
            new_category("Groceries", CategoryVisibility::Owned),
            &user,
        )
        .unwrap();
        let transaction = transaction_store
            .create(Transaction::build(9.99, user.id).category(Some(category.id)))
            .unwrap();

        let result = delete_category(
            &mut category_store,
            &transaction_store,
            category.id,
            &user,
        );
        assert_eq!(result, Err(Error::CategoryInUse));

        // Deleting the referencing transaction unblocks the category.
        transaction_store.delete(transaction.id).unwrap();

        let result = delete_category(
            &mut category_store,
            &transaction_store,
            category.id,
            &user,
        );
        assert_eq!(result, Ok(()));
    }
}
