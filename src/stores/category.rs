//! Defines the category store trait.

use crate::{
    Error,
    models::{Category, CategoryBuilder, DatabaseID, UserID},
};

/// Handles the creation and retrieval of transaction categories.
pub trait CategoryStore {
    /// Create a new category in the store.
    fn create(&mut self, builder: CategoryBuilder) -> Result<Category, Error>;

    /// Get a category by its ID.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `category_id` does not refer to a category
    /// in the store.
    fn get(&self, category_id: DatabaseID) -> Result<Category, Error>;

    /// Get all categories owned by `user_id` plus all shared (ownerless)
    /// categories, in the order they were inserted.
    fn get_by_user_or_shared(&self, user_id: UserID) -> Result<Vec<Category>, Error>;

    /// Overwrite the stored category that has `category.id` with `category`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `category.id` does not refer to a category
    /// in the store.
    fn update(&mut self, category: &Category) -> Result<(), Error>;

    /// Remove the category with `category_id` from the store.
    ///
    /// Callers are responsible for checking that no transactions reference the
    /// category, see [crate::category::delete_category].
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `category_id` does not refer to a category
    /// in the store.
    fn delete(&mut self, category_id: DatabaseID) -> Result<(), Error>;
}
