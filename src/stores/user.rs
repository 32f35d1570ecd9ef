//! Defines the user store trait.

use email_address::EmailAddress;

use crate::{
    Error,
    models::{PasswordHash, User, UserID},
};

/// Handles the creation and retrieval of users.
pub trait UserStore {
    /// Create and insert a new user into the store.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if `email` already belongs to a user in
    /// the store.
    fn create(&mut self, email: EmailAddress, password_hash: PasswordHash) -> Result<User, Error>;

    /// Get the user that has the specified `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no user with `id` in the store.
    fn get(&self, id: UserID) -> Result<User, Error>;

    /// Get the user that has the specified `email` address.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no user with `email` in the store.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error>;
}
