//! Defines the transaction store trait.

use crate::{
    Error,
    models::{DatabaseID, Transaction, TransactionBuilder, UserID},
};

/// Handles the creation and retrieval of transactions.
pub trait TransactionStore {
    /// Create a new transaction in the store.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve a transaction from the store by its ID.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `transaction_id` does not refer to a
    /// transaction in the store.
    fn get(&self, transaction_id: DatabaseID) -> Result<Transaction, Error>;

    /// Retrieve all transactions owned by `user_id`, ordered by date
    /// descending. Transactions on the same date keep their insertion order.
    fn get_by_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error>;

    /// Retrieve the transactions owned by `user_id` whose date falls within
    /// the calendar month given by `year` and `month`, ordered by date
    /// descending.
    ///
    /// `month` uses one-based numbering (January = 1). Values that do not name
    /// a valid calendar month yield an empty list rather than an error.
    fn get_by_user_and_month(
        &self,
        user_id: UserID,
        year: i32,
        month: i32,
    ) -> Result<Vec<Transaction>, Error>;

    /// Overwrite the stored transaction that has `transaction.id` with
    /// `transaction`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `transaction.id` does not refer to a
    /// transaction in the store.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error>;

    /// Remove the transaction with `transaction_id` from the store.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `transaction_id` does not refer to a
    /// transaction in the store.
    fn delete(&mut self, transaction_id: DatabaseID) -> Result<(), Error>;

    /// The number of transactions that reference the category with
    /// `category_id`.
    fn count_by_category(&self, category_id: DatabaseID) -> Result<usize, Error>;
}
