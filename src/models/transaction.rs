//! This file defines the `Transaction` type, the core type of the budgeting
//! part of the application.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::models::{DatabaseID, UserID};

/// Whether a transaction records money that was earned or spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money was earned, e.g., wages.
    Income,
    /// Money was spent, e.g., groceries.
    Expense,
}

impl TransactionType {
    /// The string stored in the database for this transaction type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }

    /// Parse a transaction type from its database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INCOME" => Some(TransactionType::Income),
            "EXPENSE" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Every transaction belongs to exactly one user and may reference a category.
/// The category reference is weak: a transaction whose category was never set,
/// or whose referenced category could not be resolved, is *uncategorized*.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseID,

    /// A text description of what the transaction was for.
    pub description: String,

    /// The amount of money spent or earned in this transaction.
    pub amount: f64,

    /// When the transaction happened.
    pub date: Date,

    /// Whether the transaction records income or an expense.
    pub transaction_type: TransactionType,

    /// The ID of the user that owns this transaction.
    pub user_id: UserID,

    /// The category the transaction is labelled with, or `None` if it is
    /// uncategorized.
    pub category_id: Option<DatabaseID>,
}

impl Transaction {
    /// Create a builder for a new transaction owned by `user_id`.
    ///
    /// Finalize the builder with [crate::stores::TransactionStore::create].
    pub fn build(amount: f64, user_id: UserID) -> TransactionBuilder {
        TransactionBuilder::new(amount, user_id)
    }
}

/// Builder for creating a new [Transaction].
///
/// Finalize the builder with [crate::stores::TransactionStore::create].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// A text description of what the transaction is for.
    pub description: String,

    /// The amount of money spent or earned.
    pub amount: f64,

    /// When the transaction happened.
    pub date: Date,

    /// Whether the transaction records income or an expense.
    pub transaction_type: TransactionType,

    /// The ID of the user that will own the transaction.
    pub user_id: UserID,

    /// The category to label the transaction with, if any.
    pub category_id: Option<DatabaseID>,
}

impl TransactionBuilder {
    /// Create a builder for a new transaction.
    ///
    /// The transaction defaults to an expense dated today with an empty
    /// description and no category.
    pub fn new(amount: f64, user_id: UserID) -> Self {
        Self {
            description: String::new(),
            amount,
            date: OffsetDateTime::now_utc().date(),
            transaction_type: TransactionType::Expense,
            user_id,
            category_id: None,
        }
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    /// Set the date for the transaction.
    pub fn date(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    /// Set whether the transaction records income or an expense.
    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    /// Set the category for the transaction.
    pub fn category(mut self, category_id: Option<DatabaseID>) -> Self {
        self.category_id = category_id;
        self
    }
}
