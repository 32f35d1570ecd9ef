//! This module defines the domain data types.

pub use category::{Category, CategoryBuilder, CategoryName, CategoryType};
pub use password::PasswordHash;
pub use transaction::{Transaction, TransactionBuilder, TransactionType};
pub use user::{User, UserID};

mod category;
mod password;
mod transaction;
mod user;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
