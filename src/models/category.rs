//! This file defines the `Category` type and the types needed to create a category.
//! A category labels transactions, e.g., 'Groceries' or 'Wages', and is either
//! owned by a single user or shared between all users.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    models::{DatabaseID, UserID},
};

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is an
    /// empty string or contains only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a category applies to income, expenses, or both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    /// The category labels money that was earned.
    Income,
    /// The category labels money that was spent.
    Expense,
    /// The category labels both income and expenses.
    Both,
}

impl CategoryType {
    /// The string stored in the database for this category type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "INCOME",
            CategoryType::Expense => "EXPENSE",
            CategoryType::Both => "BOTH",
        }
    }

    /// Parse a category type from its database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INCOME" => Some(CategoryType::Income),
            "EXPENSE" => Some(CategoryType::Expense),
            "BOTH" => Some(CategoryType::Both),
            _ => None,
        }
    }
}

/// A label for expenses and income, e.g., 'Groceries', 'Eating Out', 'Wages'.
///
/// A category with no owner is *shared*: it is visible to every user and any
/// user may edit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// The ID of the category.
    pub id: DatabaseID,

    /// The name of the category.
    pub name: CategoryName,

    /// An optional text description of what the category is for.
    pub description: Option<String>,

    /// Whether the category applies to income, expenses, or both.
    pub category_type: CategoryType,

    /// The ID of the user that owns the category, or `None` for a shared
    /// category.
    pub user_id: Option<UserID>,
}

impl Category {
    /// Create a builder for a new category.
    ///
    /// Finalize the builder with [crate::stores::CategoryStore::create].
    pub fn build(name: CategoryName, category_type: CategoryType) -> CategoryBuilder {
        CategoryBuilder::new(name, category_type)
    }
}

/// Builder for creating a new [Category].
///
/// Finalize the builder with [crate::stores::CategoryStore::create].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBuilder {
    /// The name of the category to create.
    pub name: CategoryName,

    /// An optional text description of what the category is for.
    pub description: Option<String>,

    /// Whether the category applies to income, expenses, or both.
    pub category_type: CategoryType,

    /// The owner of the category to create, or `None` for a shared category.
    pub user_id: Option<UserID>,
}

impl CategoryBuilder {
    /// Create a builder for a new category with no description and no owner.
    pub fn new(name: CategoryName, category_type: CategoryType) -> Self {
        Self {
            name,
            description: None,
            category_type,
            user_id: None,
        }
    }

    /// Set the description for the category.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the owner of the category. `None` creates a shared category.
    pub fn owner(mut self, user_id: Option<UserID>) -> Self {
        self.user_id = user_id;
        self
    }
}
