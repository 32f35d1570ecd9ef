//! Implements a SQLite backed category store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, types::Type};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Category, CategoryBuilder, CategoryName, CategoryType, DatabaseID, UserID},
    stores::CategoryStore,
};

/// Creates and retrieves transaction categories to/from a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteCategoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteCategoryStore {
    /// Create a new category store with a SQLite database.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl CategoryStore for SQLiteCategoryStore {
    /// Create a category in the database.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn create(&mut self, builder: CategoryBuilder) -> Result<Category, Error> {
        let connection = self.connection.lock().unwrap();

        connection.execute(
            "INSERT INTO category (name, description, category_type, user_id)
             VALUES (?1, ?2, ?3, ?4);",
            (
                builder.name.as_ref(),
                &builder.description,
                builder.category_type.as_str(),
                builder.user_id.map(|user_id| user_id.as_i64()),
            ),
        )?;

        let id = connection.last_insert_rowid();

        Ok(Category {
            id,
            name: builder.name,
            description: builder.description,
            category_type: builder.category_type,
            user_id: builder.user_id,
        })
    }

    /// Retrieve the category in the database with `category_id`.
    ///
    /// # Errors
    /// This function will return an [Error::NotFound] if `category_id` does
    /// not refer to a category, or an error if there is an SQL error.
    fn get(&self, category_id: DatabaseID) -> Result<Category, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, name, description, category_type, user_id
                 FROM category WHERE id = :id;",
            )?
            .query_row(&[(":id", &category_id)], Self::map_row)
            .map_err(|error| error.into())
    }

    /// Retrieve the categories owned by `user_id` plus the shared categories,
    /// in insertion order.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn get_by_user_or_shared(&self, user_id: UserID) -> Result<Vec<Category>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, name, description, category_type, user_id
                 FROM category WHERE user_id = :user_id OR user_id IS NULL;",
            )?
            .query_map(&[(":user_id", &user_id.as_i64())], Self::map_row)?
            .map(|maybe_category| maybe_category.map_err(|error| error.into()))
            .collect()
    }

    /// Overwrite the stored category that has `category.id`.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error or if the
    /// category doesn't exist.
    fn update(&mut self, category: &Category) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            "UPDATE category SET name = ?1, description = ?2, category_type = ?3, user_id = ?4
             WHERE id = ?5;",
            (
                category.name.as_ref(),
                &category.description,
                category.category_type.as_str(),
                category.user_id.map(|user_id| user_id.as_i64()),
                category.id,
            ),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete the category with `category_id` from the database.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error or if the
    /// category doesn't exist.
    fn delete(&mut self, category_id: DatabaseID) -> Result<(), Error> {
        let rows_affected = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM category WHERE id = ?1;", [category_id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteCategoryStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                category_type TEXT NOT NULL,
                user_id INTEGER,
                FOREIGN KEY(user_id) REFERENCES user(id)
                );",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteCategoryStore {
    type ReturnType = Category;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;

        let raw_name: String = row.get(offset + 1)?;
        let name = CategoryName::new_unchecked(&raw_name);

        let description: Option<String> = row.get(offset + 2)?;

        let raw_category_type: String = row.get(offset + 3)?;
        let category_type = CategoryType::parse(&raw_category_type).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 3,
                Type::Text,
                format!("unknown category type {raw_category_type}").into(),
            )
        })?;

        let raw_user_id: Option<i64> = row.get(offset + 4)?;
        let user_id = raw_user_id.map(UserID::new);

        Ok(Self::ReturnType {
            id,
            name,
            description,
            category_type,
            user_id,
        })
    }
}
