//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, types::Type};
use time::{Date, Month};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{DatabaseID, Transaction, TransactionBuilder, TransactionType, UserID},
    stores::TransactionStore,
};

/// Stores transactions in a SQLite database.
///
/// Note that because a transaction depends on the [User](crate::models::User)
/// and [Category](crate::models::Category) models, these models must be set up
/// in the database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, description, amount, date, transaction_type, user_id, category_id
     FROM \"transaction\"";

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();

        connection.execute(
            "INSERT INTO \"transaction\" (description, amount, date, transaction_type, user_id, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            (
                &builder.description,
                builder.amount,
                builder.date,
                builder.transaction_type.as_str(),
                builder.user_id.as_i64(),
                builder.category_id,
            ),
        )?;

        let id = connection.last_insert_rowid();

        Ok(Transaction {
            id,
            description: builder.description,
            amount: builder.amount,
            date: builder.date,
            transaction_type: builder.transaction_type,
            user_id: builder.user_id,
            category_id: builder.category_id,
        })
    }

    /// Retrieve the transaction in the database with `transaction_id`.
    ///
    /// # Errors
    /// This function will return an [Error::NotFound] if `transaction_id` does
    /// not refer to a transaction, or an error if there is an SQL error.
    fn get(&self, transaction_id: DatabaseID) -> Result<Transaction, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!("{SELECT_COLUMNS} WHERE id = :id;"))?
            .query_row(&[(":id", &transaction_id)], Self::map_row)
            .map_err(|error| error.into())
    }

    /// Retrieve the transactions owned by `user_id`, most recent first.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn get_by_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "{SELECT_COLUMNS} WHERE user_id = :user_id ORDER BY date DESC, id ASC;"
            ))?
            .query_map(&[(":user_id", &user_id.as_i64())], Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
            .collect()
    }

    /// Retrieve the transactions owned by `user_id` dated within the given
    /// calendar month, most recent first.
    ///
    /// A `year`/`month` pair that does not name a valid calendar month yields
    /// an empty list.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn get_by_user_and_month(
        &self,
        user_id: UserID,
        year: i32,
        month: i32,
    ) -> Result<Vec<Transaction>, Error> {
        let Some((month_start, next_month_start)) = month_date_range(year, month) else {
            return Ok(Vec::new());
        };

        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "{SELECT_COLUMNS}
                 WHERE user_id = ?1 AND date >= ?2 AND date < ?3
                 ORDER BY date DESC, id ASC;"
            ))?
            .query_map(
                (user_id.as_i64(), month_start, next_month_start),
                Self::map_row,
            )?
            .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
            .collect()
    }

    /// Overwrite the stored transaction that has `transaction.id`.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error or if the
    /// transaction doesn't exist.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            "UPDATE \"transaction\"
             SET description = ?1, amount = ?2, date = ?3, transaction_type = ?4, category_id = ?5
             WHERE id = ?6;",
            (
                &transaction.description,
                transaction.amount,
                transaction.date,
                transaction.transaction_type.as_str(),
                transaction.category_id,
                transaction.id,
            ),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete the transaction with `transaction_id` from the database.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error or if the
    /// transaction doesn't exist.
    fn delete(&mut self, transaction_id: DatabaseID) -> Result<(), Error> {
        let rows_affected = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM \"transaction\" WHERE id = ?1;", [transaction_id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// The number of transactions referencing the category with `category_id`.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn count_by_category(&self, category_id: DatabaseID) -> Result<usize, Error> {
        self.connection
            .lock()
            .unwrap()
            .query_row(
                "SELECT COUNT(id) FROM \"transaction\" WHERE category_id = :category_id;",
                &[(":category_id", &category_id)],
                |row| row.get::<_, i64>(0).map(|count| count as usize),
            )
            .map_err(|error| error.into())
    }
}

/// The first day of the given month and the first day of the following month.
///
/// Returns `None` if `year` and `month` do not name a valid calendar month.
fn month_date_range(year: i32, month: i32) -> Option<(Date, Date)> {
    let month = u8::try_from(month).ok().and_then(|m| Month::try_from(m).ok())?;

    let month_start = Date::from_calendar_date(year, month, 1).ok()?;
    let next_month_start = match month {
        Month::December => Date::from_calendar_date(year + 1, Month::January, 1),
        _ => Date::from_calendar_date(year, month.next(), 1),
    }
    .ok()?;

    Some((month_start, next_month_start))
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                transaction_type TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                category_id INTEGER,
                FOREIGN KEY(user_id) REFERENCES user(id),
                FOREIGN KEY(category_id) REFERENCES category(id)
                );",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_transaction_type: String = row.get(offset + 4)?;
        let transaction_type =
            TransactionType::parse(&raw_transaction_type).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    offset + 4,
                    Type::Text,
                    format!("unknown transaction type {raw_transaction_type}").into(),
                )
            })?;

        Ok(Self::ReturnType {
            id: row.get(offset)?,
            description: row.get(offset + 1)?,
            amount: row.get(offset + 2)?,
            date: row.get(offset + 3)?,
            transaction_type,
            user_id: UserID::new(row.get(offset + 5)?),
            category_id: row.get(offset + 6)?,
        })
    }
}
