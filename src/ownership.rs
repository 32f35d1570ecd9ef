//! Pure predicates that decide whether a user may modify a resource.
//!
//! The services report a failed ownership check on a mutating operation as
//! [Error::NotFound](crate::Error::NotFound), the same error returned for an
//! id that does not exist. Responding identically in both cases means a client
//! can never learn whether another user's resource exists by probing ids.
//! Single reads by id ([crate::category::get_category] and
//! [crate::transaction::get_transaction]) intentionally skip the ownership
//! check and only require an authenticated caller.
//!
//! These functions are deliberately free of any storage concerns so they can
//! be tested, and reasoned about, in isolation.

use crate::models::{Category, Transaction, UserID};

/// Whether `user_id` may update or delete `category`.
///
/// A category with no owner is shared: any authenticated user may modify it.
/// An owned category may only be modified by its owner.
pub fn can_modify_category(category: &Category, user_id: UserID) -> bool {
    match category.user_id {
        None => true,
        Some(owner_id) => owner_id == user_id,
    }
}

/// Whether `user_id` may update or delete `transaction`.
///
/// Transactions always have an owner and only the owner may modify them.
pub fn can_modify_transaction(transaction: &Transaction, user_id: UserID) -> bool {
    transaction.user_id == user_id
}
