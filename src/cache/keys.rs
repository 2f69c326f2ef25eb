//! Cache keys and tags.
//!
//! A listing key is `"{operation}-{page}-{limit}"`. Operation names are
//! static identifiers without `-`, so keys of different operations never
//! collide.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};

const KEY_SEPARATOR: char = '-';

/// Label grouping the cache entries of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(Cow<'static, str>);

impl Tag {
    pub const CLIENTS: Tag = Tag(Cow::Borrowed("clientsCache"));
    pub const CUSTOMERS: Tag = Tag(Cow::Borrowed("customerCache"));
    pub const CLIENT_CUSTOMERS: Tag = Tag(Cow::Borrowed("clientCustomersCache"));
    pub const PHONES: Tag = Tag(Cow::Borrowed("phonesCache"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the cache key of one listing page.
pub fn build_key(operation: &str, page: u32, limit: u32) -> String {
    debug_assert!(
        !operation.contains(KEY_SEPARATOR),
        "operation names must not contain the key separator"
    );
    format!("{operation}{KEY_SEPARATOR}{page}{KEY_SEPARATOR}{limit}")
}

/// Operation name of a listing scoped to one owner, e.g.
/// `getClientCustomersList_42`.
pub fn scoped_operation(operation: &str, owner_id: i64) -> String {
    format!("{operation}_{owner_id}")
}
