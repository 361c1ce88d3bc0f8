//! Bookstore domain types.

use serde::{Deserialize, Serialize};

/// A book in the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Book {
    /// Author name
    pub author: String,
    /// Title
    pub title: String,
    /// Publication year
    pub year: u16,
}

impl Book {
    /// Create a book.
    #[must_use]
    pub fn new(author: impl Into<String>, title: impl Into<String>, year: u16) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            year,
        }
    }
}

/// Bookstore state
///
/// A book's id is its position in `books`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookState {
    /// Catalog, in insertion order
    pub books: Vec<Book>,
}

impl BookState {
    /// State holding `books`.
    #[must_use]
    pub const fn with_books(books: Vec<Book>) -> Self {
        Self { books }
    }
}
