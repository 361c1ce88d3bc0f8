//! Bookstore actions and their creators.

use crate::models::Book;
use store_service_core::{ActionCreator, create_action};
use store_service_macros::Action;

/// Tag of [`BookAction::LoadBooks`]
pub const LOAD_BOOKS: &str = "[Books] Load books";

/// Tag of [`BookAction::BooksLoaded`]
pub const BOOKS_LOADED: &str = "[Books] Books loaded";

/// Tag of [`BookAction::AddBook`]
pub const ADD_BOOK: &str = "[Books] Add book";

/// Every action the bookstore store understands.
#[derive(Action, Clone, Debug, PartialEq, Eq)]
pub enum BookAction {
    /// Ask the book service for the catalog
    #[action("[Books] Load books")]
    LoadBooks,

    /// The book service answered
    #[action("[Books] Books loaded")]
    BooksLoaded {
        /// Loaded catalog
        books: Vec<Book>,
    },

    /// Append a book to the catalog
    #[action("[Books] Add book")]
    AddBook {
        /// Book to add
        book: Book,
    },
}

/// Class-style action type for adding a book.
///
/// Dispatchers bound to it build the action from a [`Book`] payload and
/// convert it into [`BookAction::AddBook`].
#[derive(Action, Clone, Debug, PartialEq, Eq)]
#[action("[Books] Add book")]
pub struct AddBookAction {
    /// Book to add
    pub book: Book,
}

impl From<Book> for AddBookAction {
    fn from(book: Book) -> Self {
        Self { book }
    }
}

impl From<AddBookAction> for BookAction {
    fn from(action: AddBookAction) -> Self {
        Self::AddBook { book: action.book }
    }
}

/// Creator for [`BookAction::LoadBooks`].
#[must_use]
pub fn load_books() -> ActionCreator<(), BookAction> {
    create_action(LOAD_BOOKS, |()| BookAction::LoadBooks)
}

/// Creator for [`BookAction::BooksLoaded`].
#[must_use]
pub fn books_loaded() -> ActionCreator<Vec<Book>, BookAction> {
    create_action(BOOKS_LOADED, |books| BookAction::BooksLoaded { books })
}

/// Creator for [`BookAction::AddBook`].
#[must_use]
pub fn add_book() -> ActionCreator<Book, BookAction> {
    create_action(ADD_BOOK, |book| BookAction::AddBook { book })
}
