//! Bookstore reducer.

use crate::actions::BookAction;
use crate::book_service::BookService;
use crate::models::BookState;
use std::sync::Arc;
use store_service_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

/// Injected dependencies
#[derive(Clone)]
pub struct BookEnvironment {
    /// Catalog backend
    pub books: Arc<dyn BookService>,
}

impl BookEnvironment {
    /// Environment backed by `books`.
    #[must_use]
    pub fn new(books: impl BookService) -> Self {
        Self {
            books: Arc::new(books),
        }
    }
}

impl std::fmt::Debug for BookEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookEnvironment").finish_non_exhaustive()
    }
}

/// Bookstore reducer
///
/// - `LoadBooks` leaves the state alone and asks the book service, which
///   answers with `BooksLoaded`
/// - `BooksLoaded` replaces the catalog
/// - `AddBook` appends to it
#[derive(Clone, Copy, Debug, Default)]
pub struct BookReducer;

impl BookReducer {
    /// Create a reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for BookReducer {
    type State = BookState;
    type Action = BookAction;
    type Environment = BookEnvironment;

    fn reduce(
        &self,
        state: &mut BookState,
        action: BookAction,
        env: &BookEnvironment,
    ) -> SmallVec<[Effect<BookAction>; 4]> {
        match action {
            BookAction::LoadBooks => {
                let service = Arc::clone(&env.books);
                smallvec![Effect::future(async move {
                    let books = service.load_books().await;
                    tracing::debug!(count = books.len(), "Books loaded");
                    Some(BookAction::BooksLoaded { books })
                })]
            },
            BookAction::BooksLoaded { books } => {
                state.books = books;
                smallvec![Effect::None]
            },
            BookAction::AddBook { book } => {
                state.books.push(book);
                smallvec![Effect::None]
            },
        }
    }
}
