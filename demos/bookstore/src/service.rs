//! The bookstore's store service.

use crate::actions::{self, AddBookAction, BOOKS_LOADED, BookAction};
use crate::models::{Book, BookState};
use crate::selectors::{select_book_by_id, select_books};
use store_service_core::{
    ActionDescriptor, ActionObservable, Dispatch, Observe, Select, StoreContext, StoreService,
};
use store_service_macros::ServiceShape;

/// Store access for bookstore views.
///
/// `load_books` and `book_added` carry no manifest tag; their role markers
/// identify them.
#[derive(Clone, Debug, ServiceShape)]
pub struct BookStoreService {
    /// Every book
    #[select]
    pub get_all_books: Select<(), Vec<Book>>,

    /// One book by id
    #[select]
    pub get_book: Select<usize, Option<Book>>,

    /// Add a book
    #[dispatch]
    pub add_book: Dispatch<Book>,

    /// Ask the backend for the catalog
    #[member]
    pub load_books: Dispatch<()>,

    /// Catalogs delivered by the backend
    #[observe]
    pub books_loaded: ActionObservable<Vec<Book>>,

    /// Books added from anywhere
    #[member]
    pub book_added: Observe<Book>,
}

impl StoreService for BookStoreService {
    type State = BookState;
    type Action = BookAction;

    fn from_context(context: &StoreContext<BookState, BookAction>) -> Self {
        Self {
            get_all_books: context.select(select_books()),
            get_book: context.select(select_book_by_id()),
            add_book: context.dispatch(ActionDescriptor::of_type::<AddBookAction>()),
            load_books: context.dispatch(actions::load_books()),
            books_loaded: context.observable([BOOKS_LOADED], |action| match action {
                BookAction::BooksLoaded { books } => Some(books),
                _ => None,
            }),
            book_added: context.observe_map([&actions::add_book()], |action| match action {
                BookAction::AddBook { book } => Some(book),
                _ => None,
            }),
        }
    }
}
