//! # Bookstore Example
//!
//! A small bookstore built on a store service: list, detail and add books.
//!
//! This example showcases:
//! - Actions with derived tags and a class-style action type
//! - A reducer whose `LoadBooks` effect calls a [`BookService`](book_service::BookService)
//! - Selectors with and without props
//! - A [`BookStoreService`] mixing derive-tagged and marker-discovered members
//! - View models tested against synthesized mocks
//!
//! ## Example
//!
//! ```no_run
//! use bookstore::{BookEnvironment, BookReducer, BookState, BookStoreService, InMemoryBookService};
//! use futures::StreamExt;
//! use store_service_runtime::Store;
//!
//! # async fn example() {
//! let env = BookEnvironment::new(InMemoryBookService::sample());
//! let store = Store::new(BookState::default(), BookReducer::new(), env);
//! let books: BookStoreService = store.service();
//!
//! let mut loaded = books.books_loaded.subscribe();
//! books.load_books.call(()).unwrap();
//! let catalog = loaded.next().await;
//! # drop(catalog);
//! # }
//! ```

/// Actions and action creators
pub mod actions;

/// Catalog backend
pub mod book_service;

/// View models
pub mod components;

/// Domain types
pub mod models;

/// Reducer and environment
pub mod reducer;

/// Selectors over [`BookState`]
pub mod selectors;

/// The bookstore store service
pub mod service;

pub use actions::{AddBookAction, BookAction};
pub use book_service::{BookService, InMemoryBookService};
pub use components::{BookDetail, BookList, NewBookForm};
pub use models::{Book, BookState};
pub use reducer::{BookEnvironment, BookReducer};
pub use service::BookStoreService;

/// Store type used by the demo binary
pub type BookStore =
    store_service_runtime::Store<BookState, BookAction, BookEnvironment, BookReducer>;
