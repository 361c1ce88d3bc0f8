//! # Store Service Testing
//!
//! Test support for store services.
//!
//! This crate provides:
//! - Mock synthesis: build a service whose tagged members are test doubles
//!   ([`create_store_service_mock`], [`StoreServiceMockFactory`])
//! - Store doubles: [`MockStore`], [`MockActions`] and [`StoreServiceTestBed`]
//!   for exercising real services
//! - [`ReducerTest`] for Given-When-Then reducer tests
//!
//! ## Example
//!
//! ```
//! use futures::StreamExt;
//! use store_service_core::{
//!     Action, Dispatch, Select, ServiceMember, ServiceShape, StoreContext, StoreService,
//!     create_action, create_selector,
//! };
//! use store_service_testing::{InitialValues, create_store_service_mock};
//!
//! #[derive(Clone, Debug)]
//! enum BookAction {
//!     Add(String),
//! }
//!
//! impl Action for BookAction {
//!     fn action_type(&self) -> &str {
//!         "[Books] Add book"
//!     }
//! }
//!
//! struct BookService {
//!     books: Select<(), Vec<String>>,
//!     add_book: Dispatch<String>,
//! }
//!
//! impl ServiceShape for BookService {
//!     fn members_mut(&mut self) -> Vec<(&'static str, &mut dyn ServiceMember)> {
//!         vec![("books", &mut self.books), ("add_book", &mut self.add_book)]
//!     }
//! }
//!
//! impl StoreService for BookService {
//!     type State = Vec<String>;
//!     type Action = BookAction;
//!
//!     fn from_context(context: &StoreContext<Vec<String>, BookAction>) -> Self {
//!         Self {
//!             books: context.select(create_selector(|books: &Vec<String>| books.clone())),
//!             add_book: context.dispatch(create_action("[Books] Add book", BookAction::Add)),
//!         }
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let initial = InitialValues::new().with("books", Vec::<String>::new());
//! let mock: BookService = create_store_service_mock(&initial).unwrap();
//!
//! assert_eq!(mock.books.call(()).next().await, Some(vec![]));
//!
//! mock.add_book.call("Rust".to_string()).unwrap();
//! assert_eq!(mock.add_book.spy().unwrap().calls(), vec!["Rust".to_string()]);
//! # });
//! ```

/// Mock synthesis for store services
pub mod mock;


/// Store and action-source doubles
pub mod store;

pub use mock::{
    InitialValues, InstalledMock, StoreServiceMockFactory, create_store_service_mock,
    create_store_service_mock_factory, synthesize,
};
pub use reducer_test::{ReducerTest, assertions, resolve_effects};
pub use store::{MockActions, MockStore, StoreServiceTestBed};
