//! Mock synthesis and test bed scenarios on a derived service.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use futures::StreamExt;
use proptest::prelude::*;
use std::time::Duration;
use store_service_core::{
    ActionObservable, Dispatch, MockError, MockTreatment, Observe, Select, StoreContext,
    StoreService, create_action, create_selector, create_selector_with_props,
};
use store_service_macros::{Action, ServiceShape};
use store_service_testing::{
    InitialValues, StoreServiceMockFactory, StoreServiceTestBed, create_store_service_mock,
    create_store_service_mock_factory, synthesize,
};

#[derive(Clone, Debug, PartialEq)]
struct Book {
    title: String,
}

fn book(title: &str) -> Book {
    Book {
        title: title.to_string(),
    }
}

#[derive(Action, Clone, Debug, PartialEq)]
enum BookAction {
    #[action("[Books] Add book")]
    Add(Book),

    #[action("[Books] Books loaded")]
    Loaded(Vec<Book>),

    #[action("[Books] Remove book")]
    Remove(String),
}

#[derive(ServiceShape)]
struct BookService {
    #[select]
    get_all_books: Select<(), Vec<Book>>,

    // Found through its role marker
    #[member]
    get_book: Select<String, Option<Book>>,

    #[dispatch]
    add_book: Dispatch<Book>,

    #[member]
    remove_book: Dispatch<String>,

    #[observe]
    books_loaded: ActionObservable<Vec<Book>>,

    #[member]
    book_added: Observe<Book>,

    // No tag and no marker: stays bound to the context
    #[member]
    removals: ActionObservable<String>,
}

impl StoreService for BookService {
    type State = Vec<Book>;
    type Action = BookAction;

    fn from_context(context: &StoreContext<Vec<Book>, BookAction>) -> Self {
        Self {
            get_all_books: context.select(create_selector(|books: &Vec<Book>| books.clone())),
            get_book: context.select(create_selector_with_props(
                |books: &Vec<Book>, title: &String| {
                    books.iter().find(|book| &book.title == title).cloned()
                },
            )),
            add_book: context.dispatch(create_action("[Books] Add book", BookAction::Add)),
            remove_book: context.dispatch(create_action("[Books] Remove book", BookAction::Remove)),
            books_loaded: context.observable(["[Books] Books loaded"], |action| match action {
                BookAction::Loaded(books) => Some(books),
                _ => None,
            }),
            book_added: context.observe_map(["[Books] Add book"], |action| match action {
                BookAction::Add(book) => Some(book),
                _ => None,
            }),
            removals: context.observable(["[Books] Remove book"], |action| match action {
                BookAction::Remove(title) => Some(title),
                _ => None,
            }),
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("store_service_testing=trace")
        .try_init();
}

async fn next_within<T>(stream: &mut futures::stream::BoxStream<'static, T>) -> Option<T> {
    tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .ok()
        .flatten()
}

#[tokio::test]
async fn test_mock_selectors_answer_with_initial_values() {
    let initial = InitialValues::new()
        .with("get_all_books", vec![book("A")])
        .with("get_book", Some(book("A")));
    let mock: BookService = create_store_service_mock(&initial).unwrap();

    assert_eq!(mock.get_all_books.call(()).next().await, Some(vec![book("A")]));
    // Props are ignored by mock selectors
    assert_eq!(
        mock.get_book.call("anything".to_string()).next().await,
        Some(Some(book("A")))
    );
}

#[tokio::test]
async fn test_mock_selector_pushes_reach_subscribers() {
    let mock: BookService = create_store_service_mock(&InitialValues::new()).unwrap();
    let cell = mock.get_all_books.mock().unwrap();
    let mut books = mock.get_all_books.call(());

    cell.next(vec![book("B")]);

    assert_eq!(next_within(&mut books).await, Some(vec![book("B")]));
}

#[test]
fn test_mock_dispatchers_record_calls() {
    let mock: BookService = create_store_service_mock(&InitialValues::new()).unwrap();

    mock.add_book.call(book("A")).unwrap();
    mock.remove_book.call("A".to_string()).unwrap();
    mock.remove_book.call("B".to_string()).unwrap();

    assert_eq!(mock.add_book.spy().unwrap().calls(), vec![book("A")]);
    assert_eq!(mock.remove_book.spy().unwrap().call_count(), 2);
    assert_eq!(
        mock.remove_book.spy().unwrap().last_call(),
        Some("B".to_string())
    );
}

#[tokio::test]
async fn test_mock_observers_in_both_conventions() {
    let initial = InitialValues::new().with("books_loaded", vec![book("A")]);
    let mock: BookService = create_store_service_mock(&initial).unwrap();

    let mut loaded = mock.books_loaded.subscribe();
    assert_eq!(next_within(&mut loaded).await, Some(vec![book("A")]));

    let mut added = mock.book_added.call();
    mock.book_added.mock().unwrap().next(book("C"));
    assert_eq!(next_within(&mut added).await, Some(book("C")));
}

#[test]
fn test_untagged_member_without_marker_stays_real() {
    let mock: BookService = create_store_service_mock(&InitialValues::new()).unwrap();

    assert!(mock.removals.mock().is_none());
    assert!(mock.books_loaded.mock().is_some());
}

#[test]
fn test_synthesis_reports_every_double_once() {
    let factory = StoreServiceMockFactory::<BookService>::new(InitialValues::new());
    let mut service = BookService::from_context(&StoreContext::detached());
    let registry = store_service_core::RoleRegistry::for_service::<BookService>();

    let installed = synthesize(&registry, &mut service, factory.initial_values()).unwrap();
    let names: Vec<&str> = installed.iter().map(|mock| mock.member).collect();

    assert_eq!(
        names,
        vec![
            "get_all_books",
            "add_book",
            "books_loaded",
            "get_book",
            "remove_book",
            "book_added",
        ]
    );
    assert_eq!(installed[2].treatment, MockTreatment::ObserverProperty);
    assert_eq!(installed[5].treatment, MockTreatment::ObserverFunction);

    // Synthesizing again treats nothing
    let again = synthesize(&registry, &mut service, factory.initial_values()).unwrap();
    assert!(again.is_empty());
}

#[test]
fn test_wrong_initial_type_is_an_error() {
    init_tracing();
    let initial = InitialValues::new().with("get_all_books", "not a list");

    let result = create_store_service_mock::<BookService>(&initial);

    assert!(matches!(
        result,
        Err(MockError::InitialValueType { ref member, .. }) if member == "get_all_books"
    ));
}

#[tokio::test]
async fn test_unknown_initial_value_is_ignored() {
    init_tracing();
    let initial = InitialValues::new()
        .with("no_such_member", 1_u8)
        .with("get_all_books", Vec::<Book>::new());

    let mock: BookService = create_store_service_mock(&initial).unwrap();

    assert_eq!(mock.get_all_books.call(()).next().await, Some(vec![]));
}

#[tokio::test]
async fn test_factory_mocks_are_independent() {
    let initial = InitialValues::new().with("get_all_books", vec![book("A")]);
    let factory = create_store_service_mock_factory::<BookService>(initial);
    let first = factory.create().unwrap();
    let second = factory.create().unwrap();

    first.get_all_books.mock().unwrap().next(vec![book("B")]);

    assert_eq!(second.get_all_books.call(()).next().await, Some(vec![book("A")]));
    assert_eq!(first.get_all_books.call(()).next().await, Some(vec![book("B")]));
}

#[tokio::test]
async fn test_factory_context_keeps_untagged_members_live() {
    let bed = StoreServiceTestBed::<Vec<Book>, BookAction>::with_state(Vec::new());
    let factory = StoreServiceMockFactory::<BookService>::new(InitialValues::new())
        .with_context(bed.context());
    let mock = factory.create().unwrap();

    let mut removals = mock.removals.subscribe();
    bed.actions().next(BookAction::Remove("A".to_string()));

    assert_eq!(next_within(&mut removals).await, Some("A".to_string()));

    // Mocked dispatchers never reach the store
    mock.add_book.call(book("A")).unwrap();
    assert_eq!(bed.store().dispatch_count(), 0);
}

#[tokio::test]
async fn test_real_service_on_test_bed() {
    let bed = StoreServiceTestBed::<Vec<Book>, BookAction>::with_state(vec![book("A"), book("B")]);
    let service: BookService = bed.service();

    assert_eq!(
        service.get_all_books.call(()).next().await,
        Some(vec![book("A"), book("B")])
    );
    assert_eq!(
        service.get_book.call("B".to_string()).next().await,
        Some(Some(book("B")))
    );

    service.add_book.call(book("C")).unwrap();
    assert_eq!(bed.store().dispatched_actions(), vec![BookAction::Add(book("C"))]);

    let mut loaded = service.books_loaded.subscribe();
    bed.actions().next(BookAction::Add(book("D")));
    bed.actions().next(BookAction::Loaded(vec![book("A")]));

    assert_eq!(next_within(&mut loaded).await, Some(vec![book("A")]));
}

proptest! {
    #[test]
    fn test_selector_mock_holds_any_initial_catalog(titles in proptest::collection::vec("[a-z]{1,8}", 0..8)) {
        let books: Vec<Book> = titles.iter().map(|title| book(title)).collect();
        let initial = InitialValues::new().with("get_all_books", books.clone());

        let mock: BookService = create_store_service_mock(&initial).unwrap();

        prop_assert_eq!(mock.get_all_books.mock().unwrap().value(), Some(books));
        prop_assert!(mock.add_book.spy().unwrap().calls().is_empty());
    }
}
