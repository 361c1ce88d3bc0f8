//! The bookstore running on a real store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use bookstore::{
    Book, BookAction, BookEnvironment, BookList, BookReducer, BookState, BookStore,
    BookStoreService, InMemoryBookService, NewBookForm,
};
use futures::StreamExt;
use std::time::Duration;
use store_service_core::StoreError;
use store_service_testing::StoreServiceTestBed;

fn store_with(books: Vec<Book>) -> BookStore {
    let env = BookEnvironment::new(InMemoryBookService::new(books));
    BookStore::new(BookState::default(), BookReducer::new(), env)
}

#[tokio::test]
async fn test_load_books_round_trip() {
    let store = store_with(vec![Book::new("A", "First", 2000)]);
    let service: BookStoreService = store.service();
    let mut loaded = service.books_loaded.subscribe();

    service.load_books.call(()).unwrap();

    let books = tokio::time::timeout(Duration::from_secs(1), loaded.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(books, vec![Book::new("A", "First", 2000)]);
    assert_eq!(store.state(|state| state.books.len()), 1);
}

#[tokio::test]
async fn test_service_outlives_dropped_store() {
    let store = store_with(Vec::new());
    let service: BookStoreService = store.service();
    drop(store);

    let next = tokio::time::timeout(Duration::from_secs(1), service.books_loaded.subscribe().next())
        .await
        .unwrap();
    assert_eq!(next, None);
    assert_eq!(service.load_books.call(()), Err(StoreError::StoreDropped));
}

#[tokio::test]
async fn test_list_sees_books_added_through_form() {
    let store = store_with(Vec::new());
    let service: BookStoreService = store.service();
    let mut list = BookList::new(&service);
    list.refresh().await;
    assert!(list.books().is_empty());

    let mut form = NewBookForm::new(&service);
    form.set_author("A").set_title("First").set_year(2000);
    form.submit().unwrap();

    tokio::time::timeout(Duration::from_secs(1), list.refresh())
        .await
        .unwrap();
    assert_eq!(list.books(), &[Book::new("A", "First", 2000)]);
}

#[tokio::test]
async fn test_wait_for_books_loaded() {
    let store = store_with(vec![Book::new("A", "First", 2000)]);

    let action = store
        .dispatch_and_wait_for(
            BookAction::LoadBooks,
            |action| matches!(action, BookAction::BooksLoaded { .. }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(
        action,
        BookAction::BooksLoaded {
            books: vec![Book::new("A", "First", 2000)]
        }
    );
}

#[tokio::test]
async fn test_service_on_test_bed_records_actions() {
    let bed = StoreServiceTestBed::<BookState, BookAction>::with_state(BookState::with_books(
        vec![Book::new("A", "First", 2000), Book::new("B", "Second", 2001)],
    ));
    let service: BookStoreService = bed.service();

    assert_eq!(
        service.get_book.call(1).next().await,
        Some(Some(Book::new("B", "Second", 2001)))
    );

    service.add_book.call(Book::new("C", "Third", 2002)).unwrap();
    service.load_books.call(()).unwrap();

    assert_eq!(
        bed.store().dispatched_actions(),
        vec![
            BookAction::AddBook {
                book: Book::new("C", "Third", 2002)
            },
            BookAction::LoadBooks,
        ]
    );

    let mut added = service.book_added.call();
    bed.actions().next(BookAction::LoadBooks);
    bed.actions().next(BookAction::AddBook {
        book: Book::new("D", "Fourth", 2003),
    });
    assert_eq!(added.next().await, Some(Book::new("D", "Fourth", 2003)));
}

#[tokio::test]
async fn test_closed_store_rejects_dispatch() {
    let store = store_with(Vec::new());
    let service: BookStoreService = store.service();

    store.shutdown(Duration::from_secs(1)).await.unwrap();

    assert!(service.add_book.call(Book::default()).is_err());
}
