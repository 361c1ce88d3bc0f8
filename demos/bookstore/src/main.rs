//! Bookstore example binary
//!
//! Loads the catalog, shows a book, adds one through the form and prints the
//! final catalog as JSON.

use anyhow::Context as _;
use bookstore::{
    BookDetail, BookEnvironment, BookList, BookReducer, BookState, BookStore, BookStoreService,
    InMemoryBookService, NewBookForm, book_service,
};
use futures::StreamExt;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookstore=debug,store_service_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Bookstore Example: Store Services ===\n");

    let latency = book_service::latency_from_env();
    let env = BookEnvironment::new(InMemoryBookService::sample().with_latency(latency));
    let store: BookStore = BookStore::new(BookState::default(), BookReducer::new(), env);
    let books: BookStoreService = store.service();

    let mut list = BookList::new(&books);
    list.refresh().await;
    println!("Initial catalog: {} books", list.books().len());

    println!("\n>>> Loading books ({} ms backend latency)", latency.as_millis());
    let mut loaded = books.books_loaded.subscribe();
    books.load_books.call(())?;
    let catalog = tokio::time::timeout(latency + Duration::from_secs(5), loaded.next())
        .await
        .context("book service did not answer")?
        .context("action stream ended")?;
    println!("Loaded {} books", catalog.len());

    list.refresh().await;
    for line in list.render() {
        println!("  {line}");
    }

    let mut detail = BookDetail::new(&books, 0);
    if let Some(book) = detail.next().await {
        println!("\nDetail of #{}: {} ({})", detail.id(), book.title, book.year);
    }

    println!("\n>>> Adding a book through the form");
    let mut added = books.book_added.call();
    let mut form = NewBookForm::new(&books);
    form.set_author("Barbara Liskov")
        .set_title("Abstraction and Specification")
        .set_year(1986);
    form.submit()?;
    if let Some(book) = added.next().await {
        println!("Observed added book: {}", book.title);
    }

    let state = store.snapshot();
    println!(
        "\nFinal catalog:\n{}",
        serde_json::to_string_pretty(&state.books)?
    );

    store.close().await?;
    println!("\n=== Bookstore Example Complete ===");
    Ok(())
}
