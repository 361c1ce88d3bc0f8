//! Book catalog backend.

use crate::models::Book;
use futures::future::{BoxFuture, FutureExt};
use std::time::Duration;

/// Environment variable overriding the backend latency, in milliseconds.
pub const LATENCY_ENV: &str = "BOOKSTORE_LATENCY_MS";

/// Latency used when [`LATENCY_ENV`] is unset.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(2000);

/// Source of the book catalog.
pub trait BookService: Send + Sync + 'static {
    /// Load the whole catalog.
    fn load_books(&self) -> BoxFuture<'static, Vec<Book>>;
}

/// Fixed catalog answered after a configurable delay.
#[derive(Clone, Debug)]
pub struct InMemoryBookService {
    books: Vec<Book>,
    latency: Duration,
}

impl InMemoryBookService {
    /// Serve `books` immediately.
    #[must_use]
    pub const fn new(books: Vec<Book>) -> Self {
        Self {
            books,
            latency: Duration::ZERO,
        }
    }

    /// The demo catalog.
    #[must_use]
    pub fn sample() -> Self {
        Self::new(vec![
            Book::new("Joost", "Store Services in Practice", 2018),
            Book::new("Grace Hopper", "Compilers for Everyone", 1952),
        ])
    }

    /// Answer after `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Configured latency.
    #[must_use]
    pub const fn latency(&self) -> Duration {
        self.latency
    }
}

impl BookService for InMemoryBookService {
    fn load_books(&self) -> BoxFuture<'static, Vec<Book>> {
        let books = self.books.clone();
        let latency = self.latency;
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            books
        }
        .boxed()
    }
}

/// Read the latency from [`LATENCY_ENV`], falling back to
/// [`DEFAULT_LATENCY`].
#[must_use]
pub fn latency_from_env() -> Duration {
    parse_latency(std::env::var(LATENCY_ENV).ok().as_deref())
}

fn parse_latency(value: Option<&str>) -> Duration {
    match value.map(str::trim) {
        None | Some("") => DEFAULT_LATENCY,
        Some(raw) => match raw.parse::<u64>() {
            Ok(millis) => Duration::from_millis(millis),
            Err(error) => {
                tracing::warn!(
                    value = raw,
                    %error,
                    "Invalid {LATENCY_ENV}, using the default latency"
                );
                DEFAULT_LATENCY
            },
        },
    }
}
