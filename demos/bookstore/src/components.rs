//! View models for the bookstore screens.
//!
//! Each view holds only the accessors it needs, taken from a
//! [`BookStoreService`], so tests can drive them with a synthesized mock.

use crate::models::Book;
use crate::service::BookStoreService;
use futures::StreamExt;
use futures::stream::BoxStream;
use store_service_core::{Dispatch, StoreError};

/// One line of the book list.
#[must_use]
pub fn render_entry(id: usize, book: &Book) -> String {
    format!("#{id} {} by {} ({})", book.title, book.author, book.year)
}

/// The catalog screen.
pub struct BookList {
    books: BoxStream<'static, Vec<Book>>,
    current: Vec<Book>,
}

impl BookList {
    /// Subscribe to the catalog.
    #[must_use]
    pub fn new(service: &BookStoreService) -> Self {
        Self {
            books: service.get_all_books.call(()),
            current: Vec::new(),
        }
    }

    /// Wait for the next catalog and keep it.
    ///
    /// Returns `false` once the source has ended.
    pub async fn refresh(&mut self) -> bool {
        match self.books.next().await {
            Some(books) => {
                self.current = books;
                true
            },
            None => false,
        }
    }

    /// Books shown right now.
    #[must_use]
    pub fn books(&self) -> &[Book] {
        &self.current
    }

    /// Rendered list, one line per book.
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        self.current
            .iter()
            .enumerate()
            .map(|(id, book)| render_entry(id, book))
            .collect()
    }
}

impl std::fmt::Debug for BookList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookList")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// The detail screen for one book.
pub struct BookDetail {
    id: usize,
    book: BoxStream<'static, Option<Book>>,
}

impl BookDetail {
    /// Subscribe to the book with `id`.
    #[must_use]
    pub fn new(service: &BookStoreService, id: usize) -> Self {
        Self {
            id,
            book: service.get_book.call(id),
        }
    }

    /// Id of the book shown.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Wait for the next value of the book; `None` when it does not exist
    /// or the source has ended.
    pub async fn next(&mut self) -> Option<Book> {
        self.book.next().await.flatten()
    }
}

impl std::fmt::Debug for BookDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookDetail")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// The new-book form.
#[derive(Debug)]
pub struct NewBookForm {
    add_book: Dispatch<Book>,
    draft: Book,
}

impl NewBookForm {
    /// An empty form.
    #[must_use]
    pub fn new(service: &BookStoreService) -> Self {
        Self {
            add_book: service.add_book.clone(),
            draft: Book::default(),
        }
    }

    /// Set the author field.
    pub fn set_author(&mut self, author: impl Into<String>) -> &mut Self {
        self.draft.author = author.into();
        self
    }

    /// Set the title field.
    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.draft.title = title.into();
        self
    }

    /// Set the year field.
    pub fn set_year(&mut self, year: u16) -> &mut Self {
        self.draft.year = year;
        self
    }

    /// Current field values.
    #[must_use]
    pub const fn draft(&self) -> &Book {
        &self.draft
    }

    /// Dispatch the drafted book and clear the form.
    ///
    /// # Errors
    ///
    /// Returns the dispatch error; the form keeps its values in that case.
    pub fn submit(&mut self) -> Result<Book, StoreError> {
        let book = self.draft.clone();
        self.add_book.call(book.clone())?;
        self.draft = Book::default();
        tracing::debug!(title = %book.title, "Submitted new book");
        Ok(book)
    }
}
