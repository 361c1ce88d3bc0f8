//! Bookstore selectors.

use crate::models::{Book, BookState};
use store_service_core::{Selector, create_selector, create_selector_factory, create_selector_with_props};

/// The whole catalog.
#[must_use]
pub fn select_books() -> Selector<BookState, (), Vec<Book>> {
    create_selector(|state: &BookState| state.books.clone())
}

/// The book with the given id, if any.
#[must_use]
pub fn select_book_by_id() -> Selector<BookState, usize, Option<Book>> {
    create_selector_with_props(|state: &BookState, id: &usize| state.books.get(*id).cloned())
}

/// Number of books in the catalog.
#[must_use]
pub fn select_book_count() -> Selector<BookState, (), usize> {
    select_books().map(|books| books.len())
}

/// Books by one author, in catalog order.
#[must_use]
pub fn select_books_by_author() -> Selector<BookState, String, Vec<Book>> {
    create_selector_factory(|author: &String| {
        let author = author.clone();
        create_selector(move |state: &BookState| {
            state
                .books
                .iter()
                .filter(|book| book.author == author)
                .cloned()
                .collect()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state() -> BookState {
        BookState::with_books(vec![
            Book::new("A", "First", 2000),
            Book::new("B", "Second", 2001),
            Book::new("A", "Third", 2002),
        ])
    }

    #[test]
    fn test_select_books() {
        assert_eq!(select_books().project(&state(), &()), state().books);
    }

    #[test]
    fn test_select_book_by_id() {
        let selector = select_book_by_id();

        assert_eq!(selector.project(&state(), &1).map(|book| book.title), Some("Second".to_string()));
        assert_eq!(selector.project(&state(), &3), None);
    }

    #[test]
    fn test_select_books_by_author() {
        let titles: Vec<String> = select_books_by_author()
            .project(&state(), &"A".to_string())
            .into_iter()
            .map(|book| book.title)
            .collect();

        assert_eq!(titles, vec!["First", "Third"]);
    }

    proptest! {
        #[test]
        fn test_count_matches_catalog(years in proptest::collection::vec(1900_u16..2100, 0..32)) {
            let books = years.iter().map(|year| Book::new("X", "Y", *year)).collect::<Vec<_>>();
            let state = BookState::with_books(books);

            prop_assert_eq!(select_book_count().project(&state, &()), years.len());
        }
    }
}
