//! Tests for #[derive(Action)]

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use store_service_core::{Action, ActionDescriptor, ActionFilter, TypedAction};
use store_service_macros::Action;

#[derive(Action, Clone, Debug, PartialEq)]
enum BookAction {
    #[action("[Books] Load books")]
    Load,

    #[action("[Books] Books loaded")]
    Loaded { books: Vec<String> },

    #[action("[Books] Add book")]
    Add(String),

    #[action("[Books] Remove book")]
    Remove(AddBookAction),
}

#[derive(Action, Clone, Debug, PartialEq)]
#[action("[Books] Add book")]
struct AddBookAction {
    title: String,
}

impl From<String> for AddBookAction {
    fn from(title: String) -> Self {
        Self { title }
    }
}

impl From<AddBookAction> for BookAction {
    fn from(action: AddBookAction) -> Self {
        Self::Add(action.title)
    }
}

#[test]
fn test_unit_variant_tag() {
    assert_eq!(BookAction::Load.action_type(), "[Books] Load books");
}

#[test]
fn test_named_variant_tag() {
    let action = BookAction::Loaded {
        books: vec!["A".to_string()],
    };
    assert_eq!(action.action_type(), "[Books] Books loaded");
}

#[test]
fn test_tuple_variant_tags() {
    assert_eq!(BookAction::Add("A".to_string()).action_type(), "[Books] Add book");
    let removal = BookAction::Remove(AddBookAction {
        title: "A".to_string(),
    });
    assert_eq!(removal.action_type(), "[Books] Remove book");
}

#[test]
fn test_struct_action_is_typed() {
    assert_eq!(AddBookAction::TYPE, "[Books] Add book");

    let action = AddBookAction {
        title: "Dune".to_string(),
    };
    assert_eq!(action.action_type(), AddBookAction::TYPE);
}

#[test]
fn test_struct_action_as_descriptor() {
    let descriptor = ActionDescriptor::<String, BookAction>::of_type::<AddBookAction>();

    assert_eq!(descriptor.tag().as_str(), "[Books] Add book");
    assert_eq!(
        descriptor.build("Dune".to_string()),
        BookAction::Add("Dune".to_string())
    );
}

#[test]
fn test_derived_tags_drive_filters() {
    let filter = ActionFilter::new(["[Books] Books loaded", "[Books] Add book"]);

    assert!(filter.matches(&BookAction::Loaded { books: vec![] }));
    assert!(filter.matches(&BookAction::Add("A".to_string())));
    assert!(!filter.matches(&BookAction::Load));
}
