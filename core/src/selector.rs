//! Pure selector functions over store state.
//!
//! A [`Selector`] derives a value from state, optionally parameterised by
//! props. Selectors over paths that may be absent return `Option<_>`: the
//! bound accessor then emits `None` rather than failing.

use std::fmt;
use std::sync::Arc;

/// A pure function `(state, props) -> result`.
///
/// `P` defaults to `()` for selectors that take no props.
///
/// # Example
///
/// ```
/// use store_service_core::selector::{create_selector, create_selector_with_props};
///
/// struct State {
///     books: Vec<String>,
/// }
///
/// let books = create_selector(|state: &State| state.books.clone());
/// let by_name = create_selector_with_props(|state: &State, name: &String| {
///     state.books.iter().find(|book| *book == name).cloned()
/// });
///
/// let state = State { books: vec!["Angular".into()] };
/// assert_eq!(books.project(&state, &()), vec!["Angular".to_string()]);
/// assert_eq!(by_name.project(&state, &"Angular".to_string()), Some("Angular".to_string()));
/// assert_eq!(by_name.project(&state, &"Invalid".to_string()), None);
/// ```
pub struct Selector<S, P, R> {
    projector: Arc<dyn Fn(&S, &P) -> R + Send + Sync>,
}

impl<S, P, R> Selector<S, P, R> {
    /// Run the selector against a state snapshot.
    pub fn project(&self, state: &S, props: &P) -> R {
        (self.projector)(state, props)
    }

    /// Compose a further projection on top of this selector's result.
    #[must_use]
    pub fn map<T, F>(self, f: F) -> Selector<S, P, T>
    where
        S: 'static,
        P: 'static,
        R: 'static,
        F: Fn(R) -> T + Send + Sync + 'static,
    {
        let projector = self.projector;
        Selector {
            projector: Arc::new(move |state: &S, props: &P| f(projector(state, props))),
        }
    }
}

impl<S, P, R> Clone for Selector<S, P, R> {
    fn clone(&self) -> Self {
        Self {
            projector: Arc::clone(&self.projector),
        }
    }
}

impl<S, P, R> fmt::Debug for Selector<S, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("props", &std::any::type_name::<P>())
            .field("result", &std::any::type_name::<R>())
            .finish()
    }
}

/// Create a selector that takes no props.
pub fn create_selector<S, R, F>(f: F) -> Selector<S, (), R>
where
    S: 'static,
    R: 'static,
    F: Fn(&S) -> R + Send + Sync + 'static,
{
    Selector {
        projector: Arc::new(move |state: &S, _: &()| f(state)),
    }
}

/// Create a selector parameterised by props.
pub fn create_selector_with_props<S, P, R, F>(f: F) -> Selector<S, P, R>
where
    S: 'static,
    P: 'static,
    R: 'static,
    F: Fn(&S, &P) -> R + Send + Sync + 'static,
{
    Selector {
        projector: Arc::new(f),
    }
}

/// Create a selector from a factory that builds a prop-less selector per props.
///
/// The factory runs on every projection, so it should be cheap.
pub fn create_selector_factory<S, P, R, F>(factory: F) -> Selector<S, P, R>
where
    S: 'static,
    P: 'static,
    R: 'static,
    F: Fn(&P) -> Selector<S, (), R> + Send + Sync + 'static,
{
    Selector {
        projector: Arc::new(move |state: &S, props: &P| factory(props).project(state, &())),
    }
}
