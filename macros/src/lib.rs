//! Derive macros for store services
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Implements `Action` from per-variant (or per-type)
//!   `#[action("...")]` tags
//! - `#[derive(ServiceShape)]` - Generates a service manifest from
//!   `#[select]`, `#[dispatch]` and `#[observe]` field attributes
//!
//! # Example
//!
//! ```ignore
//! use store_service_macros::{Action, ServiceShape};
//!
//! #[derive(Action, Clone, Debug)]
//! enum BookAction {
//!     #[action("[Books] Load books")]
//!     Load,
//!
//!     #[action("[Books] Books loaded")]
//!     Loaded { books: Vec<Book> },
//! }
//!
//! #[derive(ServiceShape)]
//! struct BookStoreService {
//!     #[select]
//!     books: Select<(), Vec<Book>>,
//!
//!     #[dispatch]
//!     load_books: Dispatch<()>,
//!
//!     #[observe]
//!     books_loaded: ActionObservable<Vec<Book>>,
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derive macro for actions
///
/// On an enum, every variant carries `#[action("tag")]` and `action_type()`
/// returns the tag of the current variant.
///
/// On a struct, the type carries `#[action("tag")]`; the macro implements both
/// `Action` and `TypedAction`, so the struct can be used as a class-style
/// action in dispatchers.
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a union
/// - An enum variant (or the struct) has no `#[action("...")]` tag
///
/// # Example
///
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// #[action("[Books] Add book")]
/// struct AddBookAction {
///     book: Book,
/// }
///
/// assert_eq!(AddBookAction::TYPE, "[Books] Add book");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match &input.data {
        Data::Enum(data_enum) => derive_enum_action(&input, data_enum),
        Data::Struct(_) => derive_struct_action(&input),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input,
            "#[derive(Action)] can only be used on enums and structs",
        )),
    };

    expanded.unwrap_or_else(syn::Error::into_compile_error).into()
}

fn derive_enum_action(input: &DeriveInput, data_enum: &syn::DataEnum) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut arms = Vec::new();
    for variant in &data_enum.variants {
        let variant_name = &variant.ident;
        let Some(tag) = action_tag(&variant.attrs)? else {
            return Err(syn::Error::new_spanned(
                variant,
                "Every variant needs an #[action(\"...\")] tag",
            ));
        };

        let pattern = match &variant.fields {
            Fields::Named(_) => quote! { Self::#variant_name { .. } },
            Fields::Unnamed(_) => quote! { Self::#variant_name(..) },
            Fields::Unit => quote! { Self::#variant_name },
        };
        arms.push(quote! { #pattern => #tag, });
    }

    // An empty enum has no values to match on
    let body = if arms.is_empty() {
        quote! { match *self {} }
    } else {
        quote! {
            match self {
                #(#arms)*
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::store_service_core::Action for #name #ty_generics #where_clause {
            fn action_type(&self) -> &str {
                #body
            }
        }
    })
}

fn derive_struct_action(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Some(tag) = action_tag(&input.attrs)? else {
        return Err(syn::Error::new_spanned(
            input,
            "A struct action needs an #[action(\"...\")] tag",
        ));
    };

    Ok(quote! {
        impl #impl_generics ::store_service_core::TypedAction for #name #ty_generics #where_clause {
            const TYPE: &'static str = #tag;
        }

        impl #impl_generics ::store_service_core::Action for #name #ty_generics #where_clause {
            fn action_type(&self) -> &str {
                #tag
            }
        }
    })
}

fn action_tag(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    attrs
        .iter()
        .find(|attr| attr.path().is_ident("action"))
        .map(|attr| attr.parse_args::<LitStr>())
        .transpose()
}

/// Derive macro for service manifests
///
/// Field attributes:
///
/// - `#[select]`, `#[dispatch]`, `#[observe]` - tag the field with a role in
///   the manifest and expose it to the mock synthesizer
/// - `#[member]` - expose the field without a manifest tag; its value's own
///   role marker decides
/// - `#[service]` - embed another `ServiceShape`: its manifest is inherited and
///   its members are exposed as this type's members
///
/// Fields without an attribute are ignored.
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to anything but a struct with named fields
/// - A field carries more than one of the attributes above
#[proc_macro_derive(ServiceShape, attributes(select, dispatch, observe, member, service))]
pub fn derive_service_shape(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_service_shape_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

enum FieldKind {
    Tagged(TokenStream2),
    Member,
    Service,
}

fn field_kind(attrs: &[Attribute]) -> syn::Result<Option<FieldKind>> {
    let mut kinds = Vec::new();
    for attr in attrs {
        let kind = if attr.path().is_ident("select") {
            FieldKind::Tagged(quote! { ::store_service_core::Role::Selector })
        } else if attr.path().is_ident("dispatch") {
            FieldKind::Tagged(quote! { ::store_service_core::Role::Dispatcher })
        } else if attr.path().is_ident("observe") {
            FieldKind::Tagged(quote! { ::store_service_core::Role::Observer })
        } else if attr.path().is_ident("member") {
            FieldKind::Member
        } else if attr.path().is_ident("service") {
            FieldKind::Service
        } else {
            continue;
        };
        attr.meta.require_path_only()?;
        kinds.push((attr, kind));
    }

    match kinds.len() {
        0 | 1 => Ok(kinds.pop().map(|(_, kind)| kind)),
        _ => Err(syn::Error::new_spanned(
            kinds[1].0,
            "A field can have only one of #[select], #[dispatch], #[observe], #[member] or #[service]",
        )),
    }
}

fn derive_service_shape_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data_struct) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(ServiceShape)] can only be used on structs",
        ));
    };
    let Fields::Named(fields) = &data_struct.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(ServiceShape)] requires named fields",
        ));
    };

    let mut manifest = Vec::new();
    let mut members = Vec::new();

    for field in &fields.named {
        let Some(ident) = &field.ident else {
            continue;
        };
        let member_name = ident.to_string();
        let ty = &field.ty;

        match field_kind(&field.attrs)? {
            Some(FieldKind::Tagged(role)) => {
                manifest.push(quote! {
                    registry.tag::<Self>(#member_name, #role);
                });
                members.push(quote! {
                    members.push((#member_name, &mut self.#ident));
                });
            },
            Some(FieldKind::Member) => {
                members.push(quote! {
                    members.push((#member_name, &mut self.#ident));
                });
            },
            Some(FieldKind::Service) => {
                manifest.push(quote! {
                    <#ty as ::store_service_core::ServiceShape>::describe(registry);
                    registry.inherit::<Self, #ty>();
                });
                members.push(quote! {
                    members.extend(::store_service_core::ServiceShape::members_mut(&mut self.#ident));
                });
            },
            None => {},
        }
    }

    Ok(quote! {
        impl #impl_generics ::store_service_core::ServiceShape for #name #ty_generics #where_clause {
            fn describe(registry: &mut ::store_service_core::RoleRegistry) {
                let _ = &registry;
                #(#manifest)*
            }

            fn members_mut(
                &mut self,
            ) -> ::std::vec::Vec<(&'static str, &mut dyn ::store_service_core::ServiceMember)> {
                #[allow(unused_mut)]
                let mut members: ::std::vec::Vec<(
                    &'static str,
                    &mut dyn ::store_service_core::ServiceMember,
                )> = ::std::vec::Vec::new();
                #(#members)*
                members
            }
        }
    })
}
