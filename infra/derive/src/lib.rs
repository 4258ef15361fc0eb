#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by every Cardly crate: error enums, feature slices,
//! API models and handlers, and the runtime entry point.
//!
//! See each macro's docstring for examples; they are `ignore`d because a
//! proc-macro crate cannot use its own macros.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bootstrap the tuned Tokio runtime.
///
/// Transforms an `async fn main` into a plain `fn main` that builds the runtime
/// for the requested profile and blocks on the body.
///
/// # Arguments
///
/// * `high_performance` - Optimized for high-throughput server environments.
/// * `memory_efficient` - Optimized for low-footprint environments.
/// * `default` - Worker threads auto-detected from available parallelism.
///
/// # Examples
///
/// ```rust,ignore
/// #[cardly_runtime::main(high_performance)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro to define an API data transfer object.
///
/// * **Derives**: adds `Debug`, `Serialize`, `Deserialize` and `utoipa::ToSchema` if missing.
/// * **Serde policy**: `rename_all = "camelCase"` and `deny_unknown_fields`.
/// * **Options**: `lenient` drops `deny_unknown_fields`; `rename_all = "..."` picks
///   another case.
///
/// # Example
///
/// ```rust,ignore
/// #[api_model(lenient)]
/// pub struct CardView {
///     pub slug: String,
///     pub display_name: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Attribute macro to bridge Axum handlers with `OpenAPI` documentation.
///
/// Accepts standard `utoipa::path` arguments such as `get`, `post`, `path = "..."`,
/// `responses(...)`, and `tag = "..."`.
///
/// # Example
///
/// ```rust,ignore
/// #[api_handler(get, path = "/health", responses((status = OK, body = HealthReport)), tag = "System")]
/// pub async fn health() -> Json<HealthReport> { .. }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Attribute macro for domain error enums.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` when missing.
/// * `<ErrorName>Ext` trait with `.context(...)` for `Result<T, ErrorName>` and for
///   `Result<T, SourceError>` of every variant with a source field.
/// * `From<SourceError>` impls for variants with a source field.
/// * `From<&'static str>` and `From<String>` when an `Internal` variant is present.
/// * `From<ErrorName> for cardly_kernel::server::ApiError` when at least one variant
///   carries `#[api_status(STATUS)]`. Unannotated variants map to `INTERNAL_SERVER_ERROR`,
///   and the error code is the variant name in `snake_case`.
///
/// # Requirements
///
/// Variants must use named fields. Variants with a source must also declare
/// `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// #[cardly_error]
/// pub enum CardError {
///     #[api_status(NOT_FOUND)]
///     #[error("Card not found{}: {message}", format_context(.context))]
///     NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Database error{}: {source}", format_context(.context))]
///     Database { #[source] source: surrealdb::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn cardly_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Attribute macro to define a vertical slice handle.
///
/// 1. Renames the annotated struct to `<Name>Inner`.
/// 2. Generates a cheap-to-clone `Arc` wrapper named `<Name>` with `Deref`.
/// 3. Implements `cardly_kernel::domain::registry::FeatureSlice` for the wrapper.
///
/// # Example
/// ```rust,ignore
/// #[cardly_derive::cardly_slice]
/// pub struct Cards {
///     pub database: Arc<Surreal<Any>>,
/// }
///
/// let cards = Cards::new(CardsInner { database });
/// ```
#[proc_macro_attribute]
pub fn cardly_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
