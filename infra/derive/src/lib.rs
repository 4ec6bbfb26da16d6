#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the Keepsafe crates.
//!
//! * [`ksafe_error`] turns a plain enum into a `thiserror` error with context support.
//! * [`sealed_model`] prepares a struct for sealing through `ksafe_cipher`.
//!
//! Examples are `ignore`d here because they need the consuming crates in scope.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for structs that are persisted through the cipher.
///
/// Generates `Serialize`/`Deserialize` (routed through `ksafe_cipher::serde` so consumers do
/// not need a direct serde dependency), implements `ksafe_cipher::SealedModel` with the given
/// `tag` (or the struct name), and provides a `Debug` impl that prints field names only.
///
/// The tag is bound into the ciphertext as associated data, so a payload sealed as one model
/// cannot be opened as another.
///
/// # Errors
/// Emits a compile-time error for enums, unions, tuple structs and unit structs.
///
/// # Example
/// ```rust,ignore
/// use ksafe_cipher::prelude::*;
///
/// #[sealed_model(tag = "ksafe.session.v1")]
/// struct StoredTokens {
///     user_id: String,
///     id_token: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn sealed_model(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::sealed::expand(args.into(), input).into()
}

/// Attribute macro for domain error enums.
///
/// # Features
///
/// * Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * Generates a `<ErrorName>Ext` trait adding `.context(...)` to `Result<T, ErrorName>`
///   and to `Result<T, Source>` for every variant wrapping a source error.
/// * Implements `From<Source>` for those variants so `?` works on upstream errors.
/// * Implements `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * Emits a hidden `format_context` associated fn per enum; `format_context(..)` calls in
///   `#[error(...)]` strings resolve to it, so several error enums can share a module.
///
/// # Requirements
///
/// 1. Applied to an enum with named-field variants only.
/// 2. A `context` field, if present, must be `Option<Cow<'static, str>>`.
/// 3. Variants with a `source` field (or `#[source]`/`#[from]`) must also carry `context`.
/// 4. Two variants may not wrap the same source type.
///
/// # Example
///
/// ```rust,ignore
/// use ksafe_derive::ksafe_error;
/// use std::borrow::Cow;
///
/// #[ksafe_error]
/// pub enum StoreError {
///     #[error("Storage error{}: {source}", format_context(.context))]
///     Storage { source: ksafe_storage::StorageError, context: Option<Cow<'static, str>> },
///
///     #[error("Internal error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn ksafe_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
