use super::derived_traits;
use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{Attribute, ItemFn, ItemStruct, LitStr};

const DEFAULT_CASE: &str = "camelCase";

/// Options accepted by `#[api_model(...)]`.
#[derive(Default)]
struct ModelOptions {
    /// Tolerate unknown fields; meant for payloads owned by third parties.
    lenient: bool,
    rename_all: Option<LitStr>,
}

impl ModelOptions {
    fn parse(args: TokenStream) -> syn::Result<Self> {
        let mut options = Self::default();
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("lenient") {
                if options.lenient {
                    return Err(meta.error("`lenient` given twice"));
                }
                options.lenient = true;
                Ok(())
            } else if meta.path.is_ident("rename_all") {
                if options.rename_all.is_some() {
                    return Err(meta.error("`rename_all` given twice"));
                }
                options.rename_all = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `lenient` or `rename_all = \"...\"`"))
            }
        });
        parser.parse2(args)?;
        Ok(options)
    }
}

/// What the struct already declares through `#[serde(...)]`.
#[derive(Default)]
struct SerdeSeen {
    rename_all: Option<LitStr>,
    deny_unknown_fields: bool,
}

fn serde_seen(attrs: &[Attribute]) -> syn::Result<SerdeSeen> {
    let mut seen = SerdeSeen::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                seen.rename_all = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("deny_unknown_fields") {
                seen.deny_unknown_fields = true;
            } else if meta.input.peek(syn::token::Paren) {
                let _nested;
                syn::parenthesized!(_nested in meta.input);
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            }
            Ok(())
        })?;
    }
    Ok(seen)
}

/// Expands `#[api_model]`: common derives plus the camelCase, strict serde policy.
pub fn expand_api_model(args: TokenStream, input: ItemStruct) -> TokenStream {
    match model_attrs(args, &input) {
        Ok(attrs) => quote! { #attrs #input },
        Err(err) => err.to_compile_error(),
    }
}

fn model_attrs(args: TokenStream, input: &ItemStruct) -> syn::Result<TokenStream> {
    let options = ModelOptions::parse(args)?;
    let seen = serde_seen(&input.attrs)?;
    let derives = derived_traits(&input.attrs);

    let missing: Vec<TokenStream> = [
        ("Debug", quote! { Debug }),
        ("Serialize", quote! { ::serde::Serialize }),
        ("Deserialize", quote! { ::serde::Deserialize }),
        ("ToSchema", quote! { ::utoipa::ToSchema }),
    ]
    .into_iter()
    .filter(|(name, _)| !derives.contains(*name))
    .map(|(_, path)| path)
    .collect();
    let derive = if missing.is_empty() { quote!() } else { quote! { #[derive(#(#missing),*)] } };

    let case = options
        .rename_all
        .unwrap_or_else(|| LitStr::new(DEFAULT_CASE, proc_macro2::Span::call_site()));
    let rename = match &seen.rename_all {
        Some(existing) if existing.value() != case.value() => {
            return Err(syn::Error::new_spanned(
                existing,
                "serde rename_all disagrees with api_model; drop one of them",
            ));
        }
        Some(_) => quote!(),
        None => quote! { #[serde(rename_all = #case)] },
    };

    let deny = match (options.lenient, seen.deny_unknown_fields) {
        (true, true) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "`lenient` contradicts serde(deny_unknown_fields)",
            ));
        }
        (false, false) => quote! { #[serde(deny_unknown_fields)] },
        _ => quote!(),
    };

    Ok(quote! { #derive #rename #deny })
}

/// Expands `#[api_handler]` into a `utoipa::path` documented handler.
pub fn expand_api_handler(args: TokenStream, input: ItemFn) -> TokenStream {
    let ItemFn { attrs, vis, sig, block } = input;
    quote! {
        #(#attrs)*
        #[allow(clippy::unused_async)]
        #[::utoipa::path(#args)]
        #vis #sig #block
    }
}
