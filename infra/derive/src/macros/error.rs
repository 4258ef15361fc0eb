use super::derived_traits;
use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, FieldsNamed, Ident, Type, Variant};

const API_STATUS: &str = "api_status";
const FALLBACK_STATUS: &str = "INTERNAL_SERVER_ERROR";

/// One enum variant as seen by `cardly_error`.
struct ErrorVariant<'a> {
    ident: &'a Ident,
    /// Field name and type of the wrapped error, if any.
    source: Option<(&'a Ident, &'a Type)>,
    has_context: bool,
    status: Option<Ident>,
    cfg: Vec<&'a Attribute>,
}

impl<'a> ErrorVariant<'a> {
    fn parse(variant: &'a Variant) -> syn::Result<Self> {
        let Fields::Named(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                variant,
                "cardly_error variants need named fields (`message`/`source` plus `context`)",
            ));
        };

        let has_context = context_field(fields)?.is_some();
        let source = source_field(fields).and_then(|field| Some((field.ident.as_ref()?, &field.ty)));
        if source.is_some() && !has_context {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "variants wrapping a source need `context: Option<Cow<'static, str>>`",
            ));
        }

        Ok(Self {
            ident: &variant.ident,
            source,
            has_context,
            status: status_of(variant)?,
            cfg: variant.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).collect(),
        })
    }

    fn is_internal(&self) -> bool {
        self.ident == "Internal"
    }
}

pub fn expand_derive(input: DeriveInput) -> TokenStream {
    expand(input).unwrap_or_else(syn::Error::into_compile_error)
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "cardly_error only supports enums"));
    };
    let variants = data.variants.iter().map(ErrorVariant::parse).collect::<syn::Result<Vec<_>>>()?;

    let name = &input.ident;
    let ext = format_ident!("{name}Ext");
    let context_ext = context_ext(name, &ext, &variants);
    let conversions: Vec<_> =
        variants.iter().filter_map(|v| source_conversion(name, &ext, v)).collect();
    let internal = internal_conversions(name, &variants);
    let api_error = api_error_conversion(name, &variants);

    let derived = derived_traits(&input.attrs);
    let mut missing = Vec::new();
    if !derived.contains("Debug") {
        missing.push(quote!(Debug));
    }
    if !derived.contains("Error") {
        missing.push(quote!(::thiserror::Error));
    }
    let derives = (!missing.is_empty()).then(|| quote! { #[derive(#(#missing),*)] });

    let mut output = input.clone();
    if let Data::Enum(data) = &mut output.data {
        for variant in &mut data.variants {
            variant.attrs.retain(|attr| !attr.path().is_ident(API_STATUS));
        }
    }

    Ok(quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #output

        #context_ext
        #(#conversions)*
        #internal
        #api_error

        #[allow(dead_code)]
        fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
            match context {
                Some(c) => std::borrow::Cow::Owned(format!(" ({c})")),
                None => std::borrow::Cow::Borrowed(""),
            }
        }
    })
}

fn status_of(variant: &Variant) -> syn::Result<Option<Ident>> {
    let mut attrs = variant.attrs.iter().filter(|attr| attr.path().is_ident(API_STATUS));
    let Some(attr) = attrs.next() else {
        return Ok(None);
    };
    if let Some(extra) = attrs.next() {
        return Err(syn::Error::new_spanned(extra, "api_status given more than once"));
    }
    attr.parse_args::<Ident>()
        .map(Some)
        .map_err(|err| syn::Error::new(err.span(), "api_status takes a status constant such as `NOT_FOUND`"))
}

fn context_field(fields: &FieldsNamed) -> syn::Result<Option<&Field>> {
    let Some(field) = fields.named.iter().find(|f| f.ident.as_ref().is_some_and(|i| i == "context"))
    else {
        return Ok(None);
    };
    if is_optional_static_cow(&field.ty) {
        Ok(Some(field))
    } else {
        Err(syn::Error::new_spanned(&field.ty, "`context` must be Option<Cow<'static, str>>"))
    }
}

fn source_field(fields: &FieldsNamed) -> Option<&Field> {
    fields.named.iter().find(|field| {
        field.ident.as_ref().is_some_and(|ident| ident == "source")
            || field.attrs.iter().any(|attr| attr.path().is_ident("source") || attr.path().is_ident("from"))
    })
}

/// Accepts `Option<Cow<'static, str>>` with or without module paths in front.
fn is_optional_static_cow(ty: &Type) -> bool {
    let flat: String = ty.to_token_stream().to_string().chars().filter(|c| !c.is_whitespace()).collect();
    let inner = flat
        .strip_suffix('>')
        .and_then(|rest| rest.rsplit_once("Option<"))
        .filter(|(prefix, _)| prefix.is_empty() || prefix.ends_with("::"))
        .map(|(_, inner)| inner);
    inner.is_some_and(|inner| {
        inner.strip_suffix("Cow<'static,str>").is_some_and(|path| path.is_empty() || path.ends_with("::"))
    })
}

fn context_ext(name: &Ident, ext: &Ident, variants: &[ErrorVariant<'_>]) -> TokenStream {
    let arms = variants.iter().filter(|v| v.has_context).map(|v| {
        let (cfg, ident) = (&v.cfg, v.ident);
        quote! { #(#cfg)* #name::#ident { context: slot, .. } => *slot = Some(context.into()), }
    });

    quote! {
        pub type Result<T> = std::result::Result<T, #name>;

        /// Attaches a human-readable context to an error on its way up.
        pub trait #ext<T> {
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for std::result::Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut err| {
                    match &mut err {
                        #(#arms)*
                        _ => {}
                    }
                    err
                })
            }
        }
    }
}

fn source_conversion(name: &Ident, ext: &Ident, v: &ErrorVariant<'_>) -> Option<TokenStream> {
    if v.is_internal() {
        return None;
    }
    let (field, ty) = v.source?;
    let (cfg, ident) = (&v.cfg, v.ident);

    Some(quote! {
        #(#cfg)*
        #[automatically_derived]
        impl From<#ty> for #name {
            #[inline]
            fn from(#field: #ty) -> Self {
                Self::#ident { #field, context: None }
            }
        }

        #(#cfg)*
        impl<T> #ext<T> for std::result::Result<T, #ty> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
            }
        }
    })
}

fn internal_conversions(name: &Ident, variants: &[ErrorVariant<'_>]) -> Option<TokenStream> {
    let cfg = &variants.iter().find(|v| v.is_internal())?.cfg;

    Some(quote! {
        #(#cfg)*
        impl From<&'static str> for #name {
            #[inline]
            fn from(message: &'static str) -> Self {
                Self::Internal { message: std::borrow::Cow::Borrowed(message), context: None }
            }
        }

        #(#cfg)*
        impl From<String> for #name {
            #[inline]
            fn from(message: String) -> Self {
                Self::Internal { message: std::borrow::Cow::Owned(message), context: None }
            }
        }
    })
}

/// Only generated when at least one variant carries `#[api_status]`.
fn api_error_conversion(name: &Ident, variants: &[ErrorVariant<'_>]) -> Option<TokenStream> {
    if variants.iter().all(|v| v.status.is_none()) {
        return None;
    }

    let arms = variants.iter().map(|v| {
        let (cfg, ident) = (&v.cfg, v.ident);
        let code = error_code(&ident.to_string());
        let status = v.status.clone().unwrap_or_else(|| Ident::new(FALLBACK_STATUS, ident.span()));
        quote! {
            #(#cfg)*
            #name::#ident { .. } => (::cardly_kernel::server::StatusCode::#status, #code),
        }
    });

    Some(quote! {
        #[automatically_derived]
        impl From<#name> for ::cardly_kernel::server::ApiError {
            fn from(err: #name) -> Self {
                let (status, code) = match &err {
                    #(#arms)*
                };
                ::cardly_kernel::server::ApiError::new(status, code, err.to_string())
            }
        }
    })
}

/// `QuotaExceeded` becomes `quota_exceeded`.
fn error_code(variant: &str) -> String {
    let mut code = String::with_capacity(variant.len() + 4);
    for ch in variant.chars() {
        if ch.is_ascii_uppercase() && !code.is_empty() {
            code.push('_');
        }
        code.push(ch.to_ascii_lowercase());
    }
    code
}
