use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ItemStruct;

pub fn expand_slice(input: ItemStruct) -> TokenStream {
    let ItemStruct { attrs, vis, ident: handle, fields, .. } = input;
    let inner = format_ident!("{handle}Inner");

    quote! {
        #(#attrs)*
        #vis struct #inner #fields

        #[derive(Clone)]
        #vis struct #handle(std::sync::Arc<#inner>);

        impl #handle {
            #[must_use]
            pub fn new(inner: #inner) -> Self {
                Self(std::sync::Arc::new(inner))
            }
        }

        impl std::ops::Deref for #handle {
            type Target = #inner;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Debug for #handle {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!(#handle)).finish_non_exhaustive()
            }
        }

        impl ::cardly_kernel::domain::registry::FeatureSlice for #handle {
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }
    }
}
