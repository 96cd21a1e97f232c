//! `#[derive(Event)]`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Index, parse_macro_input, spanned::Spanned};

/// Implementation of the `Event` derive.
pub fn derive_event_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let parent = match &input.data {
        Data::Struct(data) => parent_field(&data.fields)?,
        Data::Enum(data) => {
            for field in data.variants.iter().flat_map(|v| v.fields.iter()) {
                if is_parent(field)? {
                    return Err(syn::Error::new(
                        field.span(),
                        "`#[event(parent)]` is only supported on struct fields",
                    ));
                }
            }
            None
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span(),
                "`Event` cannot be derived for unions",
            ));
        }
    };

    let parent_fn = parent.map(|access| {
        quote! {
            fn parent(&self) -> ::core::option::Option<&dyn ::tidings::Event> {
                ::core::option::Option::Some(&self.#access)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::tidings::Event for #name #ty_generics #where_clause {
            #parent_fn
        }
    })
}

/// Finds the single `#[event(parent)]` field and returns how to access it.
fn parent_field(fields: &Fields) -> syn::Result<Option<TokenStream2>> {
    let mut found: Option<(usize, &Field)> = None;
    for (index, field) in fields.iter().enumerate() {
        if !is_parent(field)? {
            continue;
        }
        if found.is_some() {
            return Err(syn::Error::new(
                field.span(),
                "an event can have at most one `#[event(parent)]` field",
            ));
        }
        found = Some((index, field));
    }

    Ok(found.map(|(index, field)| match &field.ident {
        Some(ident) => quote! { #ident },
        None => {
            let index = Index::from(index);
            quote! { #index }
        }
    }))
}

fn is_parent(field: &Field) -> syn::Result<bool> {
    let mut parent = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("event")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("parent") {
                parent = true;
                Ok(())
            } else {
                Err(meta.error("unknown event attribute, expected `parent`"))
            }
        })?;
    }
    Ok(parent)
}
