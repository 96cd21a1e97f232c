//! `#[subscribe]`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Expr, FnArg, Ident, ItemFn, ReturnType, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

const PRIORITIES: [&str; 5] = ["Lowest", "Low", "Normal", "High", "Highest"];

/// Arguments for the `#[subscribe]` macro.
pub(crate) struct SubscribeArgs {
    /// A `tidings::Priority` variant name.
    pub priority: Option<Ident>,
    /// A callable taking `&E` and returning `bool`.
    pub filter: Option<Expr>,
}

impl Parse for SubscribeArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut priority = None;
        let mut filter = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "priority" => {
                    let level: Ident = input.parse()?;
                    if !PRIORITIES.contains(&level.to_string().as_str()) {
                        return Err(syn::Error::new(
                            level.span(),
                            format!("unknown priority `{level}`, expected one of {PRIORITIES:?}"),
                        ));
                    }
                    priority = Some(level);
                }
                "filter" => {
                    let expr: Expr = input.parse()?;
                    filter = Some(expr);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(SubscribeArgs { priority, filter })
    }
}

/// Implementation of the `#[subscribe]` attribute macro.
pub fn subscribe_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as SubscribeArgs);
    let input = parse_macro_input!(item as ItemFn);
    match expand(&args, &input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: &SubscribeArgs, input: &ItemFn) -> syn::Result<TokenStream2> {
    let sig = &input.sig;
    let fn_name = &sig.ident;
    let fn_vis = &input.vis;
    let fn_block = &input.block;

    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "subscribers run synchronously and cannot be async",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "subscribers cannot be generic",
        ));
    }
    let arg = match sig.inputs.first() {
        Some(arg) if sig.inputs.len() == 1 => arg,
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.inputs,
                "subscriber must take exactly one argument: fn(event: &Event)",
            ));
        }
    };

    let (event_pat, event_type) = match arg {
        FnArg::Typed(pat_type) => match &*pat_type.ty {
            Type::Reference(type_ref) if type_ref.mutability.is_none() => {
                (&pat_type.pat, &type_ref.elem)
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "subscriber argument must be a shared reference (&Event)",
                ));
            }
        },
        FnArg::Receiver(receiver) => {
            return Err(syn::Error::new_spanned(
                receiver,
                "subscriber cannot have a self parameter",
            ));
        }
    };

    let output_type = match &sig.output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => quote! { #ty },
    };

    let priority = args.priority.as_ref().map(|level| {
        quote! {
            const PRIORITY: ::tidings::Priority = ::tidings::Priority::#level;
        }
    });

    let accepts = args.filter.as_ref().map(|filter| {
        quote! {
            fn accepts(&self, __event: &Self::Event) -> bool {
                (#filter)(__event)
            }
        }
    });

    // Docs describe the struct; `#[cfg]`, lint levels and the like also
    // cover the impl that carries the function body.
    let (docs, shared): (Vec<_>, Vec<_>) = input
        .attrs
        .iter()
        .partition(|attr| attr.path().is_ident("doc"));
    let generated_doc = docs.is_empty().then(|| {
        quote! {
            #[doc = concat!("Subscriber generated by `#[tidings::subscribe]` on `", stringify!(#fn_name), "`")]
        }
    });

    Ok(quote! {
        #(#docs)*
        #generated_doc
        #(#shared)*
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, Default)]
        #fn_vis struct #fn_name;

        #(#shared)*
        impl ::tidings::Subscriber for #fn_name {
            type Event = #event_type;
            type Output = #output_type;

            #priority

            #accepts

            fn handle(&self, #event_pat: &#event_type) -> Self::Output #fn_block
        }
    })
}
