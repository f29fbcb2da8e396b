//! Attribute macros for lazybus-rs. Use `#[listener_methods]` so you don't need to write `Service::call` by hand.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Error, ImplItem, ItemImpl, LitStr, Meta};

/// Implements `Service` for the type of an inherent impl block.
///
/// Methods marked `#[listener]` become callable by name (the Rust method name, or the one given as
/// `#[listener("onFoo")]`). They take `&self` and `&mut Event` and return `()` or
/// `Result<(), DispatchError>`. Any other name fails with `DispatchError::UnknownMethod`.
#[proc_macro_attribute]
pub fn listener_methods(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let attr = proc_macro2::TokenStream::from(attr);
        return Error::new_spanned(attr, "#[listener_methods] takes no arguments")
            .to_compile_error()
            .into();
    }
    let mut block = parse_macro_input!(item as ItemImpl);
    if let Some((_, path, _)) = &block.trait_ {
        return Error::new_spanned(path, "#[listener_methods] goes on an inherent impl block")
            .to_compile_error()
            .into();
    }

    let mut arms = Vec::new();
    for item in &mut block.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let Some(pos) = method.attrs.iter().position(|a| a.path().is_ident("listener")) else {
            continue;
        };
        let marker = method.attrs.remove(pos);
        let ident = method.sig.ident.clone();
        let name = match &marker.meta {
            Meta::Path(_) => LitStr::new(&ident.to_string(), ident.span()),
            Meta::List(_) => match marker.parse_args::<LitStr>() {
                Ok(name) => name,
                Err(e) => return e.to_compile_error().into(),
            },
            Meta::NameValue(nv) => {
                return Error::new_spanned(nv, "use #[listener] or #[listener(\"name\")]")
                    .to_compile_error()
                    .into();
            }
        };
        arms.push(quote! {
            #name => ::lazybus_rs::ListenerOutcome::into_outcome(self.#ident(event)),
        });
    }

    let self_ty = &block.self_ty;
    let (impl_generics, _, where_clause) = block.generics.split_for_impl();
    let expanded = quote! {
        #block

        impl #impl_generics ::lazybus_rs::Service for #self_ty #where_clause {
            #[allow(unused_variables)]
            fn call(
                &self,
                method: &str,
                event: &mut ::lazybus_rs::Event,
            ) -> ::core::result::Result<(), ::lazybus_rs::DispatchError> {
                match method {
                    #(#arms)*
                    _ => ::core::result::Result::Err(::lazybus_rs::DispatchError::unknown_method(
                        ::lazybus_rs::Service::service_name(self),
                        method,
                    )),
                }
            }
        }
    };
    TokenStream::from(expanded)
}
