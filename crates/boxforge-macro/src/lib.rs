//! Attribute macros that wrap a plain function and submit it into
//! `boxforge_guest::registry` under a name, so a host-built manifest can
//! install it into a guest process without the two sides sharing a closure.
//!
//! ```ignore
//! #[box_handler("echo")]
//! fn echo(sender: &str, data: serde_json::Value) -> Result<serde_json::Value, String> {
//!     Ok(data)
//! }
//! ```
//!
//! The wrapped function must not capture any host-side state: it runs in
//! the guest process, which only has its own memory, environment, and
//! whatever the manifest's `data` field handed it.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, ItemFn, LitStr};

/// Register a message handler under a literal string name.
#[proc_macro_attribute]
pub fn box_handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    let name = parse_macro_input!(attr as LitStr);
    let func = parse_macro_input!(item as ItemFn);
    expand_registration(
        name,
        func,
        quote!(::boxforge_guest::registry::NamedMessageHandler),
    )
}

/// Register an event handler under a literal string name. The event name a
/// handler fires on is decided by the manifest, not this attribute — a
/// single registered function can be wired to different events by different
/// hosts.
#[proc_macro_attribute]
pub fn box_event_handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    let name = parse_macro_input!(attr as LitStr);
    let func = parse_macro_input!(item as ItemFn);
    expand_registration(
        name,
        func,
        quote!(::boxforge_guest::registry::NamedEventHandler),
    )
}

/// Register a one-shot startup task under a literal string name.
#[proc_macro_attribute]
pub fn box_task(attr: TokenStream, item: TokenStream) -> TokenStream {
    let name = parse_macro_input!(attr as LitStr);
    let func = parse_macro_input!(item as ItemFn);
    expand_registration(name, func, quote!(::boxforge_guest::registry::NamedTask))
}

fn expand_registration(
    name: LitStr,
    func: ItemFn,
    entry_ty: proc_macro2::TokenStream,
) -> TokenStream {
    let fn_ident = func.sig.ident.clone();
    let submit_ident = format_ident!("__boxforge_register_{}", fn_ident);

    let expanded = quote! {
        #func

        #[doc(hidden)]
        #[allow(non_snake_case)]
        mod #submit_ident {
            use super::#fn_ident;

            ::boxforge_guest::__private::inventory::submit! {
                #entry_ty {
                    name: #name,
                    func: #fn_ident,
                }
            }
        }
    };
    expanded.into()
}
