//! Procedural macros for tidings.
//!
//! - `#[derive(Event)]`: implements `tidings::Event`, optionally with a parent
//! - `#[subscribe]`: turns a free function into a `tidings::Subscriber`

use proc_macro::TokenStream;

mod event;
mod subscribe;

/// Derive macro for the `Event` trait.
///
/// Mark at most one field `#[event(parent)]` to declare the supertype the
/// event embeds. Buses with inheritance enabled then also deliver the event
/// to handlers of that field's type.
///
/// ```rust,ignore
/// #[derive(Event)]
/// struct Connected { peer: String }
///
/// #[derive(Event)]
/// struct TlsConnected {
///     #[event(parent)]
///     base: Connected,
///     cipher: String,
/// }
/// ```
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    event::derive_event_impl(input)
}

/// Turn a function into a subscriber that can be passed to `Bus::subscribe`.
///
/// The function takes exactly one `&E` argument and returns `()` or
/// `Result<(), E>`. The function name becomes a unit struct implementing
/// `tidings::Subscriber`.
///
/// ```rust,ignore
/// #[tidings::subscribe(priority = High, filter = |o: &OrderPlaced| o.total > 0)]
/// fn bill(order: &OrderPlaced) -> Result<(), BillingError> {
///     billing::charge(order)
/// }
///
/// bus.subscribe(bill);
/// ```
#[proc_macro_attribute]
pub fn subscribe(attr: TokenStream, item: TokenStream) -> TokenStream {
    subscribe::subscribe_impl(attr, item)
}
