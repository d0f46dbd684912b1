//! Derive macros for Flight Surety
//!
//! This crate provides procedural macros that remove the per-variant
//! boilerplate of command and event enums.
//!
//! # Available Macros
//!
//! - `#[derive(Command)]` - Implements `flight_surety_core::command::Command`
//! - `#[derive(DomainEvent)]` - Implements `flight_surety_core::event::Event`
//!
//! # Example
//!
//! ```ignore
//! use flight_surety_macros::{Command, DomainEvent};
//!
//! #[derive(Command)]
//! enum GateCommand {
//!     #[ungated]
//!     SetOperatingStatus { operational: bool },
//!     Fund { amount: u128 },
//! }
//!
//! #[derive(DomainEvent)]
//! enum GateEvent {
//!     OperatingStatusChanged { operational: bool },
//! }
//!
//! // Generated:
//! // GateCommand::Fund { .. }.name() == "Fund"
//! // GateCommand::SetOperatingStatus { .. }.requires_operational() == false
//! // GateEvent::OperatingStatusChanged { .. }.event_type() == "OperatingStatusChanged.v1"
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DataEnum, DeriveInput, Fields, Ident, parse_macro_input};

/// Derive macro for command enums
///
/// Implements `flight_surety_core::command::Command`:
/// - `name()` - Returns the variant name
/// - `requires_operational()` - `false` for variants marked `#[ungated]`,
///   `true` otherwise
///
/// # Attributes
///
/// - `#[ungated]` - The command stays available while the system is paused
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if applied to
/// a non-enum type.
#[proc_macro_derive(Command, attributes(ungated))]
pub fn derive_command(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let data_enum = match enum_data(&input, "Command") {
        Ok(data_enum) => data_enum,
        Err(error) => return error.to_compile_error().into(),
    };

    let name_arms = data_enum.variants.iter().map(|variant| {
        let pattern = variant_pattern(&variant.ident, &variant.fields);
        let label = variant.ident.to_string();
        quote! { #pattern => #label, }
    });

    let gate_arms = data_enum.variants.iter().map(|variant| {
        let pattern = variant_pattern(&variant.ident, &variant.fields);
        let gated = !has_attribute(&variant.attrs, "ungated");
        quote! { #pattern => #gated, }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::flight_surety_core::command::Command for #name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms)*
                }
            }

            fn requires_operational(&self) -> bool {
                match self {
                    #(#gate_arms)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Derive macro for event enums
///
/// Implements `flight_surety_core::event::Event` with `event_type()`
/// returning `"<Variant>.v1"`.
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if applied to
/// a non-enum type.
#[proc_macro_derive(DomainEvent)]
pub fn derive_domain_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let data_enum = match enum_data(&input, "DomainEvent") {
        Ok(data_enum) => data_enum,
        Err(error) => return error.to_compile_error().into(),
    };

    let type_arms = data_enum.variants.iter().map(|variant| {
        let pattern = variant_pattern(&variant.ident, &variant.fields);
        let type_name = format!("{}.v1", variant.ident);
        quote! { #pattern => #type_name, }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::flight_surety_core::event::Event for #name #ty_generics #where_clause {
            fn event_type(&self) -> &'static str {
                match self {
                    #(#type_arms)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Returns the enum body or a spanned error naming the derive.
fn enum_data<'a>(input: &'a DeriveInput, derive: &str) -> syn::Result<&'a DataEnum> {
    match &input.data {
        Data::Enum(data_enum) => Ok(data_enum),
        _ => Err(syn::Error::new_spanned(
            input,
            format!("#[derive({derive})] can only be used on enums"),
        )),
    }
}

/// Wildcard pattern matching any value of a variant.
fn variant_pattern(variant: &Ident, fields: &Fields) -> TokenStream2 {
    match fields {
        Fields::Named(_) => quote! { Self::#variant { .. } },
        Fields::Unnamed(_) => quote! { Self::#variant(..) },
        Fields::Unit => quote! { Self::#variant },
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
