use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Ident, ItemFn, ReturnType};

/// Proc macro to denote a Scenario
///
/// Turns an `async fn` taking no arguments and returning a `Result` into a function of the same
/// name which returns a configurable `Scenario`. Each call of the function body is one trial:
/// `Ok` is a success and `Err` a failure, with the error's `Display` output recorded.
///
/// See the `Scenario` struct for more information on the methods this macro provides on functions.
///
/// # Example
/// ```ignore
/// use loadstat::prelude::*;
///
/// #[scenario]
/// async fn homepage() -> Result<(), reqwest::Error> {
///     reqwest::get("http://localhost:8000/").await?.error_for_status()?;
///     Ok(())
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let stats = homepage().users(10).await;
/// }
/// ```
#[proc_macro_attribute]
pub fn scenario(attr: TokenStream, item: TokenStream) -> TokenStream {
    scenario_internal(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn scenario_internal(_attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let input = syn::parse2::<ItemFn>(item)?;

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;
    let stmts = &block.stmts;

    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[scenario] functions must be async",
        ));
    }
    if !sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "#[scenario] functions cannot take arguments",
        ));
    }
    if matches!(sig.output, ReturnType::Default) {
        return Err(syn::Error::new_spanned(
            &sig,
            "#[scenario] functions must return a Result",
        ));
    }

    let new_name = Ident::new(&format!("__loadstat_{}", sig.ident), Span::call_site());
    let mut new_sig = sig.clone();
    new_sig.ident = new_name.clone();

    let mut scen_sig = sig.clone();
    let scen_name = sig.ident.clone();
    scen_sig.asyncness = None;
    scen_sig.output = syn::parse2(quote! {
        -> impl ::loadstat::scenario::ConfigurableScenario<::loadstat::RunStatistics>
    })?;

    Ok(quote! {
        #(#attrs)* #vis #scen_sig {
            ::loadstat::scenario::Scenario::new(stringify!(#scen_name), #new_name)
        }

        #(#attrs)* #vis #new_sig {
            #(#stmts)*
        }
    })
}
