use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, Result, Token, parse::Parse, parse::ParseStream};

/// #[derive(Notification)] 实现
pub(crate) fn expand(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match expand_impl(&input) {
        Ok(ts) => ts.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_impl(input: &DeriveInput) -> Result<proc_macro2::TokenStream> {
    let mut name: Option<LitStr> = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("notification")) {
        let parsed: NotificationAttrConfig = attr.parse_args()?;
        if name.replace(parsed.name).is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate key 'name' in attribute"));
        }
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let name = name.unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

    Ok(quote! {
        impl #impl_generics ::conduit::Notification for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
        }
    })
}

// -------- parsing --------

struct NotificationAttrConfig {
    name: LitStr,
}

impl Parse for NotificationAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key != "name" {
            return Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'name'",
            ));
        }
        let _eq: Token![=] = input.parse()?;
        let name: LitStr = input.parse()?;
        let _ = input.parse::<Option<Token![,]>>()?;
        Ok(Self { name })
    }
}
