use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{DeriveInput, LitStr, Result, Token, Type, parse::Parse, parse::ParseStream};

/// #[derive(Command)] 实现
pub(crate) fn expand(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match expand_impl(&input) {
        Ok(ts) => ts.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_impl(input: &DeriveInput) -> Result<proc_macro2::TokenStream> {
    let mut cfg = CommandAttrConfig::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("command")) {
        cfg.merge(attr.parse_args::<CommandAttrConfig>()?, attr.span())?;
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let output = cfg.output.unwrap_or_else(|| syn::parse_quote! { () });
    let name = cfg
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

    Ok(quote! {
        impl #impl_generics ::conduit::Command for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
            type Output = #output;
        }
    })
}

// -------- parsing --------

#[derive(Default)]
struct CommandAttrConfig {
    output: Option<Type>,
    name: Option<LitStr>,
}

impl CommandAttrConfig {
    // 允许拆分到多个 #[command(...)] 上，但同一键只能出现一次
    fn merge(&mut self, other: Self, span: proc_macro2::Span) -> Result<()> {
        if let Some(output) = other.output {
            if self.output.replace(output).is_some() {
                return Err(syn::Error::new(span, "duplicate key 'output' in attribute"));
            }
        }
        if let Some(name) = other.name {
            if self.name.replace(name).is_some() {
                return Err(syn::Error::new(span, "duplicate key 'name' in attribute"));
            }
        }
        Ok(())
    }
}

impl Parse for CommandAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = Self::default();
        let elems: Punctuated<CommandAttrElem, Token![,]> = Punctuated::parse_terminated(input)?;

        for elem in elems {
            match elem {
                CommandAttrElem::Output(ty) => {
                    if cfg.output.is_some() {
                        return Err(syn::Error::new(ty.span(), "duplicate key 'output' in attribute"));
                    }
                    cfg.output = Some(ty);
                }
                CommandAttrElem::Name(lit) => {
                    if cfg.name.is_some() {
                        return Err(syn::Error::new(lit.span(), "duplicate key 'name' in attribute"));
                    }
                    cfg.name = Some(lit);
                }
            }
        }
        Ok(cfg)
    }
}

enum CommandAttrElem {
    Output(Type),
    Name(LitStr),
}

impl Parse for CommandAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;

        if key == "output" {
            Ok(Self::Output(input.parse()?))
        } else if key == "name" {
            Ok(Self::Name(input.parse()?))
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'output' or 'name'",
            ))
        }
    }
}
