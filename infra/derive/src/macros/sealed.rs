use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr, Meta, Token};

pub fn expand(args: TokenStream, input: DeriveInput) -> TokenStream {
    match try_expand(args, input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn try_expand(args: TokenStream, input: DeriveInput) -> syn::Result<TokenStream> {
    let tag = parse_tag(args)?.unwrap_or_else(|| LitStr::new(&input.ident.to_string(), Span::call_site()));

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "sealed_model only supports structs"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "sealed_model only supports structs with named fields",
        ));
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let field_names = fields.named.iter().filter_map(|f| f.ident.as_ref()).map(ToString::to_string);

    Ok(quote! {
        #[derive(::ksafe_cipher::serde::Serialize, ::ksafe_cipher::serde::Deserialize)]
        #[serde(crate = "::ksafe_cipher::serde")]
        #input

        #[automatically_derived]
        impl #impl_generics ::ksafe_cipher::SealedModel for #name #ty_generics #where_clause {
            const TAG: &'static str = #tag;
        }

        #[automatically_derived]
        impl #impl_generics ::core::fmt::Debug for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                let mut out = f.debug_struct(stringify!(#name));
                #(out.field(#field_names, &"<sealed>");)*
                out.finish()
            }
        }
    })
}

fn parse_tag(args: TokenStream) -> syn::Result<Option<LitStr>> {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args)?;
    let mut tag = None;

    for meta in metas {
        let Meta::NameValue(pair) = meta else {
            return Err(syn::Error::new_spanned(meta, "expected `tag = \"...\"`"));
        };
        if !pair.path.is_ident("tag") {
            return Err(syn::Error::new_spanned(pair.path, "only `tag = \"...\"` is supported"));
        }
        if tag.is_some() {
            return Err(syn::Error::new_spanned(pair, "duplicate `tag` argument"));
        }
        let Expr::Lit(ExprLit { lit: Lit::Str(lit), .. }) = &pair.value else {
            return Err(syn::Error::new_spanned(&pair.value, "`tag` must be a string literal"));
        };
        tag = Some(lit.clone());
    }

    Ok(tag)
}
