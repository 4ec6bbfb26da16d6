use fxhash::FxHashSet;
use proc_macro2::{Group, TokenStream, TokenTree};
use quote::{ToTokens, format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, FieldsNamed, GenericArgument, Ident, Meta,
    PathArguments, Type, Variant,
};

const CONTEXT_HELPER: &str = "format_context";

/// One parsed enum variant.
struct ErrorVariant<'a> {
    ident: &'a Ident,
    source: Option<(&'a Ident, &'a Type)>,
    has_context: bool,
    cfg: Vec<Attribute>,
}

impl ErrorVariant<'_> {
    fn is_internal(&self) -> bool {
        self.ident == "Internal"
    }
}

/// Parsed `#[ksafe_error]` input.
struct ErrorEnum<'a> {
    name: &'a Ident,
    ext: Ident,
    variants: Vec<ErrorVariant<'a>>,
}

pub fn expand(input: DeriveInput) -> TokenStream {
    let parsed = match ErrorEnum::parse(&input) {
        Ok(parsed) => parsed,
        Err(err) => return err.to_compile_error(),
    };

    let derives = missing_derives(&input);
    let ext_trait = parsed.ext_trait();
    let source_impls = parsed.source_impls();
    let message_impls = parsed.message_impls();
    let helper = parsed.context_helper(&input);

    let mut output = input.clone();
    scope_error_attrs(&mut output);

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #output

        #helper
        #ext_trait
        #source_impls
        #message_impls
    }
}

/// Points `format_context(..)` in `#[error(..)]` arguments at the enum's own helper, so
/// several error enums can share a module.
fn scope_error_attrs(input: &mut DeriveInput) {
    let Data::Enum(data) = &mut input.data else { return };
    let attrs = input.attrs.iter_mut().chain(data.variants.iter_mut().flat_map(|v| v.attrs.iter_mut()));

    for attr in attrs.filter(|a| a.path().is_ident("error")) {
        if let Meta::List(list) = &mut attr.meta {
            list.tokens = qualify_helper(std::mem::take(&mut list.tokens));
        }
    }
}

fn qualify_helper(tokens: TokenStream) -> TokenStream {
    let mut out = TokenStream::new();
    let mut after_path_sep = false;

    for token in tokens {
        let is_colon = matches!(&token, TokenTree::Punct(p) if p.as_char() == ':');
        match token {
            TokenTree::Group(group) => {
                let mut scoped = Group::new(group.delimiter(), qualify_helper(group.stream()));
                scoped.set_span(group.span());
                out.extend([TokenTree::Group(scoped)]);
            },
            TokenTree::Ident(ident) if ident == CONTEXT_HELPER && !after_path_sep => {
                out.extend(quote! { Self:: });
                out.extend([TokenTree::Ident(ident)]);
            },
            other => out.extend([other]),
        }
        after_path_sep = is_colon;
    }

    out
}

impl<'a> ErrorEnum<'a> {
    fn parse(input: &'a DeriveInput) -> syn::Result<Self> {
        let Data::Enum(data) = &input.data else {
            return Err(syn::Error::new_spanned(&input.ident, "ksafe_error only applies to enums"));
        };

        let variants = data.variants.iter().map(parse_variant).collect::<syn::Result<Vec<_>>>()?;

        let mut seen_sources = FxHashSet::default();
        for variant in &variants {
            let Some((_, ty)) = variant.source else { continue };
            if !variant.has_context {
                return Err(syn::Error::new_spanned(
                    variant.ident,
                    "ksafe_error requires `context: Option<Cow<'static, str>>` next to a source",
                ));
            }
            if !seen_sources.insert(ty.to_token_stream().to_string()) {
                return Err(syn::Error::new_spanned(
                    ty,
                    "ksafe_error cannot wrap the same source type in two variants",
                ));
            }
        }

        Ok(Self { name: &input.ident, ext: format_ident!("{}Ext", input.ident), variants })
    }

    fn context_helper(&self, input: &DeriveInput) -> TokenStream {
        let name = self.name;
        let helper = format_ident!("{}", CONTEXT_HELPER);
        let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

        quote! {
            #[automatically_derived]
            impl #impl_generics #name #ty_generics #where_clause {
                #[doc(hidden)]
                #[allow(dead_code, clippy::ref_option)]
                fn #helper(context: &Option<::std::borrow::Cow<'static, str>>) -> ::std::borrow::Cow<'static, str> {
                    context.as_ref().map_or(::std::borrow::Cow::Borrowed(""), |c| ::std::borrow::Cow::Owned(format!(" ({c})")))
                }
            }
        }
    }

    fn ext_trait(&self) -> TokenStream {
        let Self { name, ext, .. } = self;
        let arms = self.variants.iter().filter(|v| v.has_context).map(|v| {
            let ident = v.ident;
            let cfg = &v.cfg;
            quote! { #(#cfg)* #name::#ident { context: slot, .. } => *slot = Some(context.into()), }
        });

        quote! {
            pub trait #ext<T> {
                fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> ::std::result::Result<T, #name>;
            }

            #[automatically_derived]
            impl<T> #ext<T> for ::std::result::Result<T, #name> {
                #[inline]
                fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> Self {
                    self.map_err(|mut err| {
                        match &mut err {
                            #(#arms)*
                            _ => {}
                        }
                        err
                    })
                }
            }
        }
    }

    fn source_impls(&self) -> TokenStream {
        let Self { name, ext, .. } = self;
        let impls = self.variants.iter().filter(|v| !v.is_internal()).filter_map(|v| {
            let (field, ty) = v.source?;
            let ident = v.ident;
            let cfg = &v.cfg;

            Some(quote! {
                #(#cfg)*
                #[automatically_derived]
                impl From<#ty> for #name {
                    #[inline]
                    fn from(#field: #ty) -> Self { Self::#ident { #field, context: None } }
                }

                #(#cfg)*
                impl<T> #ext<T> for ::std::result::Result<T, #ty> {
                    #[inline]
                    fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> ::std::result::Result<T, #name> {
                        self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
                    }
                }
            })
        });

        quote! { #(#impls)* }
    }

    fn message_impls(&self) -> TokenStream {
        let Some(internal) = self.variants.iter().find(|v| v.is_internal()) else {
            return TokenStream::new();
        };
        let name = self.name;
        let cfg = &internal.cfg;

        quote! {
            #(#cfg)*
            impl From<&'static str> for #name {
                #[inline]
                fn from(s: &'static str) -> Self {
                    Self::Internal { message: ::std::borrow::Cow::Borrowed(s), context: None }
                }
            }

            #(#cfg)*
            impl From<String> for #name {
                #[inline]
                fn from(s: String) -> Self {
                    Self::Internal { message: ::std::borrow::Cow::Owned(s), context: None }
                }
            }
        }
    }
}

fn parse_variant(variant: &Variant) -> syn::Result<ErrorVariant<'_>> {
    let Fields::Named(fields) = &variant.fields else {
        return Err(syn::Error::new_spanned(
            variant,
            "ksafe_error requires named fields for source/context handling",
        ));
    };

    let has_context = context_field(fields)?.is_some();
    let source = source_field(fields).and_then(|f| f.ident.as_ref().map(|ident| (ident, &f.ty)));
    let cfg = variant.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).cloned().collect();

    Ok(ErrorVariant { ident: &variant.ident, source, has_context, cfg })
}

fn context_field(fields: &FieldsNamed) -> syn::Result<Option<&Field>> {
    let Some(field) = fields.named.iter().find(|f| f.ident.as_ref().is_some_and(|i| i == "context"))
    else {
        return Ok(None);
    };

    if is_optional_static_cow(&field.ty) {
        Ok(Some(field))
    } else {
        Err(syn::Error::new_spanned(&field.ty, "context field must be Option<Cow<'static, str>>"))
    }
}

fn source_field(fields: &FieldsNamed) -> Option<&Field> {
    fields.named.iter().find(|field| {
        field.ident.as_ref().is_some_and(|ident| ident == "source")
            || field.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from"))
    })
}

fn missing_derives(input: &DeriveInput) -> TokenStream {
    let mut present = FxHashSet::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(last) = meta.path.segments.last() {
                present.insert(last.ident.to_string());
            }
            Ok(())
        });
    }

    let mut derives = Vec::new();
    if !present.contains("Debug") {
        derives.push(quote! { Debug });
    }
    if !present.contains("Error") {
        derives.push(quote! { ::thiserror::Error });
    }

    if derives.is_empty() { TokenStream::new() } else { quote! { #[derive(#(#derives),*)] } }
}

/// Matches `Option<Cow<'static, str>>` by its last path segments.
fn is_optional_static_cow(ty: &Type) -> bool {
    let Some(inner) = single_type_arg(ty, "Option") else {
        return false;
    };
    let Type::Path(path) = inner else {
        return false;
    };
    let Some(cow) = path.path.segments.last().filter(|s| s.ident == "Cow") else {
        return false;
    };
    let PathArguments::AngleBracketed(args) = &cow.arguments else {
        return false;
    };

    let mut args = args.args.iter();
    let lifetime_ok = matches!(args.next(), Some(GenericArgument::Lifetime(lt)) if lt.ident == "static");
    let str_ok = matches!(
        args.next(),
        Some(GenericArgument::Type(Type::Path(p)))
            if p.path.segments.last().is_some_and(|s| s.ident == "str")
    );

    lifetime_ok && str_ok && args.next().is_none()
}

fn single_type_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last().filter(|s| s.ident == wrapper)?;
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
