//! Proc macros for `vjson`.
//!
//! Provides **`#[derive(Shape)]`**, which generates the `vjson::Shape`
//! implementation for a struct: its name, its field list, and by-index field
//! access used to copy fields between versions.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    parse_macro_input, punctuated::Punctuated, token::Comma, Attribute, Data, DeriveInput, Index,
    Member, Meta,
};

/// Derive macro that implements `vjson::Shape` for a struct.
///
/// Every field type must implement `Clone` and be `'static`. Type
/// parameters get a `Clone + 'static` bound added to the impl.
///
/// # Field Attributes
///
/// - `#[vjson(from = "name")]`: copy this field from the field `name` of the
///   previous version instead of from the field with the same name.
/// - `#[vjson(from = "")]` or `#[vjson(skip)]`: never copy this field from
///   the previous version; it starts at its default value, ready to be set by
///   an `Upgrade` hook.
///
/// Attributes only affect copies between adjacent versions, never JSON keys.
///
/// # Example
///
/// ```ignore
/// use vjson::Shape;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Shape, Default, Serialize, Deserialize)]
/// struct UserV2 {
///     id: i64,
///     #[vjson(from = "name")]
///     user_name: String,
///     #[vjson(from = "name")]
///     display_name: String,
/// }
/// ```
#[proc_macro_derive(Shape, attributes(vjson))]
pub fn derive_shape(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand_shape(&input) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_shape(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let data = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "vjson: only structs are allowed",
            ));
        }
    };

    if let Some(attr) = input.attrs.iter().find(|a| a.path().is_ident("vjson")) {
        return Err(syn::Error::new_spanned(
            attr,
            "vjson attributes belong on fields",
        ));
    }

    let mut descriptors = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();

    for (index, field) in data.fields.iter().enumerate() {
        let (name, member) = match &field.ident {
            Some(ident) => (ident.unraw().to_string(), Member::Named(ident.clone())),
            None => (index.to_string(), Member::Unnamed(Index::from(index))),
        };
        let ty = &field.ty;
        let source = field_source(&field.attrs)?;

        descriptors.push(quote! {
            ::vjson::Field::new::<#ty>(#name, #source)
        });
        getters.push(quote! {
            #index => ::core::option::Option::Some(&self.#member as &dyn ::core::any::Any)
        });
        setters.push(quote! {
            #index => match value.downcast_ref::<#ty>() {
                ::core::option::Option::Some(value) => {
                    self.#member = ::core::clone::Clone::clone(value);
                    true
                }
                ::core::option::Option::None => false,
            }
        });
    }

    let struct_name = &input.ident;
    let name = struct_name.unraw().to_string();
    // Field values are cloned and downcast through `Any`.
    let mut generics = input.generics.clone();
    let params: Vec<_> = generics.type_params().map(|p| p.ident.clone()).collect();
    let bounds = generics.make_where_clause();
    for param in &params {
        bounds
            .predicates
            .push(syn::parse_quote!(#param: ::core::clone::Clone + 'static));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::vjson::Shape for #struct_name #ty_generics #where_clause {
            const NAME: &'static str = #name;

            fn fields() -> ::std::vec::Vec<::vjson::Field> {
                ::std::vec![#(#descriptors),*]
            }

            #[allow(unused_variables)]
            fn field(&self, index: usize) -> ::core::option::Option<&dyn ::core::any::Any> {
                match index {
                    #(#getters,)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_field(&mut self, index: usize, value: &dyn ::core::any::Any) -> bool {
                match index {
                    #(#setters,)*
                    _ => false,
                }
            }
        }
    })
}

/// Read the `#[vjson(...)]` attributes of one field.
fn field_source(attrs: &[Attribute]) -> syn::Result<TokenStream2> {
    let mut source: Option<TokenStream2> = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("vjson")) {
        let args = attr.parse_args_with(Punctuated::<Meta, Comma>::parse_terminated)?;
        for meta in &args {
            let parsed = match meta {
                Meta::Path(path) if path.is_ident("skip") => quote!(::vjson::Source::Skip),
                Meta::NameValue(nv) if nv.path.is_ident("from") => {
                    let lit = match &nv.value {
                        syn::Expr::Lit(syn::ExprLit {
                            lit: syn::Lit::Str(lit),
                            ..
                        }) => lit,
                        other => {
                            return Err(syn::Error::new_spanned(
                                other,
                                "`from` expects a string literal",
                            ));
                        }
                    };
                    if lit.value().is_empty() {
                        quote!(::vjson::Source::Skip)
                    } else {
                        quote!(::vjson::Source::Renamed(#lit))
                    }
                }
                _ => {
                    let key = meta
                        .path()
                        .get_ident()
                        .map(|i| i.to_string())
                        .unwrap_or_default();
                    return Err(syn::Error::new_spanned(
                        meta,
                        format!("unknown attribute `{key}`"),
                    ));
                }
            };

            if source.is_some() {
                return Err(syn::Error::new_spanned(
                    meta,
                    "a field takes at most one of `from` and `skip`",
                ));
            }
            source = Some(parsed);
        }
    }

    Ok(source.unwrap_or_else(|| quote!(::vjson::Source::Same)))
}
