use proc_macro::TokenStream;
use quote::{format_ident, quote};

use syn::meta::ParseNestedMeta;
use syn::parse::Parse as _;
use syn::spanned::Spanned as _;
use syn::{
    Attribute, Data, DeriveInput, Error, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, Pat,
    PathArguments, ReturnType, Token, Type,
};

const INJECT_ATTR: &str = "inject";
const NAMED_ATTR: &str = "named";
const ANNOTATED_ATTR: &str = "annotated";

/// Options shared by `#[inject(...)]` on structs and `#[injectable(...)]`.
#[derive(Default)]
struct Options {
    singleton: bool,
    implements: Vec<Type>,
}

impl Options {
    fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("singleton") {
            self.singleton = true;
            Ok(())
        } else if meta.path.is_ident("implements") {
            let content;
            syn::parenthesized!(content in meta.input);
            self.implements
                .extend(content.parse_terminated(Type::parse, Token![,])?);
            Ok(())
        } else {
            Err(meta.error("expected `singleton` or `implements(...)`"))
        }
    }

    fn expand(&self, self_ty: &Type) -> (proc_macro2::TokenStream, proc_macro2::TokenStream) {
        let scope = if self.singleton {
            quote! {
                fn scope() -> ::syringe::Scope {
                    ::syringe::Scope::Singleton
                }
            }
        } else {
            quote! {}
        };
        let interfaces = &self.implements;
        let implements = quote! {
            #(::syringe::implements!(#self_ty => #interfaces);)*
        };
        (scope, implements)
    }
}

fn is_inject_attr(attr: &Attribute) -> bool {
    attr.path().is_ident(INJECT_ATTR)
}

fn is_qualifier_attr(attr: &Attribute) -> bool {
    attr.path().is_ident(NAMED_ATTR) || attr.path().is_ident(ANNOTATED_ATTR)
}

/// Builds the qualifier expression declared on a field or parameter.
fn extract_qualifier(attrs: &[Attribute]) -> syn::Result<proc_macro2::TokenStream> {
    let mut qualifier = None;
    for attr in attrs {
        let expr = if attr.path().is_ident(NAMED_ATTR) {
            let name = attr.parse_args::<LitStr>()?;
            quote! { ::syringe::Qualifier::named(#name) }
        } else if attr.path().is_ident(ANNOTATED_ATTR) {
            let marker = attr.parse_args::<Type>()?;
            quote! { ::syringe::Qualifier::annotated::<#marker>() }
        } else {
            continue;
        };
        if qualifier.is_some() {
            return Err(Error::new(attr.span(), "Only one qualifier allowed"));
        }
        qualifier = Some(expr);
    }
    Ok(match qualifier {
        Some(expr) => quote! { ::core::option::Option::Some(#expr) },
        None => quote! { ::core::option::Option::None },
    })
}

fn is_result_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Result"
        && let PathArguments::AngleBracketed(_) = &segment.arguments
    {
        return true;
    }
    false
}

/// Derive macro for the Injectable trait.
///
/// Fields marked with `#[inject]` (or a qualifier) are resolved from the
/// injector, other fields are initialized with `Default::default()`.
#[proc_macro_derive(Injectable, attributes(inject, named, annotated))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match handle_derive_injectable(input) {
        Ok(v) => v.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Attribute macro for impl blocks with injectable constructors and setters.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut options = Options::default();
    let parser = syn::meta::parser(|meta| options.parse(meta));
    syn::parse_macro_input!(attr with parser);
    if let Ok(item_impl) = syn::parse::<ItemImpl>(item) {
        return match handle_injectable_impl(item_impl, options) {
            Ok(v) => v.into(),
            Err(err) => err.to_compile_error().into(),
        };
    }
    TokenStream::from(
        Error::new(
            proc_macro2::Span::call_site(),
            "#[injectable] can only be applied to impl blocks",
        )
        .to_compile_error(),
    )
}

fn handle_derive_injectable(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(s) => &s.fields,
        _ => return Err(Error::new(name.span(), "Only structs are supported")),
    };
    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Generic structs are not supported",
        ));
    }

    let mut options = Options::default();
    for attr in &input.attrs {
        if is_inject_attr(attr) {
            attr.parse_nested_meta(|meta| options.parse(meta))?;
        }
    }

    let mut field_lets = Vec::new();
    let mut field_inits = Vec::new();
    let mut injected = false;

    match fields {
        syn::Fields::Named(fields) => {
            for field in &fields.named {
                let field_ident = field.ident.as_ref().unwrap();
                let field_ty = &field.ty;
                let marked = field
                    .attrs
                    .iter()
                    .any(|attr| is_inject_attr(attr) || is_qualifier_attr(attr));
                if marked {
                    let qualifier = extract_qualifier(&field.attrs)?;
                    field_lets.push(quote! {
                        let #field_ident = <#field_ty as ::syringe::Dependency>::resolve(
                            __resolver,
                            #qualifier,
                        )?;
                    });
                    injected = true;
                } else {
                    field_lets.push(quote! {
                        let #field_ident = ::core::default::Default::default();
                    });
                }
                field_inits.push(quote! { #field_ident });
            }
        }
        syn::Fields::Unnamed(_) => {
            return Err(Error::new(name.span(), "Tuple structs are not supported"));
        }
        syn::Fields::Unit => {}
    }

    let init = match fields {
        syn::Fields::Unit => quote! { Self },
        _ => quote! { Self { #(#field_inits,)* } },
    };
    let plan = if injected {
        quote! {
            ::syringe::InjectionPlan::new().fields(|__resolver| {
                #(#field_lets)*
                ::core::result::Result::Ok(#init)
            })
        }
    } else {
        quote! {
            ::syringe::InjectionPlan::new().default_constructor(|| {
                #(#field_lets)*
                #init
            })
        }
    };

    let self_ty: Type = syn::parse_quote! { #name };
    let (scope, implements) = options.expand(&self_ty);

    Ok(quote! {
        impl ::syringe::Injectable for #name {
            fn constructor() -> ::core::option::Option<::syringe::Constructor<Self>> {
                ::core::option::Option::Some(#plan.into())
            }

            #scope
        }

        #implements
    })
}

/// Resolution statements and argument names of an injected method.
struct InjectedArgs {
    lets: Vec<proc_macro2::TokenStream>,
    names: Vec<proc_macro2::TokenStream>,
}

fn extract_injected_args(method: &ImplItemFn) -> syn::Result<InjectedArgs> {
    let mut lets = Vec::new();
    let mut names = Vec::new();
    for (index, fn_arg) in method.sig.inputs.iter().enumerate() {
        let FnArg::Typed(pat_type) = fn_arg else {
            continue;
        };
        let arg_ty = &pat_type.ty;
        if let Type::Reference(_) = arg_ty.as_ref() {
            return Err(Error::new(
                arg_ty.span(),
                "Injected arguments must be owned values",
            ));
        }
        let arg_name = match pat_type.pat.as_ref() {
            Pat::Ident(_) => format_ident!("__arg{index}"),
            _ => {
                return Err(Error::new(
                    pat_type.pat.span(),
                    "Only simple bindings supported",
                ));
            }
        };
        let qualifier = extract_qualifier(&pat_type.attrs)?;
        lets.push(quote! {
            let #arg_name = <#arg_ty as ::syringe::Dependency>::resolve(__resolver, #qualifier)?;
        });
        names.push(quote! { #arg_name });
    }
    Ok(InjectedArgs { lets, names })
}

fn handle_injectable_impl(
    input: ItemImpl,
    options: Options,
) -> syn::Result<proc_macro2::TokenStream> {
    if input.trait_.is_some() {
        return Err(Error::new(input.span(), "Trait impls are not supported"));
    }

    let self_ty = input.self_ty.as_ref();
    let mut constructors = Vec::new();
    let mut setters = Vec::new();

    for item in &input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        if !method.attrs.iter().any(is_inject_attr) {
            continue;
        }
        if method.sig.asyncness.is_some() {
            return Err(Error::new(
                method.sig.span(),
                "Injected methods cannot be async",
            ));
        }
        let method_name = &method.sig.ident;
        let point_name = method_name.to_string();
        let InjectedArgs { lets, names } = extract_injected_args(method)?;
        let resolver = if lets.is_empty() {
            quote! { _ }
        } else {
            quote! { __resolver }
        };
        let is_result = match &method.sig.output {
            ReturnType::Default => false,
            ReturnType::Type(_, ty) => is_result_type(ty),
        };

        match method.sig.receiver() {
            None => {
                if let ReturnType::Default = method.sig.output {
                    return Err(Error::new(
                        method.sig.span(),
                        "Injected constructors must return Self",
                    ));
                }
                let call = if is_result {
                    quote! {
                        Self::#method_name(#(#names),*)
                            .map_err(|err| ::syringe::InjectError::provision::<Self>(err))
                    }
                } else {
                    quote! { ::core::result::Result::Ok(Self::#method_name(#(#names),*)) }
                };
                constructors.push(quote! {
                    .constructor(#point_name, |#resolver| {
                        #(#lets)*
                        #call
                    })
                });
            }
            Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_some() => {
                let call = if is_result {
                    quote! {
                        __this
                            .#method_name(#(#names),*)
                            .map_err(|err| ::syringe::InjectError::provision::<Self>(err))
                    }
                } else {
                    quote! {
                        __this.#method_name(#(#names),*);
                        ::core::result::Result::Ok(())
                    }
                };
                setters.push(quote! {
                    .setter(#point_name, |__this, #resolver| {
                        #(#lets)*
                        #call
                    })
                });
            }
            Some(receiver) => {
                return Err(Error::new(
                    receiver.span(),
                    "Injected methods must take &mut self",
                ));
            }
        }
    }

    let fallback = if constructors.is_empty() {
        quote! { .default_constructor(<Self as ::core::default::Default>::default) }
    } else {
        quote! {}
    };

    // Strip injection attributes, they are not valid outside of the macro.
    let mut cleaned_input = input.clone();
    for item in &mut cleaned_input.items {
        if let ImplItem::Fn(method) = item {
            method.attrs.retain(|attr| !is_inject_attr(attr));
            for fn_arg in &mut method.sig.inputs {
                if let FnArg::Typed(pat_type) = fn_arg {
                    pat_type.attrs.retain(|attr| !is_qualifier_attr(attr));
                }
            }
        }
    }

    let (scope, implements) = options.expand(self_ty);

    Ok(quote! {
        #cleaned_input

        impl ::syringe::Injectable for #self_ty {
            fn constructor() -> ::core::option::Option<::syringe::Constructor<Self>> {
                ::core::option::Option::Some(
                    ::syringe::InjectionPlan::new()
                        #(#constructors)*
                        #fallback
                        #(#setters)*
                        .into(),
                )
            }

            #scope
        }

        #implements
    })
}
