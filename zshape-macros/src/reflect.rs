use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{ext::IdentExt, parse_quote, Data, DeriveInput, Error, Fields, Generics, Ident, Type};

use crate::utils::{ContainerAttrs, FieldAttrs};

/// Main entry point for the Reflect derive macro.
pub(crate) fn derive_reflect(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match derive_reflect_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct MappedField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    property: String,
}

fn derive_reflect_impl(input: DeriveInput) -> Result<TokenStream2, Error> {
    let name = &input.ident;
    let attrs = ContainerAttrs::parse(&input.attrs)?;
    let crate_path = attrs.crate_path();

    let fields = match &input.data {
        Data::Struct(data_struct) => mapped_fields(&data_struct.fields, &attrs)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Reflect derive macro only supports structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Reflect derive macro only supports structs, not unions",
            ));
        }
    };

    let type_name = attrs.rename.clone().unwrap_or_else(|| name.to_string());
    let namespace = match &attrs.namespace {
        Some(namespace) => quote! { #namespace },
        None => quote! { ::core::module_path!() },
    };
    let anonymous = attrs.anonymous.then(|| quote! { .anonymous() });
    let type_params: Vec<_> = input.generics.type_params().map(|p| &p.ident).collect();
    let generic_arguments = (!type_params.is_empty()).then(|| {
        quote! {
            .with_generic_arguments(::std::vec![
                #(#crate_path::NativeTypeRef::of::<#type_params>()),*
            ])
        }
    });

    let properties = fields.iter().map(|f| &f.property).collect::<Vec<_>>();
    let idents = fields.iter().map(|f| f.ident).collect::<Vec<_>>();
    let types = fields.iter().map(|f| f.ty).collect::<Vec<_>>();

    let reflect_generics = bounded(&input.generics, &[quote! { #crate_path::Reflect }]);
    let (impl_generics, ty_generics, where_clause) = reflect_generics.split_for_impl();
    let reflect_impl = quote! {
        impl #impl_generics #crate_path::Reflect for #name #ty_generics #where_clause {
            fn native_type() -> #crate_path::NativeType {
                #crate_path::NativeType::record::<Self>(#type_name)
                    .with_namespace(#namespace)
                    #generic_arguments
                    .with_properties(::std::vec![
                        #(#crate_path::NativeProperty::new(
                            #properties,
                            #crate_path::NativeTypeRef::of::<#types>(),
                        )),*
                    ])
                    #anonymous
            }

            fn runtime_type(&self) -> #crate_path::NativeType {
                <Self as #crate_path::Reflect>::native_type()
            }

            fn reflect(&self) -> #crate_path::Reflected<'_> {
                #crate_path::Reflected::Record(::std::vec![
                    #((
                        ::std::borrow::Cow::Borrowed(#properties),
                        &self.#idents as &dyn #crate_path::Reflect,
                    )),*
                ])
            }
        }
    };

    let mut record_generics = bounded(
        &input.generics,
        &[
            quote! { #crate_path::Reflect },
            quote! { #crate_path::FromDynamic },
        ],
    );
    record_generics
        .make_where_clause()
        .predicates
        .push(parse_quote! { Self: ::core::default::Default });
    let (impl_generics, ty_generics, where_clause) = record_generics.split_for_impl();
    let set_property = if fields.is_empty() {
        quote! {
            let _ = (name, value, cx);
            ::core::result::Result::Ok(false)
        }
    } else {
        quote! {
            match name {
                #(#properties => {
                    self.#idents = #crate_path::FromDynamic::from_dynamic(value, cx)?;
                })*
                _ => return ::core::result::Result::Ok(false),
            }

            ::core::result::Result::Ok(true)
        }
    };
    let record_impls = quote! {
        impl #impl_generics #crate_path::FromDynamic for #name #ty_generics #where_clause {
            fn from_dynamic(
                value: &#crate_path::Value,
                cx: &mut #crate_path::MapContext<'_>,
            ) -> #crate_path::Result<Self> {
                cx.record(value)
            }

            fn from_dynamic_value(
                value: &#crate_path::DynamicValue,
                cx: &mut #crate_path::MapContext<'_>,
            ) -> #crate_path::Result<Self> {
                cx.record_from(value)
            }
        }

        impl #impl_generics #crate_path::Record for #name #ty_generics #where_clause {
            fn set_property(
                &mut self,
                name: &str,
                value: &#crate_path::Value,
                cx: &mut #crate_path::MapContext<'_>,
            ) -> #crate_path::Result<bool> {
                #set_property
            }
        }
    };

    Ok(quote! {
        #reflect_impl
        #record_impls
    })
}

fn mapped_fields<'a>(
    fields: &'a Fields,
    attrs: &ContainerAttrs,
) -> Result<Vec<MappedField<'a>>, Error> {
    let named = match fields {
        Fields::Named(named) => &named.named,
        Fields::Unnamed(unnamed) => {
            return Err(Error::new_spanned(
                unnamed,
                "Only named fields are supported: properties need names",
            ));
        }
        Fields::Unit => return Ok(Vec::new()),
    };

    let mut mapped = Vec::with_capacity(named.len());
    for field in named {
        let field_attrs = FieldAttrs::parse(&field.attrs)?;
        if field_attrs.skip {
            continue;
        }
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;
        let field_name = ident.unraw().to_string();
        let property = match (field_attrs.rename, attrs.rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rule.apply(&field_name),
            (None, None) => field_name,
        };
        if mapped.iter().any(|m: &MappedField<'_>| m.property == property) {
            return Err(Error::new_spanned(
                field,
                format!("duplicate property name `{property}`"),
            ));
        }

        mapped.push(MappedField {
            ident,
            ty: &field.ty,
            property,
        });
    }

    Ok(mapped)
}

/// `generics` with `bounds` added to every type parameter.
fn bounded(generics: &Generics, bounds: &[TokenStream2]) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        for bound in bounds {
            param.bounds.push(parse_quote! { #bound });
        }
    }

    generics
}
