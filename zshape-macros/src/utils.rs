use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Error, LitStr};

/// Container attributes: `#[zshape(crate = "...", rename = "...", ...)]` on the struct.
#[derive(Default)]
pub(crate) struct ContainerAttrs {
    pub(crate) crate_path: Option<TokenStream2>,
    pub(crate) rename: Option<String>,
    pub(crate) rename_all: Option<RenameRule>,
    pub(crate) namespace: Option<String>,
    pub(crate) anonymous: bool,
}

impl ContainerAttrs {
    pub(crate) fn parse(attrs: &[Attribute]) -> Result<Self, Error> {
        let mut parsed = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("zshape")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    let lit: LitStr = meta.value()?.parse()?;
                    parsed.crate_path = Some(syn::parse_str(&lit.value())?);
                } else if meta.path.is_ident("rename") {
                    let lit: LitStr = meta.value()?.parse()?;
                    parsed.rename = Some(lit.value());
                } else if meta.path.is_ident("rename_all") {
                    let lit: LitStr = meta.value()?.parse()?;
                    parsed.rename_all = Some(RenameRule::parse(&lit)?);
                } else if meta.path.is_ident("namespace") {
                    let lit: LitStr = meta.value()?.parse()?;
                    parsed.namespace = Some(lit.value());
                } else if meta.path.is_ident("anonymous") {
                    parsed.anonymous = true;
                } else {
                    return Err(meta.error("unknown zshape container attribute"));
                }
                Ok(())
            })?;
        }

        Ok(parsed)
    }

    /// The path to the zshape crate, defaulting to `::zshape`.
    pub(crate) fn crate_path(&self) -> TokenStream2 {
        match &self.crate_path {
            Some(path) => path.clone(),
            None => quote! { ::zshape },
        }
    }
}

/// Field attributes: `#[zshape(rename = "...")]` or `#[zshape(skip)]`.
#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub(crate) rename: Option<String>,
    pub(crate) skip: bool,
}

impl FieldAttrs {
    pub(crate) fn parse(attrs: &[Attribute]) -> Result<Self, Error> {
        let mut parsed = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("zshape")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let lit: LitStr = meta.value()?.parse()?;
                    parsed.rename = Some(lit.value());
                } else if meta.path.is_ident("skip") {
                    parsed.skip = true;
                } else {
                    return Err(meta.error("unknown zshape field attribute"));
                }
                Ok(())
            })?;
        }

        Ok(parsed)
    }
}

/// How field names turn into property names.
#[derive(Clone, Copy)]
pub(crate) enum RenameRule {
    PascalCase,
    CamelCase,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> Result<Self, Error> {
        match lit.value().as_str() {
            "PascalCase" => Ok(RenameRule::PascalCase),
            "camelCase" => Ok(RenameRule::CamelCase),
            _ => Err(Error::new_spanned(
                lit,
                "expected `PascalCase` or `camelCase`",
            )),
        }
    }

    /// Apply the rule to a snake_case field name.
    pub(crate) fn apply(self, field: &str) -> String {
        let mut out = String::with_capacity(field.len());
        let mut upper = matches!(self, RenameRule::PascalCase);

        for c in field.chars() {
            if c == '_' {
                upper = !out.is_empty();
            } else if upper {
                out.extend(c.to_uppercase());
                upper = false;
            } else {
                out.push(c);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_rules() {
        assert_eq!(RenameRule::PascalCase.apply("unit_price"), "UnitPrice");
        assert_eq!(RenameRule::PascalCase.apply("id"), "Id");
        assert_eq!(RenameRule::CamelCase.apply("unit_price"), "unitPrice");
        assert_eq!(RenameRule::CamelCase.apply("_private"), "private");
    }
}
