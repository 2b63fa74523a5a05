/*!
A variant is a named parameterisation of a package recipe, e.g. the target
triple of a cross toolchain. Recipes declare which keys they accept and the
values each key may take; instantiating a package with anything else is a
usage error caught before any filesystem side effect.
*/

use crate::error::{self, Result};
use snafu::ensure;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// A frozen variant-key to variant-value mapping. The ordering of a
/// `BTreeMap` gives variant names and config keys a deterministic layout.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Variant {
    values: BTreeMap<String, String>,
}

impl Variant {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<K, V, I>(values: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a `key:value,key:value` assignment list, as accepted by the
    /// command line.
    pub fn parse(assignments: &str) -> Result<Self> {
        let mut values = BTreeMap::new();
        for assignment in assignments.split(',') {
            if assignment.is_empty() {
                continue;
            }
            match assignment.split_once(':') {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                    values.insert(key.to_string(), value.to_string());
                }
                _ => {
                    return error::VariantAssignmentSnafu { assignment }.fail();
                }
            }
        }
        Ok(Self { values })
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

/// The variant keys a recipe accepts and the values each key allows.
#[derive(Debug, Clone, Default)]
pub struct VariantSchema {
    allowed: BTreeMap<String, Vec<String>>,
}

impl VariantSchema {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<I, K, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|(k, vs)| (k.into(), vs.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Check a variant against this schema: every declared key must be
    /// present with an allowed value, and no undeclared key may appear.
    pub fn validate(&self, pkg_name: &str, variant: &Variant) -> Result<()> {
        for (key, value) in variant.iter() {
            let allowed = match self.allowed.get(key) {
                Some(allowed) => allowed,
                None => {
                    return error::UnknownVariantKeySnafu { pkg_name, key }.fail();
                }
            };
            ensure!(
                allowed.iter().any(|a| a == value),
                error::UnknownVariantValueSnafu {
                    pkg_name,
                    key,
                    value,
                    allowed: allowed.clone(),
                }
            );
        }
        for key in self.allowed.keys() {
            ensure!(
                variant.get(key).is_some(),
                error::MissingVariantKeySnafu { pkg_name, key }
            );
        }
        Ok(())
    }
}

/// The unique name of a buildable unit: `<pkg>[-<k>_<v>...]-<host>` with
/// variant keys in sorted order. Used as the basename of the per-variant
/// build, devtree, install and release paths.
pub fn variant_name(pkg_name: &str, variant: &Variant, host: &str) -> String {
    let mut name = String::from(pkg_name);
    for (key, value) in variant.iter() {
        name.push_str(&format!("-{}_{}", key, value));
    }
    name.push('-');
    name.push_str(host);
    name
}

#[cfg(test)]
mod test {
    use super::*;

    const HOST: &str = "x86_64-unknown-linux-gnu";

    #[test]
    fn name_without_variant() {
        assert_eq!(
            variant_name("texinfo", &Variant::empty(), HOST),
            "texinfo-x86_64-unknown-linux-gnu"
        );
    }

    #[test]
    fn name_with_variant() {
        let variant = Variant::new([("target", "arm-none-eabi")]);
        assert_eq!(
            variant_name("binutils", &variant, HOST),
            "binutils-target_arm-none-eabi-x86_64-unknown-linux-gnu"
        );
    }

    #[test]
    fn name_sorts_variant_keys() {
        let variant = Variant::new([("zeta", "1"), ("alpha", "2")]);
        assert_eq!(
            variant_name("pkg", &variant, HOST),
            "pkg-alpha_2-zeta_1-x86_64-unknown-linux-gnu"
        );
    }

    #[test]
    fn schema_accepts_declared_value() {
        let schema = VariantSchema::new([("target", vec!["arm-none-eabi"])]);
        let variant = Variant::new([("target", "arm-none-eabi")]);
        schema.validate("binutils", &variant).unwrap();
    }

    #[test]
    fn schema_rejects_unknown_value() {
        let schema = VariantSchema::new([("target", vec!["arm-none-eabi"])]);
        let variant = Variant::new([("target", "x86_64-linux")]);
        let result = schema.validate("binutils", &variant);
        assert!(matches!(
            result,
            Err(crate::Error::UnknownVariantValue { .. })
        ));
    }

    #[test]
    fn schema_rejects_unknown_key() {
        let schema = VariantSchema::empty();
        let variant = Variant::new([("target", "arm-none-eabi")]);
        let result = schema.validate("texinfo", &variant);
        assert!(matches!(result, Err(crate::Error::UnknownVariantKey { .. })));
    }

    #[test]
    fn schema_rejects_missing_key() {
        let schema = VariantSchema::new([("target", vec!["arm-none-eabi"])]);
        let result = schema.validate("binutils", &Variant::empty());
        assert!(matches!(result, Err(crate::Error::MissingVariantKey { .. })));
    }

    #[test]
    fn parse_assignments() {
        let variant = Variant::parse("target:arm-none-eabi").unwrap();
        assert_eq!(variant.get("target"), Some("arm-none-eabi"));
        assert!(Variant::parse("").unwrap().is_empty());
        assert!(Variant::parse("oops").is_err());
    }
}
