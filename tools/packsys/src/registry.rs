/*!
The recipe registry.

Recipes are registered at compile time as factories keyed by package name.
The standard registry carries the built-in recipe set; tests (and embedders)
can assemble their own. Loading checks that the recipe's declared name
matches the name it was registered under, so a copy-pasted recipe cannot
quietly answer for the wrong package.
*/

use crate::error::{self, Result};
use crate::package::Recipe;
use crate::recipes;
use snafu::ensure;
use std::collections::BTreeMap;

type Factory = fn() -> Box<dyn Recipe>;

#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in recipe set.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("arm-toolchain", || Box::new(recipes::arm_toolchain::ArmToolchain));
        registry.register("binutils", || Box::new(recipes::binutils::Binutils));
        registry.register("expat", || Box::new(recipes::expat::Expat));
        registry.register("gcc", || Box::new(recipes::gcc::Gcc));
        registry.register("gdb", || Box::new(recipes::gdb::Gdb));
        registry.register("glibc", || Box::new(recipes::glibc::Glibc));
        registry.register("gmp", || Box::new(recipes::gmp::Gmp));
        registry.register("mpc", || Box::new(recipes::mpc::Mpc));
        registry.register("mpfr", || Box::new(recipes::mpfr::Mpfr));
        registry.register("texinfo", || Box::new(recipes::texinfo::Texinfo));
        registry
    }

    pub fn register<S: Into<String>>(&mut self, pkg_name: S, factory: Factory) {
        self.factories.insert(pkg_name.into(), factory);
    }

    /// Instantiate the recipe registered for `pkg_name`.
    pub fn load(&self, pkg_name: &str) -> Result<Box<dyn Recipe>> {
        let factory = self
            .factories
            .get(pkg_name)
            .ok_or_else(|| error::UnknownPackageSnafu { pkg_name }.build())?;
        let recipe = factory();
        ensure!(
            recipe.pkg_name() == pkg_name,
            error::RecipeNameMismatchSnafu {
                requested: pkg_name,
                actual: recipe.pkg_name(),
            }
        );
        Ok(recipe)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::package::Ctx;

    #[test]
    fn standard_recipes_resolve() {
        let registry = Registry::standard();
        for name in ["texinfo", "gmp", "mpfr", "binutils", "gcc", "arm-toolchain"] {
            let recipe = registry.load(name).unwrap();
            assert_eq!(recipe.pkg_name(), name);
        }
    }

    #[test]
    fn unknown_package() {
        let registry = Registry::standard();
        let result = registry.load("no-such-package");
        assert!(matches!(result, Err(crate::Error::UnknownPackage { .. })));
    }

    #[test]
    fn name_mismatch_is_caught() {
        struct Imposter;
        impl crate::package::Recipe for Imposter {
            fn pkg_name(&self) -> &'static str {
                "imposter"
            }
            fn configure(&self, _ctx: &Ctx) -> crate::Result<()> {
                Ok(())
            }
        }

        let mut registry = Registry::new();
        registry.register("texinfo", || Box::new(Imposter));
        let result = registry.load("texinfo");
        assert!(matches!(
            result,
            Err(crate::Error::RecipeNameMismatch { .. })
        ));
    }
}
