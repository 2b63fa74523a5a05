use crate::package::{Dep, Recipe};
use crate::variant::Variant;

/// A metapackage: the release archive bundles the assembled devtree of a
/// complete cross toolchain for `arm-none-eabi`.
pub struct ArmToolchain;

impl Recipe for ArmToolchain {
    fn pkg_name(&self) -> &'static str {
        "arm-toolchain"
    }

    fn group_only(&self) -> bool {
        true
    }

    fn deps(&self, _variant: &Variant) -> Vec<Dep> {
        let target = Variant::new([("target", "arm-none-eabi")]);
        vec![
            Dep::Qualified("gcc".to_string(), target.clone()),
            Dep::Qualified("binutils".to_string(), target.clone()),
            Dep::Qualified("gdb".to_string(), target),
        ]
    }
}
