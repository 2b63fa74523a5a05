/*!
The built-in recipe set. Each module holds one package's recipe; the engine
reaches them through [`crate::registry::Registry::standard`].
*/

pub mod arm_toolchain;
pub mod binutils;
pub mod expat;
pub mod gcc;
pub mod gdb;
pub mod glibc;
pub mod gmp;
pub mod mpc;
pub mod mpfr;
pub mod texinfo;

/// The cross-compilation targets the toolchain recipes support.
pub(crate) const SUPPORTED_TARGETS: &[&str] = &["arm-none-eabi"];
