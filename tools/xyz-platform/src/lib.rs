/*!
This library provides a structure for representing a platform triple of the
form `<arch>-<vendor>-<os>`, as used for the build, host and target platforms
of a package build.
*/

use error::Error;
use serde::de::Error as SerdeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::ensure;
use std::borrow::Borrow;
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;

pub type Result<T> = std::result::Result<T, error::Error>;

pub mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(super)))]
    pub enum Error {
        #[snafu(display("The '{}' segment of the triple '{}' is missing", part_name, triple))]
        TriplePart { part_name: String, triple: String },

        #[snafu(display("The '{}' segment of the triple '{}' is empty", part_name, triple))]
        TriplePartEmpty { part_name: String, triple: String },

        #[snafu(display("Unsupported build machine: {}/{}", os, arch))]
        UnsupportedBuildMachine { os: String, arch: String },
    }
}

/// The platform family a triple belongs to, keyed on the OS suffix of the
/// triple. Anything that is neither Darwin nor GNU/Linux may only appear as
/// a cross-compilation target, never as a build platform.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum OsFamily {
    Darwin,
    LinuxGnu,
    Other,
}

/// # Triple
///
/// Represents a platform triple string in the form `<arch>-<vendor>-<os>`.
///
/// For example, here are some valid triples:
/// - x86_64-apple-darwin
/// - x86_64-unknown-linux-gnu
/// - arm-none-eabi
///
/// All three segments are required. The `os` segment may itself contain
/// dashes, as in `linux-gnu`.
///
/// # Example
///
/// ```rust
/// use xyz_platform::{OsFamily, Triple};
/// let triple = Triple::new("x86_64-unknown-linux-gnu").unwrap();
///
/// assert_eq!(triple.arch(), "x86_64");
/// assert_eq!(triple.vendor(), "unknown");
/// assert_eq!(triple.os(), "linux-gnu");
/// assert_eq!(triple.family(), OsFamily::LinuxGnu);
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Triple {
    triple: String,
    arch: String,
    vendor: String,
    os: String,
}

impl Triple {
    /// Create a new `Triple` from a dash-delimited string. The first two
    /// segments are the architecture and vendor; everything after the second
    /// dash is the OS.
    pub fn new<S: Into<String>>(value: S) -> Result<Self> {
        Self::parse(value)
    }

    /// The triple for the machine this program was compiled for, which is
    /// the machine running the build unless someone is doing something
    /// unusual with compiled binaries.
    pub fn detect() -> Result<Self> {
        let arch = std::env::consts::ARCH;
        let os = std::env::consts::OS;
        let detected = match (os, arch) {
            ("macos", "x86_64") => "x86_64-apple-darwin",
            ("macos", "aarch64") => "aarch64-apple-darwin",
            ("linux", "x86_64") => "x86_64-unknown-linux-gnu",
            ("linux", "aarch64") => "aarch64-unknown-linux-gnu",
            _ => {
                return error::UnsupportedBuildMachineSnafu { os, arch }.fail();
            }
        };
        Self::parse(detected)
    }

    /// The triple's architecture, e.g. `x86_64` in `x86_64-apple-darwin`.
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// The triple's vendor, e.g. `apple` in `x86_64-apple-darwin`.
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// The triple's OS, e.g. `linux-gnu` in `x86_64-unknown-linux-gnu`.
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Classify the triple by its OS segment.
    pub fn family(&self) -> OsFamily {
        if self.os == "darwin" {
            OsFamily::Darwin
        } else if self.os == "linux-gnu" {
            OsFamily::LinuxGnu
        } else {
            OsFamily::Other
        }
    }

    pub fn as_str(&self) -> &str {
        &self.triple
    }

    fn parse<S: Into<String>>(value: S) -> Result<Self> {
        let triple = value.into();
        let mut parts = triple.splitn(3, '-');
        let arch = parts
            .next()
            .unwrap_or_default()
            .to_string();
        ensure!(
            !arch.is_empty(),
            error::TriplePartEmptySnafu {
                part_name: "arch",
                triple: triple.clone()
            }
        );
        let vendor = match parts.next() {
            Some(vendor) => vendor.to_string(),
            None => {
                return error::TriplePartSnafu {
                    part_name: "vendor",
                    triple,
                }
                .fail()
            }
        };
        ensure!(
            !vendor.is_empty(),
            error::TriplePartEmptySnafu {
                part_name: "vendor",
                triple: triple.clone()
            }
        );
        let os = match parts.next() {
            Some(os) => os.to_string(),
            None => {
                return error::TriplePartSnafu {
                    part_name: "os",
                    triple,
                }
                .fail()
            }
        };
        ensure!(
            !os.is_empty(),
            error::TriplePartEmptySnafu {
                part_name: "os",
                triple: triple.clone()
            }
        );
        Ok(Self {
            triple,
            arch,
            vendor,
            os,
        })
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.triple)
    }
}

impl FromStr for Triple {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Triple::new(s)
    }
}

impl TryFrom<String> for Triple {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Triple::new(value)
    }
}

impl TryFrom<&str> for Triple {
    type Error = Error;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Triple::new(value)
    }
}

impl Serialize for Triple {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.triple)
    }
}

impl<'de> Deserialize<'de> for Triple {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Triple, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Triple::new(value).map_err(|e| D::Error::custom(format!("Error parsing triple: {}", e)))
    }
}

impl Deref for Triple {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.triple
    }
}

impl Borrow<String> for Triple {
    fn borrow(&self) -> &String {
        &self.triple
    }
}

impl Borrow<str> for Triple {
    fn borrow(&self) -> &str {
        &self.triple
    }
}

impl AsRef<str> for Triple {
    fn as_ref(&self) -> &str {
        &self.triple
    }
}

impl PartialEq<str> for Triple {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Triple {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<Triple> for &str {
    fn eq(&self, other: &Triple) -> bool {
        self == &other.triple
    }
}

#[test]
fn parse_ok() {
    struct Test {
        input: &'static str,
        arch: &'static str,
        vendor: &'static str,
        os: &'static str,
        family: OsFamily,
    }

    let tests = vec![
        Test {
            input: "x86_64-apple-darwin",
            arch: "x86_64",
            vendor: "apple",
            os: "darwin",
            family: OsFamily::Darwin,
        },
        Test {
            input: "x86_64-unknown-linux-gnu",
            arch: "x86_64",
            vendor: "unknown",
            os: "linux-gnu",
            family: OsFamily::LinuxGnu,
        },
        Test {
            input: "aarch64-unknown-linux-gnu",
            arch: "aarch64",
            vendor: "unknown",
            os: "linux-gnu",
            family: OsFamily::LinuxGnu,
        },
        Test {
            input: "arm-none-eabi",
            arch: "arm",
            vendor: "none",
            os: "eabi",
            family: OsFamily::Other,
        },
    ];

    for test in tests {
        let parsed = Triple::new(test.input).unwrap();
        assert_eq!(parsed, test.input);
        assert_eq!(test.input, parsed);
        assert_eq!(parsed.arch(), test.arch);
        assert_eq!(parsed.vendor(), test.vendor);
        assert_eq!(parsed.os(), test.os);
        assert_eq!(parsed.family(), test.family);
    }
}

#[test]
fn parse_err() {
    let tests = vec!["", "x86_64", "x86_64-apple", "x86_64--darwin", "-apple-darwin", "x86_64-apple-"];
    for test in tests {
        let result = Triple::new(test);
        assert!(
            result.is_err(),
            "Expected Triple::new(\"{}\") to return an error",
            test
        );
    }
}
