use snafu::Snafu;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Can't determine flags for platform '{}'", platform))]
    BuildPlatformFlags { platform: String },

    #[snafu(display("Failed to start command '{}': {}", command, source))]
    CommandStart {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("Command '{}' failed with exit code {}", command, code))]
    CommandStatus { command: String, code: i32 },

    #[snafu(display("Dependency cycle: {}", chain.join(" -> ")))]
    DependencyCycle { chain: Vec<String> },

    #[snafu(display("Attempted to run an empty command"))]
    EmptyCommand,

    #[snafu(display("Failed to determine the current directory: {}", source))]
    CurrentDir { source: std::io::Error },

    #[snafu(display("Failed to create directory '{}': {}", path.display(), source))]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to read directory '{}': {}", path.display(), source))]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to remove tree '{}': {}", path.display(), source))]
    DirectoryRemove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to walk directory '{}': {}", path.display(), source))]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[snafu(display("Failed to read archive '{}': {}", path.display(), source))]
    ArchiveRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to write archive '{}': {}", path.display(), source))]
    ArchiveWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Archive '{}' entry '{}' has an unsupported type", path.display(), entry))]
    ArchiveEntryType { path: PathBuf, entry: String },

    #[snafu(display("Failed to create file '{}': {}", path.display(), source))]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to read file '{}': {}", path.display(), source))]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to remove file '{}': {}", path.display(), source))]
    FileRemove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to write file '{}': {}", path.display(), source))]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to link '{}' to '{}': {}", link.display(), target.display(), source))]
    Symlink {
        link: PathBuf,
        target: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Path '{}' is not unicode", path.display()))]
    NonUnicodePath { path: PathBuf },

    #[snafu(display("Package '{}' has no recipe", pkg_name))]
    UnknownPackage { pkg_name: String },

    #[snafu(display("Recipe for '{}' reports package name '{}'", requested, actual))]
    RecipeNameMismatch { requested: String, actual: String },

    #[snafu(display("Recipe for '{}' does not implement configure", pkg_name))]
    RecipeMissingConfigure { pkg_name: String },

    #[snafu(display("Unknown variant key '{}' for package '{}'", key, pkg_name))]
    UnknownVariantKey { pkg_name: String, key: String },

    #[snafu(display(
        "Invalid value '{}' for variant key '{}' of package '{}' (allowed: {})",
        value,
        key,
        pkg_name,
        allowed.join(", ")
    ))]
    UnknownVariantValue {
        pkg_name: String,
        key: String,
        value: String,
        allowed: Vec<String>,
    },

    #[snafu(display("Missing variant key '{}' for package '{}'", key, pkg_name))]
    MissingVariantKey { pkg_name: String, key: String },

    #[snafu(display("Invalid variant assignment '{}' (expected key:value)", assignment))]
    VariantAssignment { assignment: String },

    #[snafu(display("Config key '{}' is not set", key))]
    MissingConfigKey { key: String },

    #[snafu(display("Unknown config key '{}' in template '{}'", key, template))]
    TemplateUnknownKey { key: String, template: String },

    #[snafu(display("Unterminated '{{' in template '{}'", template))]
    TemplateUnterminated { template: String },

    #[snafu(display("Template '{}' does not reach a fixpoint", template))]
    TemplateDepth { template: String },

    #[snafu(display("Platform error: {}", source))]
    Platform { source: xyz_platform::error::Error },
}

impl Error {
    /// True for errors caused by bad input from the user (an unsupported
    /// platform, an invalid variant, an unknown package) rather than a
    /// failure encountered while carrying out a build. The CLI prints these
    /// without an error chain.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::BuildPlatformFlags { .. }
                | Error::UnknownPackage { .. }
                | Error::UnknownVariantKey { .. }
                | Error::UnknownVariantValue { .. }
                | Error::MissingVariantKey { .. }
                | Error::VariantAssignment { .. }
                | Error::Platform { .. }
        )
    }
}
