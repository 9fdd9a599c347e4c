//! Default configuration values

/// Default plan file written by `galley plan` and read by `galley apply`
pub const DEFAULT_PLAN_FILE: &str = "galley.plan.toml";

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "galley.toml";

/// Version used when none is given on the command line
pub const DEFAULT_BUILD_VERSION: &str = "0.1.0";

/// Default build configuration passed to managed-runtime toolchains
pub const DEFAULT_CONFIGURATION: &str = "Release";

/// Environment variable holding the hosting API token
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Upper bound for a single hosting API retry sequence (in seconds)
pub const API_RETRY_WINDOW_SECS: u64 = 30;

/// Platforms compiled-language executables are built for
pub const EXECUTABLE_PLATFORMS: &[(&str, &str)] = &[("linux", "amd64"), ("linux", "arm64")];

/// Directories never descended into while scanning for project markers
pub const IGNORED_DIRECTORIES: &[&str] = &[
    ".git",
    "node_modules",
    "bin",
    "obj",
    "target",
    "vendor",
    ".venv",
    "venv",
    "__pycache__",
];

/// Output directory for build products
pub const OUTPUT_DIR: &str = ".galley";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
