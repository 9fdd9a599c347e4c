//! Go composer
//!
//! Every directory with a `go.mod` is a module. Each module is tested, and
//! each `main` package in it is built for every release platform.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::{output_dir, parent_of, relative_all, Composer};
use crate::config::defaults::EXECUTABLE_PLATFORMS;
use crate::core::artifact::{Artifact, ArtifactType, Platform};
use crate::core::context::BuildContext;
use crate::core::ordering::Dependent;
use crate::core::recipe::Recipe;
use crate::error::ComposeError;
use crate::infra::filesystem;

/// Composes Go modules
#[derive(Debug, Clone)]
pub struct GoComposer {
    ldflags: String,
}

impl GoComposer {
    /// Create a composer linking with `ldflags`
    pub fn new(ldflags: &str) -> Self {
        Self {
            ldflags: ldflags.to_string(),
        }
    }

    fn ldflags_for(&self, context: &BuildContext) -> String {
        let stamp = format!("-X main.version={}", context.version());
        if self.ldflags.trim().is_empty() {
            stamp
        } else {
            format!("{} {stamp}", self.ldflags.trim())
        }
    }
}

impl Dependent for GoComposer {
    fn name(&self) -> &str {
        "go"
    }

    fn produces(&self) -> &[ArtifactType] {
        &[ArtifactType::Executable]
    }

    fn consumes(&self) -> &[ArtifactType] {
        &[]
    }
}

/// Module path declared in a `go.mod`
fn module_path(go_mod: &str) -> Option<&str> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then_some(path)
    })
}

/// Executable name `go build` picks for an import path
///
/// The last path element, unless it is a major version suffix such as
/// `v2`, in which case the element before it.
fn binary_name(import_path: &str) -> Option<&str> {
    let mut elements = import_path.rsplit('/').filter(|e| !e.is_empty());
    let last = elements.next()?;
    if is_major_version(last) {
        Some(elements.next().unwrap_or(last))
    } else {
        Some(last)
    }
}

fn is_major_version(element: &str) -> bool {
    element
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Whether a Go source file declares `package main`
fn is_main_package(source: &str) -> bool {
    source
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("package "))
        .is_some_and(|line| line.split_whitespace().nth(1) == Some("main"))
}

/// Module directory owning `file`: the deepest module containing it
fn owning_module<'a>(modules: &'a [PathBuf], file: &Path) -> Option<&'a PathBuf> {
    modules
        .iter()
        .filter(|module| file.starts_with(module))
        .max_by_key(|module| module.components().count())
}

#[async_trait]
impl Composer for GoComposer {
    async fn compose(
        &self,
        context: &BuildContext,
        _cooked: &[Recipe],
    ) -> Result<Vec<Recipe>, ComposeError> {
        let root = context.working_directory();
        let go_mods = relative_all(context, filesystem::find_named(root, "go.mod")?);
        if go_mods.is_empty() {
            return Ok(Vec::new());
        }

        let modules: Vec<PathBuf> = go_mods.iter().map(|m| parent_of(m)).collect();
        let sources = relative_all(context, filesystem::find_with_extension(root, "go")?);
        let ldflags = self.ldflags_for(context);
        let output = output_dir("go");
        let mut recipes = Vec::new();

        for (go_mod, module) in go_mods.iter().zip(&modules) {
            let content = filesystem::read_file(&root.join(go_mod))?;
            let module_name = module_path(&content)
                .and_then(binary_name)
                .map(ToString::to_string)
                .ok_or_else(|| ComposeError::Parse {
                    path: go_mod.clone(),
                    error: "missing module directive".to_string(),
                })?;

            let mut main_packages = BTreeSet::new();
            for source in &sources {
                let is_test = source
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().ends_with("_test.go"));
                if is_test || owning_module(&modules, source) != Some(module) {
                    continue;
                }
                if is_main_package(&filesystem::read_file(&root.join(source))?) {
                    main_packages.insert(parent_of(source));
                }
            }

            recipes.push(Recipe::GoTest {
                module: module.clone(),
            });

            for package_dir in main_packages {
                let relative = package_dir.strip_prefix(module).unwrap_or(&package_dir);
                let (package, name) = if relative.as_os_str().is_empty() {
                    (".".to_string(), module_name.clone())
                } else {
                    let import_path = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    let name = binary_name(&import_path)
                        .map_or_else(|| module_name.clone(), ToString::to_string);
                    (format!("./{import_path}"), name)
                };

                for &(os, arch) in EXECUTABLE_PLATFORMS {
                    let platform = Platform::new(os, arch);
                    let path = output.join(format!(
                        "{name}-{os}-{arch}{}",
                        platform.executable_suffix()
                    ));
                    recipes.push(Recipe::GoBuild {
                        module: module.clone(),
                        package: package.clone(),
                        output: path.clone(),
                        ldflags: ldflags.clone(),
                        platform: platform.clone(),
                        artifacts: vec![Artifact::Executable {
                            name: name.clone(),
                            path,
                            platform,
                        }],
                    });
                }
            }
        }

        Ok(recipes)
    }
}
