//! Named, orderable resources of the IPASIR harness and token resolution.
//!
//! A token given for an app, solver, binary or input is either the exact name of
//! an item or an ordinal shorthand such as `a3` (the third app, as listed by `apps`).
//! Catalogs are enumerated afresh on every call and sorted by name, so ordinals
//! shown by a listing stay valid until the directory contents change.

use crate::config::Layout;
use crate::error::CommandError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Entry of `ipasir/bin` that is never a binary.
const IGNORED_BINARY: &str = ".gitignore";

/// Sub-directory of an app holding its input files.
const INPUTS_DIR: &str = "inputs";

/// A file or directory that can be referred to by name or ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub name: String,
    pub path: PathBuf,
}

impl CatalogItem {
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }
}

/// Which catalog a token is looked up in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogKind {
    App,
    Solver,
    Binary,
    /// Inputs of one app, by the app's name.
    Input { app: String },
}

impl CatalogKind {
    /// Ordinal shorthand prefix, e.g. `a` in `a3`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::App => "a",
            Self::Solver => "s",
            Self::Binary => "b",
            Self::Input { .. } => "i",
        }
    }

    fn not_found(&self, token: &str) -> ResolutionError {
        let token = token.to_string();
        match self {
            Self::App => ResolutionError::App(token),
            Self::Solver => ResolutionError::Solver(token),
            Self::Binary => ResolutionError::Binary(token),
            Self::Input { app } => ResolutionError::Input {
                token,
                app: app.clone(),
            },
        }
    }
}

/// A token matched no item of its catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("App '{0}' does not exist.")]
    App(String),
    #[error("Solver '{0}' does not exist.")]
    Solver(String),
    #[error("Binary '{0}' does not exist.")]
    Binary(String),
    #[error("Input '{token}' does not exist for app '{app}'.")]
    Input { token: String, app: String },
}

/// Parse `token` as `prefix` followed by ASCII digits.
///
/// Returns the number without range checking. Values too large for `usize`
/// come back as `None`, which callers treat the same as out of range.
pub fn ordinal(prefix: &str, token: &str) -> Option<usize> {
    let digits = token.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Resolve `token` against `items`.
///
/// An exact name match wins over the ordinal form, so an item literally named
/// `a1` is returned for `a1` even if it is not the first app.
///
/// # Errors
///
/// Returns the kind-specific [`ResolutionError`] when the token is neither a
/// name in the catalog nor an in-range ordinal (`1..=items.len()`).
pub fn resolve<'c>(
    items: &'c [CatalogItem],
    kind: &CatalogKind,
    token: &str,
) -> Result<&'c CatalogItem, ResolutionError> {
    if let Some(item) = items.iter().find(|item| item.name == token) {
        return Ok(item);
    }

    ordinal(kind.prefix(), token)
        .filter(|n| (1..=items.len()).contains(n))
        .map(|n| &items[n - 1])
        .ok_or_else(|| kind.not_found(token))
}

/// Filesystem-backed catalogs rooted at a [`Layout`].
pub struct Catalog<'a> {
    layout: &'a Layout,
}

impl<'a> Catalog<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Enumerate the items of one catalog, sorted by name.
    ///
    /// # Errors
    ///
    /// Fails if the app, solver or binary directory cannot be read. A missing
    /// `inputs` directory is not an error and yields an empty list.
    pub fn items(&self, kind: &CatalogKind) -> Result<Vec<CatalogItem>, CommandError> {
        let items = match kind {
            CatalogKind::App => subdirectories(&self.layout.apps()),
            CatalogKind::Solver => subdirectories(&self.layout.solvers()),
            CatalogKind::Binary => files_except(&self.layout.binaries(), IGNORED_BINARY),
            CatalogKind::Input { app } => {
                let dir = self.layout.apps().join(app).join(INPUTS_DIR);
                if dir.is_dir() {
                    entries(&dir)
                } else {
                    Ok(Vec::new())
                }
            }
        };
        let items = items?;
        tracing::debug!(?kind, count = items.len(), "enumerated catalog");
        Ok(items)
    }

    /// Enumerate `kind` and resolve `token` against it.
    ///
    /// # Errors
    ///
    /// Fails on enumeration I/O errors or when the token does not resolve.
    pub fn lookup(&self, kind: &CatalogKind, token: &str) -> Result<CatalogItem, CommandError> {
        let items = self.items(kind)?;
        Ok(resolve(&items, kind, token)?.clone())
    }

    pub fn app(&self, token: &str) -> Result<CatalogItem, CommandError> {
        self.lookup(&CatalogKind::App, token)
    }

    pub fn solver(&self, token: &str) -> Result<CatalogItem, CommandError> {
        self.lookup(&CatalogKind::Solver, token)
    }

    pub fn input(&self, app: &CatalogItem, token: &str) -> Result<CatalogItem, CommandError> {
        self.lookup(
            &CatalogKind::Input {
                app: app.name.clone(),
            },
            token,
        )
    }
}

fn read_sorted(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<CatalogItem>, CommandError> {
    let read = || -> io::Result<Vec<CatalogItem>> {
        let mut items = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if keep(&path) {
                items.push(CatalogItem::from_path(path));
            }
        }
        Ok(items)
    };
    let mut items = read().map_err(|e| CommandError::io(dir, e))?;
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

fn subdirectories(dir: &Path) -> Result<Vec<CatalogItem>, CommandError> {
    read_sorted(dir, Path::is_dir)
}

fn files_except(dir: &Path, ignored: &str) -> Result<Vec<CatalogItem>, CommandError> {
    read_sorted(dir, |p| {
        p.is_file() && p.file_name().is_none_or(|n| n != ignored)
    })
}

fn entries(dir: &Path) -> Result<Vec<CatalogItem>, CommandError> {
    read_sorted(dir, |_| true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn items(names: &[&str]) -> Vec<CatalogItem> {
        names
            .iter()
            .map(|n| CatalogItem::from_path(PathBuf::from("/apps").join(n)))
            .collect()
    }

    #[test]
    fn test_ordinal_parsing() {
        assert_eq!(ordinal("a", "a3"), Some(3));
        assert_eq!(ordinal("a", "a0"), Some(0));
        assert_eq!(ordinal("a", "a"), None);
        assert_eq!(ordinal("a", "a-1"), None);
        assert_eq!(ordinal("a", "a+1"), None);
        assert_eq!(ordinal("a", "a1x"), None);
        assert_eq!(ordinal("a", "s1"), None);
        assert_eq!(ordinal("a", "a99999999999999999999999999"), None);
    }

    #[test]
    fn test_exact_name_wins_over_ordinal() {
        let catalog = items(&["alpha", "beta", "a1"]);
        let found = resolve(&catalog, &CatalogKind::App, "a1").unwrap();
        assert_eq!(found.name, "a1");
    }

    #[test]
    fn test_every_ordinal_resolves_to_its_position() {
        let catalog = items(&["alpha", "beta", "gamma"]);
        for (i, expected) in catalog.iter().enumerate() {
            let token = format!("s{}", i + 1);
            let found = resolve(&catalog, &CatalogKind::Solver, &token).unwrap();
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn test_out_of_range_and_malformed_ordinals_fail() {
        let catalog = items(&["alpha", "beta"]);
        for token in ["a0", "a3", "ax", "a", "zeta", "b1"] {
            let err = resolve(&catalog, &CatalogKind::App, token).unwrap_err();
            assert_eq!(err, ResolutionError::App(token.to_string()));
        }
    }

    #[test]
    fn test_empty_catalog_rejects_everything() {
        let err = resolve(&[], &CatalogKind::Binary, "b1").unwrap_err();
        assert_eq!(err.to_string(), "Binary 'b1' does not exist.");
    }

    #[test]
    fn test_error_messages_name_the_catalog() {
        let kind = CatalogKind::Input {
            app: "genipamax".to_string(),
        };
        let err = resolve(&[], &kind, "i9").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Input 'i9' does not exist for app 'genipamax'."
        );
        assert_eq!(
            resolve(&[], &CatalogKind::App, "foo").unwrap_err().to_string(),
            "App 'foo' does not exist."
        );
    }

    fn harness() -> (TempDir, Layout) {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path());
        for app in ["zeta", "alpha", "mid"] {
            fs::create_dir_all(layout.apps().join(app)).unwrap();
        }
        fs::write(layout.apps().join("README"), "not an app").unwrap();
        fs::create_dir_all(layout.solvers().join("minisat")).unwrap();
        fs::create_dir_all(layout.binaries()).unwrap();
        fs::write(layout.binaries().join(".gitignore"), "*").unwrap();
        fs::write(layout.binaries().join("mid-minisat"), "").unwrap();
        fs::create_dir_all(layout.binaries().join("stale")).unwrap();
        (dir, layout)
    }

    #[test]
    fn test_apps_are_sorted_subdirectories() {
        let (_dir, layout) = harness();
        let catalog = Catalog::new(&layout);
        let names: Vec<_> = catalog
            .items(&CatalogKind::App)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
        assert_eq!(catalog.app("a3").unwrap().name, "zeta");
    }

    #[test]
    fn test_binaries_skip_gitignore_and_directories() {
        let (_dir, layout) = harness();
        let binaries = Catalog::new(&layout).items(&CatalogKind::Binary).unwrap();
        assert_eq!(binaries.len(), 1);
        assert_eq!(binaries[0].name, "mid-minisat");
    }

    #[test]
    fn test_inputs_missing_directory_is_empty() {
        let (_dir, layout) = harness();
        let catalog = Catalog::new(&layout);
        let app = catalog.app("alpha").unwrap();
        let kind = CatalogKind::Input { app: app.name };
        assert!(catalog.items(&kind).unwrap().is_empty());
    }

    #[test]
    fn test_inputs_listed_from_app_directory() {
        let (_dir, layout) = harness();
        let inputs = layout.apps().join("mid").join("inputs");
        fs::create_dir_all(&inputs).unwrap();
        fs::write(inputs.join("b.cnf"), "").unwrap();
        fs::write(inputs.join("a.cnf"), "").unwrap();

        let catalog = Catalog::new(&layout);
        let app = catalog.app("a2").unwrap();
        let input = catalog.input(&app, "i1").unwrap();
        assert_eq!(input.name, "a.cnf");
        assert_eq!(input.path, inputs.join("a.cnf"));
    }

    #[test]
    fn test_missing_catalog_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path());
        let err = Catalog::new(&layout).app("a1").unwrap_err();
        assert!(matches!(err, CommandError::Io { .. }));
    }
}
