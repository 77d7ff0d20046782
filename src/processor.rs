//! Per-file rendering: read a template, resolve its placeholders and write
//! the result next to it with the template marker removed from the name.

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::ProcessError;
use crate::settings::Resolve;
use crate::token::{denormalize, TokenExtractor, TokenMap};

/// Outcome of a successfully rendered template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// File that was written
    pub output: PathBuf,
    /// Bytes written to `output`
    pub bytes_written: u64,
    /// Distinct variables referenced by the template
    pub variables: usize,
    /// Variables with no value, in placeholder form (`DB_HOST`)
    pub unresolved: Vec<String>,
}

/// Destination for a template: same directory, first occurrence of `marker`
/// removed from the base name.
///
/// Names that are not valid UTF-8 are left unchanged, so the template is
/// rewritten in place.
pub fn output_path_for(path: &Path, marker: &str) -> Result<PathBuf, ProcessError> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(path.to_path_buf());
    };

    let stripped = name.replacen(marker, "", 1);
    if stripped.is_empty() {
        return Err(ProcessError::EmptyOutputName {
            path: path.to_path_buf(),
        });
    }

    Ok(path.with_file_name(stripped))
}

/// Resolve every distinct variable once.
///
/// Returns the values keyed by normalized name (empty string when missing)
/// and the names that could not be resolved, in placeholder form.
pub fn resolve_tokens<R: Resolve + ?Sized>(
    tokens: &TokenMap,
    resolver: &R,
) -> (HashMap<String, String>, Vec<String>) {
    let names: BTreeSet<&String> = tokens.values().collect();
    let mut values = HashMap::with_capacity(names.len());
    let mut unresolved = Vec::new();

    for name in names {
        let value = match resolver.resolve(name) {
            Some(value) => value,
            None => {
                unresolved.push(denormalize(name));
                String::new()
            }
        };
        values.insert(name.clone(), value);
    }

    (values, unresolved)
}

/// Open `output` for writing, truncating it.
///
/// A file created here starts with the template's mode, never wider.
fn create_output(output: &Path, permissions: &fs::Permissions) -> Result<File, ProcessError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(permissions.mode());
    }
    #[cfg(not(unix))]
    let _ = permissions;

    options
        .open(output)
        .map_err(|e| ProcessError::write(output.to_path_buf(), e))
}

/// Write `content` to `output` and apply `permissions` to it.
///
/// The mode is set again after writing so an existing output is reset too.
fn write_preserving(
    output: &Path,
    content: &[u8],
    permissions: fs::Permissions,
) -> Result<(), ProcessError> {
    let mut file = create_output(output, &permissions)?;
    file.write_all(content)
        .map_err(|e| ProcessError::write(output.to_path_buf(), e))?;

    file.set_permissions(permissions)
        .map_err(|source| ProcessError::Permissions {
            path: output.to_path_buf(),
            source,
        })
}

/// Renders templates against a shared, read-only resolver
pub struct Renderer<'a, R: Resolve + ?Sized> {
    extractor: &'a TokenExtractor,
    resolver: &'a R,
    marker: &'a str,
}

impl<'a, R: Resolve + ?Sized> Renderer<'a, R> {
    pub fn new(extractor: &'a TokenExtractor, resolver: &'a R, marker: &'a str) -> Self {
        Self {
            extractor,
            resolver,
            marker,
        }
    }

    /// Render one template.
    ///
    /// Prints the template path and one warning per unresolved variable.
    pub fn render_file(&self, path: &Path) -> Result<FileReport, ProcessError> {
        println!("{}", path.display());

        let permissions = fs::metadata(path)
            .map_err(|source| ProcessError::Metadata {
                path: path.to_path_buf(),
                source,
            })?
            .permissions();

        let content = fs::read(path).map_err(|source| ProcessError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let tokens = self.extractor.extract(&content);
        let (values, unresolved) = resolve_tokens(&tokens, self.resolver);
        for name in &unresolved {
            println!("[WARN] Variable {name} has not been set!");
        }
        trace!(
            "{}: {} token(s), {} unresolved",
            path.display(),
            tokens.len(),
            unresolved.len()
        );

        let rendered = self.extractor.substitute(&content, &tokens, &values);
        let output = output_path_for(path, self.marker)?;
        write_preserving(&output, &rendered, permissions)?;

        Ok(FileReport {
            output,
            bytes_written: rendered.len() as u64,
            variables: values.len(),
            unresolved,
        })
    }
}
