//! Deployment packaging: walk a project directory into a deflate zip.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::client::{CliError, CliResult};

/// Directory names never shipped to the platform.
pub(crate) const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules", ".mgzon", "target"];

/// Result of a packaging run.
#[derive(Debug)]
pub(crate) struct PackageSummary {
    pub(crate) archive: PathBuf,
    pub(crate) files: usize,
    pub(crate) total_bytes: u64,
}

/// Package `root` into a zip at `output`.
///
/// Entries are stored with forward-slash relative paths. Directories named in
/// [`EXCLUDED_DIRS`] are skipped at any depth, as is the output archive when
/// it lives inside the project.
pub(crate) fn package_project(root: &Path, output: &Path) -> CliResult<PackageSummary> {
    if !root.is_dir() {
        return Err(CliError::validation(format!(
            "project directory '{}' does not exist",
            root.display()
        )));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            CliError::failure(anyhow!("failed to create '{}': {err}", parent.display()))
        })?;
    }
    let file = File::create(output).map_err(|err| {
        CliError::failure(anyhow!("failed to create archive '{}': {err}", output.display()))
    })?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let output_abs = output.canonicalize().ok();
    let mut files = 0usize;
    let mut total_bytes = 0u64;

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| EXCLUDED_DIRS.contains(&name)))
        });

    for entry in walker {
        let entry = entry
            .map_err(|err| CliError::failure(anyhow!("failed to walk project: {err}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if output_abs.as_deref().is_some_and(|archive| {
            entry
                .path()
                .canonicalize()
                .is_ok_and(|path| path == archive)
        }) {
            continue;
        }

        let relative = entry.path().strip_prefix(root).map_err(|err| {
            CliError::failure(anyhow!("entry escaped the project root: {err}"))
        })?;
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        writer
            .start_file(&name, options)
            .map_err(|err| CliError::failure(anyhow!("failed to add '{name}': {err}")))?;
        let mut input = File::open(entry.path()).map_err(|err| {
            CliError::failure(anyhow!("failed to read '{}': {err}", entry.path().display()))
        })?;
        let written = io::copy(&mut input, &mut writer)
            .map_err(|err| CliError::failure(anyhow!("failed to compress '{name}': {err}")))?;

        files += 1;
        total_bytes += written;
        tracing::debug!(entry = %name, bytes = written, "packaged");
    }

    writer
        .finish()
        .map_err(|err| CliError::failure(anyhow!("failed to finalize archive: {err}")))?;

    if files == 0 {
        return Err(CliError::validation(format!(
            "nothing to package under '{}'",
            root.display()
        )));
    }

    Ok(PackageSummary {
        archive: output.to_path_buf(),
        files,
        total_bytes,
    })
}
