//! Archive packaging: bundles the generated site into a zip container
//! and writes the same layout to an export folder

use crate::models::{GeneratedArtifacts, ImageAsset};
use crate::splice;
use std::io::{Cursor, Write};
use std::path::{Component, Path, PathBuf};
use zip::write::SimpleFileOptions;

/// Fixed marker appended to the title slug
pub const ARCHIVE_SUFFIX: &str = "-website.zip";

/// Derives the archive file name from the site title: lowercased,
/// whitespace runs collapsed to single hyphens, fixed suffix
pub fn archive_file_name(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let slug = if slug.is_empty() { "site".to_string() } else { slug };
    format!("{}{}", slug, ARCHIVE_SUFFIX)
}

/// Builds the downloadable zip: `index.html` (archive-substituted),
/// `style.css`, `script.js`, the server file when both serverCode and
/// serverFileName are non-empty, and every image under `assets/`.
pub fn build_archive(
    artifacts: &GeneratedArtifacts,
    assets: &[ImageAsset],
) -> Result<Vec<u8>, String> {
    let (archive_html, asset_files) = splice::splice_for_archive(&artifacts.html, assets)?;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    write_entry(&mut writer, "index.html", archive_html.as_bytes(), options)?;
    write_entry(&mut writer, "style.css", artifacts.css.as_bytes(), options)?;
    write_entry(&mut writer, "script.js", artifacts.js.as_bytes(), options)?;

    if let Some(name) = server_file_entry(artifacts)? {
        let code = artifacts.server_code.as_deref().unwrap_or_default();
        write_entry(&mut writer, &name, code.as_bytes(), options)?;
    }

    // Stable entry order regardless of map iteration
    let mut paths: Vec<&String> = asset_files.keys().collect();
    paths.sort();
    for path in paths {
        write_entry(&mut writer, path, &asset_files[path], options)?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| format!("Failed to finalize archive: {}", e))?;
    Ok(cursor.into_inner())
}

/// Writes the archive layout as plain files under `dir` and returns the
/// relative paths written
pub fn export_site_dir(
    artifacts: &GeneratedArtifacts,
    assets: &[ImageAsset],
    dir: &Path,
) -> Result<Vec<String>, String> {
    let (archive_html, asset_files) = splice::splice_for_archive(&artifacts.html, assets)?;

    let mut written = Vec::new();
    let mut write_file = |relative: &str, bytes: &[u8]| -> Result<(), String> {
        let full_path = dir.join(relative);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory {:?}: {}", parent, e))?;
        }
        std::fs::write(&full_path, bytes)
            .map_err(|e| format!("Failed to write file {:?}: {}", full_path, e))?;
        written.push(relative.to_string());
        Ok(())
    };

    write_file("index.html", archive_html.as_bytes())?;
    write_file("style.css", artifacts.css.as_bytes())?;
    write_file("script.js", artifacts.js.as_bytes())?;

    if let Some(name) = server_file_entry(artifacts)? {
        let code = artifacts.server_code.as_deref().unwrap_or_default();
        write_file(&name, code.as_bytes())?;
    }

    let mut paths: Vec<&String> = asset_files.keys().collect();
    paths.sort();
    for path in paths {
        write_file(path, &asset_files[path])?;
    }

    Ok(written)
}

/// The sanitized server file entry name, or None when either serverCode
/// or serverFileName is missing or empty
fn server_file_entry(artifacts: &GeneratedArtifacts) -> Result<Option<String>, String> {
    match (&artifacts.server_code, &artifacts.server_file_name) {
        (Some(code), Some(name)) if !code.is_empty() && !name.is_empty() => {
            Ok(Some(sanitize_relative_path(name)?))
        }
        _ => Ok(None),
    }
}

/// Rejects absolute paths and parent-directory segments in a
/// model-supplied file name
pub fn sanitize_relative_path(path: &str) -> Result<String, String> {
    let input = Path::new(path);
    if input.is_absolute() {
        return Err(format!("Absolute paths are not allowed: {}", path));
    }

    let mut cleaned = PathBuf::new();
    for component in input.components() {
        match component {
            Component::Normal(part) => cleaned.push(part),
            Component::CurDir => {}
            _ => return Err(format!("Invalid path component in {}", path)),
        }
    }

    if cleaned.as_os_str().is_empty() {
        return Err("Empty file path returned by model".to_string());
    }

    // Zip entry names always use forward slashes
    let parts: Vec<String> = cleaned
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Ok(parts.join("/"))
}

fn write_entry(
    writer: &mut zip::ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    bytes: &[u8],
    options: SimpleFileOptions,
) -> Result<(), String> {
    writer
        .start_file(name, options)
        .map_err(|e| format!("Failed to add {} to archive: {}", name, e))?;
    writer
        .write_all(bytes)
        .map_err(|e| format!("Failed to write {} to archive: {}", name, e))?;
    Ok(())
}
