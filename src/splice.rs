//! Asset splicing: rewriting generated image references for the live
//! preview (data URIs) and for the archive (relative paths)

use crate::models::ImageAsset;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::HashMap;

/// Directory inside the archive that holds the generated images
pub const ASSETS_DIR: &str = "assets";

/// Replaces every quoted occurrence of each asset's fileName with a
/// base64 data URI embedding the payload. Assets whose fileName never
/// appears in the markup are left alone (silent no-op).
pub fn splice_for_preview(html: &str, assets: &[ImageAsset]) -> String {
    let mut out = html.to_string();
    for asset in assets {
        out = replace_quoted(&out, &asset.file_name, &data_uri(asset));
    }
    out
}

/// Replaces every quoted occurrence of each asset's fileName with its
/// `assets/<fileName>` relative path and records the payload under that
/// path for packaging. On duplicate fileNames the later asset wins in
/// the file map. Asset names are model-supplied, so they go through the
/// same path sanitization as server file names; a name that escapes the
/// assets directory fails the whole splice.
pub fn splice_for_archive(
    html: &str,
    assets: &[ImageAsset],
) -> Result<(String, HashMap<String, Vec<u8>>), String> {
    let mut out = html.to_string();
    let mut files = HashMap::new();
    for asset in assets {
        let safe_name = crate::archive::sanitize_relative_path(&asset.file_name)?;
        let relative = format!("{}/{}", ASSETS_DIR, safe_name);
        out = replace_quoted(&out, &asset.file_name, &relative);
        files.insert(relative, asset.bytes.clone());
    }
    Ok((out, files))
}

/// Substitutes an attribute value matched by textual equality, covering
/// both quoting forms. Exactly the matching rule of the original
/// markup: `src="logo.png"` or `src='logo.png'`.
fn replace_quoted(html: &str, needle: &str, replacement: &str) -> String {
    html.replace(
        &format!("\"{}\"", needle),
        &format!("\"{}\"", replacement),
    )
    .replace(&format!("'{}'", needle), &format!("'{}'", replacement))
}

/// Builds the data URI for an asset. The subtype is sniffed from the
/// payload magic bytes, then guessed from the file extension, and
/// finally defaults to the jpeg format the image API is asked for.
pub fn data_uri(asset: &ImageAsset) -> String {
    format!(
        "data:{};base64,{}",
        detect_mime(asset),
        BASE64.encode(&asset.bytes)
    )
}

fn detect_mime(asset: &ImageAsset) -> String {
    if let Ok(format) = image::guess_format(&asset.bytes) {
        return format.to_mime_type().to_string();
    }
    if let Some(mime) = mime_guess::from_path(&asset.file_name).first_raw() {
        if mime.starts_with("image/") {
            return mime.to_string();
        }
    }
    "image/jpeg".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Valid JPEG / PNG signatures; enough for format sniffing
    const JPEG_BYTES: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
    const PNG_BYTES: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn asset(file_name: &str, bytes: &[u8]) -> ImageAsset {
        ImageAsset {
            file_name: file_name.to_string(),
            alt_text: format!("alt {}", file_name),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn preview_replaces_double_and_single_quoted_references() {
        let html = r#"<img src="logo.png"> <img src='logo.png'>"#;
        let spliced = splice_for_preview(html, &[asset("logo.png", &JPEG_BYTES)]);
        assert!(!spliced.contains("\"logo.png\""));
        assert!(!spliced.contains("'logo.png'"));
        assert_eq!(spliced.matches("data:image/jpeg;base64,").count(), 2);
    }

    #[test]
    fn preview_mime_follows_payload_magic_bytes() {
        let spliced = splice_for_preview(
            r#"<img src="logo.png">"#,
            &[asset("logo.png", &PNG_BYTES)],
        );
        assert!(spliced.contains("data:image/png;base64,"));
    }

    #[test]
    fn unknown_payload_defaults_to_jpeg_via_extension_fallback() {
        let unknown = asset("pic.bin", &[0x00, 0x01, 0x02]);
        assert_eq!(detect_mime(&unknown), "image/jpeg");
        let by_extension = asset("pic.gif", &[0x00, 0x01, 0x02]);
        assert_eq!(detect_mime(&by_extension), "image/gif");
    }

    #[test]
    fn splicing_an_absent_file_name_is_a_no_op() {
        let html = r#"<img src="hero.png">"#;
        let spliced = splice_for_preview(html, &[asset("logo.png", &JPEG_BYTES)]);
        assert_eq!(spliced, html);

        let (archive_html, files) =
            splice_for_archive(html, &[asset("logo.png", &JPEG_BYTES)]).unwrap();
        assert_eq!(archive_html, html);
        // Unmatched assets are still recorded; they are just unused
        assert!(files.contains_key("assets/logo.png"));
    }

    #[test]
    fn archive_rewrites_to_relative_paths_and_records_payloads() {
        let html = r#"<img src="logo.png" alt="Logo"><img src="banner.png">"#;
        let assets = [
            asset("logo.png", &JPEG_BYTES),
            asset("banner.png", &PNG_BYTES),
        ];
        let (spliced, files) = splice_for_archive(html, &assets).unwrap();
        assert!(spliced.contains(r#"src="assets/logo.png""#));
        assert!(spliced.contains(r#"src="assets/banner.png""#));
        assert_eq!(files.len(), 2);
        assert_eq!(files["assets/logo.png"], JPEG_BYTES.to_vec());
        assert_eq!(files["assets/banner.png"], PNG_BYTES.to_vec());
    }

    #[test]
    fn preview_and_archive_differ_only_in_reference_form() {
        let html = r#"<h1>Welcome</h1><img src="logo.png" alt="Logo"><p>unrelated text</p>"#;
        let assets = [asset("logo.png", &JPEG_BYTES)];

        let preview = splice_for_preview(html, &assets);
        let (archive, _) = splice_for_archive(html, &assets).unwrap();

        let uri = data_uri(&assets[0]);
        assert_eq!(preview.replace(&uri, "logo.png"), html);
        assert_eq!(archive.replace("assets/logo.png", "logo.png"), html);
        assert!(preview.contains("<p>unrelated text</p>"));
        assert!(archive.contains("<p>unrelated text</p>"));
    }

    #[test]
    fn duplicate_file_names_keep_the_later_payload_in_the_file_map() {
        let html = r#"<img src="logo.png">"#;
        let assets = [asset("logo.png", &JPEG_BYTES), asset("logo.png", &PNG_BYTES)];
        let (_, files) = splice_for_archive(html, &assets).unwrap();
        assert_eq!(files["assets/logo.png"], PNG_BYTES.to_vec());
    }

    #[test]
    fn asset_names_that_escape_the_assets_dir_are_rejected() {
        let html = r#"<img src="../../escape.png">"#;
        assert!(splice_for_archive(html, &[asset("../../escape.png", &JPEG_BYTES)]).is_err());
        assert!(splice_for_archive(html, &[asset("/etc/evil.png", &JPEG_BYTES)]).is_err());

        // Subdirectories inside assets/ are fine
        let (spliced, files) =
            splice_for_archive(r#"<img src="icons/star.png">"#, &[asset("icons/star.png", &PNG_BYTES)])
                .unwrap();
        assert!(spliced.contains(r#"src="assets/icons/star.png""#));
        assert!(files.contains_key("assets/icons/star.png"));
    }
}
