//! Current-generation state and the editable preview
//!
//! One `GenerationState` snapshot exists at a time. Every transition
//! produces a new snapshot; regenerating replaces artifacts and assets
//! together, never partially.

use crate::models::{FormState, GeneratedArtifacts, ImageAsset};
use crate::splice;

#[derive(Debug, Clone, Default)]
pub struct GenerationState {
    pub form: Option<FormState>,
    pub artifacts: Option<GeneratedArtifacts>,
    pub assets: Vec<ImageAsset>,
    pub loading: bool,
    pub error: Option<String>,
    pub started_at: Option<String>,
}

impl GenerationState {
    /// Submission: snapshot the form and clear everything from the
    /// previous epoch before the new attempt's outcome is known
    pub fn submit(&self, form: FormState) -> Self {
        Self {
            form: Some(form),
            artifacts: None,
            assets: Vec::new(),
            loading: true,
            error: None,
            started_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Re-submission from the stored form snapshot. Clears the prior
    /// result up front, so a failed regeneration leaves an empty state.
    pub fn regenerate_requested(&self) -> Result<Self, String> {
        let form = self
            .form
            .clone()
            .ok_or_else(|| "Nothing to regenerate: no website has been generated yet".to_string())?;
        Ok(self.submit(form))
    }

    pub fn generation_succeeded(
        &self,
        artifacts: GeneratedArtifacts,
        assets: Vec<ImageAsset>,
    ) -> Self {
        Self {
            form: self.form.clone(),
            artifacts: Some(artifacts),
            assets,
            loading: false,
            error: None,
            started_at: self.started_at.clone(),
        }
    }

    pub fn generation_failed(&self, message: String) -> Self {
        Self {
            form: self.form.clone(),
            artifacts: None,
            assets: Vec::new(),
            loading: false,
            error: Some(message),
            started_at: self.started_at.clone(),
        }
    }

    /// Replaces exactly one top-level text field. The image asset set
    /// and the other fields are untouched.
    pub fn edit_field(&self, field: &str, value: String) -> Result<Self, String> {
        let mut artifacts = self
            .artifacts
            .clone()
            .ok_or_else(|| "No generated website to edit".to_string())?;
        match field {
            "html" => artifacts.html = value,
            "css" => artifacts.css = value,
            "js" => artifacts.js = value,
            "server_code" => artifacts.server_code = Some(value),
            other => return Err(format!("Unknown editable field: {}", other)),
        }
        Ok(Self {
            artifacts: Some(artifacts),
            ..self.clone()
        })
    }

    /// Full standalone preview document, recomputed on every access so
    /// edits show up immediately
    pub fn preview_document(&self) -> Result<String, String> {
        let artifacts = self
            .artifacts
            .as_ref()
            .ok_or_else(|| "No generated website to preview".to_string())?;
        Ok(assemble_preview(artifacts, &self.assets))
    }
}

/// Inlines the current css and js into the markup and splices image
/// references to data URIs
pub fn assemble_preview(artifacts: &GeneratedArtifacts, assets: &[ImageAsset]) -> String {
    let html = splice::splice_for_preview(&artifacts.html, assets);
    let html = inline_stylesheet(&html, &artifacts.css);
    inline_script(&html, &artifacts.js)
}

const STYLESHEET_LINK_TAGS: [&str; 4] = [
    r#"<link rel="stylesheet" href="style.css">"#,
    r#"<link rel="stylesheet" href="style.css" />"#,
    r#"<link rel="stylesheet" href="style.css"/>"#,
    r#"<link href="style.css" rel="stylesheet">"#,
];

const SCRIPT_TAGS: [&str; 3] = [
    r#"<script src="script.js"></script>"#,
    r#"<script src="script.js" defer></script>"#,
    r#"<script defer src="script.js"></script>"#,
];

fn inline_stylesheet(html: &str, css: &str) -> String {
    let block = format!("<style>\n{}\n</style>", css);
    for tag in STYLESHEET_LINK_TAGS {
        if html.contains(tag) {
            return html.replacen(tag, &block, 1);
        }
    }
    match html.find("</head>") {
        Some(idx) => format!("{}{}\n{}", &html[..idx], block, &html[idx..]),
        None => format!("{}\n{}", block, html),
    }
}

fn inline_script(html: &str, js: &str) -> String {
    let block = format!("<script>\n{}\n</script>", js);
    for tag in SCRIPT_TAGS {
        if html.contains(tag) {
            return html.replacen(tag, &block, 1);
        }
    }
    match html.find("</body>") {
        Some(idx) => format!("{}{}\n{}", &html[..idx], block, &html[idx..]),
        None => format!("{}\n{}", html, block),
    }
}
