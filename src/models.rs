//! Data models and structures used throughout the application

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of website the user is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteType {
    #[default]
    Landing,
    Portfolio,
    Blog,
    Ecommerce,
    Business,
    Other,
}

impl SiteType {
    /// Human-readable label used inside the composed prompt
    pub fn label(&self) -> &'static str {
        match self {
            SiteType::Landing => "landing page",
            SiteType::Portfolio => "portfolio",
            SiteType::Blog => "blog",
            SiteType::Ecommerce => "e-commerce store",
            SiteType::Business => "business website",
            SiteType::Other => "other",
        }
    }
}

/// Visual style requested for the extra generated images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconStyle {
    #[default]
    Flat,
    ThreeD,
    Minimal,
    Cartoon,
    Realistic,
}

impl IconStyle {
    pub fn label(&self) -> &'static str {
        match self {
            IconStyle::Flat => "flat",
            IconStyle::ThreeD => "3D",
            IconStyle::Minimal => "minimal",
            IconStyle::Cartoon => "cartoon",
            IconStyle::Realistic => "realistic",
        }
    }
}

/// Connection parameters restated verbatim in the prompt when the
/// database flag is set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub table_description: String,
}

/// Image-generation fields of the form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageOptions {
    #[serde(default)]
    pub logo_prompt: String,
    #[serde(default)]
    pub banner_prompt: String,
    #[serde(default)]
    pub icon_style: IconStyle,
    #[serde(default)]
    pub extra_image_count: u8,
}

/// Snapshot of the website-specification form, taken at submission time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormState {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub site_type: SiteType,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub custom_instructions: String,
    #[serde(default)]
    pub include_database: bool,
    #[serde(default)]
    pub generate_images: bool,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub images: ImageOptions,
}

/// Composed prompt plus the machine-checkable response contract sent
/// alongside it
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub schema: Value,
}

/// One imagePrompts entry returned by the text model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePromptDescriptor {
    pub file_name: String,
    pub prompt: String,
    pub alt_text: String,
}

/// Text output of one successful generation call; each field is
/// independently editable afterwards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifacts {
    pub html: String,
    pub css: String,
    pub js: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_file_name: Option<String>,
    #[serde(default)]
    pub image_prompts: Vec<ImagePromptDescriptor>,
}

/// One named binary image payload produced by the image model.
/// Immutable once created; the whole set is discarded on regeneration.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub file_name: String,
    pub alt_text: String,
    pub bytes: Vec<u8>,
}
