//! Prompt templates and prompt composition for website generation

use crate::models::{FormState, GenerationRequest};
use serde_json::{json, Value};

/// Upper bound on the extra images a single generation may request
pub const MAX_EXTRA_IMAGES: u8 = 5;

/// System prompt sent with every website-generation request
pub const WEBSITE_SYSTEM_PROMPT: &str = r#"You are an expert web developer. You build complete, polished, responsive websites.

Return ONLY valid JSON in this exact shape:
{
  "html": "complete index.html contents",
  "css": "complete style.css contents",
  "js": "complete script.js contents",
  "serverCode": "optional server-side source",
  "serverFileName": "optional server file name, e.g. server.php",
  "imagePrompts": [
    { "fileName": "logo.png", "prompt": "creative image prompt", "altText": "accessibility text" }
  ]
}

Rules:
- html, css and js are always required and must be complete files, not diffs or fragments.
- Only include serverCode and serverFileName when the specification asks for server-side logic.
- Only include imagePrompts when the specification asks for generated images.
- Do not include markdown fences or any text outside the JSON object."#;

/// Composes the single natural-language prompt plus the declared
/// response contract from a form snapshot. Pure string building; no I/O.
pub fn compose(form: &FormState) -> GenerationRequest {
    let features = if form.features.is_empty() {
        "None".to_string()
    } else {
        form.features.join(", ")
    };
    let custom = if form.custom_instructions.trim().is_empty() {
        "None"
    } else {
        form.custom_instructions.trim()
    };

    let mut prompt = format!(
        "Build a complete website from the following specification.\n\n\
         Title: {}\n\
         Description: {}\n\
         Site type: {}\n\
         Features: {}\n\
         Custom instructions: {}\n",
        form.title,
        form.description,
        form.site_type.label(),
        features,
        custom
    );

    prompt.push_str(
        "\nOutput requirements:\n\
         - The html field must be a complete standalone HTML document that links an external stylesheet named exactly \"style.css\" and an external script named exactly \"script.js\".\n\
         - Return html, css and js as complete, independent file contents. Never return fragments.\n",
    );

    if form.include_database {
        let db = &form.database;
        prompt.push_str(&format!(
            "\nDatabase requirements:\n\
             - Include server-side code backed by a MySQL database. Return the source in the serverCode field and its file name in the serverFileName field.\n\
             - Connect with host \"{}\", username \"{}\", password \"{}\" and database name \"{}\".\n\
             - Tables: {}\n",
            db.host, db.username, db.password, db.name, db.table_description
        ));
    }

    if form.generate_images {
        let images = &form.images;
        let extra = images.extra_image_count.min(MAX_EXTRA_IMAGES);
        prompt.push_str(&format!(
            "\nImage requirements:\n\
             - Fill the imagePrompts field with one entry per image. Each entry needs a unique fileName, a creative prompt and accessibility altText.\n\
             - Every fileName listed in imagePrompts must appear in an image reference inside the html.\n\
             - Include a logo image: {}\n\
             - Include a banner image: {}\n\
             - Include {} additional images sharing a {} visual style.\n",
            images.logo_prompt,
            images.banner_prompt,
            extra,
            images.icon_style.label()
        ));
    }

    GenerationRequest {
        prompt,
        schema: response_format(),
    }
}

/// The `response_format` value passed to the chat completions API.
/// Required keys: html, css, js. Optional: serverCode, serverFileName,
/// imagePrompts; each imagePrompts entry requires fileName, prompt and
/// altText.
pub fn response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "website_bundle",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "html": { "type": "string" },
                    "css": { "type": "string" },
                    "js": { "type": "string" },
                    "serverCode": { "type": "string" },
                    "serverFileName": { "type": "string" },
                    "imagePrompts": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "fileName": { "type": "string" },
                                "prompt": { "type": "string" },
                                "altText": { "type": "string" }
                            },
                            "required": ["fileName", "prompt", "altText"]
                        }
                    }
                },
                "required": ["html", "css", "js"]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatabaseConfig, IconStyle, ImageOptions, SiteType};

    fn sample_form() -> FormState {
        FormState {
            title: "Acme Bakery".to_string(),
            description: "A bakery selling sourdough".to_string(),
            site_type: SiteType::Business,
            features: vec!["contact form".to_string(), "gallery".to_string()],
            custom_instructions: "Use warm colors".to_string(),
            include_database: false,
            generate_images: false,
            database: DatabaseConfig {
                host: "db.internal.example".to_string(),
                username: "acme_admin".to_string(),
                password: "s3cret".to_string(),
                name: "acme_db".to_string(),
                table_description: "orders with id, customer, total".to_string(),
            },
            images: ImageOptions {
                logo_prompt: "a minimalist wheat sheaf".to_string(),
                banner_prompt: "bread on a wooden table".to_string(),
                icon_style: IconStyle::Flat,
                extra_image_count: 2,
            },
        }
    }

    #[test]
    fn compose_always_names_required_files_and_core_fields() {
        for (db, img) in [(false, false), (true, false), (false, true), (true, true)] {
            let mut form = sample_form();
            form.include_database = db;
            form.generate_images = img;
            let request = compose(&form);
            assert!(request.prompt.contains("style.css"), "db={} img={}", db, img);
            assert!(request.prompt.contains("script.js"), "db={} img={}", db, img);
            assert!(request.prompt.contains("Acme Bakery"));
            assert!(request.prompt.contains("A bakery selling sourdough"));
            assert!(request.prompt.contains("business website"));
            assert!(request.prompt.contains("contact form, gallery"));
        }
    }

    #[test]
    fn database_fields_do_not_leak_when_flag_is_off() {
        let form = sample_form();
        let request = compose(&form);
        assert!(!request.prompt.contains("db.internal.example"));
        assert!(!request.prompt.contains("acme_admin"));
        assert!(!request.prompt.contains("s3cret"));
        assert!(!request.prompt.contains("orders with id"));
    }

    #[test]
    fn database_section_restates_connection_parameters_verbatim() {
        let mut form = sample_form();
        form.include_database = true;
        let request = compose(&form);
        assert!(request.prompt.contains("MySQL"));
        assert!(request.prompt.contains("db.internal.example"));
        assert!(request.prompt.contains("acme_admin"));
        assert!(request.prompt.contains("s3cret"));
        assert!(request.prompt.contains("acme_db"));
        assert!(request.prompt.contains("orders with id, customer, total"));
    }

    #[test]
    fn image_section_includes_prompts_and_clamps_extra_count() {
        let mut form = sample_form();
        form.generate_images = true;
        form.images.extra_image_count = 9;
        let request = compose(&form);
        assert!(request.prompt.contains("a minimalist wheat sheaf"));
        assert!(request.prompt.contains("bread on a wooden table"));
        assert!(request.prompt.contains("5 additional images"));
        assert!(request.prompt.contains("flat visual style"));
    }

    #[test]
    fn empty_custom_instructions_become_none_marker() {
        let mut form = sample_form();
        form.custom_instructions = "   ".to_string();
        let request = compose(&form);
        assert!(request.prompt.contains("Custom instructions: None"));
    }

    #[test]
    fn empty_feature_list_becomes_none_marker() {
        let mut form = sample_form();
        form.features.clear();
        let request = compose(&form);
        assert!(request.prompt.contains("Features: None"));
    }

    #[test]
    fn schema_declares_required_and_optional_keys() {
        let request = compose(&sample_form());
        let schema = &request.schema["json_schema"]["schema"];
        assert_eq!(schema["required"], serde_json::json!(["html", "css", "js"]));
        assert!(schema["properties"]["serverCode"].is_object());
        assert!(schema["properties"]["imagePrompts"].is_object());
        assert_eq!(
            schema["properties"]["imagePrompts"]["items"]["required"],
            serde_json::json!(["fileName", "prompt", "altText"])
        );
    }
}
