//! Generation client: text-model and image-model round trips

use crate::models::{GeneratedArtifacts, GenerationRequest, ImageAsset, ImagePromptDescriptor};
use crate::prompts::WEBSITE_SYSTEM_PROMPT;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures_util::future::try_join_all;
use log::info;
use serde_json::{json, Value};
use std::future::Future;

const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPENROUTER_REFERER: &str = "https://sitesmith.frisson.app";
const OPENROUTER_TITLE: &str = "SiteSmith Desktop";

const OPENAI_IMAGES_URL: &str = "https://api.openai.com/v1/images/generations";
const IMAGE_MODEL: &str = "gpt-image-1";
const IMAGE_SIZE: &str = "1024x1024";
const IMAGE_OUTPUT_FORMAT: &str = "jpeg";

/// One request/response round trip against the text model. The response
/// content must parse into [`GeneratedArtifacts`]; a malformed or
/// schema-violating response is a terminal error. No retry, no repair
/// beyond the brace-slice fallback.
pub async fn generate(
    api_key: &str,
    model: &str,
    request: &GenerationRequest,
) -> Result<GeneratedArtifacts, String> {
    let client = reqwest::Client::new();

    let mut body = json!({
        "model": model,
        "messages": [
            { "role": "system", "content": WEBSITE_SYSTEM_PROMPT },
            { "role": "user", "content": request.prompt }
        ],
        "temperature": 0.2
    });
    body["response_format"] = request.schema.clone();

    let response = client
        .post(OPENROUTER_CHAT_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("HTTP-Referer", OPENROUTER_REFERER)
        .header("X-Title", OPENROUTER_TITLE)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("API request failed: {}", e))?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(format!("API error: {}", error_text));
    }

    let response_json: Value = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse API response: {}", e))?;

    let content = response_json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| "Model returned empty content".to_string())?;

    parse_artifacts(content)
}

/// Parses the model's content into artifacts, tolerating stray prose
/// around the JSON object by slicing from the first `{` to the last `}`
pub fn parse_artifacts(content: &str) -> Result<GeneratedArtifacts, String> {
    serde_json::from_str::<GeneratedArtifacts>(content).or_else(|_| {
        let maybe_json = extract_json_object(content)
            .ok_or_else(|| "Model response did not contain valid JSON".to_string())?;
        serde_json::from_str::<GeneratedArtifacts>(&maybe_json)
            .map_err(|e| format!("Failed to parse generation response: {}", e))
    })
}

fn extract_json_object(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(raw[start..=end].to_string())
}

/// Issues one image-generation request per descriptor, all in flight at
/// once. All-or-nothing: a single failure fails the whole batch and no
/// partial asset set is retained.
pub async fn generate_images(
    api_key: &str,
    prompts: &[ImagePromptDescriptor],
) -> Result<Vec<ImageAsset>, String> {
    if prompts.is_empty() {
        return Ok(Vec::new());
    }

    info!(
        "[generate_images] dispatching {} concurrent image requests",
        prompts.len()
    );

    let client = reqwest::Client::new();
    collect_image_assets(prompts, |descriptor| {
        let client = client.clone();
        let api_key = api_key.to_string();
        let prompt = descriptor.prompt.clone();
        async move { fetch_image_payload(&client, &api_key, &prompt).await }
    })
    .await
}

/// Joins the per-descriptor fetches. The returned list is index-aligned
/// with `prompts` regardless of completion order; fileName and altText
/// are carried over from the descriptors unchanged.
pub async fn collect_image_assets<F, Fut>(
    prompts: &[ImagePromptDescriptor],
    fetch: F,
) -> Result<Vec<ImageAsset>, String>
where
    F: Fn(&ImagePromptDescriptor) -> Fut,
    Fut: Future<Output = Result<Vec<u8>, String>>,
{
    let payloads = try_join_all(prompts.iter().map(&fetch)).await?;
    Ok(prompts
        .iter()
        .zip(payloads)
        .map(|(descriptor, bytes)| ImageAsset {
            file_name: descriptor.file_name.clone(),
            alt_text: descriptor.alt_text.clone(),
            bytes,
        })
        .collect())
}

/// One image request: first candidate only, base64 transport decoded to
/// raw bytes
async fn fetch_image_payload(
    client: &reqwest::Client,
    api_key: &str,
    prompt: &str,
) -> Result<Vec<u8>, String> {
    let response = client
        .post(OPENAI_IMAGES_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&json!({
            "model": IMAGE_MODEL,
            "prompt": prompt,
            "n": 1,
            "size": IMAGE_SIZE,
            "output_format": IMAGE_OUTPUT_FORMAT
        }))
        .send()
        .await
        .map_err(|e| format!("Image request failed: {}", e))?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(format!("Image API error: {}", error_text));
    }

    let response_json: Value = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse image API response: {}", e))?;

    let b64 = response_json["data"][0]["b64_json"]
        .as_str()
        .ok_or_else(|| "Image API returned no image data".to_string())?;

    BASE64
        .decode(b64)
        .map_err(|e| format!("Failed to decode image payload: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn descriptor(file_name: &str, prompt: &str) -> ImagePromptDescriptor {
        ImagePromptDescriptor {
            file_name: file_name.to_string(),
            prompt: prompt.to_string(),
            alt_text: format!("alt for {}", file_name),
        }
    }

    #[test]
    fn parse_artifacts_accepts_plain_json() {
        let artifacts = parse_artifacts(
            r#"{"html":"<html></html>","css":"body{}","js":"","imagePrompts":[]}"#,
        )
        .unwrap();
        assert_eq!(artifacts.html, "<html></html>");
        assert!(artifacts.server_code.is_none());
        assert!(artifacts.image_prompts.is_empty());
    }

    #[test]
    fn parse_artifacts_slices_out_surrounding_prose() {
        let content = "Here is your website:\n{\"html\":\"<html></html>\",\"css\":\"\",\"js\":\"\"}\nEnjoy!";
        let artifacts = parse_artifacts(content).unwrap();
        assert_eq!(artifacts.html, "<html></html>");
    }

    #[test]
    fn parse_artifacts_reads_optional_fields() {
        let content = r#"{
            "html": "<html></html>",
            "css": "",
            "js": "",
            "serverCode": "<?php ?>",
            "serverFileName": "server.php",
            "imagePrompts": [
                { "fileName": "logo.png", "prompt": "a logo", "altText": "Logo" }
            ]
        }"#;
        let artifacts = parse_artifacts(content).unwrap();
        assert_eq!(artifacts.server_file_name.as_deref(), Some("server.php"));
        assert_eq!(artifacts.image_prompts.len(), 1);
        assert_eq!(artifacts.image_prompts[0].file_name, "logo.png");
    }

    #[test]
    fn parse_artifacts_rejects_missing_required_fields() {
        assert!(parse_artifacts(r#"{"html":"<html></html>","css":""}"#).is_err());
        assert!(parse_artifacts("no json here at all").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn asset_list_is_index_aligned_even_when_responses_finish_out_of_order() {
        let prompts = vec![
            descriptor("slow.png", "slow"),
            descriptor("fast.png", "fast"),
            descriptor("medium.png", "medium"),
        ];

        let requests = std::sync::atomic::AtomicUsize::new(0);
        let assets = collect_image_assets(&prompts, |d| {
            requests.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let delay = match d.prompt.as_str() {
                "slow" => Duration::from_millis(300),
                "medium" => Duration::from_millis(200),
                _ => Duration::from_millis(10),
            };
            let marker = d.prompt.clone();
            async move {
                tokio::time::sleep(delay).await;
                Ok(marker.into_bytes())
            }
        })
        .await
        .unwrap();

        // Exactly one request per descriptor
        assert_eq!(requests.load(std::sync::atomic::Ordering::SeqCst), 3);
        assert_eq!(assets.len(), 3);
        assert_eq!(assets[0].file_name, "slow.png");
        assert_eq!(assets[0].bytes, b"slow");
        assert_eq!(assets[1].file_name, "fast.png");
        assert_eq!(assets[1].bytes, b"fast");
        assert_eq!(assets[2].file_name, "medium.png");
        assert_eq!(assets[2].bytes, b"medium");
        assert_eq!(assets[0].alt_text, "alt for slow.png");
    }

    #[tokio::test(start_paused = true)]
    async fn single_failure_discards_all_sibling_results() {
        let prompts = vec![
            descriptor("ok1.png", "ok"),
            descriptor("bad.png", "fail"),
            descriptor("ok2.png", "ok"),
        ];

        let result = collect_image_assets(&prompts, |d| {
            let fails = d.prompt == "fail";
            async move {
                if fails {
                    Err("Image API error: overloaded".to_string())
                } else {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(vec![1u8, 2, 3])
                }
            }
        })
        .await;

        assert_eq!(
            result.unwrap_err(),
            "Image API error: overloaded".to_string()
        );
    }

    #[tokio::test]
    async fn empty_prompt_list_yields_no_assets_and_no_requests() {
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let assets = collect_image_assets(&[], |_| {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Ok(Vec::new()) }
        })
        .await
        .unwrap();
        assert!(assets.is_empty());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
