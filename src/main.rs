// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Module declarations
mod archive;
mod generation;
mod models;
mod paths;
mod prompts;
mod splice;
mod state;

use models::{FormState, GeneratedArtifacts, ImageAsset};
use paths::*;
use state::GenerationState;

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tauri::{command, AppHandle};
use tauri_plugin_dialog::DialogExt;

// ============ LLM Configuration ============

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LlmConfig {
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    pub openrouter_api_key: Option<String>,
    #[serde(default)]
    pub openai_image_api_key: Option<String>,
}

fn default_generation_model() -> String {
    "openai/gpt-5.2-codex".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            generation_model: default_generation_model(),
            openrouter_api_key: None,
            openai_image_api_key: None,
        }
    }
}

fn load_llm_config() -> Result<LlmConfig, String> {
    let config_path = get_llm_config_path()?;
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read LLM config: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse LLM config: {}", e))
    } else {
        Ok(LlmConfig::default())
    }
}

fn save_llm_config(config: &LlmConfig) -> Result<(), String> {
    let config_path = get_llm_config_path()?;
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory: {}", e))?;
    }
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize LLM config: {}", e))?;
    std::fs::write(&config_path, content).map_err(|e| format!("Failed to save LLM config: {}", e))
}

// ============ API Key Commands ============

#[command]
async fn save_api_key(key: String) -> Result<(), String> {
    info!("[save_api_key] Saving OpenRouter API key");
    let mut config = load_llm_config()?;
    config.openrouter_api_key = Some(key);
    save_llm_config(&config)?;
    info!("[save_api_key] OpenRouter API key saved successfully");
    Ok(())
}

#[command]
async fn has_api_key() -> Result<bool, String> {
    let config = load_llm_config()?;
    Ok(config.openrouter_api_key.is_some())
}

#[command]
async fn save_image_api_key(key: String) -> Result<(), String> {
    info!("[save_image_api_key] Saving OpenAI API key for image generation");
    let mut config = load_llm_config()?;
    config.openai_image_api_key = Some(key);
    save_llm_config(&config)?;
    Ok(())
}

#[command]
async fn has_image_api_key() -> Result<bool, String> {
    let config = load_llm_config()?;
    Ok(config.openai_image_api_key.is_some())
}

#[command]
async fn get_generation_model() -> Result<String, String> {
    let config = load_llm_config()?;
    Ok(config.generation_model)
}

#[command]
async fn set_generation_model(model: String) -> Result<(), String> {
    info!("[set_generation_model] Switching generation model to {}", model);
    let mut config = load_llm_config()?;
    config.generation_model = model;
    save_llm_config(&config)
}

// ============ App State ============

#[derive(Default)]
pub struct AppState {
    pub generation: Mutex<GenerationState>,
}

/// Summary returned to the UI after a successful generation
#[derive(Serialize)]
pub struct GenerationOutcome {
    pub image_count: usize,
    pub server_file_name: Option<String>,
    pub archive_name: String,
}

/// Lightweight status poll for the UI
#[derive(Serialize)]
pub struct GenerationStatus {
    pub loading: bool,
    pub has_artifacts: bool,
    pub image_count: usize,
    pub error: Option<String>,
    pub started_at: Option<String>,
}

/// One row of the asset listing shown next to the preview
#[derive(Serialize)]
pub struct AssetInfo {
    pub file_name: String,
    pub alt_text: String,
    pub byte_len: usize,
    pub referenced: bool,
}

// ============ Generation Commands ============

/// Runs compose -> text generation -> conditional image generation.
/// Pure pipeline; the caller owns the state transitions on either side.
async fn run_generation_pipeline(
    form: &FormState,
) -> Result<(GeneratedArtifacts, Vec<ImageAsset>), String> {
    let config = load_llm_config()?;
    let api_key = config
        .openrouter_api_key
        .clone()
        .ok_or_else(|| "OpenRouter API key not configured".to_string())?;

    let request = prompts::compose(form);
    info!(
        "[generate] requesting website generation with {} ({} prompt chars)",
        config.generation_model,
        request.prompt.len()
    );

    let artifacts = generation::generate(&api_key, &config.generation_model, &request).await?;
    info!(
        "[generate] text generation done: {} html bytes, {} image prompts",
        artifacts.html.len(),
        artifacts.image_prompts.len()
    );

    let assets = if form.generate_images && !artifacts.image_prompts.is_empty() {
        let image_key = config.openai_image_api_key.clone().ok_or_else(|| {
            "Image generation requires an OpenAI API key in Settings > API".to_string()
        })?;
        generation::generate_images(&image_key, &artifacts.image_prompts).await?
    } else {
        Vec::new()
    };

    Ok((artifacts, assets))
}

/// Applies the pipeline result to the shared state and shapes the UI
/// response. Loading is cleared on both paths.
fn finish_generation(
    state: &tauri::State<'_, AppState>,
    result: Result<(GeneratedArtifacts, Vec<ImageAsset>), String>,
) -> Result<GenerationOutcome, String> {
    let mut guard = state.generation.lock().unwrap();
    match result {
        Ok((artifacts, assets)) => {
            info!(
                "[generate] success: {} image assets attached",
                assets.len()
            );
            let outcome = GenerationOutcome {
                image_count: assets.len(),
                server_file_name: artifacts.server_file_name.clone(),
                archive_name: archive::archive_file_name(
                    guard.form.as_ref().map(|f| f.title.as_str()).unwrap_or(""),
                ),
            };
            *guard = guard.generation_succeeded(artifacts, assets);
            Ok(outcome)
        }
        Err(message) => {
            error!("[generate] generation failed: {}", message);
            *guard = guard.generation_failed(message.clone());
            Err(message)
        }
    }
}

#[command]
async fn generate_website(
    state: tauri::State<'_, AppState>,
    form: FormState,
) -> Result<GenerationOutcome, String> {
    {
        let mut guard = state.generation.lock().unwrap();
        *guard = guard.submit(form.clone());
    }
    let result = run_generation_pipeline(&form).await;
    finish_generation(&state, result)
}

#[command]
async fn regenerate_website(
    state: tauri::State<'_, AppState>,
) -> Result<GenerationOutcome, String> {
    let form = {
        let mut guard = state.generation.lock().unwrap();
        // Clears the prior result before the new attempt resolves
        *guard = guard.regenerate_requested()?;
        guard
            .form
            .clone()
            .ok_or_else(|| "Missing form snapshot".to_string())?
    };
    let result = run_generation_pipeline(&form).await;
    finish_generation(&state, result)
}

#[command]
fn get_generation_status(state: tauri::State<'_, AppState>) -> Result<GenerationStatus, String> {
    let guard = state.generation.lock().unwrap();
    Ok(GenerationStatus {
        loading: guard.loading,
        has_artifacts: guard.artifacts.is_some(),
        image_count: guard.assets.len(),
        error: guard.error.clone(),
        started_at: guard.started_at.clone(),
    })
}

#[command]
fn get_artifacts(
    state: tauri::State<'_, AppState>,
) -> Result<Option<GeneratedArtifacts>, String> {
    let guard = state.generation.lock().unwrap();
    Ok(guard.artifacts.clone())
}

#[command]
fn edit_artifact(
    state: tauri::State<'_, AppState>,
    field: String,
    value: String,
) -> Result<(), String> {
    let mut guard = state.generation.lock().unwrap();
    *guard = guard.edit_field(&field, value)?;
    Ok(())
}

#[command]
fn get_preview_document(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let guard = state.generation.lock().unwrap();
    guard.preview_document()
}

#[command]
fn list_image_assets(state: tauri::State<'_, AppState>) -> Result<Vec<AssetInfo>, String> {
    let guard = state.generation.lock().unwrap();
    let html = guard
        .artifacts
        .as_ref()
        .map(|a| a.html.as_str())
        .unwrap_or("");
    Ok(guard
        .assets
        .iter()
        .map(|asset| AssetInfo {
            file_name: asset.file_name.clone(),
            alt_text: asset.alt_text.clone(),
            byte_len: asset.bytes.len(),
            referenced: html.contains(&format!("\"{}\"", asset.file_name))
                || html.contains(&format!("'{}'", asset.file_name)),
        })
        .collect())
}

// ============ Export Commands ============

fn build_current_archive(
    state: &tauri::State<'_, AppState>,
) -> Result<(Vec<u8>, String), String> {
    let guard = state.generation.lock().unwrap();
    let artifacts = guard
        .artifacts
        .clone()
        .ok_or_else(|| "No generated website to download".to_string())?;
    let title = guard
        .form
        .as_ref()
        .map(|f| f.title.clone())
        .unwrap_or_default();
    let assets = guard.assets.clone();
    drop(guard);

    let bytes = archive::build_archive(&artifacts, &assets)?;
    Ok((bytes, archive::archive_file_name(&title)))
}

/// Opens a save dialog and writes the zip; returns None when the user
/// cancels
#[command]
async fn download_archive(
    app: AppHandle,
    state: tauri::State<'_, AppState>,
) -> Result<Option<String>, String> {
    let (bytes, name) = build_current_archive(&state)?;

    let picked = app
        .dialog()
        .file()
        .set_file_name(&name)
        .add_filter("Zip archive", &["zip"])
        .blocking_save_file();

    let Some(file_path) = picked else {
        info!("[download_archive] save dialog cancelled");
        return Ok(None);
    };
    let path = match file_path {
        tauri_plugin_dialog::FilePath::Path(p) => p,
        tauri_plugin_dialog::FilePath::Url(u) => PathBuf::from(u.path()),
    };

    std::fs::write(&path, &bytes).map_err(|e| format!("Failed to write archive: {}", e))?;
    info!("[download_archive] wrote {} bytes to {:?}", bytes.len(), path);
    Ok(Some(path.to_string_lossy().to_string()))
}

/// Writes the zip without a dialog, defaulting to the Downloads folder
#[command]
fn export_archive(
    state: tauri::State<'_, AppState>,
    dest_dir: Option<String>,
) -> Result<String, String> {
    let (bytes, name) = build_current_archive(&state)?;
    let dir = match dest_dir {
        Some(d) => PathBuf::from(d),
        None => get_downloads_dir()?,
    };
    std::fs::create_dir_all(&dir).map_err(|e| format!("Failed to create directory: {}", e))?;
    let path = dir.join(name);
    std::fs::write(&path, &bytes).map_err(|e| format!("Failed to write archive: {}", e))?;
    info!("[export_archive] wrote {} bytes to {:?}", bytes.len(), path);
    Ok(path.to_string_lossy().to_string())
}

/// Writes the archive layout as plain files into a fresh session folder
/// under the export workspace
#[command]
fn export_site_folder(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let (artifacts, assets) = {
        let guard = state.generation.lock().unwrap();
        let artifacts = guard
            .artifacts
            .clone()
            .ok_or_else(|| "No generated website to export".to_string())?;
        (artifacts, guard.assets.clone())
    };

    let workspace_root = get_export_workspace_dir()?;
    std::fs::create_dir_all(&workspace_root)
        .map_err(|e| format!("Failed to create export workspace root: {}", e))?;

    let session_name = format!("site-{}", chrono::Utc::now().format("%Y%m%d-%H%M%S"));
    let target_dir = workspace_root.join(session_name);
    std::fs::create_dir_all(&target_dir)
        .map_err(|e| format!("Failed to create export session: {}", e))?;

    let written = archive::export_site_dir(&artifacts, &assets, &target_dir)?;
    info!(
        "[export_site_folder] wrote {} files to {:?}",
        written.len(),
        target_dir
    );
    Ok(target_dir.to_string_lossy().to_string())
}

/// Reveals an export session folder in the OS file manager
#[command]
async fn open_export_folder(folder: String) -> Result<(), String> {
    let workspace_root = get_export_workspace_dir()?;
    std::fs::create_dir_all(&workspace_root)
        .map_err(|e| format!("Failed to create export workspace root: {}", e))?;

    let requested = PathBuf::from(folder);
    let target_dir = if requested.is_absolute() {
        requested
    } else {
        workspace_root.join(requested)
    };

    let canonical_root = std::fs::canonicalize(&workspace_root)
        .map_err(|e| format!("Failed to resolve workspace root: {}", e))?;
    let canonical_target = std::fs::canonicalize(&target_dir)
        .map_err(|e| format!("Failed to resolve export directory: {}", e))?;

    if !canonical_target.starts_with(&canonical_root) {
        return Err("Folder is outside the export workspace".to_string());
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(&canonical_target)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("explorer")
            .arg(&canonical_target)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    #[cfg(all(not(target_os = "macos"), not(target_os = "windows")))]
    {
        std::process::Command::new("xdg-open")
            .arg(&canonical_target)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    Ok(())
}

// ============ Misc Commands ============

#[command]
fn log_from_frontend(level: String, message: String) {
    match level.as_str() {
        "error" => error!("[frontend] {}", message),
        "warn" => log::warn!("[frontend] {}", message),
        _ => info!("[frontend] {}", message),
    }
}

#[command]
fn clear_all_data() -> Result<(), String> {
    info!("[clear_all_data] Clearing all application data");
    clear_app_data()
}

#[command]
fn quit_app() {
    std::process::exit(0);
}

fn main() {
    tauri::Builder::default()
        .manage(AppState::default())
        .setup(|_app| {
            info!("=== SiteSmith Desktop Starting ===");
            if let Ok(app_dir) = get_app_data_dir() {
                info!("[startup] App data directory: {:?}", app_dir);
            }
            if let Ok(config) = load_llm_config() {
                info!("[startup] Generation model: {}", config.generation_model);
            }
            Ok(())
        })
        .plugin(tauri_plugin_dialog::init())
        .plugin(
            tauri_plugin_log::Builder::new()
                .target(tauri_plugin_log::Target::new(
                    tauri_plugin_log::TargetKind::LogDir {
                        file_name: Some("sitesmith.log".into()),
                    },
                ))
                .level(log::LevelFilter::Info)
                .build(),
        )
        .invoke_handler(tauri::generate_handler![
            save_api_key,
            has_api_key,
            save_image_api_key,
            has_image_api_key,
            get_generation_model,
            set_generation_model,
            generate_website,
            regenerate_website,
            get_generation_status,
            get_artifacts,
            edit_artifact,
            get_preview_document,
            list_image_assets,
            download_archive,
            export_archive,
            export_site_folder,
            open_export_folder,
            log_from_frontend,
            clear_all_data,
            quit_app,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
