//! Path utilities and file system helpers

use std::path::PathBuf;

/// Gets the application data directory
pub fn get_app_data_dir() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|p| p.join("com.sitesmith.desktop"))
        .ok_or_else(|| "Could not find app data directory".to_string())
}

/// Clears all application data
pub fn clear_app_data() -> Result<(), String> {
    let app_dir = get_app_data_dir()?;
    if app_dir.exists() {
        std::fs::remove_dir_all(&app_dir)
            .map_err(|e| format!("Failed to clear app data: {}", e))?;
    }
    Ok(())
}

/// Gets the LLM configuration file path
pub fn get_llm_config_path() -> Result<PathBuf, String> {
    get_app_data_dir().map(|p| p.join(".llm_config.json"))
}

/// Gets the root directory for exported site folders
pub fn get_export_workspace_dir() -> Result<PathBuf, String> {
    get_app_data_dir().map(|p| p.join("exports"))
}

/// Gets the user's Downloads directory, used as the default archive
/// destination when no explicit path is given
pub fn get_downloads_dir() -> Result<PathBuf, String> {
    dirs::download_dir().ok_or_else(|| "Could not find downloads directory".to_string())
}
