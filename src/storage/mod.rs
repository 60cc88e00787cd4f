use std::fs;
use std::path::{Path, PathBuf};
use crate::bom::Bom;
use crate::utils::error::StorageError;
use std::io::Write;

/// Writes the rendered report and its optional JSON metadata next to it.
pub struct StorageManager {
    output_path: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager for the given report path, creating its
    /// parent directory if it doesn't exist
    pub fn new<P: AsRef<Path>>(output_path: P) -> Result<Self, StorageError> {
        let output_path = output_path.as_ref().to_path_buf();

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(StorageError::IoError)?;
            }
        }

        Ok(Self { output_path })
    }

    /// `<output>.json`, e.g. `report.txt` -> `report.txt.json`
    pub fn metadata_path(&self) -> PathBuf {
        let mut name = self.output_path.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    }

    /// Writes the report, replacing any existing file. Content is written
    /// exactly as rendered, with no trailing newline added.
    pub fn save_report(&self, content: &str) -> Result<PathBuf, StorageError> {
        let mut file = fs::File::create(&self.output_path)
            .map_err(StorageError::IoError)?;

        file.write_all(content.as_bytes())
            .map_err(StorageError::IoError)?;

        tracing::info!("{} written successfully", self.output_path.display());

        Ok(self.output_path.clone())
    }

    /// Saves a summary of the bill of materials in JSON format
    pub fn save_bom_metadata(&self, bom: &Bom) -> Result<PathBuf, StorageError> {
        let file_path = self.metadata_path();

        let metadata = serde_json::json!({
            "title": bom.title(),
            "total_cost": bom.total_cost(),
            "currency": bom.currency_symbol(),
            "group_count": bom.group_count(),
            "item_count": bom.item_count(),
            "bill_of_materials": bom,
            "report": self.output_path.display().to_string(),
            "generated_at": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());

        Ok(file_path)
    }
}
