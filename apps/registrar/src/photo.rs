use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const NOT_AN_IMAGE_MESSAGE: &str = "Please select an image file";

/// Reads an image from disk and encodes it as a `data:{mime};base64,...` URL.
pub async fn load_photo(path: &Path) -> Result<String> {
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .filter(|mime| mime.starts_with("image/"));
    let Some(mime_type) = mime_type else {
        bail!(NOT_AN_IMAGE_MESSAGE);
    };

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read photo '{}'", path.display()))?;
    Ok(to_data_url(mime_type, &bytes))
}

pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}
