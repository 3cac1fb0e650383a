//! Loading of external assets.
//!
//! Everything goes through [`load_binary`]: absolute `http(s)` URLs are fetched
//! with reqwest, anything else is a path below `assets/` (next to the binary's
//! working directory natively, below the page origin in the browser).

use std::path::PathBuf;

use crate::data_structures::texture::Texture;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid asset location {0}")]
    Location(String),

    #[error("script {0} failed to load")]
    Script(String),
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Local path an asset name resolves to on native targets.
pub fn local_path(file_name: &str) -> PathBuf {
    std::path::Path::new("./").join("assets").join(file_name)
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url, AssetError> {
    let invalid = || AssetError::Location(file_name.to_string());
    let origin = web_sys::window()
        .and_then(|window| window.location().origin().ok())
        .ok_or_else(invalid)?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin)).map_err(|_| invalid())?;
    base.join(file_name).map_err(|_| invalid())
}

async fn fetch(url: reqwest::Url) -> Result<Vec<u8>, AssetError> {
    let fetch_error = |source| AssetError::Fetch {
        url: url.to_string(),
        source,
    };
    let response = reqwest::get(url.clone())
        .await
        .and_then(|response| response.error_for_status())
        .map_err(fetch_error)?;
    let bytes = response.bytes().await.map_err(fetch_error)?;
    Ok(bytes.to_vec())
}

pub async fn load_binary(location: &str) -> Result<Vec<u8>, AssetError> {
    if is_remote(location) {
        let url = reqwest::Url::parse(location)
            .map_err(|_| AssetError::Location(location.to_string()))?;
        return fetch(url).await;
    }

    #[cfg(target_arch = "wasm32")]
    let data = fetch(format_url(location)?).await?;
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = local_path(location);
        tokio::fs::read(&path)
            .await
            .map_err(|source| AssetError::Io { path, source })?
    };

    log::debug!("Loaded {} ({} bytes)", location, data.len());
    Ok(data)
}

pub async fn load_texture(
    location: &str,
    is_normal_map: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<Texture, AssetError> {
    let data = load_binary(location).await?;
    Texture::from_bytes(device, queue, &data, location, is_normal_map).map_err(|source| {
        AssetError::Decode {
            name: location.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_locations_are_recognised() {
        assert!(is_remote("https://threejs.org/examples/textures/waternormals.jpg"));
        assert!(is_remote("http://localhost:8080/a.png"));
        assert!(!is_remote("waternormals.jpg"));
        assert!(!is_remote("textures/https.png"));
    }

    #[test]
    fn local_names_resolve_below_assets() {
        assert_eq!(local_path("waternormals.jpg"), PathBuf::from("./assets/waternormals.jpg"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test]
    async fn missing_local_file_is_an_io_error() {
        let err = load_binary("does/not/exist.png").await.unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }), "{}", err);
    }
}
