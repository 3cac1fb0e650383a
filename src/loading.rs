//! Progress of the asynchronous asset loads.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    Pending,
    Loaded,
    Failed(String),
}

/// Counts registered assets and how they resolved. A failed asset is resolved
/// too: the scene has a fallback for every asset.
#[derive(Debug, Default)]
pub struct LoadProgress {
    assets: HashMap<String, AssetState>,
}

impl LoadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str) {
        self.assets.insert(name.to_string(), AssetState::Pending);
    }

    /// Record the outcome of `name`. Unknown names are registered on the fly.
    pub fn resolve<E: std::fmt::Display>(&mut self, name: &str, result: &Result<(), E>) {
        let state = match result {
            Ok(()) => AssetState::Loaded,
            Err(e) => AssetState::Failed(e.to_string()),
        };
        self.assets.insert(name.to_string(), state);
    }

    pub fn state(&self, name: &str) -> Option<&AssetState> {
        self.assets.get(name)
    }

    pub fn resolved(&self) -> usize {
        self.assets
            .values()
            .filter(|state| **state != AssetState::Pending)
            .count()
    }

    pub fn total(&self) -> usize {
        self.assets.len()
    }

    /// Resolved share in percent. With nothing registered everything is done.
    pub fn percent(&self) -> f32 {
        if self.assets.is_empty() {
            return 100.0;
        }
        self.resolved() as f32 / self.total() as f32 * 100.0
    }

    pub fn is_loading(&self) -> bool {
        self.resolved() < self.total()
    }

    pub fn overlay_text(&self) -> String {
        format!("Loading cosmic landscape... {}%", self.percent().round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_registered_is_not_loading() {
        let progress = LoadProgress::new();
        assert!(!progress.is_loading());
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn overlay_counts_resolved_assets() {
        let mut progress = LoadProgress::new();
        progress.register("water_normals");
        progress.register("compat_script");
        progress.register("extra");
        assert_eq!(progress.overlay_text(), "Loading cosmic landscape... 0%");

        progress.resolve::<String>("water_normals", &Ok(()));
        assert_eq!(progress.overlay_text(), "Loading cosmic landscape... 33%");
        assert!(progress.is_loading());
    }

    #[test]
    fn failures_count_as_resolved() {
        let mut progress = LoadProgress::new();
        progress.register("water_normals");
        progress.register("compat_script");
        progress.resolve("water_normals", &Err("404 Not Found"));
        assert!(progress.is_loading());
        progress.resolve::<String>("compat_script", &Ok(()));
        assert!(!progress.is_loading());
        assert_eq!(
            progress.state("water_normals"),
            Some(&AssetState::Failed("404 Not Found".to_string()))
        );
    }
}
