use crate::config::LayersConfig;
use crate::types::ArchLayer;

/// Assigns architectural layers from path segments, then file content.
pub struct LayerClassifier {
    groups: Vec<(ArchLayer, Vec<String>)>,
}

impl LayerClassifier {
    pub fn new(config: &LayersConfig) -> Self {
        let groups = config
            .groups()
            .into_iter()
            .map(|(layer, words)| {
                (
                    layer,
                    words.iter().map(|w| w.to_ascii_lowercase()).collect(),
                )
            })
            .collect();
        Self { groups }
    }

    /// First match wins: path keyword, then content tokens, then `Unknown`.
    pub fn classify(&self, path: &str, content: &str) -> ArchLayer {
        self.classify_path(path)
            .or_else(|| classify_content(content))
            .unwrap_or(ArchLayer::Unknown)
    }

    /// Layer whose keyword equals one of the path's segments.
    pub fn classify_path(&self, path: &str) -> Option<ArchLayer> {
        let lower = path.to_ascii_lowercase().replace('\\', "/");
        let segments: Vec<&str> = lower.split('/').collect();
        self.groups
            .iter()
            .find(|(_, words)| words.iter().any(|w| segments.contains(&w.as_str())))
            .map(|(layer, _)| *layer)
    }
}

fn classify_content(content: &str) -> Option<ArchLayer> {
    if content.contains("React") || content.contains("useState") {
        Some(ArchLayer::Frontend)
    } else if content.contains("app.get") || content.contains("router.") {
        Some(ArchLayer::Backend)
    } else if content.contains("Schema") || content.contains("Model") {
        Some(ArchLayer::Data)
    } else {
        None
    }
}
