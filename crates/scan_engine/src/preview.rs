use std::collections::BTreeMap;

use scan_core::{CapturedImage, PreviewId};
use scan_logging::scan_debug;

struct PreviewEntry {
    content_type: String,
    bytes: Vec<u8>,
}

/// Local previews of captured or selected images, addressed by URL.
/// Every published preview must be revoked once superseded.
#[derive(Default)]
pub struct PreviewRegistry {
    live: BTreeMap<PreviewId, PreviewEntry>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, preview: PreviewId, image: CapturedImage) -> String {
        self.live.insert(
            preview,
            PreviewEntry {
                content_type: image.content_type,
                bytes: image.bytes,
            },
        );
        scan_debug!("published preview {}", preview);
        preview_url(preview)
    }

    /// Returns whether the preview was live.
    pub fn revoke(&mut self, preview: PreviewId) -> bool {
        let removed = self.live.remove(&preview).is_some();
        if removed {
            scan_debug!("revoked preview {}", preview);
        }
        removed
    }

    pub fn revoke_all(&mut self) {
        self.live.clear();
    }

    pub fn url(&self, preview: PreviewId) -> Option<String> {
        self.live.contains_key(&preview).then(|| preview_url(preview))
    }

    /// Content type and bytes of a live preview.
    pub fn resolve(&self, preview: PreviewId) -> Option<(&str, &[u8])> {
        self.live
            .get(&preview)
            .map(|entry| (entry.content_type.as_str(), entry.bytes.as_slice()))
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

fn preview_url(preview: PreviewId) -> String {
    format!("preview://{preview}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_revoke() {
        let mut registry = PreviewRegistry::new();
        let url = registry.publish(1, CapturedImage::new("a.png", "image/png", vec![7]));
        assert_eq!(url, "preview://1");
        assert_eq!(registry.url(1), Some(url));
        assert_eq!(registry.resolve(1), Some(("image/png", &[7u8][..])));

        assert!(registry.revoke(1));
        assert!(!registry.revoke(1));
        assert_eq!(registry.url(1), None);
        assert_eq!(registry.live_count(), 0);
    }
}
