//! Render preview provider
//!
//! Holds the most recent rendering of the active file. Renderers publish into
//! it, the controller only reads it (and clears it on teardown).

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewKind {
    Html,
    /// Non-HTML output (errors, plain text), tagged with its type
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewArtifact {
    pub kind: PreviewKind,
    pub content: String,
}

impl PreviewArtifact {
    pub fn new(kind: PreviewKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    pub fn html(content: impl Into<String>) -> Self {
        Self::new(PreviewKind::Html, content)
    }

    pub fn is_html(&self) -> bool {
        self.kind == PreviewKind::Html
    }
}

/// Shared handle to the latest preview
#[derive(Debug, Clone)]
pub struct PreviewHandle {
    tx: Arc<watch::Sender<Option<PreviewArtifact>>>,
}

impl Default for PreviewHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn publish(&self, artifact: PreviewArtifact) {
        self.tx.send_replace(Some(artifact));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn latest(&self) -> Option<PreviewArtifact> {
        self.tx.borrow().clone()
    }

    /// Content of the latest preview when it is HTML
    pub fn html_content(&self) -> Option<String> {
        self.tx
            .borrow()
            .as_ref()
            .filter(|a| a.is_html())
            .map(|a| a.content.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PreviewArtifact>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_content_requires_html_kind() {
        let preview = PreviewHandle::new();
        assert!(preview.html_content().is_none());

        preview.publish(PreviewArtifact::new(
            PreviewKind::Other("error".to_string()),
            "Line 3: unclosed tag",
        ));
        assert!(preview.latest().is_some());
        assert!(preview.html_content().is_none());

        preview.publish(PreviewArtifact::html("<html></html>"));
        assert_eq!(preview.html_content().as_deref(), Some("<html></html>"));
    }

    #[test]
    fn test_clear_is_seen_by_subscribers() {
        let preview = PreviewHandle::new();
        let rx = preview.subscribe();
        preview.publish(PreviewArtifact::html("<p/>"));
        assert!(rx.borrow().is_some());

        preview.clear();
        assert!(rx.borrow().is_none());
        assert!(preview.latest().is_none());
    }
}
