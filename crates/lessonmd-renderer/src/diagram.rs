//! Mermaid diagram rendering seam.

/// How `mermaid` fences are emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MermaidMode {
    /// Emit the escaped diagram source for the client-side Mermaid script.
    #[default]
    Client,
    /// Embed SVG produced by a [`DiagramRenderer`] at conversion time.
    Server,
}

/// Error from an external diagram renderer.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("diagram renderer is not available: {0}")]
    Unavailable(String),
    #[error("diagram renderer failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Turns Mermaid source into inline SVG markup.
///
/// Implementations must be usable from several conversions at once.
pub trait DiagramRenderer: Send + Sync {
    fn render(&self, source: &str) -> Result<String, DiagramError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_client() {
        assert_eq!(MermaidMode::default(), MermaidMode::Client);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DiagramError::Failed("exit status 1".to_owned()).to_string(),
            "diagram renderer failed: exit status 1"
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "mmdc");
        assert_eq!(DiagramError::from(io).to_string(), "mmdc");
    }
}
