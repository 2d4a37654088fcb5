//! Server-side Mermaid rendering through the `mmdc` command line tool.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use lessonmd_renderer::{DiagramError, DiagramRenderer};

/// Renders diagrams by running `mmdc` in a scratch directory.
#[derive(Debug)]
pub(crate) struct MmdcRenderer {
    program: PathBuf,
}

impl MmdcRenderer {
    pub(crate) fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

impl DiagramRenderer for MmdcRenderer {
    fn render(&self, source: &str) -> Result<String, DiagramError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("diagram.mmd");
        let output = dir.path().join("diagram.svg");
        fs::write(&input, source)?;

        let result = Command::new(&self.program)
            .arg("--quiet")
            .arg("--input")
            .arg(&input)
            .arg("--output")
            .arg(&output)
            .arg("--backgroundColor")
            .arg("transparent")
            .output();

        let finished = match result {
            Ok(finished) => finished,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DiagramError::Unavailable(format!(
                    "{} not found",
                    self.program.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        if !finished.status.success() {
            let stderr = String::from_utf8_lossy(&finished.stderr);
            return Err(DiagramError::Failed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                finished.status,
                stderr.trim()
            )));
        }

        let svg = fs::read_to_string(&output)?;
        tracing::debug!(bytes = svg.len(), "rendered diagram with mmdc");
        Ok(svg.trim_end().to_owned())
    }
}
