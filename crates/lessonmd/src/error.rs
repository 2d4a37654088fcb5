//! CLI error types.

use lessonmd_config::ConfigError;
use lessonmd_renderer::ConvertError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to convert input: {0}")]
    Convert(#[from] ConvertError),
}
