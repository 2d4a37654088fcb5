//! lessonmd CLI - lesson markdown to HTML.
//!
//! Reads a markdown document from stdin and writes an HTML fragment to
//! stdout. The `--print-*` flags write one of the bundled assets instead.
//!
//! ```text
//! cat lesson.md | lessonmd > lesson.html
//! lessonmd --print-stylesheet -c lesson-item > lesson.css
//! ```

mod diagram;
mod error;
mod output;

use std::io::{Read, Write};
use std::path::PathBuf;

use clap::Parser;
use lessonmd_config::{CliSettings, Config};
use lessonmd_renderer::{ConvertOptions, Converter, MermaidMode, assets};
use tracing_subscriber::EnvFilter;

use diagram::MmdcRenderer;
use error::CliError;
use output::Output;

/// Minimal Markdown to HTML converter with extensions for technical course
/// content.
#[derive(Parser, Debug)]
#[command(name = "lessonmd", version, about)]
struct Cli {
    /// Do not wrap output with outer <div> tag.
    #[arg(long)]
    no_wrap: bool,

    /// Class name for the outer div (default: item).
    #[arg(short = 'c', long)]
    wrapper_class: Option<String>,

    /// Include Highlight.js loader and copy-to-clipboard buttons.
    #[arg(long)]
    include_highlight_js: bool,

    /// Include the client-side Mermaid loader.
    #[arg(long)]
    include_mermaid_js: bool,

    /// Include the client-side tabs script.
    #[arg(long)]
    include_tabs_js: bool,

    /// Include the stylesheet in a <style> tag.
    #[arg(long)]
    include_stylesheet: bool,

    /// Render YAML front matter as a table instead of dropping it.
    #[arg(long)]
    include_frontmatter: bool,

    /// Embed Mermaid diagrams as SVG rendered with mmdc.
    #[arg(long)]
    use_mermaid_svg_renderer: bool,

    /// Print the stylesheet scoped to the wrapper class and exit.
    #[arg(long)]
    print_stylesheet: bool,

    /// Print the Highlight.js loader and exit.
    #[arg(long)]
    print_highlight_js: bool,

    /// Print the Mermaid loader and exit.
    #[arg(long)]
    print_mermaid_js: bool,

    /// Print the tabs script and exit.
    #[arg(long)]
    print_tabs_js: bool,

    /// Path to configuration file (default: auto-discover .lessonmd.yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mermaid CLI used for server-side diagrams.
    #[arg(long, env = "LESSONMD_MMDC", default_value = "mmdc")]
    mmdc: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    /// Flags given on the command line, as overrides for the config file.
    fn settings(&self) -> CliSettings {
        let flag = |set: bool| set.then_some(true);
        CliSettings {
            no_wrap: flag(self.no_wrap),
            wrapper_class: self.wrapper_class.clone(),
            include_highlight_js: flag(self.include_highlight_js),
            include_mermaid_js: flag(self.include_mermaid_js),
            include_tabs_js: flag(self.include_tabs_js),
            include_stylesheet: flag(self.include_stylesheet),
            include_frontmatter: flag(self.include_frontmatter),
            use_mermaid_svg_renderer: flag(self.use_mermaid_svg_renderer),
        }
    }

    /// Asset requested by a `--print-*` flag, if any.
    fn printed_asset(&self, wrapper_class: &str) -> Option<String> {
        if self.print_highlight_js {
            Some(assets::highlight_js(wrapper_class))
        } else if self.print_mermaid_js {
            Some(assets::mermaid_js().to_owned())
        } else if self.print_tabs_js {
            Some(assets::tabs_js().to_owned())
        } else if self.print_stylesheet {
            Some(assets::stylesheet(wrapper_class))
        } else {
            None
        }
    }
}

fn convert_options(config: &Config) -> ConvertOptions {
    ConvertOptions {
        wrap: !config.no_wrap,
        wrapper_class: config.wrapper_class.clone(),
        include_stylesheet: config.include_stylesheet,
        include_highlight_js: config.include_highlight_js,
        include_mermaid_js: config.include_mermaid_js,
        include_tabs_js: config.include_tabs_js,
        mermaid_mode: if config.use_mermaid_svg_renderer {
            MermaidMode::Server
        } else {
            MermaidMode::Client
        },
        include_front_matter: config.include_frontmatter,
        ..ConvertOptions::default()
    }
}

/// Load configuration. A broken discovered config falls back to defaults.
fn load_config(cli: &Cli, output: &Output) -> Result<Config, CliError> {
    let settings = cli.settings();
    match Config::load(cli.config.as_deref(), Some(&settings)) {
        Ok(config) => Ok(config),
        Err(err) if cli.config.is_none() => {
            output.config_fallback(&err);
            let mut config = Config::default();
            config.apply_cli_settings(&settings);
            config.validate()?;
            Ok(config)
        }
        Err(err) => Err(err.into()),
    }
}

fn run(cli: &Cli, output: &Output) -> Result<(), CliError> {
    let config = load_config(cli, output)?;
    let mut stdout = std::io::stdout().lock();

    if let Some(asset) = cli.printed_asset(&config.wrapper_class) {
        stdout.write_all(asset.as_bytes())?;
        return Ok(());
    }

    let mut input = Vec::new();
    std::io::stdin().lock().read_to_end(&mut input)?;

    let mut converter = Converter::new(convert_options(&config));
    if config.use_mermaid_svg_renderer {
        converter = converter.with_diagram_renderer(MmdcRenderer::new(cli.mmdc.clone()));
    }
    let conversion = converter.run(&input)?;
    tracing::debug!(
        input = input.len(),
        output = conversion.html.len(),
        warnings = conversion.warnings.len(),
        "converted document"
    );

    stdout.write_all(conversion.html.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&cli, &output) {
        output.conversion_failed(&err);
        std::process::exit(1);
    }
}
