//! Command-line entry point for Bolota documents.
//!
//! # Responsibility
//! - Open, check and create documents through `bolota_core` only.
//! - Map "newer version" failures to their own exit code.

use bolota_core::{
    init_logging, open_document, save_document, Document, Field, FileError, LoggingConfig,
};
use clap::{Parser, Subcommand};
use log::warn;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 1;
const EXIT_NEWER_VERSION: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "bolota", version, about = "Inspect and create Bolota outline documents")]
struct Cli {
    /// Log level: trace|debug|info|warn|error. Falls back to BOLOTA_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Falls back to BOLOTA_LOG_DIR;
    /// logging is off when neither is set.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the document properties and its outline.
    Show { path: PathBuf },
    /// Validate a document and report its topic count.
    Check { path: PathBuf },
    /// Write the example document.
    Example { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let started = LoggingConfig::from_env_or(cli.log_level.as_deref(), cli.log_dir.as_deref())
        .and_then(|config| config.map_or(Ok(()), |config| init_logging(&config)));
    if let Err(err) = started {
        eprintln!("logging disabled: {err}");
    }

    let result = match &cli.command {
        Command::Show { path } => open_document(path).map(|doc| print!("{}", render(&doc))),
        Command::Check { path } => open_document(path).map(|doc| {
            println!(
                "{}: ok, {} topics ({} top-level)",
                path.display(),
                doc.topic_count(),
                doc.topics().len()
            );
        }),
        Command::Example { path } => save_document(&Document::example(), path)
            .map(|()| println!("wrote example document to {}", path.display())),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn report(err: &FileError) -> ExitCode {
    if err.is_newer_version() {
        warn!("event=cli_open module=cli status=error error_code=newer_version");
        eprintln!("{err}\nUpgrade bolota to open this document.");
        return ExitCode::from(EXIT_NEWER_VERSION);
    }
    eprintln!("{err}");
    ExitCode::from(EXIT_FAILURE)
}

/// Renders properties followed by an indented outline.
fn render(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n", doc.title()));
    if !doc.subtitle().is_empty() {
        out.push_str(&format!("{}\n", doc.subtitle()));
    }
    out.push_str(&format!("created {} UTC\n\n", doc.created()));

    let tree = doc.tree();
    for (id, depth) in tree.preorder(tree.root()) {
        let Some(field) = tree.get(id) else {
            continue;
        };
        let indent = "  ".repeat(depth);
        match field {
            Field::Blank => out.push('\n'),
            Field::Icon { icon, .. } => {
                out.push_str(&format!("{indent}[{icon}] {}\n", field.display_text()))
            }
            _ => out.push_str(&format!("{indent}- {}\n", field.display_text())),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{render, Cli};
    use bolota_core::{Document, Field, IconId, Timestamp};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_flags_are_optional() {
        let cli = Cli::try_parse_from(["bolota", "check", "a.bol"]).unwrap();
        assert_eq!(cli.log_level, None);
        assert_eq!(cli.log_dir, None);

        let cli = Cli::try_parse_from(["bolota", "show", "a.bol", "--log-level", "warn"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn render_indents_by_depth() {
        let mut doc = Document::with_created(Timestamp::new(2024, 1, 2, 3, 4, 5).unwrap());
        doc.set_title("Plan");
        let a = doc.push_topic(Field::text("a"));
        doc.push_child(a, Field::icon("b", IconId(4))).unwrap();
        doc.push_topic(Field::blank());
        doc.push_topic(Field::date("c", Timestamp::new(2024, 5, 6, 7, 8, 9).unwrap()));

        assert_eq!(
            render(&doc),
            "# Plan\ncreated 2024-01-02 03:04:05 UTC\n\n- a\n  [4] b\n\n- (2024-05-06 07:08) c\n"
        );
    }
}
