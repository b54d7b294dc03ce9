// Command-line front end for docshrink.
//
// Takes exactly one document path, renders pipeline progress on stdout and
// optionally a JSON report on stderr.

use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{ArgAction, Parser, ValueEnum, ValueHint};

use crate::config::{self, ShrinkOptions};
use crate::pipeline::{self, ProgressEvent, ShrinkOutcome, ShrinkStatus};
use crate::recompress::{DEFAULT_QUALITY, JpegSettings};
use crate::tools::{ExternalTools, NativeTools, Toolkit, TrashCommand};

const EXIT_USAGE: i32 = 1;
const EXIT_FAILURE: i32 = 2;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Shrink office documents by recompressing their embedded images.
#[derive(Parser, Debug)]
#[command(name = "docshrink", version, about = "Recompress images inside ZIP-based documents")]
struct Cli {
    /// Document to shrink (.docx, .pptx, .xlsx, .odt, ...).
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    file: String,

    /// JPEG quality for recompressed images (1-100).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100), default_value_t = DEFAULT_QUALITY)]
    quality: u8,

    /// Skip Huffman table optimization (faster, slightly larger images).
    #[arg(long = "no-optimize")]
    no_optimize: bool,

    /// How archives are extracted and repacked.
    #[arg(long, value_enum, default_value_t = BackendArg::Native)]
    backend: BackendArg,

    /// Parent directory for the scratch workspace.
    #[arg(long = "cache-dir", value_hint = ValueHint::DirPath)]
    cache_dir: Option<PathBuf>,

    /// Command used to move the original to the trash (path is appended).
    #[arg(long = "trash-command", value_name = "CMD")]
    trash_command: Option<String>,

    /// Quiet mode (suppress progress output).
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose logging (use multiple times for more detail).
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Output a JSON report to stderr.
    #[arg(long = "json")]
    json_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// Built-in ZIP support.
    Native,
    /// `unzip` and `zip` from PATH.
    External,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

struct Options {
    target: PathBuf,
    shrink: ShrinkOptions,
    backend: BackendArg,
    trash: TrashCommand,
    quiet: bool,
    verbose: u8,
    json_output: bool,
}

fn resolve_options(cli: Cli) -> Options {
    let trash = cli
        .trash_command
        .as_deref()
        .map(TrashCommand::parse)
        .unwrap_or_default();

    Options {
        target: config::normalize_input_arg(&cli.file),
        shrink: ShrinkOptions {
            cache_root: cli.cache_dir.unwrap_or_else(config::default_cache_root),
            jpeg: JpegSettings {
                quality: cli.quality,
                optimize: !cli.no_optimize,
            },
        },
        backend: cli.backend,
        trash,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
    }
}

fn build_toolkit(opts: &Options) -> Box<dyn Toolkit> {
    match opts.backend {
        BackendArg::Native => Box::new(NativeTools::new(opts.trash.clone())),
        BackendArg::External => Box::new(ExternalTools::new(opts.trash.clone())),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_event(event: ProgressEvent<'_>) {
    match event {
        ProgressEvent::Extracting { .. } => println!("Extracting document..."),
        ProgressEvent::Compressing { images } => println!("Compressing {images} images..."),
        ProgressEvent::Image { name, size } => println!("  compressed {name}: {size}"),
        // Already reported through the logger.
        ProgressEvent::ImageFailed { .. } => {}
        ProgressEvent::Repacking => println!("Repacking..."),
        ProgressEvent::Unchanged { .. } => println!("File size unchanged"),
        ProgressEvent::Committed { size } => println!("Done: {size}"),
    }
}

fn json_report(opts: &Options, outcome: &ShrinkOutcome) -> serde_json::Value {
    let status = match outcome.status {
        ShrinkStatus::Committed => "committed",
        ShrinkStatus::Unchanged => "unchanged",
    };
    let failures: Vec<_> = outcome
        .report
        .failures
        .iter()
        .map(|f| {
            serde_json::json!({
                "path": f.path.display().to_string(),
                "kind": f.kind,
                "message": f.message,
            })
        })
        .collect();
    let images = outcome.report.total();

    serde_json::json!({
        "file": opts.target.display().to_string(),
        "status": status,
        "before": outcome.size.before,
        "after": outcome.size.after,
        "ratio": outcome.size.ratio(),
        "images": {
            "processed": outcome.report.images.len(),
            "before": images.before,
            "after": images.after,
        },
        "failures": failures,
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_logging(quiet: bool, verbose: u8) {
    let default_filter = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                println!("{}", err.render());
                process::exit(EXIT_USAGE);
            }
        },
    }
}

fn execute(opts: &Options) -> i32 {
    let tools = build_toolkit(opts);
    let quiet = opts.quiet;
    let result = pipeline::shrink(&opts.target, &opts.shrink, tools.as_ref(), |event| {
        if !quiet {
            print_event(event);
        }
    });

    match result {
        Ok(outcome) => {
            if opts.verbose > 0 && !outcome.report.failures.is_empty() {
                log::info!("{} images skipped", outcome.report.failures.len());
            }
            if opts.json_output {
                let report = json_report(opts, &outcome);
                match serde_json::to_string_pretty(&report) {
                    Ok(text) => eprintln!("{text}"),
                    Err(e) => log::error!("json report: {e}"),
                }
            }
            0
        }
        Err(e) => {
            eprintln!("docshrink: {e}");
            EXIT_FAILURE
        }
    }
}

/// Main CLI entry point. Parses arguments via clap and runs the pipeline.
pub fn run() -> ! {
    let opts = resolve_options(parse_cli());
    init_logging(opts.quiet, opts.verbose);
    process::exit(execute(&opts));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::SizeChange;
    use std::path::Path;

    fn try_parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let argv: Vec<String> = std::iter::once("docshrink".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        Cli::try_parse_from(argv)
    }

    fn parse_opts(args: &[&str]) -> Options {
        resolve_options(try_parse(args).expect("cli parse failed"))
    }

    #[test]
    fn defaults() {
        let opts = parse_opts(&["report.docx"]);
        assert_eq!(opts.target, PathBuf::from("report.docx"));
        assert_eq!(opts.shrink.jpeg, JpegSettings::default());
        assert_eq!(opts.backend, BackendArg::Native);
        assert_eq!(opts.trash, TrashCommand::default());
        assert_eq!(opts.shrink.cache_root, config::default_cache_root());
        assert!(!opts.quiet);
        assert!(!opts.json_output);
    }

    #[test]
    fn positional_count_is_exactly_one() {
        assert!(try_parse(&[]).is_err());
        assert!(try_parse(&["a.docx", "b.docx"]).is_err());
    }

    #[test]
    fn quoted_windows_path_is_normalized() {
        let opts = parse_opts(&[r#""docs\q3\deck.pptx""#]);
        assert_eq!(opts.target, PathBuf::from("docs/q3/deck.pptx"));
    }

    #[test]
    fn tuning_flags_parse() {
        let opts = parse_opts(&[
            "--quality",
            "70",
            "--no-optimize",
            "--backend",
            "external",
            "--cache-dir",
            "/tmp/shrink-cache",
            "--trash-command",
            "trash-put",
            "--json",
            "deck.pptx",
        ]);
        assert_eq!(opts.shrink.jpeg.quality, 70);
        assert!(!opts.shrink.jpeg.optimize);
        assert_eq!(opts.backend, BackendArg::External);
        assert_eq!(opts.shrink.cache_root, Path::new("/tmp/shrink-cache"));
        assert_eq!(opts.trash.argv(), ["trash-put"]);
        assert!(opts.json_output);
    }

    #[test]
    fn quality_is_range_checked() {
        assert!(try_parse(&["--quality", "0", "a.docx"]).is_err());
        assert!(try_parse(&["--quality", "101", "a.docx"]).is_err());
        assert!(try_parse(&["--quality", "100", "a.docx"]).is_ok());
    }

    #[test]
    fn verbose_is_capped_and_excludes_quiet() {
        assert_eq!(parse_opts(&["-vvv", "a.docx"]).verbose, 2);
        assert!(try_parse(&["-q", "-v", "a.docx"]).is_err());
    }

    #[test]
    fn json_report_shape() {
        let opts = parse_opts(&["a.docx"]);
        let outcome = ShrinkOutcome {
            status: ShrinkStatus::Committed,
            size: SizeChange::new(1000, 600),
            report: pipeline::BatchReport {
                images: vec![pipeline::ImageRecord {
                    path: "word/media/image1.png".into(),
                    size: SizeChange::new(500, 100),
                }],
                failures: vec![pipeline::ImageFailure {
                    path: "word/media/broken.jpg".into(),
                    kind: "decode",
                    message: "decode error: bad".to_string(),
                }],
            },
        };
        let json = json_report(&opts, &outcome);
        assert_eq!(json["status"], "committed");
        assert_eq!(json["before"], 1000);
        assert_eq!(json["after"], 600);
        assert_eq!(json["images"]["processed"], 1);
        assert_eq!(json["images"]["after"], 100);
        assert_eq!(json["failures"][0]["kind"], "decode");
    }
}
