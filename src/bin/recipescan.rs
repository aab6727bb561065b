//! CLI binary for recipescan.
//!
//! A thin shim over the library crate: maps flags to `PipelineConfig`, runs
//! one stage (`reader`, `parser`, `export`) or drives all three as child
//! processes (`run`, the default), and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use recipescan::driver::{format_elapsed, run_stages, STAGE_COMMANDS};
use recipescan::pipeline::complete::build_completer;
use recipescan::{
    run_export, run_parser, run_reader, CommandCleaner, PipelineConfig, PipelineProgressCallback,
    ProgressCallback, SofficeConverter, Stage, StageReport, TesseractEngine,
};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One progress bar per stage, with a log line per item.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(ref bar) = *self.bar.lock().unwrap() {
            f(bar);
        }
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage, total_items: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold:>9}  [{bar:42.green/238}] {pos:>3}/{len}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(total_items as u64);
        bar.set_style(style);
        bar.set_prefix(stage.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        *self.bar.lock().unwrap() = Some(bar);
    }

    fn on_item_start(&self, _stage: Stage, item: &str) {
        self.with_bar(|bar| bar.set_message(item.to_string()));
    }

    fn on_item_complete(&self, _stage: Stage, item: &str) {
        self.with_bar(|bar| {
            bar.println(format!("  {} {}", green("✓"), item));
            bar.inc(1);
        });
    }

    fn on_item_error(&self, _stage: Stage, item: &str, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.with_bar(|bar| {
            bar.println(format!("  {} {}  {}", red("✗"), item, red(&msg)));
            bar.inc(1);
        });
    }

    fn on_stage_complete(&self, stage: Stage, total_items: usize, success_count: usize) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
        let failed = total_items.saturating_sub(success_count);
        if failed == 0 {
            eprintln!("{} {}: {} item(s)", green("✔"), bold(&stage.to_string()), success_count);
        } else {
            eprintln!(
                "{} {}: {}/{} item(s)  ({} failed)",
                red("✘"),
                bold(&stage.to_string()),
                success_count,
                total_items,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"FOLDERS (relative to --root):
  images/         photographed recipe pages (input)
  scanned/        OCR text, one <image>_output.txt per page
  parsed/         one <Recipe_Name>_parsed.txt per recipe
  export/docx/    styled documents
  export/pdf/     PDF copies of the documents

EXAMPLES:
  # Whole pipeline, each stage in its own process
  recipescan --root ./cookbook

  # One stage at a time
  recipescan reader --root ./cookbook
  recipescan parser --root ./cookbook --model gpt-4.1-mini
  recipescan export --root ./cookbook

  # Use an edgequake-llm provider instead of the plain HTTP endpoint
  recipescan parser --provider anthropic --model claude-haiku-4-20250514

ENVIRONMENT VARIABLES:
  RECIPESCAN_API_KEY      Completion API key (falls back to OPENAI_API_KEY)
  RECIPESCAN_ENDPOINT     Chat-completions URL
  RECIPESCAN_MODEL        Model ID
  RUST_LOG                Overrides the log filter

EXTERNAL TOOLS:
  python3 noteshrink.py   bitmap cleanup (--normalizer)
  tesseract               OCR (--tesseract, --lang)
  soffice                 DOCX → PDF (--converter)
"#;

/// Digitise photographed recipes into styled DOCX and PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "recipescan",
    version,
    about = "Digitise photographed recipes into styled DOCX and PDF documents",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Clean images and OCR them into scanned/.
    Reader,
    /// Split scanned text into parsed recipes via the completion API.
    Parser,
    /// Render parsed recipes to DOCX and convert them to PDF.
    Export,
    /// Run reader, parser and export as separate processes (default).
    Run,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Folder holding images/, scanned/, parsed/ and export/.
    #[arg(long, global = true, env = "RECIPESCAN_ROOT", default_value = ".")]
    root: PathBuf,

    /// Chat-completions endpoint URL.
    #[arg(long, global = true, env = "RECIPESCAN_ENDPOINT")]
    endpoint: Option<String>,

    /// Completion API key.
    #[arg(long, global = true, env = "RECIPESCAN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID sent with each request.
    #[arg(long, global = true, env = "RECIPESCAN_MODEL")]
    model: Option<String>,

    /// Max output tokens per recipe.
    #[arg(long, global = true, env = "RECIPESCAN_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// edgequake-llm provider (openai, anthropic, gemini, ollama, ...).
    #[arg(long, global = true, env = "RECIPESCAN_PROVIDER")]
    provider: Option<String>,

    /// Bitmap cleanup command; input path and `-b <base>` are appended.
    #[arg(long, global = true, env = "RECIPESCAN_NORMALIZER")]
    normalizer: Option<String>,

    /// tesseract executable.
    #[arg(long, global = true, env = "RECIPESCAN_TESSERACT")]
    tesseract: Option<String>,

    /// DOCX → PDF converter executable.
    #[arg(long, global = true, env = "RECIPESCAN_CONVERTER")]
    converter: Option<String>,

    /// OCR language.
    #[arg(long, global = true, env = "RECIPESCAN_LANG")]
    lang: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, global = true, env = "RECIPESCAN_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Print stage reports as JSON on stdout.
    #[arg(long, global = true, env = "RECIPESCAN_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "RECIPESCAN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RECIPESCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "RECIPESCAN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);
    let args = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while a progress bar is drawn. The
    // driver itself has no bar, so `run` keeps its Starting/Finished lines.
    let show_progress = command != Command::Run && !args.quiet && !args.no_progress && !args.json;
    let filter = if args.verbose {
        "debug"
    } else if args.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };
    let config = build_config(args, progress_cb).await?;

    let reports: Vec<StageReport> = match command {
        Command::Reader => run_reader(
            &config,
            &CommandCleaner::from_config(&config),
            &TesseractEngine::from_config(&config),
        )
        .await
        .context("Reader stage failed")?,
        Command::Parser => {
            let completer = build_completer(&config).context("Failed to set up completion client")?;
            vec![run_parser(&config, completer.as_ref())
                .await
                .context("Parser stage failed")?]
        }
        Command::Export => run_export(&config, &SofficeConverter::from_config(&config))
            .await
            .context("Export stage failed")?,
        Command::Run => return drive(args).await,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&reports).context("Failed to serialise reports")?;
        println!("{json}");
    } else if !args.quiet && !show_progress {
        for report in &reports {
            eprintln!(
                "{}: {}/{} item(s) in {}ms",
                report.stage,
                report.succeeded(),
                report.items.len(),
                report.duration_ms
            );
            for error in report.errors() {
                eprintln!("  {}", dim(&error.to_string()));
            }
        }
    }

    Ok(())
}

/// `run`: re-execute this binary once per stage and report the total time.
async fn drive(args: &GlobalArgs) -> Result<()> {
    let exe = std::env::current_exe().context("Failed to locate the recipescan executable")?;

    let summary = run_stages(&exe, &STAGE_COMMANDS, &forwarded_args(args), &child_envs(args))
        .await
        .context("Failed to run pipeline stages")?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else {
        println!("Time Taken: {}", format_elapsed(summary.elapsed));
    }
    Ok(())
}

/// Environment for a child stage.
///
/// The key travels through the environment so it never shows up in `ps`.
/// JSON is forced off so stdout carries only the driver's summary.
fn child_envs(args: &GlobalArgs) -> Vec<(String, String)> {
    let mut envs = vec![("RECIPESCAN_JSON".to_string(), "false".to_string())];
    if let Some(key) = resolve_api_key(args) {
        envs.push(("RECIPESCAN_API_KEY".to_string(), key));
    }
    envs
}

/// Global flags re-emitted for a child stage (everything except the key
/// and `--json`).
fn forwarded_args(args: &GlobalArgs) -> Vec<OsString> {
    let mut out: Vec<OsString> = vec!["--root".into(), args.root.clone().into_os_string()];

    let optional: [(&str, Option<String>); 8] = [
        ("--endpoint", args.endpoint.clone()),
        ("--model", args.model.clone()),
        ("--max-tokens", args.max_tokens.map(|n| n.to_string())),
        ("--provider", args.provider.clone()),
        ("--normalizer", args.normalizer.clone()),
        ("--tesseract", args.tesseract.clone()),
        ("--converter", args.converter.clone()),
        ("--lang", args.lang.clone()),
    ];
    for (flag, value) in optional {
        if let Some(value) = value {
            out.push(flag.into());
            out.push(value.into());
        }
    }
    if let Some(ref path) = args.system_prompt {
        out.push("--system-prompt".into());
        out.push(path.clone().into_os_string());
    }

    for (flag, on) in [
        ("--no-progress", args.no_progress),
        ("--verbose", args.verbose),
        ("--quiet", args.quiet),
    ] {
        if on {
            out.push(flag.into());
        }
    }
    out
}

fn resolve_api_key(args: &GlobalArgs) -> Option<String> {
    args.api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|k| !k.is_empty())
}

/// Map CLI args to `PipelineConfig`.
async fn build_config(args: &GlobalArgs, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder().root(&args.root);

    if let Some(ref url) = args.endpoint {
        builder = builder.endpoint(url.clone());
    }
    if let Some(key) = resolve_api_key(args) {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(n) = args.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref name) = args.provider {
        builder = builder.provider_name(name.clone());
    }
    if let Some(ref command) = args.normalizer {
        builder = builder.normalizer(command);
    }
    if let Some(ref program) = args.tesseract {
        builder = builder.tesseract(program.clone());
    }
    if let Some(ref program) = args.converter {
        builder = builder.converter(program.clone());
    }
    if let Some(ref lang) = args.lang {
        builder = builder.ocr_language(lang.clone());
    }
    if let Some(ref path) = args.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
