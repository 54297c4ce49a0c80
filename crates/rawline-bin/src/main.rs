//! rawline entrypoint: a raw-mode line-editing probe.
//!
//! Brackets the whole input loop in a `RawModeGuard`, decodes stdin through
//! `KeyReader`, and redraws the prompt with the column count probed for every
//! frame.
use anyhow::{Context, Result, bail};
use clap::Parser;
use core_config::{Config, load_from};
use core_events::{ESCAPES_DECODED, ESCAPES_DROPPED, KEYS_DECODED, META_UNMAPPED, SemanticKey};
use core_input::{KeyReader, TtySource};
use core_terminal::{RawModeGuard, columns_or, current_size, is_terminal};
use core_text::visual_width;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::Ordering;
use tracing::{info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod render;
mod session;

use render::{Renderer, flush};
use session::{LineSession, Outcome};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "rawline", version, about = "Raw-mode line editing probe")]
struct Args {
    /// Optional configuration file path (overrides discovery of `rawline.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Write diagnostics to this file (enables diagnostics regardless of config).
    #[arg(long = "log")]
    pub log: Option<PathBuf>,
    /// Print each decoded key instead of editing a line.
    #[arg(long = "keys")]
    pub keys: bool,
    #[arg(long = "prompt", default_value = "> ")]
    pub prompt: String,
}

fn configure_logging(path: Option<&Path>) -> Option<WorkerGuard> {
    let path = path?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name()?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_env("RAWLINE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        // Global tracing subscriber already installed; drop guard so writer shuts down.
        Err(_err) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn write_line<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    // Raw mode disables output post-processing; CR must be explicit.
    write!(out, "{text}\r\n")?;
    out.flush()
}

/// `--keys`: echo every decoded key with the width bookkeeping it implies.
fn run_key_probe<S: core_input::KeySource>(
    reader: &mut KeyReader<S>,
    config: &Config,
) -> Result<()> {
    let mut out = io::stdout();
    write_line(&mut out, "decoding keys; Ctrl-C or Ctrl-D to quit")?;
    let mut typed: Vec<char> = Vec::new();
    while let Some(key) = reader.next_key()? {
        if matches!(key, SemanticKey::Control('\u{03}' | '\u{04}')) {
            break;
        }
        if let SemanticKey::Char(c) = key {
            typed.push(c);
        }
        let columns = columns_or(&out, config.default_columns);
        let width = config.width_model().width(&typed);
        write_line(
            &mut out,
            &format!(
                "{key}  typed_width={width} lines={} columns={columns}",
                core_text::line_count(width, usize::from(columns))
            ),
        )?;
    }
    Ok(())
}

fn run_editor<S: core_input::KeySource>(
    reader: &mut KeyReader<S>,
    config: &Config,
    prompt: &str,
) -> Result<()> {
    let mut out = io::stdout();
    let mut session = LineSession::new();
    let mut renderer = Renderer::new(config.width_model());

    let columns = usize::from(columns_or(&out, config.default_columns));
    renderer.draw(&mut out, &session.view(prompt), columns)?;
    while let Some(key) = reader.next_key()? {
        // Snapshot before applying so an accepted line can be redrawn in place.
        let before = session.view(prompt);
        let outcome = session.apply(key);
        let columns = usize::from(columns_or(&out, config.default_columns));
        trace!(
            target: "runtime",
            len = session.line().len(),
            cursor = session.cursor(),
            searching = session.is_searching(),
            "key_applied"
        );
        match outcome {
            Outcome::Continue => renderer.draw(&mut out, &session.view(prompt), columns)?,
            Outcome::Submit(line) => {
                let accepted = session::View {
                    prompt: prompt.chars().collect(),
                    line: line.chars().collect(),
                    cursor: 0,
                };
                flush(&mut out, renderer.accept(&accepted, columns))?;
                let chars: Vec<char> = line.chars().collect();
                info!(
                    target: "runtime",
                    len = chars.len(),
                    width = visual_width(&chars),
                    history = session.history_len(),
                    "line_submitted"
                );
                renderer.draw(&mut out, &session.view(prompt), columns)?;
            }
            Outcome::Exit => {
                flush(&mut out, renderer.accept(&before, columns))?;
                break;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_from(args.config.clone())?;
    let log_path = args.log.as_deref().or(config.diagnostics_path().map(PathBuf::as_path));
    let _log_guard = configure_logging(log_path);
    install_panic_hook();

    info!(target: "runtime", "startup");
    let stdin = io::stdin();
    if !is_terminal(&stdin) {
        bail!("stdin is not a terminal");
    }
    match current_size(io::stdout()) {
        Ok(size) => info!(
            target: "runtime.startup",
            rows = size.rows,
            columns = size.columns,
            pixel_width = size.pixel_width,
            pixel_height = size.pixel_height,
            "geometry"
        ),
        Err(err) => warn!(
            target: "runtime.startup",
            %err,
            fallback = config.default_columns,
            "geometry_unavailable"
        ),
    }

    let guard = RawModeGuard::enter(io::stdin()).context("entering raw mode")?;
    let mut reader = KeyReader::new(TtySource::new(io::stdin()), config.escape_timeout);
    let result = if args.keys {
        run_key_probe(&mut reader, &config)
    } else {
        run_editor(&mut reader, &config, &args.prompt)
    };
    // Restore before reporting any loop error so the shell gets a sane terminal.
    let restored = guard.restore().context("restoring terminal");

    info!(
        target: "runtime",
        keys = KEYS_DECODED.load(Ordering::Relaxed),
        escapes = ESCAPES_DECODED.load(Ordering::Relaxed),
        escapes_dropped = ESCAPES_DROPPED.load(Ordering::Relaxed),
        meta_unmapped = META_UNMAPPED.load(Ordering::Relaxed),
        "shutdown"
    );
    result.and(restored)
}
