//! relex - print a file with syntax highlighting

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use tracing_subscriber::EnvFilter;

use relex::render::{self, Renderer};
use relex::{Config, Document, Language, RelexError, Result};

/// Parsed command line
#[derive(Debug, Default)]
struct Options {
    lang: Option<Language>,
    spans: bool,
    list: bool,
    help: bool,
    version: bool,
    file: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_env("RELEX_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut opts = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => opts.help = true,
            "--version" | "-V" => opts.version = true,
            "--spans" | "-s" => opts.spans = true,
            "--list" | "-l" => opts.list = true,
            "--lang" | "-L" => {
                let name = iter
                    .next()
                    .ok_or_else(|| RelexError::Message("--lang needs a language name".into()))?;
                opts.lang = Some(Language::from_name(name)?);
            }
            flag if flag.starts_with('-') => {
                return Err(RelexError::Message(format!("unknown option: {flag}")));
            }
            path => opts.file = Some(PathBuf::from(path)),
        }
    }
    Ok(opts)
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let opts = parse_args(&args)?;

    if opts.help {
        print_usage();
        return Ok(());
    }
    if opts.version {
        print_version();
        return Ok(());
    }
    if opts.list {
        for lang in Language::ALL {
            println!("{lang}");
        }
        return Ok(());
    }

    let Some(path) = opts.file else {
        print_usage();
        return Err(RelexError::Message("no file given".into()));
    };

    let config = Config::load();
    let lang = opts
        .lang
        .or_else(|| config.language_for(&path))
        .unwrap_or(Language::Plain);
    let text = fs::read_to_string(&path)?;
    let text = text.strip_suffix('\n').unwrap_or(&text);

    let mut doc = Document::with_config(text, lang, &config);
    doc.flush();

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    if opts.spans {
        for line in 0..doc.line_count() {
            render::write_span_records(&mut out, line, doc.spans(line).unwrap_or_default())?;
        }
    } else {
        let renderer = Renderer::new(config.theme_styles()?);
        for line in 0..doc.line_count() {
            let text = doc.text(line).unwrap_or_default();
            renderer.write_line(&mut out, text, doc.spans(line).unwrap_or_default())?;
        }
    }
    out.flush()?;
    Ok(())
}

fn print_usage() {
    println!("relex {} - incremental syntax highlighter", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: relex [OPTIONS] FILE");
    println!();
    println!("Options:");
    println!("  -L, --lang NAME  Highlight as NAME instead of detecting the language");
    println!("  -s, --spans      Print line:start..end Format records instead of color");
    println!("  -l, --list       List supported languages");
    println!("  -h, --help       Show this help message");
    println!("  -V, --version    Show version information");
    println!();
    println!("Set RELEX_LOG (e.g. RELEX_LOG=debug) to see diagnostics on stderr.");
}

fn print_version() {
    println!("relex {}", env!("CARGO_PKG_VERSION"));
}
