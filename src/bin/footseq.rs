use clap::{Parser, Subcommand};
use footseq::classify::{Verdict, bracket_spans, classify};
use footseq::config::{Settings, load_settings, save_settings, settings_file_path};
use footseq::debounce::ChangeDebouncer;
use footseq::document::{Document, FileHost, collect_markdown_files, save_document};
use footseq::host::recheck;
use footseq::links::{extract_links, link_starting_at};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{Level, debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "footseq")]
#[command(about = "Renumber markdown footnotes in order of first reference", long_about = None)]
struct Args {
    /// Settings file (default: platform config directory)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Renumber footnotes in files or directories of markdown files
    Resequence {
        /// Files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Only report files that would change; exit with 1 if any would
        #[arg(long, conflicts_with = "stdout")]
        check: bool,
        /// Print the result instead of writing it back
        #[arg(long)]
        stdout: bool,
    },
    /// List bracketed spans and whether each one is a real link
    Links {
        /// Markdown file to inspect
        path: PathBuf,
    },
    /// Watch a file and renumber its footnotes after edits settle
    Watch {
        /// Markdown file to watch
        path: PathBuf,
        /// Quiet period before rechecking, overrides the settings file
        #[arg(long, value_name = "MS")]
        debounce_ms: Option<u64>,
        /// How often to look at the file's modification time
        #[arg(long, value_name = "MS", default_value = "250")]
        poll_ms: u64,
    },
    /// Show the settings file location and effective settings
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        init: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_settings_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(settings_file_path)
}

fn cmd_resequence(paths: &[PathBuf], check: bool, stdout: bool) -> Result<bool, String> {
    let files = collect_markdown_files(paths).map_err(|e| e.to_string())?;
    let mut any_changed = false;

    for path in files {
        let mut doc = Document::open(&path).map_err(|e| e.to_string())?;
        let changed = doc.resequence().map_err(|e| e.to_string())?;
        any_changed |= changed;

        if stdout {
            print!("{}", doc.content);
        } else if !changed {
            debug!(path = %path.display(), "already canonical");
        } else if check {
            println!("would renumber {}", path.display());
        } else {
            save_document(&doc).map_err(|e| e.to_string())?;
            println!("renumbered {}", path.display());
        }
    }

    Ok(any_changed)
}

fn line_and_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|nl| before[nl + 1..].chars().count())
        .unwrap_or_else(|| before.chars().count())
        + 1;
    (line, column)
}

fn cmd_links(path: &Path) -> Result<(), String> {
    let doc = Document::open(path).map_err(|e| e.to_string())?;
    let links = extract_links(&doc.content);

    for span in bracket_spans(&doc.content) {
        let (line, column) = line_and_column(&doc.content, span.start);
        match classify(&span) {
            Verdict::Verified => {
                let destination = link_starting_at(&links, span.start)
                    .map(|l| l.destination.as_str())
                    .unwrap_or("?");
                println!("{}:{}: [{}] link -> {}", line, column, span.label, destination);
            }
            Verdict::Plain => println!("{}:{}: [{}] plain", line, column, span.label),
        }
    }

    Ok(())
}

fn modified_time(path: &Path) -> Option<std::time::SystemTime> {
    fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

fn cmd_watch(path: &Path, settings: &Settings, poll: Duration) -> Result<(), String> {
    let mut host = FileHost::open(path).map_err(|e| e.to_string())?;
    let mut debouncer = ChangeDebouncer::new(settings.debounce());
    let mut seen = host.document.modified_time;

    info!(path = %path.display(), delay_ms = settings.debounce_ms, "watching");
    // Check once on startup as well
    debouncer.mark_changed(Instant::now());

    loop {
        let now = Instant::now();
        let mtime = modified_time(path);
        if mtime != seen {
            seen = mtime;
            debouncer.mark_changed(now);
            debug!("change detected");
        }

        if debouncer.take_due(now) {
            host.reload().map_err(|e| e.to_string())?;

            if settings.resequence_footnotes && recheck(&mut host).map_err(|e| e.to_string())? {
                host.flush().map_err(|e| e.to_string())?;
                // Our own write must not count as an edit
                seen = host.document.modified_time;
                println!("renumbered {}", path.display());
            }

            if settings.classify_links {
                let spans = bracket_spans(&host.document.content);
                let verified = spans.iter().filter(|s| classify(*s).is_verified()).count();
                info!(verified, plain = spans.len() - verified, "classified bracket spans");
            }
        }

        let wait = debouncer.remaining(now).map_or(poll, |left| left.min(poll));
        thread::sleep(wait.max(Duration::from_millis(10)));
    }
}

fn cmd_config(settings_path: Option<&Path>, settings: &Settings, init: bool) -> Result<(), String> {
    match settings_path {
        Some(path) => println!("# {}", path.display()),
        None => println!("# (no settings directory available)"),
    }

    let rendered = toml::to_string_pretty(settings).map_err(|e| e.to_string())?;
    print!("{}", rendered);

    if init {
        let path = settings_path.ok_or("No settings path available")?;
        save_settings(path, settings)
            .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
        eprintln!("wrote {}", path.display());
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings_path = resolve_settings_path(args.config);
    let mut settings = match &settings_path {
        Some(path) => load_settings(path),
        None => {
            warn!("no settings directory available, using defaults");
            Settings::default()
        }
    };

    let result = match args.command {
        Commands::Resequence {
            paths,
            check,
            stdout,
        } => match cmd_resequence(&paths, check, stdout) {
            Ok(true) if check => std::process::exit(1),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        },
        Commands::Links { path } => cmd_links(&path),
        Commands::Watch {
            path,
            debounce_ms,
            poll_ms,
        } => {
            if let Some(ms) = debounce_ms {
                settings.debounce_ms = ms;
            }
            cmd_watch(&path, &settings, Duration::from_millis(poll_ms))
        }
        Commands::Config { init } => cmd_config(settings_path.as_deref(), &settings, init),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_accepts_init() {
        let args = Args::try_parse_from(["footseq", "config", "--init"]).unwrap();
        assert!(matches!(args.command, Commands::Config { init: true }));

        let args = Args::try_parse_from(["footseq", "config"]).unwrap();
        assert!(matches!(args.command, Commands::Config { init: false }));
    }

    #[test]
    fn test_config_rejects_unknown_flag() {
        assert!(Args::try_parse_from(["footseq", "config", "--show"]).is_err());
    }

    #[test]
    fn test_check_conflicts_with_stdout() {
        let parsed =
            Args::try_parse_from(["footseq", "resequence", "--check", "--stdout", "a.md"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_line_and_column() {
        assert_eq!(line_and_column("ab\ncd [x]", 6), (2, 4));
        assert_eq!(line_and_column("[x]", 0), (1, 1));
    }
}
