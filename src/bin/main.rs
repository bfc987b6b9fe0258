use clap::{Parser, Subcommand};
use dawgdic::{utfc, BuildStats, GuideKind, Lexicon, LexiconBuilder, Streamer, MAX_VALUE};
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod shell;
use shell::{run_shell, run_shell_commands};

// Cross-platform resident set size (RSS) in KB; uses getrusage on UNIX.
#[cfg(unix)]
fn get_rss_kb() -> Option<usize> {
    use libc::{getrusage, rusage, RUSAGE_SELF};
    unsafe {
        let mut usage: rusage = std::mem::zeroed();
        if getrusage(RUSAGE_SELF, &mut usage) != 0 {
            return None;
        }
        #[cfg(target_os = "linux")]
        {
            // Linux: ru_maxrss is in kilobytes
            Some(usage.ru_maxrss as usize)
        }
        #[cfg(target_os = "macos")]
        {
            // macOS: ru_maxrss is in bytes
            Some((usage.ru_maxrss as usize) / 1024)
        }
        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            Some((usage.ru_maxrss as usize) / 1024)
        }
    }
}

#[cfg(not(unix))]
fn get_rss_kb() -> Option<usize> {
    None
}

fn format_mem(kb: usize) -> String {
    if kb >= 1_048_576 {
        format!("{:.2} GB", kb as f64 / 1_048_576.0)
    } else if kb >= 1024 {
        format!("{:.2} MB", kb as f64 / 1024.0)
    } else {
        format!("{} KB", kb)
    }
}

/// How keys typed by the user map to dictionary bytes.
#[derive(Clone, Copy, Debug)]
pub enum KeyEncoding {
    Utf8,
    Utfc,
}

impl KeyEncoding {
    fn new(utfc: bool) -> Self {
        if utfc {
            KeyEncoding::Utfc
        } else {
            KeyEncoding::Utf8
        }
    }

    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        match self {
            KeyEncoding::Utf8 => Cow::Borrowed(text.as_bytes()),
            KeyEncoding::Utfc => Cow::Owned(utfc::encode(text)),
        }
    }

    pub fn render(&self, bytes: &[u8]) -> String {
        match self {
            KeyEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            KeyEncoding::Utfc => utfc::decode(bytes)
                .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

fn guide_kind(guide: bool, ranked: bool) -> GuideKind {
    if ranked {
        GuideKind::Ranked
    } else if guide {
        GuideKind::Plain
    } else {
        GuideKind::None
    }
}

/// Build and query DAWG dictionaries.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a lexicon file from input lines (one key per line)
    Build {
        /// Path to write the lexicon
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Input file (defaults to stdin)
        #[arg(long, value_name = "INPUT")]
        input: Option<PathBuf>,
        /// Lines are KEY<TAB>VALUE
        #[arg(short, long)]
        tab: bool,
        /// Sort the keys before inserting them
        #[arg(short, long)]
        sort: bool,
        /// Encode keys with UTF-C instead of UTF-8
        #[arg(short, long)]
        utfc: bool,
        /// Append a guide for completion in key order
        #[arg(short, long)]
        guide: bool,
        /// Append a ranked guide for completion best value first
        #[arg(short, long, conflicts_with = "guide")]
        ranked: bool,
        /// Print build statistics as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Look up each input line: completions with a guide, stored prefixes without
    Query {
        /// Path to the lexicon
        #[arg(short, long, value_name = "FILE")]
        lexicon: PathBuf,
        /// Input file (defaults to stdin)
        #[arg(long, value_name = "INPUT")]
        input: Option<PathBuf>,
        /// The lexicon carries a guide
        #[arg(short, long)]
        guide: bool,
        /// The lexicon carries a ranked guide
        #[arg(short, long, conflicts_with = "guide")]
        ranked: bool,
        /// Keys are UTF-C encoded
        #[arg(short, long)]
        utfc: bool,
        /// Print at most this many completions per key
        #[arg(short = 'n', long, value_name = "N")]
        limit: Option<usize>,
    },
    /// Interactive shell for exploring a lexicon (or run commands non-interactively)
    Shell {
        /// Path to the lexicon
        #[arg(short, long, value_name = "FILE")]
        lexicon: PathBuf,
        /// The lexicon carries a guide
        #[arg(short, long)]
        guide: bool,
        /// The lexicon carries a ranked guide
        #[arg(short, long, conflicts_with = "guide")]
        ranked: bool,
        /// Keys are UTF-C encoded
        #[arg(short, long)]
        utfc: bool,
        /// Shell commands to execute non-interactively (skips REPL)
        #[arg(value_name = "CMD", num_args = 0.., last = true)]
        commands: Vec<String>,
    },
}

/// Splits a `KEY<TAB>VALUE` line, clamping the value into the storable range.
fn parse_tab_line(line: &str, line_no: usize) -> Result<(&str, u32), Box<dyn std::error::Error>> {
    let (key, value) = line
        .split_once('\t')
        .ok_or_else(|| format!("line {}: missing tab-separated value", line_no))?;
    let value: i64 = value
        .trim()
        .parse()
        .map_err(|e| format!("line {}: bad value {:?}: {}", line_no, value, e))?;
    let clamped = value.clamp(0, MAX_VALUE as i64);
    if clamped != value {
        warn!(line = line_no, value, clamped, "value out of range, clamped");
    }
    Ok((key, clamped as u32))
}

/// Sorts buffered keys by their encoded bytes and drops repeats, keeping the
/// value read last. Returns the number of dropped lines.
fn sort_pending(pending: &mut Vec<(Vec<u8>, u32)>) -> usize {
    let before = pending.len();
    pending.reverse();
    pending.sort_by(|a, b| a.0.cmp(&b.0));
    pending.dedup_by(|a, b| a.0 == b.0);
    before - pending.len()
}

fn print_stats(stats: &BuildStats, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }
    eprintln!("no. keys: {}", stats.keys);
    eprintln!("no. states: {}", stats.states);
    eprintln!("no. transitions: {}", stats.transitions);
    eprintln!("no. merged states: {}", stats.merged_states);
    eprintln!("no. merging states: {}", stats.merging_states);
    eprintln!("no. merged transitions: {}", stats.merged_transitions);
    eprintln!("no. units: {}", stats.units);
    eprintln!(
        "no. unused units: {} ({:.2}%)",
        stats.unused_units,
        stats.unused_ratio * 100.0
    );
    eprintln!("dictionary size: {} bytes", stats.dictionary_size);
    if stats.guide != GuideKind::None {
        eprintln!("guide size: {} bytes ({:?})", stats.guide_size, stats.guide);
    }
    eprintln!("file size: {} bytes", stats.file_size);
    Ok(())
}

fn open_input(input: Option<PathBuf>) -> io::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if let Some(input_path) = input {
        Box::new(BufReader::new(File::open(input_path)?))
    } else {
        Box::new(BufReader::new(io::stdin()))
    };
    Ok(reader)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            output,
            input,
            tab,
            sort,
            utfc,
            guide,
            ranked,
            json,
        } => {
            let encoding = KeyEncoding::new(utfc);
            // Setup progress bar using indicatif
            let total_bytes = input
                .as_ref()
                .and_then(|p| std::fs::metadata(p).ok())
                .map(|m| m.len());
            let pb = if let Some(total) = total_bytes {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] [{eta_precise}] {bytes}/{total_bytes} ({percent}%) {msg}")?
                        .progress_chars("#>-")
                );
                pb
            } else {
                let pb = ProgressBar::new_spinner();
                pb.enable_steady_tick(Duration::from_millis(100));
                let style = ProgressStyle::with_template("{spinner:.green} {bytes} bytes {msg}")?;
                pb.set_style(style);
                pb
            };
            let reader = open_input(input)?;

            let key_pb = pb.clone();
            let mut builder = LexiconBuilder::new().with_progress(move |keys| {
                if keys % 10_000 == 0 {
                    key_pb.set_message(format!("{} keys", keys));
                }
            });

            let start = Instant::now();
            let report_interval = Duration::from_millis(20);
            let mut last_report = Instant::now();
            let mut bytes_in = 0usize;
            // With --sort every (key, value) is buffered, encoded, before insertion.
            let mut pending: Vec<(Vec<u8>, u32)> = Vec::new();
            for (i, line) in reader.lines().enumerate() {
                let line = line?;
                bytes_in += line.len() + 1;
                if line.is_empty() {
                    continue;
                }
                let line_no = i + 1;
                let (key, value) = if tab {
                    parse_tab_line(&line, line_no)?
                } else {
                    (line.as_str(), 0)
                };
                let bytes = encoding.encode(key);
                if sort {
                    pending.push((bytes.into_owned(), value));
                } else {
                    builder
                        .insert(&bytes, value)
                        .map_err(|e| format!("line {}: {}", line_no, e))?;
                }

                let now = Instant::now();
                if now.duration_since(last_report) >= report_interval {
                    pb.set_position(bytes_in as u64);
                    if let Some(mem_kb) = get_rss_kb() {
                        pb.set_message(format!(
                            "{} keys, mem {}",
                            builder.num_keys().max(pending.len()),
                            format_mem(mem_kb)
                        ));
                    }
                    last_report = now;
                }
            }
            if sort {
                let dropped = sort_pending(&mut pending);
                if dropped > 0 {
                    warn!(dropped, "repeated keys skipped, last value kept");
                }
                for (key, value) in &pending {
                    builder.insert(key, *value)?;
                }
            }
            pb.finish();
            let read_duration = start.elapsed();

            let build_start = Instant::now();
            let (lexicon, stats) = builder.finish(guide_kind(guide, ranked))?;
            let build_duration = build_start.elapsed();

            lexicon.save(&output)?;

            print_stats(&stats, json)?;
            eprintln!(
                "Read {} bytes in {:.3} ms, packed in {:.3} ms",
                bytes_in,
                read_duration.as_secs_f64() * 1000.0,
                build_duration.as_secs_f64() * 1000.0
            );
            if let Some(mem_after) = get_rss_kb() {
                eprintln!("Memory usage: {}", format_mem(mem_after));
            }
        }
        Commands::Query {
            lexicon,
            input,
            guide,
            ranked,
            utfc,
            limit,
        } => {
            let encoding = KeyEncoding::new(utfc);
            let lexicon = Lexicon::open(&lexicon, guide_kind(guide, ranked))?;
            let limit = limit.unwrap_or(usize::MAX);
            let reader = open_input(input)?;

            for line in reader.lines() {
                let key = line?;
                let bytes = encoding.encode(&key);
                let mut out = format!("{}:", key);
                if lexicon.guide_kind() == GuideKind::None {
                    for (len, value) in lexicon.common_prefixes(&bytes) {
                        out.push_str(&format!(" {} = {};", encoding.render(&bytes[..len]), value));
                    }
                } else {
                    for completion in lexicon.complete(&bytes).take_n(limit) {
                        out.push_str(&format!(
                            " {} = {};",
                            encoding.render(completion.key()),
                            completion.value()
                        ));
                    }
                }
                println!("{}", out);
            }
        }
        Commands::Shell {
            lexicon,
            guide,
            ranked,
            utfc,
            commands,
        } => {
            let encoding = KeyEncoding::new(utfc);
            let lexicon = Lexicon::open(&lexicon, guide_kind(guide, ranked))?;
            if commands.is_empty() {
                run_shell(lexicon, encoding)?;
            } else {
                run_shell_commands(lexicon, encoding, &commands)?;
            }
        }
    }

    Ok(())
}
