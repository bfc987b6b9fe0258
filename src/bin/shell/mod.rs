// Interactive shell over a lexicon: lookups, completion listings and ordinals.
// Commands: complete, get, prefixes, ordinal, key, stats, help, exit/quit

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    validate::Validator,
    Context, Editor, Helper,
};
use std::cell::RefCell;
use std::rc::Rc;

use dawgdic::{Completion, GuideKind, Lexicon, Streamer};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    mpsc::{channel, Receiver},
    Arc,
};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::KeyEncoding;

/// Help text for interactive shell commands and Ctrl-C behavior.
const HELP_TEXT: &str = "\
Available commands:
  complete [-n N] [prefix]        list keys starting with prefix
    -n <N>   stop after N completions
  get <key>                       print the value stored for key
  prefixes <key>                  list stored keys that are prefixes of key
  ordinal <key>                   position of key in sorted order (plain guide)
  key <n>                         key at sorted position n (plain guide)
  stats                           summarize the lexicon
  exit, quit                      exit shell
  help                            show this help

Ctrl-C once aborts a running listing; twice within 2s exits the shell
";

/// Number of candidates offered on tab completion.
const MAX_CANDIDATES: usize = 64;

/// Commands that take a key argument get completion from the dictionary.
const KEY_COMMANDS: [&str; 4] = ["complete", "get", "prefixes", "ordinal"];

/// Result of printing a stream: either completed or aborted via Ctrl-C.
enum PrintResult {
    Count(usize),
    Aborted,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Print completions from the stream, at most `limit`, optionally abortable.
fn print_completions<S>(
    encoding: KeyEncoding,
    stream: &mut S,
    limit: usize,
    abort_rx: Option<&Receiver<()>>,
) -> PrintResult
where
    S: Streamer<Item = Completion>,
{
    let mut printed = 0usize;
    while printed < limit {
        if let Some(rx) = abort_rx {
            if rx.try_recv().is_ok() {
                println!("\nListing aborted");
                return PrintResult::Aborted;
            }
        }
        match stream.next() {
            Some(completion) => {
                println!(
                    "{} \x1b[90m= {}\x1b[0m",
                    encoding.render(completion.key()),
                    completion.value()
                );
                printed += 1;
            }
            None => break,
        }
    }
    PrintResult::Count(printed)
}

struct ShellState {
    lexicon: Lexicon,
    encoding: KeyEncoding,
}

struct ShellHelper {
    state: Rc<RefCell<ShellState>>,
}

impl Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let before = &line[..pos];
        let Some(cmd_end) = before.find(' ') else {
            let cmds = [
                "complete", "get", "prefixes", "ordinal", "key", "stats", "exit", "quit", "help",
            ];
            let candidates = cmds
                .iter()
                .filter(|cmd| cmd.starts_with(before))
                .map(|&cmd| Pair {
                    display: cmd.to_string(),
                    replacement: if cmd == "key" || KEY_COMMANDS.contains(&cmd) {
                        format!("{} ", cmd)
                    } else {
                        cmd.to_string()
                    },
                })
                .collect();
            return Ok((0, candidates));
        };
        if !KEY_COMMANDS.contains(&&before[..cmd_end]) {
            return Ok((pos, Vec::new()));
        }
        // Keys may contain spaces: everything after the command is the prefix.
        let start = cmd_end + 1;
        let word = &before[start..];
        let state = self.state.borrow();
        let bytes = state.encoding.encode(word);
        let candidates = state
            .lexicon
            .complete(&bytes)
            .take_n(MAX_CANDIDATES)
            .into_iter()
            .map(|completion| {
                let key = state.encoding.render(completion.key());
                Pair {
                    display: key.clone(),
                    replacement: key,
                }
            })
            .collect();
        Ok((start, candidates))
    }
}

// Disable inline hinting to avoid blocking on large dictionaries
impl Hinter for ShellHelper {
    type Hint = String;
}
impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

fn print_stats(lexicon: &Lexicon) {
    let dict = lexicon.dictionary();
    println!("guide: {:?}", lexicon.guide_kind());
    println!("units: {}", dict.len());
    println!("dictionary size: {} bytes", dict.file_size());
    println!("file size: {} bytes", lexicon.file_size());
    if let Some(keys) = lexicon.num_keys() {
        println!("keys: {}", keys);
    }
}

/// Internal helper to process one shell command; returns true to exit shell
fn handle_cmd(
    state: &Rc<RefCell<ShellState>>,
    abort_rx: Option<&Receiver<()>>,
    raw: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    let line = raw.trim();
    let (cmd, arg) = match line.split_once(' ') {
        Some((cmd, arg)) => (cmd, arg.trim_start()),
        None => (line, ""),
    };
    if cmd.is_empty() {
        return Ok(false);
    }
    let state_ref = state.borrow();
    let lexicon = &state_ref.lexicon;
    let encoding = state_ref.encoding;
    match cmd {
        "complete" => {
            if lexicon.guide_kind() == GuideKind::None {
                println!("Completion needs a lexicon opened with --guide or --ranked");
                return Ok(false);
            }
            let mut limit = usize::MAX;
            let mut prefix = arg;
            if let Some(rest) = prefix.strip_prefix("-n") {
                let rest = rest.trim_start();
                let (num, tail) = rest.split_once(' ').unwrap_or((rest, ""));
                match num.parse::<usize>() {
                    Ok(n) => limit = n,
                    Err(_) => {
                        println!("Usage: complete [-n N] [prefix]");
                        return Ok(false);
                    }
                }
                prefix = tail.trim_start();
            }
            let bytes = encoding.encode(prefix);
            let mut stream = lexicon.complete(&bytes);
            match print_completions(encoding, &mut stream, limit, abort_rx) {
                PrintResult::Aborted => {}
                PrintResult::Count(printed) if printed > 0 => {
                    println!(
                        "\n{} {} listed",
                        printed,
                        if printed == 1 { "key" } else { "keys" }
                    );
                }
                PrintResult::Count(_) => println!("No keys start with {:?}", prefix),
            }
        }
        "get" => match lexicon.get(&encoding.encode(arg)) {
            Some(value) => println!("{} \x1b[90m= {}\x1b[0m", arg, value),
            None => println!("Key {:?} not found", arg),
        },
        "prefixes" => {
            let bytes = encoding.encode(arg);
            let prefixes = lexicon.common_prefixes(&bytes);
            if prefixes.is_empty() {
                println!("No stored key is a prefix of {:?}", arg);
            }
            for (len, value) in prefixes {
                println!("{} \x1b[90m= {}\x1b[0m", encoding.render(&bytes[..len]), value);
            }
        }
        "ordinal" => {
            if lexicon.num_keys().is_none() {
                println!("Ordinals need a lexicon opened with --guide");
                return Ok(false);
            }
            match lexicon.ordinal_of(&encoding.encode(arg)) {
                Some(n) => println!("{} \x1b[90m#{}\x1b[0m", arg, n),
                None => println!("Key {:?} not found", arg),
            }
        }
        "key" => {
            let Some(total) = lexicon.num_keys() else {
                println!("Ordinals need a lexicon opened with --guide");
                return Ok(false);
            };
            match arg.parse::<u32>() {
                Ok(n) => match lexicon.key_at(n) {
                    Some(key) => println!("{} \x1b[90m#{}\x1b[0m", encoding.render(&key), n),
                    None => println!("No key at position {} ({} keys)", n, total),
                },
                Err(_) => println!("Usage: key <n>"),
            }
        }
        "stats" => print_stats(lexicon),
        "help" => println!("{}", HELP_TEXT),
        "exit" | "quit" => return Ok(true),
        _ => println!("Unknown command: {}", cmd),
    }
    Ok(false)
}

pub fn run_shell(lexicon: Lexicon, encoding: KeyEncoding) -> Result<(), Box<dyn std::error::Error>> {
    let state = Rc::new(RefCell::new(ShellState { lexicon, encoding }));
    let helper = ShellHelper {
        state: Rc::clone(&state),
    };
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));
    // First Ctrl-C aborts a listing, a second within 2s exits the shell
    let (sig_tx, sig_rx) = channel::<()>();
    let last_sig = Arc::new(AtomicU64::new(0));
    {
        let last_sig = Arc::clone(&last_sig);
        ctrlc::set_handler(move || {
            let now = now_millis();
            let prev = last_sig.swap(now, Ordering::SeqCst);
            if now.saturating_sub(prev) < 2000 {
                std::process::exit(0);
            }
            let _ = sig_tx.send(());
        })?;
    }

    print_stats(&state.borrow().lexicon);
    println!("{}", HELP_TEXT);

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let raw = line.trim();
                if raw.is_empty() {
                    continue;
                }
                rl.add_history_entry(raw);
                // Drop a Ctrl-C that arrived while idle at the prompt.
                while sig_rx.try_recv().is_ok() {}

                if handle_cmd(&state, Some(&sig_rx), raw)? {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                let now = now_millis();
                let prev = last_sig.swap(now, Ordering::SeqCst);
                if now.saturating_sub(prev) < 2000 {
                    break;
                }
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

/// Execute a single shell command non-interactively.
pub fn run_shell_commands(
    lexicon: Lexicon,
    encoding: KeyEncoding,
    commands: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Rc::new(RefCell::new(ShellState { lexicon, encoding }));
    let line = commands.join(" ");
    println!("> {}", line);
    let _ = handle_cmd(&state, None, &line)?;
    Ok(())
}
