use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ikdict::{Config, Dictionary, FsSource, Lexicon, Segment};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;
use unicode_normalization::UnicodeNormalization;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const LEXICON_NAMES: &[&str] = &["main", "stopword", "quantifier"];

/// Runs of letters and digits; dictionary words never span anything else.
const RUN_PAT: &str = r"[\p{L}\p{N}]+";

struct Args {
    config: Option<PathBuf>,
    dict_root: Option<PathBuf>,
    lexicons: Vec<Lexicon>,
    add: Vec<String>,
    disable: Vec<String>,
    help: bool,
    version: bool,
    paths: Vec<String>,
}

fn parse_lexicon(name: &str) -> Option<Lexicon> {
    match name {
        "main" => Some(Lexicon::Main),
        "stopword" | "stop" => Some(Lexicon::StopWord),
        "quantifier" => Some(Lexicon::Quantifier),
        _ => None,
    }
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args {
        config: None,
        dict_root: None,
        lexicons: Vec::new(),
        add: Vec::new(),
        disable: Vec::new(),
        help: false,
        version: false,
        paths: Vec::new(),
    };

    let mut i = 0;
    while i < argv.len() {
        match argv[i].as_str() {
            "-V" | "--version" => args.version = true,
            "-h" | "--help" => args.help = true,
            opt @ ("-c" | "--config" | "-d" | "--dict-root" | "-l" | "--lexicon" | "--add"
            | "--disable") => {
                i += 1;
                if i >= argv.len() {
                    eprintln!("Error: {} requires a value", opt);
                    std::process::exit(1);
                }
                let value = argv[i].clone();
                match opt {
                    "-c" | "--config" => args.config = Some(PathBuf::from(value)),
                    "-d" | "--dict-root" => args.dict_root = Some(PathBuf::from(value)),
                    "--add" => args.add.push(value),
                    "--disable" => args.disable.push(value),
                    _ => match parse_lexicon(&value) {
                        Some(l) => args.lexicons.push(l),
                        None => {
                            eprintln!(
                                "Error: unknown lexicon '{}'\nAvailable: {}",
                                value,
                                LEXICON_NAMES.join(", ")
                            );
                            std::process::exit(1);
                        }
                    },
                }
            }
            s if s.starts_with('-') => {
                eprintln!("Error: unknown option: {}", s);
                std::process::exit(1);
            }
            _ => args.paths.push(argv[i].clone()),
        }
        i += 1;
    }
    if args.lexicons.is_empty() {
        args.lexicons = vec![Lexicon::Main, Lexicon::StopWord, Lexicon::Quantifier];
    }
    args
}

fn print_help() {
    println!(
        "Usage: ikdict [options] [path...]\n\
         \n\
         Report every dictionary word found in files or stdin.\n\
         \n\
         Options:\n\
         \x20 -c, --config <file>     JSON configuration (default: built-in defaults)\n\
         \x20 -d, --dict-root <dir>   Directory dictionary names resolve against\n\
         \x20                         (default: the config file's directory, else .)\n\
         \x20 -l, --lexicon <name>    Lexicon to scan (repeatable, default: all)\n\
         \x20 --add <word>            Add a word to the main lexicon (repeatable)\n\
         \x20 --disable <word>        Disable a main lexicon word (repeatable)\n\
         \x20 -V, --version           Show version\n\
         \x20 -h, --help              Show this help\n\
         \n\
         Lexicons: {}\n\
         \n\
         When no paths are given, reads from stdin.\n\
         Log verbosity is controlled with IKDICT_LOG (default: warn).",
        LEXICON_NAMES.join(", ")
    );
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("IKDICT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn dict_root(args: &Args) -> PathBuf {
    if let Some(root) = &args.dict_root {
        return root.clone();
    }
    args.config
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

struct Found {
    offset: usize,
    lexicon: Lexicon,
    word: String,
}

/// Every entry of `segment` that starts inside `chars`, extending each
/// candidate one character at a time from its previous hit.
fn scan(segment: &Segment, lexicon: Lexicon, chars: &[char], base: usize, out: &mut Vec<Found>) {
    for start in 0..chars.len() {
        let mut hit = segment.match_at(chars, start, 1);
        let mut next = start + 1;
        loop {
            if hit.is_match() {
                out.push(Found {
                    offset: base + hit.begin(),
                    lexicon,
                    word: chars[hit.begin()..hit.end()].iter().collect(),
                });
            }
            if !hit.is_prefix() || next >= chars.len() {
                break;
            }
            hit = segment.match_from(chars, next, 1, &hit);
            next += 1;
        }
    }
}

fn find_words(dict: &Dictionary, runs: &fancy_regex::Regex, lexicons: &[Lexicon], text: &str) -> Vec<Found> {
    let text: String = text.nfc().collect::<String>().to_lowercase();
    let mut found = Vec::new();
    let mut char_pos = 0;
    let mut byte_pos = 0;
    for m in runs.find_iter(&text) {
        let m = match m {
            Ok(m) => m,
            Err(_) => continue,
        };
        char_pos += text[byte_pos..m.start()].chars().count();
        byte_pos = m.start();
        let chars: Vec<char> = m.as_str().chars().collect();
        for &lexicon in lexicons {
            scan(dict.lexicon(lexicon), lexicon, &chars, char_pos, &mut found);
        }
    }
    found.sort_by_key(|f| f.offset);
    found
}

fn format_line(offset: usize, lexicon: Lexicon, word: &str) -> String {
    format!("{:>8} {:<10} {}\n", offset, lexicon.as_str(), word)
}

fn main() {
    let args = parse_args();

    if args.version {
        println!("ikdict {}", VERSION);
        return;
    }
    if args.help {
        print_help();
        return;
    }

    init_tracing();

    let config = match &args.config {
        Some(path) => Config::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => Config::default(),
    };
    let source = FsSource::new(dict_root(&args));
    tracing::debug!(root = %source.root().display(), "resolving dictionaries");
    let dict = ikdict::initialize(config, Arc::new(source)).unwrap_or_else(|e| {
        eprintln!("Error loading dictionaries: {}", e);
        std::process::exit(1);
    });
    dict.add_words(&args.add);
    dict.disable_words(&args.disable);

    struct Input {
        name: Option<String>,
        text: String,
    }

    let inputs: Vec<Input> = if args.paths.is_empty() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
            eprintln!("Error reading stdin: {}", e);
            std::process::exit(1);
        });
        vec![Input {
            name: None,
            text: buf,
        }]
    } else {
        args.paths
            .iter()
            .map(|p| {
                let text = fs::read_to_string(p).unwrap_or_else(|e| {
                    eprintln!("Error reading {}: {}", p, e);
                    std::process::exit(1);
                });
                Input {
                    name: Some(p.clone()),
                    text,
                }
            })
            .collect()
    };

    let runs = fancy_regex::Regex::new(RUN_PAT).unwrap_or_else(|e| {
        eprintln!("Error: invalid run pattern: {}", e);
        std::process::exit(1);
    });

    let find = |input: &Input| find_words(&dict, &runs, &args.lexicons, &input.text);
    let results: Vec<Vec<Found>> = if inputs.len() > 1 {
        inputs.par_iter().map(find).collect()
    } else {
        inputs.iter().map(find).collect()
    };

    for (input, found) in inputs.iter().zip(results.iter()) {
        if inputs.len() > 1 {
            println!("{}:", input.name.as_deref().unwrap_or("stdin"));
        }
        for f in found {
            print!("{}", format_line(f.offset, f.lexicon, &f.word));
        }
    }
}
