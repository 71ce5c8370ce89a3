//! Normalize SVG path data, one path per input line.
//!
//! Usage: `normalize_path [--cubic] [--relative] [--precision N] [FILE...]`
//! Reads stdin when no files are given. Set `RUST_LOG=debug` to see what
//! the parser skipped.

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use vf_core::{FormatConfig, format_path_data};

fn main() {
    env_logger::init();

    let mut config = FormatConfig::default();
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cubic" => config.arcs_to_cubics = true,
            "--relative" => config.relative = true,
            "--precision" => match args.next().and_then(|n| n.parse().ok()) {
                Some(p) => config.precision = p,
                None => {
                    eprintln!("--precision needs a non-negative integer");
                    std::process::exit(2);
                }
            },
            _ => paths.push(PathBuf::from(arg)),
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut normalized = 0;
    let mut skipped = 0;

    let mut emit = |line: &str, out: &mut io::StdoutLock<'_>| {
        if line.trim().is_empty() {
            return;
        }
        if writeln!(out, "{}", format_path_data(line, &config)).is_err() {
            std::process::exit(1);
        }
        normalized += 1;
    };

    if paths.is_empty() {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => emit(&line, &mut out),
                Err(e) => {
                    eprintln!("stdin: {e}");
                    break;
                }
            }
        }
    } else {
        for path in &paths {
            match fs::read_to_string(path) {
                Ok(text) => text.lines().for_each(|line| emit(line, &mut out)),
                Err(e) => {
                    eprintln!("SKIP {}: {}", path.display(), e);
                    skipped += 1;
                }
            }
        }
    }

    eprintln!("{normalized} paths normalized, {skipped} files skipped");
}
