use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use icon_cli::{write_icons, DEFAULT_SIZES};

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if !args.is_empty() && (args[0] == "-h" || args[0] == "--help") {
        print_usage();
        return Ok(());
    }

    let mut out_dir = PathBuf::from("public");
    let mut sizes = DEFAULT_SIZES.to_vec();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--out-dir" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --out-dir".to_string())?;
                out_dir = PathBuf::from(value);
                index += 2;
            }
            "--sizes" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --sizes".to_string())?;
                sizes = parse_sizes(value)?;
                index += 2;
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }

    let written = write_icons(&out_dir, &sizes).map_err(|error| error.to_string())?;
    for path in written {
        println!("generated {}", path.display());
    }
    Ok(())
}

fn parse_sizes(raw: &str) -> Result<Vec<u32>, String> {
    let mut sizes = Vec::new();
    for entry in raw.split(',') {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            continue;
        }
        let size = trimmed
            .parse::<u32>()
            .map_err(|_| format!("invalid --sizes entry '{trimmed}' (expected u32)"))?;
        if size == 0 {
            return Err(format!("invalid --sizes entry '{trimmed}' (must be nonzero)"));
        }
        sizes.push(size);
    }
    if sizes.is_empty() {
        return Err("--sizes requires at least one value".to_string());
    }
    Ok(sizes)
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    [
        "icon_cli - PWA launcher icon rasterizer",
        "",
        "Usage:",
        "  icon_cli [--out-dir <dir>] [--sizes <u32,u32,...>]",
        "",
        "Defaults:",
        "  --out-dir public",
        "  --sizes 192,512",
    ]
    .join("\n")
}
