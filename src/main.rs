use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::time::Duration;

use anyhow::{Context, Result};
use treedepth::solve::{BranchAndBound, Solver};
use treedepth::{Config, Graph};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut cfg = Config::default();
    let mut files: Vec<&str> = Vec::new();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--time-limit" => {
                let secs: f64 = parse_flag(&args, i);
                cfg.time_limit = Some(Duration::from_secs_f64(secs));
                i += 2;
            }
            "--subset-gap" => {
                cfg.subset_gap = parse_flag(&args, i);
                i += 2;
            }
            "--small-n" => {
                cfg.small_n = parse_flag(&args, i);
                i += 2;
            }
            "--batch" => {
                cfg.separator_batch = parse_flag(&args, i);
                i += 2;
            }
            "--help" | "-h" => usage_and_exit(0),
            arg if !arg.starts_with('-') => {
                files.push(&args[i]);
                i += 1;
            }
            _ => usage_and_exit(2),
        }
    }
    let &[input_path, output_path] = files.as_slice() else {
        usage_and_exit(2)
    };

    let input = File::open(input_path).with_context(|| format!("opening {input_path}"))?;
    let graph = Graph::parse(BufReader::new(input))?;
    log::info!(
        "loaded a graph with {} vertices and {} edges",
        graph.n(),
        graph.m()
    );

    let decomposition = BranchAndBound::new(cfg).solve(&graph)?;

    let output = File::create(output_path).with_context(|| format!("creating {output_path}"))?;
    let mut writer = BufWriter::new(output);
    decomposition
        .write_to(&mut writer)
        .context("writing the decomposition")?;
    Ok(())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], i: usize) -> T {
    args.get(i + 1)
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| usage_and_exit(2))
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage:\n  treedepth INPUT_FILE OUTPUT_FILE [options]\n\nOptions:\n  --time-limit SECS   Wall-clock budget; cancellation at overrun\n  --subset-gap N      Max gap for cache subset inheritance (0 disables)\n  --small-n N         Exact-store threshold for small graphs\n  --batch N           Separator generator batch size\n"
    );
    std::process::exit(code)
}
