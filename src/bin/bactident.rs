//! bactident command-line identifier
//!
//! Reads a JSON array of sample rows and writes ranked identifications as
//! JSON to stdout. Logs go to stderr, filtered by `RUST_LOG`.
//!
//! `--prefetch` skips identification and only warms the profile cache for
//! the named genera.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bactident::{
    IdentificationEngine, IdentifyConfig, RawValue, ReferenceTable, SampleInput, SampleResult, StaticProfileSource,
    ZeroScorePolicy,
};

/// Command-line options.
#[derive(Debug, Default)]
struct Args {
    /// Samples file, or stdin when absent or `-`.
    samples: Option<PathBuf>,
    config: Option<PathBuf>,
    profiles: Option<PathBuf>,
    genus: Option<String>,
    cache: Option<PathBuf>,
    preset: Option<String>,
    drop_zero: bool,
    top: Option<usize>,
    /// Genera to load into the cache instead of identifying samples.
    prefetch: Vec<String>,
}

const USAGE: &str = "\
bactident - identify bacterial samples from biochemical test panels

USAGE:
    bactident [OPTIONS] [SAMPLES.json]
    bactident [OPTIONS] --prefetch <GENUS>...

Samples are a JSON array of objects mapping column names to cell values.
Without --profiles or --genus, samples are matched against the builtin
reference table.

OPTIONS:
    -c, --config <FILE>       TOML configuration file
    -p, --profiles <FILE>     JSON file of raw BacDive profiles to match against
    -g, --genus <GENUS>       Fetch candidates for this genus from BacDive (http feature)
        --cache <FILE>        Profile cache file [default: from config]
        --preset <NAME>       Weight preset: standard, uniform, biochemical
        --drop-zero           Drop candidates that scored zero
    -n, --top <N>             Keep at most N candidates per sample
        --prefetch <GENUS>... Fetch and cache profiles for each genus, then
                              print profile counts (http feature)
    -h, --help                Print help information";

fn value(args: &[String], i: usize, flag: &str) -> Result<String, String> {
    args.get(i + 1)
        .cloned()
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--config" | "-c" => parsed.config = Some(PathBuf::from(value(args, i, arg)?)),
            "--profiles" | "-p" => parsed.profiles = Some(PathBuf::from(value(args, i, arg)?)),
            "--genus" | "-g" => parsed.genus = Some(value(args, i, arg)?),
            "--cache" => parsed.cache = Some(PathBuf::from(value(args, i, arg)?)),
            "--preset" => parsed.preset = Some(value(args, i, arg)?),
            "--top" | "-n" => {
                let n = value(args, i, arg)?;
                let n: usize = n.parse().map_err(|_| format!("invalid number for {arg}: {n}"))?;
                parsed.top = Some(n);
            }
            "--prefetch" => {
                let start = i + 1;
                i = start;
                while i < args.len() && !args[i].starts_with('-') {
                    parsed.prefetch.push(args[i].clone());
                    i += 1;
                }
                if i == start {
                    return Err(format!("{arg} requires at least one genus"));
                }
                continue;
            }
            "--drop-zero" => {
                parsed.drop_zero = true;
                i += 1;
                continue;
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with('-') && other != "-" => return Err(format!("unknown option: {other}")),
            other => {
                if parsed.samples.is_some() {
                    return Err(format!("unexpected argument: {other}"));
                }
                parsed.samples = (other != "-").then(|| PathBuf::from(other));
                i += 1;
                continue;
            }
        }
        i += 2;
    }
    Ok(parsed)
}

fn load_config(args: &Args) -> Result<IdentifyConfig, String> {
    let mut config = match &args.config {
        Some(path) => IdentifyConfig::load(path).map_err(|e| e.to_string())?,
        None => IdentifyConfig::default(),
    };
    if let Some(preset) = &args.preset {
        config.weights.preset.clone_from(preset);
    }
    if args.drop_zero {
        config.ranking.zero_scores = ZeroScorePolicy::Drop;
    }
    if args.top.is_some() {
        config.ranking.max_results = args.top;
    }
    if let Some(cache) = &args.cache {
        config.cache.path.clone_from(cache);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn read_samples(path: Option<&PathBuf>) -> Result<Vec<SampleInput>, String> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("stdin: {e}"))?;
            text
        }
    };
    let rows: RawValue = serde_json::from_str(&text).map_err(|e| format!("samples: {e}"))?;
    let rows = match &rows {
        RawValue::Seq(items) => items.as_slice(),
        RawValue::Map(_) => std::slice::from_ref(&rows),
        _ => return Err("samples: expected a JSON array of objects".to_string()),
    };
    Ok(rows.iter().filter_map(SampleInput::from_record).collect())
}

#[cfg(feature = "http")]
fn live_engine(config: &IdentifyConfig) -> Result<IdentificationEngine, String> {
    let source = bactident::fetch::BacDiveSource::new(config.fetch.bacdive()).map_err(|e| e.to_string())?;
    let cache = bactident::cache::JsonFileCache::new(config.cache.path.clone());
    Ok(IdentificationEngine::from_config(Arc::new(source), config)
        .map_err(|e| e.to_string())?
        .with_cache(Arc::new(cache)))
}

#[cfg(not(feature = "http"))]
fn live_engine(_config: &IdentifyConfig) -> Result<IdentificationEngine, String> {
    Err("--genus and --prefetch require bactident to be built with the `http` feature".to_string())
}

/// Loads each genus through the cache and reports how many profiles it holds.
fn prefetch(args: &Args) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    let config = load_config(args)?;
    let engine = live_engine(&config)?;
    let mut counts = serde_json::Map::new();
    for genus in &args.prefetch {
        let profiles = engine.load_profiles(genus);
        info!(genus = %genus, profiles = profiles.len(), "prefetched genus");
        counts.insert(genus.trim().to_string(), profiles.len().into());
    }
    Ok(counts)
}

fn run(args: &Args) -> Result<Vec<SampleResult>, String> {
    let config = load_config(args)?;
    let mut samples = read_samples(args.samples.as_ref())?;
    info!(samples = samples.len(), "loaded samples");

    if let Some(path) = &args.profiles {
        let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
        let source = StaticProfileSource::from_json_str(&text).map_err(|e| e.to_string())?;
        let engine = IdentificationEngine::from_config(Arc::new(source), &config).map_err(|e| e.to_string())?;
        // The profile file is one candidate pool; every sample matches against it.
        for sample in &mut samples {
            if let Some(genus) = &args.genus {
                sample.genus = Some(genus.clone());
            }
            sample.genus.get_or_insert_with(|| "profiles".to_string());
        }
        return engine.identify_batch(&samples).map_err(|e| e.to_string());
    }

    if let Some(genus) = &args.genus {
        let engine = live_engine(&config)?;
        for sample in &mut samples {
            sample.genus = Some(genus.clone());
        }
        return engine.identify_batch(&samples).map_err(|e| e.to_string());
    }

    let engine = IdentificationEngine::from_config(Arc::new(StaticProfileSource::new()), &config)
        .map_err(|e| e.to_string())?;
    let table = ReferenceTable::builtin();
    samples
        .iter()
        .map(|sample| {
            Ok(SampleResult {
                label: sample.label.clone(),
                genus: sample.genus.clone(),
                candidates: engine.identify_reference(sample, &table).map_err(|e| e.to_string())?,
            })
        })
        .collect()
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    let output = if args.prefetch.is_empty() {
        run(&args).and_then(|results| serde_json::to_string_pretty(&results).map_err(|e| e.to_string()))
    } else {
        prefetch(&args).and_then(|counts| serde_json::to_string_pretty(&counts).map_err(|e| e.to_string()))
    };
    match output {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_prefetch_takes_every_following_genus() {
        let args = parse_args(&argv(&["--prefetch", "Vibrio", "Aeromonas", "--cache", "c.json"])).unwrap();
        assert_eq!(args.prefetch, vec!["Vibrio", "Aeromonas"]);
        assert_eq!(args.cache, Some(PathBuf::from("c.json")));
        assert!(args.samples.is_none());

        let repeated = parse_args(&argv(&["--prefetch", "Vibrio", "--drop-zero", "--prefetch", "Bacillus"])).unwrap();
        assert_eq!(repeated.prefetch, vec!["Vibrio", "Bacillus"]);
        assert!(repeated.drop_zero);
    }

    #[test]
    fn test_prefetch_without_genus_is_rejected() {
        assert!(parse_args(&argv(&["--prefetch"])).is_err());
        assert!(parse_args(&argv(&["--prefetch", "--top", "3"])).is_err());
    }

    #[test]
    fn test_identify_options() {
        let args = parse_args(&argv(&["-g", "Bacillus", "--top", "5", "--drop-zero", "samples.json"])).unwrap();
        assert_eq!(args.genus.as_deref(), Some("Bacillus"));
        assert_eq!(args.top, Some(5));
        assert!(args.drop_zero);
        assert_eq!(args.samples, Some(PathBuf::from("samples.json")));
        assert!(args.prefetch.is_empty());

        let stdin = parse_args(&argv(&["-"])).unwrap();
        assert!(stdin.samples.is_none());
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse_args(&argv(&["--bogus"])).is_err());
        assert!(parse_args(&argv(&["--genus"])).is_err());
        assert!(parse_args(&argv(&["--top", "many"])).is_err());
        assert!(parse_args(&argv(&["a.json", "b.json"])).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = parse_args(&argv(&["--preset", "uniform", "--drop-zero", "-n", "2"])).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.weights.preset, "uniform");
        assert_eq!(config.ranking.zero_scores, ZeroScorePolicy::Drop);
        assert_eq!(config.ranking.max_results, Some(2));

        let zero = parse_args(&argv(&["--top", "0"])).unwrap();
        assert!(load_config(&zero).is_err());
    }
}
