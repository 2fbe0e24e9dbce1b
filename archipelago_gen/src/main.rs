// Archipelago generator — CLI entry point.
//
// Runs the full pipeline once with the built-in shapes and writes the
// resulting buffers as JSON. The pipeline: config → site layout + MST →
// city grammar expansion → interpretation → reef growth.
//
// Usage:
//   cargo run -p archipelago_gen --bin generate -- [output.json]
//     [--config PATH] [--seed N] [--expansions N] [--water F]
//     [--no-trees] [--no-reef] [--summary]
//
// Flags override values loaded from `--config`. `--summary` writes vertex
// and index counts instead of the buffers. Logging goes to stderr; set
// `RUST_LOG` (e.g. `RUST_LOG=archipelago_gen=debug`) for more detail.

use archipelago_gen::config::GenConfig;
use archipelago_gen::error::GenResult;
use archipelago_gen::scene::generate_scene;
use archipelago_gen::shapes::BuiltinShapes;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_logging();
    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> GenResult<()> {
    let output_path = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("scene.json");

    let mut config = match parse_flag::<String>(args, "--config") {
        Some(path) => GenConfig::load(Path::new(&path))?,
        None => GenConfig::default(),
    };
    if let Some(seed) = parse_flag(args, "--seed") {
        config.seed = seed;
    }
    if let Some(n) = parse_flag(args, "--expansions") {
        config.expansion_count = n;
    }
    if let Some(water) = parse_flag(args, "--water") {
        config.water_threshold = water;
    }
    if has_flag(args, "--no-trees") {
        config.include_trees = false;
    }
    if has_flag(args, "--no-reef") {
        config.reef.enabled = false;
    }

    tracing::info!(
        output = output_path,
        seed = config.seed,
        expansions = config.expansion_count,
        water = config.water_threshold,
        trees = config.include_trees,
        reef = config.reef.enabled,
        "generating"
    );

    let scene = generate_scene(&config, &BuiltinShapes)?;
    let json = if has_flag(args, "--summary") {
        serde_json::to_string_pretty(&scene.summary())?
    } else {
        serde_json::to_string(&scene)?
    };
    std::fs::write(output_path, json)?;
    tracing::info!(output = output_path, "written");
    Ok(())
}

fn init_logging() {
    // Default to INFO, can be overridden with RUST_LOG.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
