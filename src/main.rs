use std::fs;
use std::path::PathBuf;

use kestrel::nav::{NavLayer, NavMesh};
use kestrel::terrain::{HeightField, MapDescription, MarkerRegistry, ResourceMarker};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn setup_file_logging() -> String {
    // Create logs directory if it doesn't exist
    let log_dir = PathBuf::from("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir).expect("Failed to create logs directory");
    }

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    // Generate timestamped filename
    let now = chrono::Local::now();
    let log_filename = format!("kestrel_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_file_path = log_dir.join(&log_filename);
    let log_path_str = log_file_path.to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(
        Rotation::NEVER, // One file per run
        &log_dir,
        &log_filename,
    );

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kestrel=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    log_path_str
}

fn cleanup_old_logs(log_dir: &PathBuf, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("kestrel") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Sort by modified time (oldest first)
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

/// Seeded random map: rolling hills, a handful of lakes, scattered deposits.
fn random_map(size: usize, seed: u64) -> (HeightField, MarkerRegistry) {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut field = HeightField::flat(size, 24.0);

    // Plateaus and basins
    for _ in 0..size / 16 {
        let w = rng.usize(4..size / 4);
        let x = rng.usize(0..size - w);
        let z = rng.usize(0..size - w);
        let height = 24.0 + rng.f32() * 16.0 - 8.0;
        field.fill_terrain(x, z, x + w, z + w, height);
    }
    for _ in 0..size / 32 {
        let w = rng.usize(8..size / 3);
        let x = rng.usize(0..size - w);
        let z = rng.usize(0..size - w);
        field.fill_terrain(x, z, x + w, z + w, 14.0 + rng.f32() * 4.0);
    }
    field.set_water_level(20.0);

    let mut registry = MarkerRegistry::default();
    for _ in 0..size / 8 {
        let x = rng.f32() * size as f32;
        let z = rng.f32() * size as f32;
        registry.mass.push(ResourceMarker::at(x, z));
    }
    for _ in 0..size / 32 {
        let x = rng.f32() * size as f32;
        let z = rng.f32() * size as f32;
        registry.hydrocarbons.push(ResourceMarker::at(x, z));
    }
    (field, registry)
}

fn load_map(path: &str) -> Result<(HeightField, MarkerRegistry), Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    let description: MapDescription = ron::from_str(&contents)?;
    Ok((description.build(), description.markers()))
}

fn print_stats(mesh: &NavMesh, registry: &MarkerRegistry) {
    println!();
    println!("{:<12} {:>9} {:>11} {:>13} {:>10} {:>7}", "Layer", "Pathable", "Unpathable", "Subdivisions", "Neighbors", "Labels");
    for layer in NavLayer::ALL {
        let data = mesh.layer_data(layer);
        println!(
            "{:<12} {:>9} {:>11} {:>13} {:>10} {:>7}",
            layer.to_string(),
            data.pathable_leafs,
            data.unpathable_leafs,
            data.subdivisions,
            data.neighbors,
            data.labels,
        );
    }
    println!();
    println!(
        "Components: {} total, {} culled",
        mesh.labels.len(),
        mesh.culled_labels
    );
    let bound = registry
        .mass
        .iter()
        .chain(registry.hydrocarbons.iter())
        .filter(|m| m.nav_label.is_some())
        .count();
    println!(
        "Markers: {} mass, {} hydrocarbon, {} bound to components",
        registry.mass.len(),
        registry.hydrocarbons.len(),
        bound,
    );
}

fn main() {
    let log_file = setup_file_logging();
    println!("kestrel mesh stats - logging to {}", log_file);

    // Usage: kestrel [map.ron] [--size N] [--seed S]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut map_path: Option<String> = None;
    let mut size = 256usize;
    let mut seed = 42u64;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--size" => {
                size = iter
                    .next()
                    .and_then(|v| v.parse().ok())
                    .expect("--size expects a number");
            }
            "--seed" => {
                seed = iter
                    .next()
                    .and_then(|v| v.parse().ok())
                    .expect("--seed expects a number");
            }
            other => map_path = Some(other.to_string()),
        }
    }

    let (field, mut registry) = match &map_path {
        Some(path) => match load_map(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => {
            if size < 64 || size % 16 != 0 {
                eprintln!("--size must be a multiple of 16, at least 64");
                std::process::exit(1);
            }
            println!("No map file given; generating a random {0}x{0} map (seed {1})", size, seed);
            random_map(size, seed)
        }
    };

    let mut mesh = NavMesh::default();
    if let Err(e) = mesh.generate(&field, &mut registry) {
        eprintln!("Mesh generation rejected the map: {}", e);
        std::process::exit(1);
    }

    print_stats(&mesh, &registry);
}
