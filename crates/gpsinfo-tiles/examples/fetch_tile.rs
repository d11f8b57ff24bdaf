//! Example: Fetch one slope tile and print summary statistics.
//!
//! Usage: cargo run --example fetch_tile -- <tileX> <tileY>

use gpsinfo_tiles::{select_fetcher, DatasetConfig, TileIndex};
use std::env;
use std::time::Instant;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <tileX> <tileY>", args[0]);
        eprintln!("Example: {} 200 100", args[0]);
        std::process::exit(1);
    }

    let x: i64 = args[1].parse().expect("Invalid tile X");
    let y: i64 = args[2].parse().expect("Invalid tile Y");
    let index = TileIndex::new(x, y);

    let config = DatasetConfig::default();
    println!("Probing {}...", config.base_url);

    let fetcher = select_fetcher(&config).expect("No fetch strategy could reach the service");

    println!("Fetching tile {index}...");
    let start = Instant::now();

    match fetcher.fetch(index) {
        Ok(tile) => {
            println!(
                "Got {}x{} cells in {:.2}s",
                tile.ncols(),
                tile.nrows(),
                start.elapsed().as_secs_f64()
            );

            let nodata = config.spec.nodata;
            let mut min = f32::MAX;
            let mut max = f32::MIN;
            let mut sum = 0.0f64;
            let mut n = 0usize;
            for row in 0..tile.nrows() {
                for col in 0..tile.ncols() {
                    let v = tile.value(row, col);
                    if v == nodata {
                        continue;
                    }
                    min = min.min(v);
                    max = max.max(v);
                    sum += v as f64;
                    n += 1;
                }
            }

            if n == 0 {
                println!("Tile contains no valid cells");
            } else {
                println!(
                    "Slope: min {:.2}, max {:.2}, mean {:.2} ({} valid cells)",
                    min,
                    max,
                    sum / n as f64,
                    n
                );
            }

            let (cx, cy) = tile.cell_center(tile.ncols() / 2, tile.nrows() / 2);
            println!("Center cell at ({cx:.1}, {cy:.1}) {}", config.spec.epsg);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
