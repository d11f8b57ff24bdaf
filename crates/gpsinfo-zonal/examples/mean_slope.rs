//! Example: Mean slope of a rectangular region.
//!
//! Usage: cargo run --example mean_slope -- <xmin> <ymin> <xmax> <ymax>
//!
//! Coordinates are in EPSG:31287 (Austria Lambert).

use geo::polygon;
use gpsinfo_tiles::DatasetConfig;
use gpsinfo_zonal::{compute_batch, BatchOptions, Feature};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 5 {
        eprintln!("Usage: {} <xmin> <ymin> <xmax> <ymax>", args[0]);
        eprintln!("Example: {} 520000 470000 522000 471500", args[0]);
        std::process::exit(1);
    }

    let xmin: f64 = args[1].parse().expect("Invalid xmin");
    let ymin: f64 = args[2].parse().expect("Invalid ymin");
    let xmax: f64 = args[3].parse().expect("Invalid xmax");
    let ymax: f64 = args[4].parse().expect("Invalid ymax");

    let feature = Feature::from_polygon(
        "region",
        "1",
        polygon![
            (x: xmin, y: ymin),
            (x: xmax, y: ymin),
            (x: xmax, y: ymax),
            (x: xmin, y: ymax),
            (x: xmin, y: ymin),
        ],
    );

    let config = DatasetConfig::default();
    let progress: gpsinfo_zonal::ProgressCallback = Box::new(|done: usize, total: usize| {
        eprint!("\rProcessing tile {done}/{total}");
        if done == total {
            eprintln!();
        }
    });

    match compute_batch(&config, &[feature], BatchOptions::default(), Some(progress)) {
        Ok(outcome) => {
            for row in &outcome.results {
                println!(
                    "Mean slope: {:.5} over {:.5} km2 (centroid {:.1}, {:.1})",
                    row.mean,
                    row.area / 1_000_000.0,
                    row.centroid.0,
                    row.centroid.1
                );
            }
            if !outcome.warnings.is_empty() {
                eprintln!("{}", outcome.warning_report());
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
