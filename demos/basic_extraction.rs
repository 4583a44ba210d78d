//! Extract streets from a synthetic track with an in-memory geocoder.
//!
//! Run with: cargo run --example basic_extraction

use street_extractor::{
    extract_confirmed_streets, format_offset, track_start_time, ExtractConfig, StaticResolver,
    TrackPoint,
};

fn main() {
    // Walk north along Whitehall, then turn east onto The Strand.
    // One point every 5 seconds, ~11m apart.
    let mut track = Vec::new();
    for i in 0..60u32 {
        let (lat, lon) = if i < 35 {
            (51.5030 + i as f64 * 0.0001, -0.1265)
        } else {
            (51.5064, -0.1265 + (i - 34) as f64 * 0.00015)
        };
        track.push(TrackPoint::new(i, lat, lon).with_time(Some(i as f64 * 5.0)));
    }

    // A few known locations, including a cross street right at the corner
    let resolver = StaticResolver::new(25.0)
        .with_street(51.5030, -0.1265, "Whitehall")
        .with_street(51.5045, -0.1265, "Whitehall")
        .with_street(51.5058, -0.1265, "Whitehall")
        .with_street(51.5064, -0.1265, "Trafalgar Square")
        .with_street(51.5064, -0.1245, "Strand")
        .with_street(51.5064, -0.1225, "Strand")
        .with_street(51.5064, -0.1210, "Strand");

    let config = ExtractConfig {
        downsample: 2,
        ..Default::default()
    };

    println!("Street Extraction Example\n");
    println!(
        "Config: downsample={}, threshold={}, final_threshold={}\n",
        config.downsample, config.threshold, config.final_threshold
    );

    match extract_confirmed_streets(&track, &resolver, &config) {
        Ok(streets) => {
            let start = track_start_time(&track);
            for street in &streets {
                println!("{} {}", format_offset(street.offset_from(start)), street.name);
            }
            if streets.is_empty() {
                println!("No streets confirmed");
            }
        }
        Err(e) => println!("Extraction failed: {}", e),
    }
}
