//! Extract streets for several tracks in parallel.
//!
//! Run with: cargo run --example batch_extraction --features parallel

use std::time::Instant;
use street_extractor::{
    extract_streets_batch_parallel, ExtractConfig, Street, StreetTrack, TrackPoint,
};

fn main() {
    // Grid city: streets change name every 0.002 degrees of latitude
    let resolver = |lat: f64, _lon: f64| {
        let block = ((lat - 51.5) / 0.002).floor() as i64;
        if block < 0 {
            Street::Unknown
        } else {
            Street::named(format!("{} Avenue", block + 1))
        }
    };

    let tracks: Vec<StreetTrack> = (0..8u32)
        .map(|t| StreetTrack {
            track_id: format!("track-{}", t),
            points: (0..(100 + t * 40))
                .map(|i| TrackPoint::new(i, 51.5 + i as f64 * 0.0001, -0.12 + t as f64 * 0.01))
                .collect(),
        })
        .collect();

    let config = ExtractConfig::default();
    let start = Instant::now();
    let results = extract_streets_batch_parallel(&tracks, &resolver, &config);

    println!("Processed {} tracks in {:?}\n", results.len(), start.elapsed());
    for r in &results {
        match &r.streets {
            Ok(streets) => {
                let names: Vec<&str> = streets.iter().map(|s| s.name.as_str()).collect();
                println!("  {}: {}", r.track_id, names.join(" -> "));
            }
            Err(e) => println!("  {}: failed: {}", r.track_id, e),
        }
    }
}
