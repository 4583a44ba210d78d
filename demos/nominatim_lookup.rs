//! Resolve a short track against the public Nominatim service.
//! Run with: cargo run --example nominatim_lookup --features http
//!
//! Please respect the Nominatim usage policy: keep the request delay at 1s or
//! more and set a user agent that identifies you.

use street_extractor::{extract_streets, ExtractConfig, NominatimConfig, NominatimResolver, TrackPoint};

// Along Oxford Street towards Regent Street, London
const TRACK: &[(f64, f64)] = &[
    (51.51536, -0.14190),
    (51.51530, -0.14120),
    (51.51522, -0.14040),
    (51.51515, -0.13960),
    (51.51508, -0.13880),
    (51.51500, -0.13800),
    (51.51470, -0.13800),
    (51.51420, -0.13810),
    (51.51370, -0.13830),
    (51.51320, -0.13850),
];

fn main() {
    let resolver = match NominatimResolver::new(NominatimConfig {
        user_agent: "street-extractor-demo/0.1 (https://github.com/ejthomas/street-extractor)".to_string(),
        request_delay_ms: 1000,
        ..Default::default()
    }) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    let track: Vec<TrackPoint> = TRACK
        .iter()
        .enumerate()
        .map(|(i, &(lat, lon))| TrackPoint::new(i as u32, lat, lon))
        .collect();

    let config = ExtractConfig {
        downsample: 1,
        threshold: 2,
        final_threshold: 2,
    };

    match extract_streets(&track, &resolver, &config) {
        Ok(streets) => {
            for s in streets {
                println!("{}", s);
            }
        }
        Err(e) => eprintln!("Extraction failed: {}", e),
    }
}
