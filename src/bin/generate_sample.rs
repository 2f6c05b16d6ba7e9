use chrono::{Duration, Utc};

/// Writes `sample_catalog.csv`: a deterministic offline stand-in for the
/// USGS monthly feed, covering the current and previous UTC calendar month
/// (File → Open local catalog… in the app).

fn main() {
    let mut rng = SimpleRng::new(42);

    let now = Utc::now();
    // ~60 days back so both the current and previous month have data.
    let window = Duration::days(60);

    let regions = [
        "Ridgecrest, CA",
        "Anchorage, Alaska",
        "Tonga region",
        "Honshu, Japan",
        "Valparaíso, Chile",
        "Mid-Atlantic Ridge",
        "Reykjanes Peninsula, Iceland",
        "Sulawesi, Indonesia",
        "Kermadec Islands, New Zealand",
        "Oaxaca, Mexico",
    ];
    let directions = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

    let output_path = "sample_catalog.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record(["time", "latitude", "longitude", "depth", "mag", "magType", "place"])
        .expect("Failed to write header");

    let n_events = 600;
    for i in 0..n_events {
        let offset_secs = (rng.next_f64() * window.num_seconds() as f64) as i64;
        let time = now - Duration::seconds(offset_secs);

        let latitude = -65.0 + rng.next_f64() * 140.0;
        let longitude = -180.0 + rng.next_f64() * 360.0;
        let depth = rng.next_f64().powi(2) * 120.0;

        // Gutenberg–Richter-ish magnitude distribution: mostly small events,
        // rare large ones. Every 40th row has no magnitude, like the feed.
        let magnitude = if i % 40 == 39 {
            None
        } else {
            let mag = -rng.next_f64().max(1e-12).ln() * 1.1;
            Some((mag * 10.0).round() / 10.0)
        };

        let region = regions[(rng.next_u64() % regions.len() as u64) as usize];
        let direction = directions[(rng.next_u64() % directions.len() as u64) as usize];
        let distance = 2 + rng.next_u64() % 90;
        let place = format!("{distance} km {direction} of {region}");

        writer
            .write_record([
                time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                format!("{latitude:.4}"),
                format!("{longitude:.4}"),
                format!("{depth:.2}"),
                magnitude.map(|m| format!("{m:.1}")).unwrap_or_default(),
                "ml".to_string(),
                place,
            ])
            .expect("Failed to write row");
    }

    writer.flush().expect("Failed to flush output");
    println!("Wrote {n_events} events to {output_path}");
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}
