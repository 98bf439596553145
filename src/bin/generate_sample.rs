//! Writes a deterministic demo CSV for exercising the workbench.
//!
//! Usage: `generate_sample [OUTPUT] [ROWS]` (defaults: `sample_data.csv`, 200).

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Box-Muller transform for a normal draw.
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output_path = PathBuf::from(args.next().unwrap_or_else(|| "sample_data.csv".into()));
    let rows: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid row count '{n}'"))?,
        None => 200,
    };

    let mut rng = StdRng::seed_from_u64(42);
    let groups = ["control", "treatment_a", "treatment_b"];

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    writer.write_record([
        "patient_id",
        "age",
        "height_cm",
        "weight_kg",
        "group",
        "smoker",
        "visit_date",
        "score",
    ])?;

    for id in 0..rows {
        let age = rng.gen_range(18..80);
        let height = gauss(&mut rng, 170.0, 9.0);
        let weight = gauss(&mut rng, 0.9 * height - 85.0, 8.0);
        let group_idx = rng.gen_range(0..groups.len());
        let smoker = rng.gen_bool(0.25);
        let day = 1 + id % 28;
        let month = 1 + (id / 28) % 12;

        // Score depends linearly on age and weight, plus noise.
        let score = 20.0 + 0.4 * age as f64 + 0.3 * weight + 4.0 * group_idx as f64
            + gauss(&mut rng, 0.0, 3.0);

        // Leave roughly one weight in twenty blank.
        let weight_field = if rng.gen_bool(0.05) {
            String::new()
        } else {
            format!("{weight:.1}")
        };

        writer.write_record([
            id.to_string(),
            age.to_string(),
            format!("{height:.1}"),
            weight_field,
            groups[group_idx].to_string(),
            smoker.to_string(),
            format!("2024-{month:02}-{day:02}"),
            format!("{score:.2}"),
        ])?;
    }
    writer.flush()?;

    info!("Wrote {rows} rows to {}", output_path.display());
    println!("Wrote {rows} rows to {}", output_path.display());
    Ok(())
}
