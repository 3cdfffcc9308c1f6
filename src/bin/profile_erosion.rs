//! Profiling tool to identify slow erosion passes

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use landform::erosion::{Eroder, ErosionParams};
use landform::fields::FieldSet;
use landform::geometry::Vec2;
use landform::heightmap::{generate_hard, HeightmapParams};
use landform::mesh::Mesh;

const PASSES: [&str; 7] = [
    "fix_water",
    "rain",
    "spread_water",
    "landslide",
    "pass_time",
    "iterate_rivers",
    "derive_occlusion",
];

fn main() {
    let size = 256.0;
    let radius = 1.5;
    let seed = 1337u64;
    let steps = 200;

    println!("=== Performance Profiling ===");
    println!("World size: {}x{}, node spacing {}", size, size, radius);
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let start = Instant::now();
    let mesh = match Mesh::generate(size, size, radius, &mut rng) {
        Ok(mesh) => mesh,
        Err(e) => {
            eprintln!("Mesh generation failed: {}", e);
            return;
        }
    };
    println!("Mesh generation: {:?} ({} nodes)", start.elapsed(), mesh.len());

    let start = Instant::now();
    let mut fields = FieldSet::with_hard(generate_hard(&mesh, &HeightmapParams::default(), seed));
    println!("Heightmap generation: {:?}", start.elapsed());

    let params = ErosionParams::default();
    let mut eroder = match Eroder::new(&mesh, &fields) {
        Ok(eroder) => eroder,
        Err(e) => {
            eprintln!("Eroder setup failed: {}", e);
            return;
        }
    };
    eroder.reset_water(&mut fields, &params);

    let wind = Vec2::new(1.0, 0.0);
    let mut timings = [Duration::ZERO; PASSES.len()];
    for _ in 0..steps {
        let mut timed = |slot: usize, pass: &mut dyn FnMut()| {
            let start = Instant::now();
            pass();
            timings[slot] += start.elapsed();
        };
        timed(0, &mut || {
            eroder.fix_water(&mut fields, &params);
        });
        timed(1, &mut || eroder.rain(&mesh, &mut fields, &params));
        timed(2, &mut || eroder.spread_water(&mesh, &mut fields, &params));
        timed(3, &mut || eroder.landslide(&mesh, &mut fields, &params));
        timed(4, &mut || eroder.pass_time(&mesh, &mut fields, &params));
        timed(5, &mut || eroder.iterate_rivers(&mesh, &mut fields, &params));
        timed(6, &mut || eroder.derive_occlusion(&mesh, &mut fields, &params, wind));
    }

    let start = Instant::now();
    eroder.derive_uphills(&mesh, &fields);
    let uphill_time = start.elapsed();

    let total: Duration = timings.iter().sum();
    println!("\n=== Pass timings over {} steps ===", steps);
    for (name, time) in PASSES.iter().zip(timings.iter()) {
        println!(
            "{:>18}: {:>10.2?} ({:>5.1}%)",
            name,
            time,
            100.0 * time.as_secs_f64() / total.as_secs_f64().max(1e-9)
        );
    }
    println!("{:>18}: {:>10.2?} (once)", "derive_uphills", uphill_time);

    let stats = eroder.stats();
    println!("\nTotal eroded: {:.3} units over {} passes", stats.total_eroded, stats.passes);
}
