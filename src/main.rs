use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use landform::erosion::{Eroder, ErosionParams, ErosionPreset};
use landform::export::{load_terrain, save_terrain};
use landform::fields::FieldSet;
use landform::geometry::Vec2;
use landform::heightmap::{generate_hard, HeightmapParams};
use landform::mesh::Mesh;
use landform::render::export_preview;

#[derive(Parser, Debug)]
#[command(name = "landform")]
#[command(about = "Erode a procedural island on a blue-noise mesh")]
struct Args {
    /// World width in map units
    #[arg(short = 'W', long, default_value = "256")]
    width: f32,

    /// World height in map units
    #[arg(short = 'H', long, default_value = "256")]
    height: f32,

    /// Minimum spacing between mesh nodes
    #[arg(short, long, default_value = "2.0")]
    radius: f32,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of simulation steps
    #[arg(short = 'n', long, default_value = "500")]
    steps: usize,

    /// Erosion preset: calm, normal, dramatic
    #[arg(short, long, default_value = "normal")]
    preset: ErosionPreset,

    /// JSON file overriding individual erosion parameters
    #[arg(long)]
    params: Option<PathBuf>,

    /// Prevailing wind direction in degrees (0 = blowing east)
    #[arg(long, default_value = "0")]
    wind_angle: f32,

    /// Continue from a saved terrain instead of generating one
    #[arg(long)]
    import: Option<PathBuf>,

    /// Save the eroded terrain as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Store adjacency in the saved terrain
    #[arg(long)]
    with_adjacency: bool,

    /// Write a PNG preview
    #[arg(long)]
    png: Option<PathBuf>,

    /// Preview width in pixels
    #[arg(long, default_value = "1024")]
    png_width: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let params = load_params(&args)?;
    println!("Erosion preset: {} ({})", args.preset, args.preset.description());

    let (mesh, mut fields) = match &args.import {
        Some(path) => {
            println!("Importing terrain from {}...", path.display());
            load_terrain(path).map_err(|e| e.to_string())?
        }
        None => generate_terrain(&args)?,
    };
    println!("Mesh: {} nodes, {} edges, mean spacing {:.2}", mesh.len(), mesh.graph().edge_count(), mesh.spacing());

    let mut eroder = Eroder::new(&mesh, &fields).map_err(|e| e.to_string())?;
    if args.import.is_none() {
        eroder.reset_water(&mut fields, &params);
    }

    let wind_target = Vec2::from_angle(args.wind_angle.to_radians());
    let report_every = (args.steps / 10).max(1);

    println!("Simulating {} steps...", args.steps);
    for step in 0..args.steps {
        eroder.fix_water(&mut fields, &params);
        eroder.rain(&mesh, &mut fields, &params);
        eroder.spread_water(&mesh, &mut fields, &params);
        eroder.landslide(&mesh, &mut fields, &params);
        eroder.pass_time(&mesh, &mut fields, &params);
        eroder.iterate_rivers(&mesh, &mut fields, &params);
        eroder.derive_occlusion(&mesh, &mut fields, &params, wind_target);

        if (step + 1) % report_every == 0 {
            println!(
                "  step {:>5}: rock {:.2}, water {:.2}, sea level {:.3}",
                step + 1,
                fields.total_rock(),
                fields.total_water(),
                eroder.sea_level(&params)
            );
        }
    }
    eroder.derive_uphills(&mesh, &fields);

    let stats = eroder.stats();
    println!("Erosion complete:");
    println!("  Total eroded: {:.3} units", stats.total_eroded);
    println!("  Total transported: {:.3} units", stats.total_transported);
    println!("  Total landslid: {:.3} units", stats.total_landslid);
    println!("  Total scraped: {:.3} units", stats.total_scraped);
    println!("  Rain events: {}", stats.rain_events);
    println!("  Max erosion: {:.4} units", stats.max_erosion);

    let (min_h, max_h) = (0..fields.len())
        .map(|i| fields.rock_elevation(i))
        .fold((f32::MAX, f32::MIN), |(lo, hi), h| (lo.min(h), hi.max(h)));
    let wet = (0..fields.len()).filter(|&i| fields.water[i] > 0.0).count();
    println!(
        "Rock elevation range: {:.3} to {:.3} ({:.1}% of nodes under water)",
        min_h,
        max_h,
        100.0 * wet as f64 / fields.len().max(1) as f64
    );

    if let Some(path) = &args.output {
        println!("Saving terrain to {}...", path.display());
        save_terrain(path, &mesh, &fields, args.with_adjacency).map_err(|e| e.to_string())?;
    }

    if let Some(path) = &args.png {
        println!("Writing preview to {}...", path.display());
        export_preview(&mesh, &fields, eroder.sea_level(&params), args.png_width, path).map_err(|e| e.to_string())?;
    }

    Ok(())
}

fn load_params(args: &Args) -> Result<ErosionParams, String> {
    match &args.params {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
            println!("Applying parameter overrides from {}", path.display());
            ErosionParams::from_preset(args.preset)
                .overridden_by_json(&text)
                .map_err(|e| format!("{}: {}", path.display(), e))
        }
        None => Ok(ErosionParams::from_preset(args.preset)),
    }
}

fn generate_terrain(args: &Args) -> Result<(Mesh, FieldSet), String> {
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    println!("Generating terrain with seed: {}", seed);
    println!("World size: {}x{}, node spacing {}", args.width, args.height, args.radius);

    let mesh = Mesh::generate(args.width, args.height, args.radius, &mut rng).map_err(|e| e.to_string())?;
    let hard = generate_hard(&mesh, &HeightmapParams::default(), seed);
    Ok((mesh, FieldSet::with_hard(hard)))
}
