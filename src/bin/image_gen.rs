//! Generate projection images for one worker of a run.
use em_image_gen::config::{self, RunConfig};
use em_image_gen::image::io::{load_atoms, write_json_file};
use em_image_gen::{run_worker, FileSink};
use std::env;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "image_gen".to_string());
    let cli = config::parse_cli(&program, args)?;
    let config: RunConfig = config::load_config(&cli.config_path)?;

    let atoms = load_atoms(&config.atoms).map_err(|e| e.to_string())?;
    if cli.launch.rank == 0 {
        println!(
            "{} atoms, {} pixels, {} images over {} workers",
            atoms.len(),
            config.image.n_pixels,
            config.generation.n_imgs,
            cli.launch.world_size
        );
    }

    let mut sink = FileSink::new(config.output.png_preview);
    let summary = run_worker(&config, &atoms, &cli.launch, &mut sink).map_err(|e| e.to_string())?;

    if let Some(path) = &config.output.manifest {
        write_json_file(path, &sink.entries())?;
    }
    println!(
        "worker {}: wrote images {}..{} in {:.1} ms",
        summary.rank, summary.indices.start, summary.indices.end, summary.elapsed_ms
    );
    Ok(())
}
