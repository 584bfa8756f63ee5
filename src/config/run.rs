use crate::ctf::CtfParams;
use crate::grid::ImageParams;
use crate::noise::DEFAULT_RADIUS_COEF;
use crate::raster::KernelMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete description of a generation run, loaded from JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Atom set document (`{ "names": [...], "positions": [[x, y, z], ...] }`).
    pub atoms: PathBuf,
    #[serde(default)]
    pub image: ImageParams,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Images requested across all workers.
    pub n_imgs: usize,
    /// Sample a random orientation per image; otherwise every image uses the
    /// input orientation.
    pub with_rot: bool,
    /// Fixed seed for orientations and noise. Each worker offsets it by rank.
    pub seed: Option<u64>,
    pub kernel: KernelMode,
    /// Filter each projection with a contrast transfer function before noise.
    pub ctf: Option<CtfParams>,
    /// Add Gaussian noise at this signal-to-noise ratio.
    pub snr: Option<f64>,
    /// Radius of the signal mask as a fraction of the image side.
    pub noise_radius_coef: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            n_imgs: 1,
            with_rot: true,
            seed: None,
            kernel: KernelMode::Windowed,
            ctf: None,
            snr: None,
            noise_radius_coef: DEFAULT_RADIUS_COEF,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Text matrices go to `<img_pfx><index>.txt`.
    pub img_pfx: String,
    /// Also write `<img_pfx><index>.png`.
    pub png_preview: bool,
    /// JSON manifest of every image written by this worker.
    pub manifest: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            img_pfx: "img_".to_string(),
            png_preview: false,
            manifest: None,
        }
    }
}

/// Position of this process among the workers of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchConfig {
    pub rank: usize,
    pub world_size: usize,
    /// Rasterization threads for this worker.
    pub threads: usize,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            rank: 0,
            world_size: 1,
            threads: 1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CliArgs {
    pub config_path: PathBuf,
    pub launch: LaunchConfig,
}

pub fn load_config(path: &Path) -> Result<RunConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let mut config: RunConfig = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    // Relative atom paths are resolved against the config file.
    if config.atoms.is_relative() {
        if let Some(dir) = path.parent() {
            config.atoms = dir.join(&config.atoms);
        }
    }
    Ok(config)
}

/// Parse `<config.json> [--rank R] [--world-size W] [--threads T]`.
pub fn parse_cli<I>(program: &str, args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let usage = || {
        format!("Usage: {program} <config.json> [--rank R] [--world-size W] [--threads T]")
    };
    let mut config_path = None;
    let mut launch = LaunchConfig::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let slot = match arg.as_str() {
            "--rank" => &mut launch.rank,
            "--world-size" => &mut launch.world_size,
            "--threads" => &mut launch.threads,
            "-h" | "--help" => return Err(usage()),
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown option {flag}\n{}", usage()))
            }
            _ => {
                if config_path.replace(PathBuf::from(&arg)).is_some() {
                    return Err(format!("Unexpected argument {arg}\n{}", usage()));
                }
                continue;
            }
        };
        let value = it
            .next()
            .ok_or_else(|| format!("Missing value for {arg}\n{}", usage()))?;
        *slot = value
            .parse()
            .map_err(|e| format!("Invalid value {value:?} for {arg}: {e}"))?;
    }
    let config_path = config_path.ok_or_else(usage)?;
    Ok(CliArgs {
        config_path,
        launch,
    })
}
