pub mod run;

pub use run::{
    load_config, parse_cli, CliArgs, GenerationConfig, LaunchConfig, OutputConfig, RunConfig,
};
