use std::path::{Path, PathBuf};

use meshbake_core::{
    read_obj, resolve_save_path, schema_json, unwrap_and_bake, write_textured_obj,
    BoundsColorField, ColorField, HostSettings, NormalColorField, UnwrapOptions, OUTPUT_PREFIX,
};
use tracing::Level;

use crate::logging::parse_level;

const DEFAULT_BAKE_RESOLUTION: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugField {
    Bounds,
    Normal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BakeArgs {
    pub mesh_path: PathBuf,
    pub resolution: u32,
    pub field: DebugField,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Schema,
    Bake(BakeArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub settings_path: Option<PathBuf>,
    pub log_level: Level,
    pub command: Command,
}

/// Parses arguments after the program name.
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut settings_path = None;
    let mut log_level = Level::INFO;
    let mut schema = false;
    let mut help = false;
    let mut mesh_path = None;
    let mut resolution = DEFAULT_BAKE_RESOLUTION;
    let mut field = DebugField::Bounds;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--settings" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--settings requires a path".to_string())?;
                settings_path = Some(PathBuf::from(value));
            }
            "--schema" => schema = true,
            "--bake" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--bake requires an OBJ path".to_string())?;
                mesh_path = Some(PathBuf::from(value));
            }
            "--resolution" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--resolution requires a value".to_string())?;
                resolution = value
                    .parse::<u32>()
                    .ok()
                    .filter(|value| *value > 0)
                    .ok_or_else(|| format!("invalid resolution '{value}'"))?;
            }
            "--field" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--field requires bounds or normal".to_string())?;
                field = match value.as_str() {
                    "bounds" => DebugField::Bounds,
                    "normal" => DebugField::Normal,
                    other => return Err(format!("unknown field '{other}'")),
                };
            }
            "--log-level" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--log-level requires a level".to_string())?;
                log_level = parse_level(value)?;
            }
            "--help" | "-h" => help = true,
            other => return Err(format!("unknown argument '{other}'")),
        }
    }

    let command = if help {
        Command::Help
    } else if let Some(mesh_path) = mesh_path {
        Command::Bake(BakeArgs {
            mesh_path,
            resolution,
            field,
        })
    } else if schema {
        Command::Schema
    } else {
        Command::Help
    };

    Ok(CliArgs {
        settings_path,
        log_level,
        command,
    })
}

pub fn print_help() {
    println!(
        "meshbake options:\n  --schema\n  --bake <mesh.obj> [--resolution N] [--field bounds|normal]\n  --settings <path>\n  --log-level <error|warn|info|debug|trace>"
    );
}

pub fn run(args: CliArgs) -> Result<(), String> {
    let settings = match &args.settings_path {
        Some(path) => HostSettings::load(path)?,
        None => HostSettings::default(),
    };
    match args.command {
        Command::Help => print_help(),
        Command::Schema => println!("{}", schema_json(&settings)?),
        Command::Bake(bake) => {
            let path = run_bake(&settings, &bake)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Bakes a debug field over an OBJ and writes the UV-mapped OBJ set.
fn run_bake(settings: &HostSettings, args: &BakeArgs) -> Result<PathBuf, String> {
    let mesh = read_obj(&args.mesh_path)?;
    let field: Box<dyn ColorField> = match args.field {
        DebugField::Bounds => Box::new(BoundsColorField::for_mesh(&mesh)),
        DebugField::Normal => Box::new(NormalColorField),
    };
    let baked = unwrap_and_bake(
        &mesh,
        field.as_ref(),
        args.resolution,
        &UnwrapOptions::default(),
    )
    .map_err(|err| err.to_string())?;
    tracing::info!(
        charts = baked.atlas.chart_count(),
        occupied = baked.occupied,
        "baked {}",
        args.mesh_path.display()
    );

    let path = next_output_path(&settings.output_dir)?;
    let export = baked.atlas.remap_mesh(&mesh)?;
    write_textured_obj(&path, &export, &baked.texture.to_rgb8_flipped())?;
    Ok(path)
}

fn next_output_path(output_dir: &Path) -> Result<PathBuf, String> {
    let save = resolve_save_path(OUTPUT_PREFIX, output_dir)?;
    Ok(save
        .full_output_folder
        .join(format!("{}_{:05}.uv_mapped.obj", save.filename, save.counter)))
}
