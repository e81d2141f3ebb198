use std::collections::BTreeMap;
use std::path::{Component, Path};

use crate::host::{HostContext, NodeOutputs, NodeValue};
use crate::model::{Device, ModelLoadRequest};
use crate::model_cache::ModelKey;
use crate::node::{NodeDefinition, NodeParams, ParamValue, PinType};
use crate::nodes::{pin, positive_param, CATEGORY};
use crate::param_spec::ParamSpec;
use crate::settings::HostSettings;

pub const ID: &str = "MeshbakeModelLoader";
pub const DISPLAY_NAME: &str = "Meshbake Model Loader";

pub const DEFAULT_CHUNK_SIZE: i32 = 8192;
const CHECKPOINT_EXTENSIONS: &[&str] = &["ckpt", "pt", "pth", "bin", "safetensors"];

pub fn definition() -> NodeDefinition {
    NodeDefinition {
        id: ID,
        display_name: DISPLAY_NAME,
        category: CATEGORY,
        inputs: Vec::new(),
        outputs: vec![pin("model", PinType::Model)],
        output_node: false,
    }
}

/// `model` has no default; the host picks one of the listed checkpoints.
pub fn default_params() -> NodeParams {
    NodeParams {
        values: BTreeMap::from([(
            "chunk_size".to_string(),
            ParamValue::Int(DEFAULT_CHUNK_SIZE),
        )]),
    }
}

pub fn param_specs(settings: &HostSettings) -> Vec<ParamSpec> {
    let checkpoints = list_checkpoints(&settings.checkpoints_dir);
    let mut model = ParamSpec::string_enum("model", "Model", checkpoints.clone())
        .allow_unlisted()
        .with_help("Checkpoint file in the checkpoints folder.");
    if let Some(first) = checkpoints.into_iter().next() {
        model = model.with_default(ParamValue::String(first));
    }
    vec![
        model,
        ParamSpec::int_slider("chunk_size", "Chunk Size", 1, 10000)
            .with_default(ParamValue::Int(DEFAULT_CHUNK_SIZE))
            .with_help("Points per color field query. Lower values use less memory."),
    ]
}

/// Checkpoint files under `dir` as `/`-separated relative paths, sorted.
/// A missing folder lists nothing.
pub fn list_checkpoints(dir: &Path) -> Vec<String> {
    let mut found = Vec::new();
    collect_checkpoints(dir, "", &mut found);
    found.sort();
    found
}

fn collect_checkpoints(dir: &Path, prefix: &str, found: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        if path.is_dir() {
            collect_checkpoints(&path, &relative, found);
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| CHECKPOINT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        {
            found.push(relative);
        }
    }
}

pub fn compute(ctx: &mut HostContext, params: &NodeParams) -> Result<NodeOutputs, String> {
    let name = params.get_string("model", "");
    if name.trim().is_empty() {
        return Err("Model Loader requires a checkpoint".to_string());
    }
    let relative = Path::new(name);
    if !relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(format!("Invalid checkpoint name: {name}"));
    }
    let chunk_size =
        positive_param(params.get_int("chunk_size", DEFAULT_CHUNK_SIZE), "chunk_size")? as usize;

    let weights_path = ctx.settings.checkpoints_dir.join(relative);
    let device = Device::select(ctx.settings.device, ctx.backend.accelerator_available());
    let key = ModelKey::for_checkpoint(&weights_path, chunk_size, device)?;
    let request = ModelLoadRequest {
        weights_path,
        config_path: ctx.settings.model_config.clone(),
        chunk_size,
        device,
    };

    let backend = &ctx.backend;
    let model = ctx.models.get_or_load(key, || {
        tracing::info!(
            chunk_size,
            ?device,
            "loading model from {}",
            request.weights_path.display()
        );
        backend.load(&request)
    })?;
    Ok(NodeOutputs::values(vec![NodeValue::Model(model)]))
}
