use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::float_image::FloatImage;
use crate::mesh::Mesh;
use crate::model::{ModelBackend, ModelHandle};
use crate::model_cache::ModelCache;
use crate::node::{NodeParams, PinType};
use crate::nodes_builtin::{
    compute_node, default_params, node_definition, param_specs, BuiltinNodeKind,
};
use crate::progress::{set_progress_context, ProgressSink};
use crate::settings::HostSettings;

/// A value on one of the host's typed slots.
#[derive(Clone)]
pub enum NodeValue {
    Model(ModelHandle),
    Image(Vec<FloatImage>),
    Mask(Vec<FloatImage>),
    Mesh(Vec<Mesh>),
}

impl NodeValue {
    pub fn pin_type(&self) -> PinType {
        match self {
            NodeValue::Model(_) => PinType::Model,
            NodeValue::Image(_) => PinType::Image,
            NodeValue::Mask(_) => PinType::Mask,
            NodeValue::Mesh(_) => PinType::Mesh,
        }
    }
}

impl fmt::Debug for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Model(model) => write!(f, "Model({})", model.name()),
            NodeValue::Image(images) => write!(f, "Image(batch of {})", images.len()),
            NodeValue::Mask(masks) => write!(f, "Mask(batch of {})", masks.len()),
            NodeValue::Mesh(meshes) => write!(f, "Mesh(batch of {})", meshes.len()),
        }
    }
}

/// Node inputs in pin order; `None` for an unconnected optional pin.
#[derive(Debug, Clone, Default)]
pub struct NodeInputs {
    values: Vec<Option<NodeValue>>,
}

impl NodeInputs {
    pub fn new(values: Vec<Option<NodeValue>>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&NodeValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn model(&self, index: usize, message: &str) -> Result<ModelHandle, String> {
        match self.get(index) {
            Some(NodeValue::Model(model)) => Ok(Arc::clone(model)),
            _ => Err(message.to_string()),
        }
    }

    pub fn images(&self, index: usize, message: &str) -> Result<&[FloatImage], String> {
        match self.get(index) {
            Some(NodeValue::Image(images)) => Ok(images),
            _ => Err(message.to_string()),
        }
    }

    pub fn optional_masks(&self, index: usize) -> Result<Option<&[FloatImage]>, String> {
        match self.get(index) {
            None => Ok(None),
            Some(NodeValue::Mask(masks)) => Ok(Some(masks)),
            Some(other) => Err(format!("expected a mask, got {other:?}")),
        }
    }

    pub fn meshes(&self, index: usize, message: &str) -> Result<&[Mesh], String> {
        match self.get(index) {
            Some(NodeValue::Mesh(meshes)) => Ok(meshes),
            _ => Err(message.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub subfolder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UiPayload {
    pub mesh: Vec<SavedFile>,
}

#[derive(Debug, Default)]
pub struct NodeOutputs {
    pub values: Vec<NodeValue>,
    pub ui: Option<UiPayload>,
}

impl NodeOutputs {
    pub fn values(values: Vec<NodeValue>) -> Self {
        Self { values, ui: None }
    }

    pub fn ui(ui: UiPayload) -> Self {
        Self {
            values: Vec::new(),
            ui: Some(ui),
        }
    }

    /// `{"ui": {...}}` as output nodes report it to the host.
    pub fn ui_json(&self) -> Option<serde_json::Value> {
        let ui = self.ui.as_ref()?;
        Some(serde_json::json!({ "ui": ui }))
    }
}

/// State the host integration owns across node calls.
pub struct HostContext {
    pub settings: HostSettings,
    pub models: ModelCache,
    pub backend: Arc<dyn ModelBackend>,
    pub progress: Option<ProgressSink>,
}

impl HostContext {
    pub fn new(settings: HostSettings, backend: Arc<dyn ModelBackend>) -> Self {
        let models = ModelCache::with_capacity(settings.cached_models);
        Self {
            settings,
            models,
            backend,
            progress: None,
        }
    }
}

/// Checks inputs and params against the node's schema, then runs it.
pub fn execute_node(
    ctx: &mut HostContext,
    kind: BuiltinNodeKind,
    params: &NodeParams,
    inputs: &NodeInputs,
) -> Result<NodeOutputs, String> {
    let definition = node_definition(kind);
    for (index, pin) in definition.inputs.iter().enumerate() {
        match inputs.get(index) {
            None if pin.optional => {}
            None => {
                return Err(format!(
                    "{} requires input '{}'",
                    definition.display_name, pin.name
                ));
            }
            Some(value) if value.pin_type() != pin.pin_type => {
                return Err(format!(
                    "{} input '{}' expects {:?}, got {value:?}",
                    definition.display_name, pin.name, pin.pin_type
                ));
            }
            Some(_) => {}
        }
    }

    let params = params.merged_over(&default_params(kind));
    for spec in param_specs(kind, &ctx.settings) {
        if let Some(value) = params.values.get(spec.key) {
            spec.validate(value)
                .map_err(|err| format!("{}: {err}", definition.display_name))?;
        }
    }

    let _guard = set_progress_context(definition.id, ctx.progress.clone());
    let start = Instant::now();
    let result = compute_node(kind, ctx, &params, inputs);
    let duration_ms = start.elapsed().as_secs_f32() * 1000.0;
    match &result {
        Ok(_) => tracing::info!(node = definition.id, duration_ms, "node finished"),
        Err(err) => tracing::warn!(node = definition.id, duration_ms, "node failed: {err}"),
    }
    result
}
