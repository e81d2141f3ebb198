use serde::Serialize;

use crate::host::{HostContext, NodeInputs, NodeOutputs};
use crate::node::{NodeDefinition, NodeParams};
use crate::nodes;
use crate::param_spec::ParamSpec;
use crate::settings::HostSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinNodeKind {
    ModelLoader,
    Sampler,
    Viewer,
}

pub const BUILTIN_KINDS: [BuiltinNodeKind; 3] = [
    BuiltinNodeKind::ModelLoader,
    BuiltinNodeKind::Sampler,
    BuiltinNodeKind::Viewer,
];

impl BuiltinNodeKind {
    pub fn id(self) -> &'static str {
        match self {
            BuiltinNodeKind::ModelLoader => nodes::model_loader::ID,
            BuiltinNodeKind::Sampler => nodes::sampler::ID,
            BuiltinNodeKind::Viewer => nodes::viewer::ID,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BuiltinNodeKind::ModelLoader => nodes::model_loader::DISPLAY_NAME,
            BuiltinNodeKind::Sampler => nodes::sampler::DISPLAY_NAME,
            BuiltinNodeKind::Viewer => nodes::viewer::DISPLAY_NAME,
        }
    }
}

pub fn builtin_kind_from_id(id: &str) -> Option<BuiltinNodeKind> {
    match id {
        nodes::model_loader::ID => Some(BuiltinNodeKind::ModelLoader),
        nodes::sampler::ID => Some(BuiltinNodeKind::Sampler),
        nodes::viewer::ID => Some(BuiltinNodeKind::Viewer),
        _ => None,
    }
}

pub fn builtin_definitions() -> Vec<NodeDefinition> {
    BUILTIN_KINDS.into_iter().map(node_definition).collect()
}

pub fn node_definition(kind: BuiltinNodeKind) -> NodeDefinition {
    match kind {
        BuiltinNodeKind::ModelLoader => nodes::model_loader::definition(),
        BuiltinNodeKind::Sampler => nodes::sampler::definition(),
        BuiltinNodeKind::Viewer => nodes::viewer::definition(),
    }
}

pub fn default_params(kind: BuiltinNodeKind) -> NodeParams {
    match kind {
        BuiltinNodeKind::ModelLoader => nodes::model_loader::default_params(),
        BuiltinNodeKind::Sampler => nodes::sampler::default_params(),
        BuiltinNodeKind::Viewer => nodes::viewer::default_params(),
    }
}

/// Param specs depend on settings because the loader's combo lists the
/// checkpoints folder.
pub fn param_specs(kind: BuiltinNodeKind, settings: &HostSettings) -> Vec<ParamSpec> {
    match kind {
        BuiltinNodeKind::ModelLoader => nodes::model_loader::param_specs(settings),
        BuiltinNodeKind::Sampler => nodes::sampler::param_specs(),
        BuiltinNodeKind::Viewer => Vec::new(),
    }
}

pub(crate) fn compute_node(
    kind: BuiltinNodeKind,
    ctx: &mut HostContext,
    params: &NodeParams,
    inputs: &NodeInputs,
) -> Result<NodeOutputs, String> {
    match kind {
        BuiltinNodeKind::ModelLoader => nodes::model_loader::compute(ctx, params),
        BuiltinNodeKind::Sampler => nodes::sampler::compute(ctx, params, inputs),
        BuiltinNodeKind::Viewer => nodes::viewer::compute(ctx, inputs),
    }
}

/// A node as hosts register it: pins and flags plus its params.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSchema {
    #[serde(flatten)]
    pub definition: NodeDefinition,
    pub params: Vec<ParamSpec>,
}

pub fn node_schemas(settings: &HostSettings) -> Vec<NodeSchema> {
    BUILTIN_KINDS
        .into_iter()
        .map(|kind| NodeSchema {
            definition: node_definition(kind),
            params: param_specs(kind, settings),
        })
        .collect()
}

pub fn schema_json(settings: &HostSettings) -> Result<String, String> {
    serde_json::to_string_pretty(&node_schemas(settings)).map_err(|err| err.to_string())
}
