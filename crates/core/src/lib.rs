mod bake;
mod field;
mod float_image;
mod host;
mod mesh;
mod model;
mod model_cache;
mod node;
mod nodes;
mod nodes_builtin;
mod obj_io;
mod output_paths;
mod parallel;
mod param_spec;
mod progress;
mod raster;
mod settings;
mod uv_atlas;

#[cfg(test)]
mod testing;

pub use bake::{bake_texture, unwrap_and_bake, BakeError, BakeOutput, TextureImage, BACKGROUND};
pub use field::{BoundsColorField, ColorField, NormalColorField, SceneColorField};
pub use float_image::{composite_on_background, quantize, FloatImage, MASK_BACKGROUND};
pub use host::{
    execute_node, HostContext, NodeInputs, NodeOutputs, NodeValue, SavedFile, UiPayload,
};
pub use mesh::{make_box, y_up_to_z_up, Aabb, Mesh};
pub use model::{
    Device, ModelBackend, ModelHandle, ModelLoadRequest, ReconstructionModel, SceneCode,
};
pub use model_cache::{ModelCache, ModelCacheStats, ModelKey};
pub use node::{NodeDefinition, NodeParams, ParamValue, PinDefinition, PinType};
pub use nodes::model_loader::list_checkpoints;
pub use nodes::OUTPUT_PREFIX;
pub use nodes_builtin::{
    builtin_definitions, builtin_kind_from_id, default_params, node_definition, node_schemas,
    param_specs, schema_json, BuiltinNodeKind, NodeSchema, BUILTIN_KINDS,
};
pub use obj_io::{read_obj, read_obj_bytes, write_obj, write_textured_obj};
pub use output_paths::{resolve_save_path, SavePath};
pub use param_spec::{ParamKind, ParamOption, ParamRange, ParamSpec, ParamWidget};
pub use progress::{
    report_progress, set_progress_context, ProgressEvent, ProgressGuard, ProgressSink,
};
pub use raster::{rasterize_atlas, AtlasRaster, EMPTY_PIXEL};
pub use settings::HostSettings;
pub use uv_atlas::{unwrap, UnwrapOptions, UvAtlas};
