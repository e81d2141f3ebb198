use std::collections::BTreeMap;

use crate::bake::unwrap_and_bake;
use crate::field::SceneColorField;
use crate::float_image::composite_on_background;
use crate::host::{HostContext, NodeInputs, NodeOutputs, NodeValue};
use crate::node::{NodeDefinition, NodeParams, ParamValue, PinType};
use crate::nodes::{optional_pin, pin, positive_param, CATEGORY, OUTPUT_PREFIX};
use crate::obj_io::write_textured_obj;
use crate::output_paths::resolve_save_path;
use crate::param_spec::{ParamRange, ParamSpec};
use crate::uv_atlas::UnwrapOptions;

pub const ID: &str = "MeshbakeSampler";
pub const DISPLAY_NAME: &str = "Meshbake Sampler";

const DEFAULT_GEOMETRY_RESOLUTION: i32 = 256;
const DEFAULT_THRESHOLD: f32 = 25.0;
const DEFAULT_TEXTURE_RESOLUTION: i32 = 2048;

pub fn definition() -> NodeDefinition {
    NodeDefinition {
        id: ID,
        display_name: DISPLAY_NAME,
        category: CATEGORY,
        inputs: vec![
            pin("model", PinType::Model),
            pin("reference_image", PinType::Image),
            optional_pin("reference_mask", PinType::Mask),
        ],
        outputs: vec![pin("mesh", PinType::Mesh), pin("texture", PinType::Image)],
        output_node: false,
    }
}

pub fn default_params() -> NodeParams {
    NodeParams {
        values: BTreeMap::from([
            (
                "geometry_resolution".to_string(),
                ParamValue::Int(DEFAULT_GEOMETRY_RESOLUTION),
            ),
            ("threshold".to_string(), ParamValue::Float(DEFAULT_THRESHOLD)),
            (
                "texture_resolution".to_string(),
                ParamValue::Int(DEFAULT_TEXTURE_RESOLUTION),
            ),
        ]),
    }
}

pub fn param_specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int_slider("geometry_resolution", "Geometry Resolution", 128, 12288)
            .with_default(ParamValue::Int(DEFAULT_GEOMETRY_RESOLUTION))
            .with_help("Grid resolution for surface extraction."),
        ParamSpec::float("threshold", "Threshold")
            .with_range(ParamRange::Float { min: 0.0, max: None }, false)
            .with_step(0.01)
            .with_default(ParamValue::Float(DEFAULT_THRESHOLD))
            .with_help("Density level of the extracted surface."),
        ParamSpec::int_slider("texture_resolution", "Texture Resolution", 256, 4096)
            .with_default(ParamValue::Int(DEFAULT_TEXTURE_RESOLUTION)),
    ]
}

/// Reconstructs a mesh from the first reference image, bakes its color
/// texture and writes the UV-mapped OBJ set to the output folder.
pub fn compute(
    ctx: &mut HostContext,
    params: &NodeParams,
    inputs: &NodeInputs,
) -> Result<NodeOutputs, String> {
    let model = inputs.model(0, "Sampler requires a model")?;
    let images = inputs.images(1, "Sampler requires a reference image")?;
    let image = images
        .first()
        .ok_or_else(|| "Sampler reference image batch is empty".to_string())?;
    let reference = match inputs.optional_masks(2)? {
        Some(masks) => {
            let mask = masks
                .first()
                .ok_or_else(|| "Sampler reference mask batch is empty".to_string())?;
            composite_on_background(image, mask)?
        }
        None => image.to_rgb8()?,
    };

    let geometry_resolution = positive_param(
        params.get_int("geometry_resolution", DEFAULT_GEOMETRY_RESOLUTION),
        "geometry_resolution",
    )?;
    let threshold = params.get_float("threshold", DEFAULT_THRESHOLD);
    let texture_resolution = positive_param(
        params.get_int("texture_resolution", DEFAULT_TEXTURE_RESOLUTION),
        "texture_resolution",
    )?;

    let scene = model.reconstruct(&reference)?;
    let mesh = model.extract_mesh(&scene, geometry_resolution, threshold)?;
    mesh.validate()?;
    tracing::info!(
        vertices = mesh.positions.len(),
        triangles = mesh.triangle_count(),
        "surface extracted"
    );

    let save = resolve_save_path(OUTPUT_PREFIX, &ctx.settings.output_dir)?;
    let path = save
        .full_output_folder
        .join(format!("{}_{:05}.uv_mapped.obj", save.filename, save.counter));

    let field = SceneColorField::new(model.as_ref(), &scene);
    let baked = unwrap_and_bake(
        &mesh,
        &field,
        texture_resolution,
        &UnwrapOptions::default(),
    )
    .map_err(|err| err.to_string())?;
    let export = baked.atlas.remap_mesh(&mesh)?;
    write_textured_obj(&path, &export, &baked.texture.to_rgb8_flipped())?;

    Ok(NodeOutputs::values(vec![
        NodeValue::Mesh(vec![mesh]),
        NodeValue::Image(vec![baked.texture.to_float_image_flipped()]),
    ]))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::float_image::FloatImage;
    use crate::host::execute_node;
    use crate::model::ModelHandle;
    use crate::nodes_builtin::BuiltinNodeKind;
    use crate::settings::HostSettings;
    use crate::testing::{temp_dir, FakeBackend, FakeModel};

    fn context(name: &str) -> HostContext {
        let settings = HostSettings {
            output_dir: temp_dir(name),
            ..HostSettings::default()
        };
        HostContext::new(settings, Arc::new(FakeBackend::default()))
    }

    fn small_texture() -> NodeParams {
        NodeParams::default().with("texture_resolution", ParamValue::Int(256))
    }

    fn inputs(model: ModelHandle, image: FloatImage, mask: Option<FloatImage>) -> NodeInputs {
        NodeInputs::new(vec![
            Some(NodeValue::Model(model)),
            Some(NodeValue::Image(vec![image])),
            mask.map(|mask| NodeValue::Mask(vec![mask])),
        ])
    }

    #[test]
    fn sample_writes_textured_obj_and_returns_texture() {
        let mut ctx = context("sampler_flow");
        let model: ModelHandle = Arc::new(FakeModel::new(4096));
        let image = FloatImage::filled(8, 8, 3, 0.4);
        let outputs = execute_node(
            &mut ctx,
            BuiltinNodeKind::Sampler,
            &small_texture(),
            &inputs(model, image, None),
        )
        .expect("sample");

        let dir = &ctx.settings.output_dir;
        assert!(dir.join("meshsave_00001.uv_mapped.obj").is_file());
        assert!(dir.join("meshsave_00001.uv_mapped.mtl").is_file());
        assert!(dir.join("meshsave_00001.uv_mapped.png").is_file());

        assert_eq!(outputs.values.len(), 2);
        match &outputs.values[0] {
            NodeValue::Mesh(meshes) => {
                assert_eq!(meshes.len(), 1);
                assert_eq!(meshes[0].triangle_count(), 12);
            }
            other => panic!("unexpected mesh output {other:?}"),
        }
        match &outputs.values[1] {
            NodeValue::Image(textures) => {
                let texture = &textures[0];
                assert_eq!((texture.width, texture.height, texture.channels), (256, 256, 3));
                assert!(texture
                    .data
                    .iter()
                    .all(|&value| value == 0.0 || (value - 0.4).abs() < 2.0 / 255.0));
                assert!(texture.data.iter().any(|&value| value > 0.0));
            }
            other => panic!("unexpected texture output {other:?}"),
        }
        assert!(outputs.ui.is_none());
    }

    #[test]
    fn empty_mask_gives_the_model_uniform_gray() {
        let mut ctx = context("sampler_mask");
        let fake = Arc::new(FakeModel::new(4096));
        let image = FloatImage::filled(6, 4, 3, 0.9);
        let mask = FloatImage::filled(6, 4, 1, 0.0);
        execute_node(
            &mut ctx,
            BuiltinNodeKind::Sampler,
            &small_texture(),
            &inputs(fake.clone(), image, Some(mask)),
        )
        .expect("sample");

        let seen = fake.reconstructed.lock().expect("reconstructed");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].dimensions(), (6, 4));
        assert!(seen[0].pixels().all(|p| p.0 == [127, 127, 127]));
    }

    #[test]
    fn mismatched_mask_is_fatal() {
        let mut ctx = context("sampler_mask_shape");
        let model: ModelHandle = Arc::new(FakeModel::new(4096));
        let image = FloatImage::filled(6, 4, 3, 0.9);
        let mask = FloatImage::filled(4, 4, 1, 1.0);
        let err = execute_node(
            &mut ctx,
            BuiltinNodeKind::Sampler,
            &small_texture(),
            &inputs(model, image, Some(mask)),
        )
        .err()
        .expect("shape mismatch");
        assert!(err.contains("reference mask is 4x4"), "{err}");
        assert!(std::fs::read_dir(&ctx.settings.output_dir)
            .expect("output dir")
            .next()
            .is_none());
    }

    #[test]
    fn consecutive_samples_advance_the_counter() {
        let mut ctx = context("sampler_counter");
        let model: ModelHandle = Arc::new(FakeModel::new(4096));
        for _ in 0..2 {
            execute_node(
                &mut ctx,
                BuiltinNodeKind::Sampler,
                &small_texture(),
                &inputs(model.clone(), FloatImage::filled(4, 4, 3, 0.5), None),
            )
            .expect("sample");
        }
        assert!(ctx
            .settings
            .output_dir
            .join("meshsave_00002.uv_mapped.obj")
            .is_file());
    }

    #[test]
    fn missing_reference_image_is_reported() {
        let mut ctx = context("sampler_no_image");
        let model: ModelHandle = Arc::new(FakeModel::new(4096));
        let err = execute_node(
            &mut ctx,
            BuiltinNodeKind::Sampler,
            &small_texture(),
            &NodeInputs::new(vec![Some(NodeValue::Model(model))]),
        )
        .err()
        .expect("missing image");
        assert!(err.contains("reference_image"), "{err}");
    }

    #[test]
    fn out_of_range_texture_resolution_is_rejected() {
        let mut ctx = context("sampler_range");
        let model: ModelHandle = Arc::new(FakeModel::new(4096));
        let params = NodeParams::default().with("texture_resolution", ParamValue::Int(8192));
        let err = execute_node(
            &mut ctx,
            BuiltinNodeKind::Sampler,
            &params,
            &inputs(model, FloatImage::filled(4, 4, 3, 0.5), None),
        )
        .err()
        .expect("range");
        assert!(err.contains("texture_resolution"), "{err}");
    }
}
