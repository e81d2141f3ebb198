use crate::host::{HostContext, NodeInputs, NodeOutputs, SavedFile, UiPayload};
use crate::mesh::y_up_to_z_up;
use crate::node::{NodeDefinition, NodeParams, PinType};
use crate::nodes::{pin, CATEGORY, OUTPUT_PREFIX};
use crate::obj_io::write_obj;
use crate::output_paths::resolve_save_path;

pub const ID: &str = "MeshbakeViewer";
pub const DISPLAY_NAME: &str = "Meshbake Viewer";

const BATCH_PLACEHOLDER: &str = "%batch_num%";

pub fn definition() -> NodeDefinition {
    NodeDefinition {
        id: ID,
        display_name: DISPLAY_NAME,
        category: CATEGORY,
        inputs: vec![pin("mesh", PinType::Mesh)],
        outputs: Vec::new(),
        output_node: true,
    }
}

pub fn default_params() -> NodeParams {
    NodeParams::default()
}

/// Writes every mesh in the batch as a Z-up OBJ and lists the files for the
/// host UI.
///
/// Batch entries after the first take the following counters so that a
/// prefix without `%batch_num%` does not overwrite earlier meshes.
pub fn compute(ctx: &mut HostContext, inputs: &NodeInputs) -> Result<NodeOutputs, String> {
    let meshes = inputs.meshes(0, "Viewer requires a mesh")?;
    let save = resolve_save_path(OUTPUT_PREFIX, &ctx.settings.output_dir)?;

    let mut saved = Vec::with_capacity(meshes.len());
    for (batch_number, mesh) in meshes.iter().enumerate() {
        let filename = batch_filename(&save.filename, save.counter, batch_number);

        let mut export = mesh.clone();
        if export.normals.is_none() {
            export.compute_normals();
        }
        export.transform(y_up_to_z_up());
        write_obj(&save.full_output_folder.join(&filename), &export)?;
        tracing::info!("mesh written to {}", filename);

        saved.push(SavedFile {
            filename,
            kind: "output",
            subfolder: save.subfolder.clone(),
        });
    }
    Ok(NodeOutputs::ui(UiPayload { mesh: saved }))
}

/// A stem carrying `%batch_num%` keeps the shared counter for every entry;
/// any other stem advances the counter per entry.
fn batch_filename(stem: &str, counter: u32, batch_number: usize) -> String {
    if stem.contains(BATCH_PLACEHOLDER) {
        let stem = stem.replace(BATCH_PLACEHOLDER, &batch_number.to_string());
        format!("{stem}_{counter:05}_.obj")
    } else {
        let counter = counter + batch_number as u32;
        format!("{stem}_{counter:05}_.obj")
    }
}
