use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::Path;

use image::RgbImage;

use crate::mesh::Mesh;

const MATERIAL_NAME: &str = "baked";

pub fn read_obj(path: &Path) -> Result<Mesh, String> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()));
    }
    let (models, _) = tobj::load_obj(path, &load_options())
        .map_err(|err| format!("OBJ load failed: {err}"))?;
    build_mesh_from_models(models)
}

pub fn read_obj_bytes(data: &[u8]) -> Result<Mesh, String> {
    let mut reader = BufReader::new(Cursor::new(data));
    let (models, _) = tobj::load_obj_buf(&mut reader, &load_options(), |_path| {
        Ok((Vec::new(), Default::default()))
    })
    .map_err(|err| format!("OBJ load failed: {err}"))?;
    build_mesh_from_models(models)
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

fn build_mesh_from_models(models: Vec<tobj::Model>) -> Result<Mesh, String> {
    if models.is_empty() {
        return Err("OBJ has no geometry".to_string());
    }

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut include_normals = true;
    let mut include_uvs = true;
    let mut vertex_offset = 0u32;

    for model in models {
        let mesh = &model.mesh;
        if mesh.positions.len() % 3 != 0 {
            return Err("OBJ has malformed positions".to_string());
        }
        let vertex_count = mesh.positions.len() / 3;

        positions.extend(mesh.positions.chunks_exact(3).map(|v| [v[0], v[1], v[2]]));
        indices.extend(mesh.indices.iter().map(|i| i + vertex_offset));
        vertex_offset += vertex_count as u32;

        if mesh.normals.len() == mesh.positions.len() {
            normals.extend(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
        } else {
            include_normals = false;
        }

        if mesh.texcoords.len() / 2 == vertex_count {
            uvs.extend(mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]));
        } else {
            include_uvs = false;
        }
    }

    let mut mesh = Mesh::with_positions_indices(positions, indices);
    if include_normals && !normals.is_empty() {
        mesh.normals = Some(normals);
    }
    if include_uvs && !uvs.is_empty() {
        mesh.uvs = Some(uvs);
    }
    if mesh.normals.is_none() {
        mesh.compute_normals();
    }
    mesh.validate()?;
    Ok(mesh)
}

pub fn write_obj(path: &Path, mesh: &Mesh) -> Result<(), String> {
    let file = File::create(path).map_err(|err| format!("{}: {err}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_obj_body(&mut out, mesh, None).map_err(|err| err.to_string())?;
    out.flush().map_err(|err| err.to_string())
}

/// Writes `path` plus a sibling `.mtl` material and `.png` texture that the
/// OBJ references. The mesh must carry UVs.
pub fn write_textured_obj(path: &Path, mesh: &Mesh, texture: &RgbImage) -> Result<(), String> {
    if mesh.uvs.as_ref().map(Vec::len) != Some(mesh.positions.len()) {
        return Err("Textured OBJ export requires per-vertex uvs".to_string());
    }
    let mtl_path = path.with_extension("mtl");
    let png_path = path.with_extension("png");
    let mtl_name = file_name(&mtl_path)?;
    let png_name = file_name(&png_path)?;

    texture
        .save(&png_path)
        .map_err(|err| format!("{}: {err}", png_path.display()))?;

    let mtl = File::create(&mtl_path).map_err(|err| format!("{}: {err}", mtl_path.display()))?;
    let mut mtl = BufWriter::new(mtl);
    write_material(&mut mtl, &png_name).map_err(|err| err.to_string())?;
    mtl.flush().map_err(|err| err.to_string())?;

    let file = File::create(path).map_err(|err| format!("{}: {err}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_obj_body(&mut out, mesh, Some(&mtl_name)).map_err(|err| err.to_string())?;
    out.flush().map_err(|err| err.to_string())?;

    tracing::info!("textured OBJ written to {}", path.display());
    Ok(())
}

fn file_name(path: &Path) -> Result<String, String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| format!("invalid output path {}", path.display()))
}

fn write_material(out: &mut impl Write, texture_name: &str) -> std::io::Result<()> {
    writeln!(out, "newmtl {MATERIAL_NAME}")?;
    writeln!(out, "Ka 1 1 1")?;
    writeln!(out, "Kd 1 1 1")?;
    writeln!(out, "Ks 0 0 0")?;
    writeln!(out, "illum 1")?;
    writeln!(out, "map_Kd {texture_name}")
}

fn write_obj_body(
    out: &mut impl Write,
    mesh: &Mesh,
    material_lib: Option<&str>,
) -> std::io::Result<()> {
    if let Some(lib) = material_lib {
        writeln!(out, "mtllib {lib}")?;
        writeln!(out, "usemtl {MATERIAL_NAME}")?;
    }
    for p in &mesh.positions {
        writeln!(out, "v {} {} {}", p[0], p[1], p[2])?;
    }

    let uvs = mesh
        .uvs
        .as_ref()
        .filter(|uvs| uvs.len() == mesh.positions.len());
    if let Some(uvs) = uvs {
        for uv in uvs {
            writeln!(out, "vt {} {}", uv[0], uv[1])?;
        }
    }

    let normals = mesh
        .normals
        .as_ref()
        .filter(|normals| normals.len() == mesh.positions.len());
    if let Some(normals) = normals {
        for n in normals {
            writeln!(out, "vn {} {} {}", n[0], n[1], n[2])?;
        }
    }

    let has_uv = uvs.is_some();
    let has_normals = normals.is_some();
    for tri in mesh.indices.chunks_exact(3) {
        let a = tri[0] + 1;
        let b = tri[1] + 1;
        let c = tri[2] + 1;
        if has_uv && has_normals {
            writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
        } else if has_uv {
            writeln!(out, "f {a}/{a} {b}/{b} {c}/{c}")?;
        } else if has_normals {
            writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
        } else {
            writeln!(out, "f {a} {b} {c}")?;
        }
    }
    Ok(())
}
