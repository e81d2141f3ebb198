use std::path::{Component, Path, PathBuf};

/// Where the next output for a prefix goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePath {
    pub full_output_folder: PathBuf,
    pub filename: String,
    pub counter: u32,
    pub subfolder: String,
}

/// Resolves `prefix` (optionally `sub/dirs/name`) under `output_dir`.
///
/// The counter is one past the largest `<name>_<digits>` already in the
/// folder, so files written by earlier calls are never overwritten. The folder
/// is created when missing.
pub fn resolve_save_path(prefix: &str, output_dir: &Path) -> Result<SavePath, String> {
    let normalized = prefix.replace('\\', "/");
    let mut parts = Vec::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(format!(
                    "Saving outside the output folder is not allowed: {prefix}"
                ));
            }
        }
    }
    let Some(filename) = parts.pop() else {
        return Err("Output prefix is empty".to_string());
    };
    let subfolder = parts.join("/");
    let full_output_folder = parts
        .iter()
        .fold(output_dir.to_path_buf(), |dir, part| dir.join(part));

    std::fs::create_dir_all(&full_output_folder).map_err(|err| {
        format!(
            "Cannot create output folder {}: {err}",
            full_output_folder.display()
        )
    })?;

    let entries = std::fs::read_dir(&full_output_folder).map_err(|err| {
        format!(
            "Cannot read output folder {}: {err}",
            full_output_folder.display()
        )
    })?;
    let marker = format!("{filename}_");
    let mut highest = 0u32;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(counter) = existing_counter(&name, &marker) {
            highest = highest.max(counter);
        }
    }

    Ok(SavePath {
        full_output_folder,
        filename,
        counter: highest.saturating_add(1),
        subfolder,
    })
}

fn existing_counter(name: &str, marker: &str) -> Option<u32> {
    let rest = name.strip_prefix(marker)?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::temp_dir;

    #[test]
    fn first_counter_is_one() {
        let dir = temp_dir("save_first");
        let save = resolve_save_path("meshsave", &dir).expect("save path");
        assert_eq!(save.counter, 1);
        assert_eq!(save.filename, "meshsave");
        assert_eq!(save.subfolder, "");
        assert_eq!(save.full_output_folder, dir);
    }

    #[test]
    fn counter_moves_past_both_naming_styles() {
        let dir = temp_dir("save_counter");
        std::fs::write(dir.join("meshsave_00003_.obj"), b"").expect("write");
        std::fs::write(dir.join("meshsave_00007.uv_mapped.obj"), b"").expect("write");
        std::fs::write(dir.join("other_00042_.obj"), b"").expect("write");
        let save = resolve_save_path("meshsave", &dir).expect("save path");
        assert_eq!(save.counter, 8);
    }

    #[test]
    fn subfolders_are_created() {
        let dir = temp_dir("save_sub");
        let save = resolve_save_path("meshes/run/meshsave", &dir).expect("save path");
        assert_eq!(save.subfolder, "meshes/run");
        assert!(save.full_output_folder.is_dir());
        assert_eq!(save.full_output_folder, dir.join("meshes").join("run"));
    }

    #[test]
    fn escaping_the_output_dir_is_rejected() {
        let dir = temp_dir("save_escape");
        assert!(resolve_save_path("../meshsave", &dir).is_err());
        assert!(resolve_save_path("/tmp/meshsave", &dir).is_err());
    }
}
