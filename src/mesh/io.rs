/// File loading and saving for the polyhedral mesh store

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::obj::{read_obj, write_obj};
use super::profile::{Profile, ProfileOptions};
use super::PolyhedralMesh;
use crate::error::{ModalError, Result};

/// Formats `PolyhedralMesh::load` understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// Triangulated surface (`v` / `vn` / `f`)
    Obj,
    /// Vector-graphics profile revolved into a surface
    Svg,
}

impl MeshFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("obj") => Ok(Self::Obj),
            Some("svg") => Ok(Self::Svg),
            Some(other) => Err(ModalError::UnsupportedFormat(format!(".{} files", other))),
            None => Err(ModalError::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
        }
    }
}

impl PolyhedralMesh {
    /// Load a surface mesh, or revolve a profile, from `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, &ProfileOptions::default())
    }

    /// `load` with explicit profile revolution settings
    pub fn load_with<P: AsRef<Path>>(path: P, options: &ProfileOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = MeshFormat::from_path(path)?;

        let mesh = match format {
            MeshFormat::Obj => {
                let file = File::open(path).map_err(|e| ModalError::io(path, e))?;
                read_obj(BufReader::new(file))?
            }
            MeshFormat::Svg => {
                let text = std::fs::read_to_string(path).map_err(|e| ModalError::io(path, e))?;
                let mut profile = Profile::from_svg_document(&text, options.curve_segments)?;
                profile.simplify(1e-9);
                let closed = options.closed.unwrap_or(profile.closed);
                PolyhedralMesh::from_profile(&profile.points, options.radial_slices, closed)?
            }
        };

        log::info!(
            "loaded {}: {} vertices, {} faces",
            path.display(),
            mesh.num_vertices(),
            mesh.num_faces()
        );
        Ok(mesh)
    }

    /// Save to `path`; only the `.obj` format can be written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if MeshFormat::from_path(path)? != MeshFormat::Obj {
            return Err(ModalError::UnsupportedFormat(format!(
                "cannot export {}, only .obj is writable",
                path.display()
            )));
        }
        let file = File::create(path).map_err(|e| ModalError::io(path, e))?;
        write_obj(self, BufWriter::new(file)).map_err(|e| ModalError::io(path, e))?;
        log::info!("saved {} ({} vertices)", path.display(), self.num_vertices());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(MeshFormat::from_path(Path::new("a/b.OBJ")).unwrap(), MeshFormat::Obj);
        assert_eq!(MeshFormat::from_path(Path::new("shape.svg")).unwrap(), MeshFormat::Svg);
        assert!(matches!(
            MeshFormat::from_path(Path::new("mesh.stl")),
            Err(ModalError::UnsupportedFormat(_))
        ));
        assert!(MeshFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PolyhedralMesh::load("definitely/not/here.obj").unwrap_err();
        assert!(matches!(err, ModalError::Io { .. }));
    }

    #[test]
    fn test_save_rejects_profile_format() {
        let err = PolyhedralMesh::cube(1.0).save("out.svg").unwrap_err();
        assert!(matches!(err, ModalError::UnsupportedFormat(_)));
    }
}
