/// Plain-text face/vertex mesh format
///
/// Reads `v`, `vn` and `f` statements (`i`, `i/j`, `i//k`, `i/j/k` tokens,
/// 1-based, negative indices relative to the end). Everything else (`vt`,
/// `o`, `g`, `s`, `usemtl`, `mtllib`) is skipped. Writes `v`, `vn` and
/// `f i//i ...` with one normal per vertex.

use nalgebra::{Point3, Vector3};
use std::io::{BufRead, Write};

use super::PolyhedralMesh;
use crate::error::{ModalError, Result};

pub fn read_obj<R: BufRead>(reader: R) -> Result<PolyhedralMesh> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut normals: Vec<Vector3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();
    // Normal index referenced by each vertex, if consistent across faces
    let mut vertex_normal_ref: Vec<Option<usize>> = Vec::new();
    let mut normals_consistent = true;

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.map_err(|e| ModalError::io("<obj stream>", e))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let [x, y, z] = parse_triple(&mut tokens, line_no)?;
                vertices.push(Point3::new(x, y, z));
                vertex_normal_ref.push(None);
            }
            Some("vn") => {
                let [x, y, z] = parse_triple(&mut tokens, line_no)?;
                normals.push(Vector3::new(x, y, z));
            }
            Some("f") => {
                let mut face = Vec::new();
                for token in tokens {
                    let (vi, ni) = parse_face_token(token, vertices.len(), normals.len(), line_no)?;
                    match (vertex_normal_ref[vi], ni) {
                        (None, Some(n)) => vertex_normal_ref[vi] = Some(n),
                        (Some(prev), Some(n)) if prev != n => normals_consistent = false,
                        (_, None) => normals_consistent = false,
                        _ => {}
                    }
                    face.push(vi);
                }
                if face.len() < 3 {
                    return Err(ModalError::parse(line_no, "face needs at least 3 vertices"));
                }
                faces.push(face);
            }
            _ => {}
        }
    }

    let mut mesh = PolyhedralMesh::from_faces(vertices, faces)?;

    if normals_consistent && !normals.is_empty() {
        let per_vertex: Option<Vec<Vector3<f64>>> = vertex_normal_ref
            .iter()
            .map(|r| r.map(|n| normals[n]))
            .collect();
        if let Some(per_vertex) = per_vertex {
            mesh.set_normals(per_vertex);
        }
    }

    log::debug!(
        "read obj: {} vertices, {} faces, file normals {}",
        mesh.num_vertices(),
        mesh.num_faces(),
        if mesh.has_normals() { "used" } else { "recomputed on demand" }
    );
    Ok(mesh)
}

pub fn write_obj<W: Write>(mesh: &PolyhedralMesh, mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "# {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces())?;
    for v in mesh.vertices() {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for n in mesh.vertex_normals() {
        writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    for face in mesh.faces() {
        write!(writer, "f")?;
        for &i in face {
            write!(writer, " {}//{}", i + 1, i + 1)?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

fn parse_triple<'a, I>(tokens: &mut I, line_no: usize) -> Result<[f64; 3]>
where
    I: Iterator<Item = &'a str>,
{
    let mut out = [0.0; 3];
    for slot in &mut out {
        let token = tokens
            .next()
            .ok_or_else(|| ModalError::parse(line_no, "expected 3 coordinates"))?;
        *slot = token
            .parse::<f64>()
            .map_err(|e| ModalError::parse(line_no, format!("bad number '{}': {}", token, e)))?;
    }
    Ok(out)
}

/// Resolve `i[/j[/k]]` into a 0-based vertex index and optional normal index
fn parse_face_token(
    token: &str,
    num_vertices: usize,
    num_normals: usize,
    line_no: usize,
) -> Result<(usize, Option<usize>)> {
    let mut parts = token.split('/');
    let vertex = parts
        .next()
        .ok_or_else(|| ModalError::parse(line_no, "empty face token"))?;
    let vi = resolve_index(vertex, num_vertices, line_no)?;

    let _texcoord = parts.next();
    let ni = match parts.next() {
        Some(n) if !n.is_empty() => Some(resolve_index(n, num_normals, line_no)?),
        _ => None,
    };
    Ok((vi, ni))
}

fn resolve_index(token: &str, count: usize, line_no: usize) -> Result<usize> {
    let raw: i64 = token
        .parse()
        .map_err(|_| ModalError::parse(line_no, format!("bad index '{}'", token)))?;
    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => count.checked_sub(r.unsigned_abs() as usize),
    };
    match resolved {
        Some(i) if i < count => Ok(i),
        _ => Err(ModalError::parse(
            line_no,
            format!("index {} out of range ({} defined)", raw, count),
        )),
    }
}
