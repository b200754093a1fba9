/// 2D profiles and their revolution into surface meshes
///
/// A profile lives in the (x = radius, y = height) plane in screen
/// orientation (y grows downward) and is ordered from the outer/top point
/// to the inner/bottom one. Revolving it around the y axis produces a
/// closed surface.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use super::PolyhedralMesh;
use crate::error::{ModalError, Result};

/// Segments used to sample each curved path command
pub const DEFAULT_CURVE_SEGMENTS: usize = 8;

/// Radial slices used when a profile file is loaded directly
pub const DEFAULT_RADIAL_SLICES: usize = 32;

/// How profile files are turned into surfaces on load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    pub radial_slices: usize,
    pub curve_segments: usize,
    /// Overrides the close command found in the path data
    pub closed: Option<bool>,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            radial_slices: DEFAULT_RADIAL_SLICES,
            curve_segments: DEFAULT_CURVE_SEGMENTS,
            closed: None,
        }
    }
}

/// Ordered polyline sampled from vector path data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub points: Vec<Point2<f64>>,
    /// Path ended with a close command
    pub closed: bool,
}

impl Profile {
    pub fn new(points: Vec<Point2<f64>>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Parse SVG path data (`d` attribute), sampling curves into line segments
    ///
    /// Supports `M L H V C S Q T Z` in absolute and relative form. Elliptical
    /// arcs are rejected.
    pub fn from_svg_path(d: &str, curve_segments: usize) -> Result<Self> {
        let segments = curve_segments.max(1);
        let tokens = tokenize_path(d)?;
        let mut points: Vec<Point2<f64>> = Vec::new();
        let mut closed = false;

        let mut cursor = Point2::origin();
        let mut subpath_start = Point2::origin();
        let mut last_control: Option<Point2<f64>> = None;
        let mut last_quad_control: Option<Point2<f64>> = None;
        let mut pos = 0;
        let mut command: Option<char> = None;

        while pos < tokens.len() {
            let cmd = match tokens[pos] {
                PathToken::Command(c) => {
                    pos += 1;
                    c
                }
                PathToken::Number(_) => match command {
                    // Implicit repetition; a repeated moveto becomes lineto
                    Some('M') => 'L',
                    Some('m') => 'l',
                    Some(c) => c,
                    None => {
                        return Err(ModalError::UnsupportedFormat(
                            "path data must start with a command".to_string(),
                        ))
                    }
                },
            };
            command = Some(cmd);
            let relative = cmd.is_ascii_lowercase();
            let base = if relative { cursor.coords } else { nalgebra::Vector2::zeros() };

            match cmd.to_ascii_uppercase() {
                'M' | 'L' | 'T' => {
                    let [x, y] = take_numbers::<2>(&tokens, &mut pos)?;
                    let target = Point2::new(x, y) + base;
                    match cmd.to_ascii_uppercase() {
                        'M' => subpath_start = target,
                        'T' => {
                            let control = reflect(last_quad_control, cursor);
                            sample_quadratic(&mut points, cursor, control, target, segments);
                            last_quad_control = Some(control);
                            cursor = target;
                            last_control = None;
                            continue;
                        }
                        _ => {}
                    }
                    push_point(&mut points, target);
                    cursor = target;
                    last_control = None;
                    last_quad_control = None;
                }
                'H' => {
                    let [x] = take_numbers::<1>(&tokens, &mut pos)?;
                    cursor = Point2::new(x + base.x, cursor.y);
                    push_point(&mut points, cursor);
                    last_control = None;
                    last_quad_control = None;
                }
                'V' => {
                    let [y] = take_numbers::<1>(&tokens, &mut pos)?;
                    cursor = Point2::new(cursor.x, y + base.y);
                    push_point(&mut points, cursor);
                    last_control = None;
                    last_quad_control = None;
                }
                'C' => {
                    let [x1, y1, x2, y2, x, y] = take_numbers::<6>(&tokens, &mut pos)?;
                    let c1 = Point2::new(x1, y1) + base;
                    let c2 = Point2::new(x2, y2) + base;
                    let target = Point2::new(x, y) + base;
                    sample_cubic(&mut points, cursor, c1, c2, target, segments);
                    last_control = Some(c2);
                    last_quad_control = None;
                    cursor = target;
                }
                'S' => {
                    let [x2, y2, x, y] = take_numbers::<4>(&tokens, &mut pos)?;
                    let c1 = reflect(last_control, cursor);
                    let c2 = Point2::new(x2, y2) + base;
                    let target = Point2::new(x, y) + base;
                    sample_cubic(&mut points, cursor, c1, c2, target, segments);
                    last_control = Some(c2);
                    last_quad_control = None;
                    cursor = target;
                }
                'Q' => {
                    let [x1, y1, x, y] = take_numbers::<4>(&tokens, &mut pos)?;
                    let control = Point2::new(x1, y1) + base;
                    let target = Point2::new(x, y) + base;
                    sample_quadratic(&mut points, cursor, control, target, segments);
                    last_quad_control = Some(control);
                    last_control = None;
                    cursor = target;
                }
                'Z' => {
                    closed = true;
                    cursor = subpath_start;
                    last_control = None;
                    last_quad_control = None;
                    // The closing segment is implied; drop a duplicated start point
                    if points.len() > 1 && points.last() == points.first() {
                        points.pop();
                    }
                }
                'A' => {
                    return Err(ModalError::UnsupportedFormat(
                        "elliptical arc path commands are not supported".to_string(),
                    ))
                }
                other => {
                    return Err(ModalError::UnsupportedFormat(format!(
                        "unknown path command '{}'",
                        other
                    )))
                }
            }
        }

        Ok(Self { points, closed })
    }

    /// Extract the first `<path d="...">` of an SVG document
    pub fn from_svg_document(text: &str, curve_segments: usize) -> Result<Self> {
        let mut rest = text;
        while let Some(start) = rest.find("<path") {
            let element = &rest[start..];
            let end = element.find('>').unwrap_or(element.len());
            if let Some(d) = attribute(&element[..end], "d") {
                return Self::from_svg_path(d, curve_segments);
            }
            rest = &element[end..];
        }
        Err(ModalError::UnsupportedFormat(
            "svg document has no <path> with path data".to_string(),
        ))
    }

    /// Drop consecutive points closer than `min_distance`
    pub fn simplify(&mut self, min_distance: f64) {
        let mut kept: Vec<Point2<f64>> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            match kept.last() {
                Some(last) if nalgebra::distance(last, p) < min_distance => {}
                _ => kept.push(*p),
            }
        }
        self.points = kept;
    }
}

impl PolyhedralMesh {
    /// Replace this mesh with the revolution of `profile` around the y axis
    ///
    /// Open profiles (`closed == false`) collapse their first and last points
    /// onto the axis as two apex vertices, giving
    /// `radial_slices * (n - 2) + 2` vertices. Closed profiles replicate every
    /// point per slice and produce a tube. The result is mirrored in y
    /// (screen to world) and centred on its bounding box. Profiles with fewer
    /// than 3 points leave the mesh cleared.
    pub fn extrude_profile(
        &mut self,
        profile: &[Point2<f64>],
        radial_slices: usize,
        closed: bool,
    ) -> Result<()> {
        self.clear();
        if profile.len() < 3 {
            log::debug!("profile has {} points, nothing to extrude", profile.len());
            return Ok(());
        }
        if radial_slices < 3 {
            return Err(ModalError::InvalidParameters(format!(
                "need at least 3 radial slices, got {}",
                radial_slices
            )));
        }

        let mut ordered = profile.to_vec();
        if profile_signed_area(&ordered, closed) < 0.0 {
            ordered.reverse();
        }

        let revolved = if closed {
            revolve_closed(&ordered, radial_slices)
        } else {
            revolve_open(&ordered, radial_slices)
        };
        let (vertices, faces) = revolved;
        *self = PolyhedralMesh::from_faces(vertices, faces)?;
        self.mirror_y();
        self.center_bounds();

        log::info!(
            "extruded {}-point {} profile over {} slices: {} vertices, {} faces",
            profile.len(),
            if closed { "closed" } else { "open" },
            radial_slices,
            self.num_vertices(),
            self.num_faces()
        );
        Ok(())
    }

    pub fn from_profile(profile: &[Point2<f64>], radial_slices: usize, closed: bool) -> Result<Self> {
        let mut mesh = Self::new();
        mesh.extrude_profile(profile, radial_slices, closed)?;
        Ok(mesh)
    }
}

fn ring_point(p: &Point2<f64>, slice: usize, slices: usize) -> Point3<f64> {
    let angle = std::f64::consts::TAU * slice as f64 / slices as f64;
    Point3::new(p.x * angle.cos(), p.y, p.x * angle.sin())
}

fn revolve_open(profile: &[Point2<f64>], slices: usize) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let n = profile.len();
    let ring = n - 2;
    let mut vertices = Vec::with_capacity(slices * ring + 2);

    let top = 0;
    vertices.push(Point3::new(0.0, profile[0].y, 0.0));
    for s in 0..slices {
        for p in &profile[1..n - 1] {
            vertices.push(ring_point(p, s, slices));
        }
    }
    let bottom = vertices.len();
    vertices.push(Point3::new(0.0, profile[n - 1].y, 0.0));

    let v = |s: usize, r: usize| 1 + (s % slices) * ring + r;
    let mut faces = Vec::with_capacity(slices * (ring + 1));
    for s in 0..slices {
        faces.push(vec![top, v(s, 0), v(s + 1, 0)]);
        for r in 0..ring.saturating_sub(1) {
            faces.push(vec![v(s, r), v(s, r + 1), v(s + 1, r + 1), v(s + 1, r)]);
        }
        faces.push(vec![bottom, v(s + 1, ring - 1), v(s, ring - 1)]);
    }
    (vertices, faces)
}

fn revolve_closed(profile: &[Point2<f64>], slices: usize) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let n = profile.len();
    let mut vertices = Vec::with_capacity(slices * n);
    for s in 0..slices {
        for p in profile {
            vertices.push(ring_point(p, s, slices));
        }
    }

    let v = |s: usize, r: usize| (s % slices) * n + (r % n);
    let mut faces = Vec::with_capacity(slices * n);
    for s in 0..slices {
        for r in 0..n {
            faces.push(vec![v(s, r), v(s, r + 1), v(s + 1, r + 1), v(s + 1, r)]);
        }
    }
    (vertices, faces)
}

/// Shoelace area of the profile; open profiles are closed along the axis
fn profile_signed_area(points: &[Point2<f64>], closed: bool) -> f64 {
    let mut loop_points = points.to_vec();
    if !closed {
        let first = points[0];
        let last = points[points.len() - 1];
        loop_points.insert(0, Point2::new(0.0, first.y));
        loop_points.push(Point2::new(0.0, last.y));
    }
    let n = loop_points.len();
    (0..n)
        .map(|i| {
            let a = loop_points[i];
            let b = loop_points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        * 0.5
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PathToken {
    Command(char),
    Number(f64),
}

fn tokenize_path(d: &str) -> Result<Vec<PathToken>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = d.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() || c == ',' {
            i += 1;
        } else if c.is_ascii_alphabetic() && c != 'e' && c != 'E' {
            tokens.push(PathToken::Command(c));
            i += 1;
        } else {
            let start = i;
            let mut seen_dot = false;
            let mut seen_exp = false;
            if chars[i] == '-' || chars[i] == '+' {
                i += 1;
            }
            while i < chars.len() {
                let ch = chars[i];
                if ch.is_ascii_digit() {
                    i += 1;
                } else if ch == '.' && !seen_dot && !seen_exp {
                    seen_dot = true;
                    i += 1;
                } else if (ch == 'e' || ch == 'E') && !seen_exp {
                    seen_exp = true;
                    i += 1;
                    if i < chars.len() && (chars[i] == '-' || chars[i] == '+') {
                        i += 1;
                    }
                } else {
                    break;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<f64>().map_err(|_| {
                ModalError::UnsupportedFormat(format!("bad number '{}' in path data", text))
            })?;
            tokens.push(PathToken::Number(value));
        }
    }
    Ok(tokens)
}

fn take_numbers<const N: usize>(tokens: &[PathToken], pos: &mut usize) -> Result<[f64; N]> {
    let mut out = [0.0; N];
    for slot in &mut out {
        match tokens.get(*pos) {
            Some(PathToken::Number(v)) => {
                *slot = *v;
                *pos += 1;
            }
            _ => {
                return Err(ModalError::UnsupportedFormat(
                    "path command is missing arguments".to_string(),
                ))
            }
        }
    }
    Ok(out)
}

fn reflect(control: Option<Point2<f64>>, about: Point2<f64>) -> Point2<f64> {
    match control {
        Some(c) => about + (about - c),
        None => about,
    }
}

fn push_point(points: &mut Vec<Point2<f64>>, p: Point2<f64>) {
    if points.last() != Some(&p) {
        points.push(p);
    }
}

fn sample_cubic(
    points: &mut Vec<Point2<f64>>,
    p0: Point2<f64>,
    c1: Point2<f64>,
    c2: Point2<f64>,
    p1: Point2<f64>,
    segments: usize,
) {
    push_point(points, p0);
    for k in 1..=segments {
        let t = k as f64 / segments as f64;
        let u = 1.0 - t;
        let coords = p0.coords * (u * u * u)
            + c1.coords * (3.0 * u * u * t)
            + c2.coords * (3.0 * u * t * t)
            + p1.coords * (t * t * t);
        push_point(points, Point2::from(coords));
    }
}

fn sample_quadratic(
    points: &mut Vec<Point2<f64>>,
    p0: Point2<f64>,
    c: Point2<f64>,
    p1: Point2<f64>,
    segments: usize,
) {
    push_point(points, p0);
    for k in 1..=segments {
        let t = k as f64 / segments as f64;
        let u = 1.0 - t;
        let coords = p0.coords * (u * u) + c.coords * (2.0 * u * t) + p1.coords * (t * t);
        push_point(points, Point2::from(coords));
    }
}

fn attribute<'a>(element: &'a str, name: &str) -> Option<&'a str> {
    let bytes = element.as_bytes();
    let mut search = 0;
    while let Some(found) = element[search..].find(name) {
        let at = search + found;
        search = at + name.len();
        let preceded_ok = at == 0 || bytes[at - 1].is_ascii_whitespace();
        let rest = element[search..].trim_start();
        if !preceded_ok || !rest.starts_with('=') {
            continue;
        }
        let rest = rest[1..].trim_start();
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let body = &rest[1..];
        let end = body.find(quote)?;
        return Some(&body[..end]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bowl_profile() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.2),
            Point2::new(1.2, 0.8),
            Point2::new(0.8, 1.4),
            Point2::new(0.0, 1.6),
        ]
    }

    #[test]
    fn test_open_profile_vertex_count() {
        let mesh = PolyhedralMesh::from_profile(&bowl_profile(), 8, false).unwrap();
        assert_eq!(mesh.num_vertices(), 8 * 3 + 2);
        // two cap fans plus (n - 3) quad bands
        assert_eq!(mesh.num_faces(), 8 * 2 + 8 * 2);
    }

    #[test]
    fn test_open_profile_is_outward_and_centred() {
        let mesh = PolyhedralMesh::from_profile(&bowl_profile(), 16, false).unwrap();
        assert!(mesh.enclosed_volume() > 0.0);
        let b = mesh.compute_bounds().unwrap();
        assert_relative_eq!(b.center().coords.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reversed_profile_still_outward() {
        let mut profile = bowl_profile();
        profile.reverse();
        let mesh = PolyhedralMesh::from_profile(&profile, 12, false).unwrap();
        assert!(mesh.enclosed_volume() > 0.0);
    }

    #[test]
    fn test_mirror_puts_first_point_on_top() {
        let mesh = PolyhedralMesh::from_profile(&bowl_profile(), 8, false).unwrap();
        // Screen y grows downward, so the first profile point ends highest
        assert!(mesh.vertices()[0].y > mesh.vertices()[mesh.num_vertices() - 1].y);
    }

    #[test]
    fn test_closed_profile_makes_tube() {
        let square = vec![
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
        ];
        let mesh = PolyhedralMesh::from_profile(&square, 10, true).unwrap();
        assert_eq!(mesh.num_vertices(), 40);
        assert_eq!(mesh.num_faces(), 40);
        assert!(mesh.enclosed_volume() > 0.0);
    }

    #[test]
    fn test_short_profile_only_clears() {
        let mut mesh = PolyhedralMesh::cube(1.0);
        mesh.extrude_profile(&[Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)], 8, false)
            .unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_parses_lines_and_curves() {
        let p = Profile::from_svg_path("M 0 0 L 10 0 C 10 5, 5 10, 0 10", 4).unwrap();
        assert!(!p.closed);
        assert_eq!(p.len(), 2 + 4);
        assert_eq!(p.points[0], Point2::new(0.0, 0.0));
        assert_relative_eq!(p.points.last().unwrap().y, 10.0);
    }

    #[test]
    fn test_parses_relative_and_close() {
        let p = Profile::from_svg_path("m1,1 h2 v2 h-2 z", 4).unwrap();
        assert!(p.closed);
        assert_eq!(
            p.points,
            vec![
                Point2::new(1.0, 1.0),
                Point2::new(3.0, 1.0),
                Point2::new(3.0, 3.0),
                Point2::new(1.0, 3.0)
            ]
        );
    }

    #[test]
    fn test_rejects_arcs() {
        assert!(Profile::from_svg_path("M0 0 A 5 5 0 0 1 10 10", 4).is_err());
    }

    #[test]
    fn test_reads_path_from_document() {
        let doc = r#"<svg><g><path id="p" d="M0,0 L1,2 L0,4"/></g></svg>"#;
        let p = Profile::from_svg_document(doc, 4).unwrap();
        assert_eq!(p.len(), 3);
        assert!(Profile::from_svg_document("<svg></svg>", 4).is_err());
    }

    #[test]
    fn test_simplify_drops_near_duplicates() {
        let mut p = Profile::new(
            vec![Point2::new(0.0, 0.0), Point2::new(0.0, 1e-9), Point2::new(1.0, 0.0)],
            false,
        );
        p.simplify(1e-6);
        assert_eq!(p.len(), 2);
    }
}
