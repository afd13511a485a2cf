//! Contact routines for every supported pair of shape kinds.
//!
//! Each routine returns the number of contacts it produced. With
//! `just_test` set it returns 1 on the first overlap found and pushes
//! nothing.
//!
//! Contact rows store the normal pointing out of body A and contact points
//! relative to each body's position. Routines that involve a plane or a
//! heightfield always put that shape on side A.

use std::f64::consts::FRAC_PI_2;

use planar_types::math::{Vec2, normalize_or_zero, rotate, to_global_frame, to_local_frame, vec2, vector_to_global_frame};
use smallvec::SmallVec;

use super::{Collider, Narrowphase};
use crate::shape::{Capsule, Convex, Heightfield, ShapeKind, TILE_DEPTH, plane::plane_normal};

/// Tolerance when choosing which polygon provides the reference face.
const REFERENCE_FACE_TOLERANCE: f64 = 0.0005;

/// A polygon in world coordinates.
struct WorldPolygon {
    vertices: SmallVec<[Vec2; 8]>,
    normals: SmallVec<[Vec2; 8]>,
}

impl WorldPolygon {
    fn new(poly: &Convex, position: &Vec2, angle: f64) -> Self {
        Self {
            vertices: poly
                .vertices()
                .iter()
                .map(|v| to_global_frame(v, position, angle))
                .collect(),
            normals: poly
                .normals()
                .iter()
                .map(|n| vector_to_global_frame(n, angle))
                .collect(),
        }
    }

    fn len(&self) -> usize {
        self.vertices.len()
    }

    fn edge(&self, i: usize) -> (Vec2, Vec2) {
        (self.vertices[i], self.vertices[(i + 1) % self.len()])
    }
}

/// Edge of `p1` with the largest separation from `p2`.
fn find_max_separation(p1: &WorldPolygon, p2: &WorldPolygon) -> (usize, f64) {
    let mut best_index = 0;
    let mut max_separation = f64::NEG_INFINITY;
    for i in 0..p1.len() {
        let n = p1.normals[i];
        let v1 = p1.vertices[i];
        let si = p2
            .vertices
            .iter()
            .map(|v2| n.dot(&(v2 - v1)))
            .fold(f64::INFINITY, f64::min);
        if si > max_separation {
            max_separation = si;
            best_index = i;
        }
    }
    (best_index, max_separation)
}

/// Edge of `incident` most anti-parallel to the reference normal.
fn find_incident_edge(reference_normal: &Vec2, incident: &WorldPolygon) -> (Vec2, Vec2) {
    let mut index = 0;
    let mut min_dot = f64::INFINITY;
    for (i, n) in incident.normals.iter().enumerate() {
        let dot = reference_normal.dot(n);
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }
    incident.edge(index)
}

/// Keep the part of a segment behind a line `normal · x = offset`.
fn clip_segment_to_line(input: [Vec2; 2], normal: &Vec2, offset: f64) -> SmallVec<[Vec2; 2]> {
    let mut out = SmallVec::new();
    let d0 = normal.dot(&input[0]) - offset;
    let d1 = normal.dot(&input[1]) - offset;
    if d0 <= 0.0 {
        out.push(input[0]);
    }
    if d1 <= 0.0 {
        out.push(input[1]);
    }
    if d0 * d1 < 0.0 {
        let interp = d0 / (d0 - d1);
        out.push(input[0] + (input[1] - input[0]) * interp);
    }
    out
}

/// Range of samples `[first, last]` covering `[min_x, max_x]` in the
/// heightfield frame. `None` when the range misses the field.
fn sample_range(field: &Heightfield, min_x: f64, max_x: f64) -> Option<(usize, usize)> {
    let w = field.element_width();
    let last = field.heights().len() as isize - 1;
    let first = ((min_x / w).floor() as isize).max(0);
    let end = ((max_x / w).ceil() as isize).min(last);
    if first > end {
        return None;
    }
    Some((first as usize, end as usize))
}

impl Narrowphase {
    // ========================================================================
    // Circles and particles
    // ========================================================================

    /// Circle against circle. Touching counts as contact.
    pub fn circle_circle(
        &mut self,
        a: &Collider<'_>,
        radius_a: f64,
        b: &Collider<'_>,
        radius_b: f64,
        just_test: bool,
    ) -> usize {
        let dist = b.position - a.position;
        let radius = radius_a + radius_b;
        if dist.norm_squared() > radius * radius {
            return 0;
        }
        if just_test {
            return 1;
        }
        let n = normalize_or_zero(&dist);
        let index = self.push_contact(a, b, n, a.position + n * radius_a, b.position - n * radius_b);
        self.single_contact_friction(index);
        1
    }

    /// Circle against particle.
    pub fn circle_particle(&mut self, a: &Collider<'_>, radius: f64, b: &Collider<'_>, just_test: bool) -> usize {
        self.circle_circle(a, radius, b, 0.0, just_test)
    }

    /// Circle against plane. The plane is body A of the contact.
    pub fn circle_plane(&mut self, a: &Collider<'_>, radius: f64, b: &Collider<'_>, just_test: bool) -> usize {
        let n = plane_normal(b.angle);
        let d = n.dot(&(a.position - b.position));
        if d > radius {
            return 0;
        }
        if just_test {
            return 1;
        }
        let index = self.push_contact(b, a, n, a.position - n * d, a.position - n * radius);
        self.single_contact_friction(index);
        1
    }

    /// Particle against plane. The plane is body A of the contact.
    pub fn particle_plane(&mut self, a: &Collider<'_>, b: &Collider<'_>, just_test: bool) -> usize {
        let n = plane_normal(b.angle);
        let d = n.dot(&(a.position - b.position));
        if d > 0.0 {
            return 0;
        }
        if just_test {
            return 1;
        }
        let index = self.push_contact(b, a, n, a.position - n * d, a.position);
        self.single_contact_friction(index);
        1
    }

    /// Circle against a thick segment of `length` centred on `b`.
    ///
    /// The segment interior is tried first; the projection of the circle
    /// centre has to fall strictly inside the segment. The end points are
    /// tried after that.
    pub fn circle_line(
        &mut self,
        a: &Collider<'_>,
        circle_radius: f64,
        b: &Collider<'_>,
        length: f64,
        line_radius: f64,
        just_test: bool,
    ) -> usize {
        let half = length / 2.0;
        let start = to_global_frame(&vec2(-half, 0.0), &b.position, b.angle);
        let end = to_global_frame(&vec2(half, 0.0), &b.position, b.angle);
        let center = a.position;
        let radius_sum = circle_radius + line_radius;

        let tangent = normalize_or_zero(&(end - start));
        let along = tangent.dot(&(center - start));
        let projected = start + tangent * along;
        let ortho = projected - center;
        if along > 0.0 && along < length && ortho.norm_squared() < radius_sum * radius_sum {
            if just_test {
                return 1;
            }
            let n = normalize_or_zero(&ortho);
            let index = self.push_contact(a, b, n, center + n * circle_radius, projected - n * line_radius);
            self.single_contact_friction(index);
            return 1;
        }

        for vertex in [start, end] {
            let dist = vertex - center;
            if dist.norm_squared() < radius_sum * radius_sum {
                if just_test {
                    return 1;
                }
                let n = normalize_or_zero(&dist);
                let index = self.push_contact(a, b, n, center + n * circle_radius, vertex - n * line_radius);
                self.single_contact_friction(index);
                return 1;
            }
        }
        0
    }

    /// Circle against capsule.
    pub fn circle_capsule(
        &mut self,
        a: &Collider<'_>,
        radius: f64,
        b: &Collider<'_>,
        capsule: &Capsule,
        just_test: bool,
    ) -> usize {
        self.circle_line(a, radius, b, capsule.length(), capsule.radius(), just_test)
    }

    /// Particle against capsule.
    pub fn particle_capsule(&mut self, a: &Collider<'_>, b: &Collider<'_>, capsule: &Capsule, just_test: bool) -> usize {
        self.circle_line(a, 0.0, b, capsule.length(), capsule.radius(), just_test)
    }

    /// Circle against convex polygon.
    ///
    /// For each edge the deepest circle point towards it is tested against
    /// the polygon; the edge with the smallest penetration wins. When no
    /// such point lies inside, the polygon corners are tried.
    pub fn circle_convex(
        &mut self,
        a: &Collider<'_>,
        radius: f64,
        b: &Collider<'_>,
        poly: &Convex,
        just_test: bool,
    ) -> usize {
        let world = WorldPolygon::new(poly, &b.position, b.angle);
        let center = a.position;

        let mut best: Option<(Vec2, Vec2, f64)> = None;
        for i in 0..world.len() {
            let (v0, _) = world.edge(i);
            let edge_normal = world.normals[i];
            let candidate = center - edge_normal * radius;
            if !poly.point_test(&to_local_frame(&candidate, &b.position, b.angle)) {
                continue;
            }
            let depth = (v0 - candidate).dot(&edge_normal);
            if best.is_none_or(|(_, _, d)| depth.abs() < d.abs()) {
                best = Some((edge_normal, candidate, depth));
            }
        }

        if let Some((edge_normal, candidate, depth)) = best {
            if just_test {
                return 1;
            }
            let index = self.push_contact(a, b, -edge_normal, candidate, candidate + edge_normal * depth);
            self.single_contact_friction(index);
            return 1;
        }

        if radius > 0.0 {
            for vertex in &world.vertices {
                let dist = vertex - center;
                if dist.norm_squared() < radius * radius {
                    if just_test {
                        return 1;
                    }
                    let n = normalize_or_zero(&dist);
                    let index = self.push_contact(a, b, n, center + n * radius, *vertex);
                    self.single_contact_friction(index);
                    return 1;
                }
            }
        }
        0
    }

    /// Particle against convex polygon, pushed out through the closest edge.
    pub fn particle_convex(&mut self, a: &Collider<'_>, b: &Collider<'_>, poly: &Convex, just_test: bool) -> usize {
        let point = a.position;
        if !poly.point_test(&to_local_frame(&point, &b.position, b.angle)) {
            return 0;
        }
        if just_test {
            return 1;
        }
        let world = WorldPolygon::new(poly, &b.position, b.angle);
        let mut best: Option<(Vec2, f64)> = None;
        for i in 0..world.len() {
            let (v0, _) = world.edge(i);
            let edge_normal = world.normals[i];
            let d = (point - v0).dot(&edge_normal);
            if best.is_none_or(|(_, bd)| d.abs() < bd.abs()) {
                best = Some((edge_normal, d));
            }
        }
        let Some((edge_normal, d)) = best else {
            return 0;
        };
        let index = self.push_contact(a, b, -edge_normal, point, point - edge_normal * d);
        self.single_contact_friction(index);
        1
    }

    /// Circle against heightfield. The heightfield is body A.
    ///
    /// Segment faces are tried first. The sample points are only tried
    /// when no face produced a contact, so a circle resting on a flat run
    /// gets one row per face.
    pub fn circle_heightfield(
        &mut self,
        a: &Collider<'_>,
        radius: f64,
        b: &Collider<'_>,
        field: &Heightfield,
        just_test: bool,
    ) -> usize {
        let local = a.position - b.position;
        let Some((first, last)) = sample_range(field, local.x - radius, local.x + radius) else {
            return 0;
        };
        let heights = field.heights();
        let max_height = heights[first..=last].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if local.y - radius > max_height {
            return 0;
        }
        let w = field.element_width();
        let sample = |i: usize| b.position + vec2(i as f64 * w, heights[i]);

        let mut count = 0;
        for i in first..last {
            let v0 = sample(i);
            let v1 = sample(i + 1);
            let n = normalize_or_zero(&rotate(&(v1 - v0), FRAC_PI_2));
            let candidate = a.position - n * radius;
            let d = (candidate - v0).dot(&n);
            if candidate.x >= v0.x && candidate.x < v1.x && d <= 0.0 {
                if just_test {
                    return 1;
                }
                let index = self.push_contact(b, a, n, candidate - n * d, candidate);
                self.manifold_contact_friction(index);
                count += 1;
            }
        }

        if count == 0 && radius > 0.0 {
            for i in first..=last {
                let v0 = sample(i);
                let dist = a.position - v0;
                if dist.norm_squared() < radius * radius {
                    if just_test {
                        return 1;
                    }
                    let n = normalize_or_zero(&dist);
                    let index = self.push_contact(b, a, n, v0, a.position - n * radius);
                    self.manifold_contact_friction(index);
                    count += 1;
                }
            }
        }

        self.finish_manifold(count);
        count
    }

    // ========================================================================
    // Planes
    // ========================================================================

    /// Plane against convex polygon: one contact per corner below the
    /// surface. The plane is body A.
    pub fn plane_convex(&mut self, a: &Collider<'_>, b: &Collider<'_>, poly: &Convex, just_test: bool) -> usize {
        let n = plane_normal(a.angle);
        let mut count = 0;
        for local in poly.vertices() {
            let vertex = to_global_frame(local, &b.position, b.angle);
            let d = n.dot(&(vertex - a.position));
            if d <= 0.0 {
                if just_test {
                    return 1;
                }
                let index = self.push_contact(a, b, n, vertex - n * d, vertex);
                self.manifold_contact_friction(index);
                count += 1;
            }
        }
        self.finish_manifold(count);
        count
    }

    /// Plane against line: one contact per end point below the surface.
    pub fn plane_line(&mut self, a: &Collider<'_>, b: &Collider<'_>, length: f64, just_test: bool) -> usize {
        let n = plane_normal(a.angle);
        let half = length / 2.0;
        let mut count = 0;
        for x in [-half, half] {
            let vertex = to_global_frame(&vec2(x, 0.0), &b.position, b.angle);
            let d = n.dot(&(vertex - a.position));
            if d < 0.0 {
                if just_test {
                    return 1;
                }
                let index = self.push_contact(a, b, n, vertex - n * d, vertex);
                self.manifold_contact_friction(index);
                count += 1;
            }
        }
        self.finish_manifold(count);
        count
    }

    /// Plane against capsule, as two end circles.
    pub fn plane_capsule(&mut self, a: &Collider<'_>, b: &Collider<'_>, capsule: &Capsule, just_test: bool) -> usize {
        let ends = capsule.end_points(&b.position, b.angle);
        let radius = capsule.radius();
        let count = self.without_friction(|np| {
            let mut count = 0;
            for end in ends {
                count += np.circle_plane(&b.at(end, b.angle), radius, a, just_test);
                if just_test && count > 0 {
                    break;
                }
            }
            count
        });
        if just_test {
            return count.min(1);
        }
        self.finish_manifold(count);
        count
    }

    // ========================================================================
    // Polygons and capsules
    // ========================================================================

    /// Polygon `a` against whatever `b` is.
    pub(crate) fn convex_against(
        &mut self,
        a: &Collider<'_>,
        poly: &Convex,
        b: &Collider<'_>,
        just_test: bool,
    ) -> usize {
        match b.shape.kind() {
            ShapeKind::Convex(other) => self.convex_convex(a, poly, b, other, just_test),
            ShapeKind::Box(other) => self.convex_convex(a, poly, b, other.polygon(), just_test),
            ShapeKind::Line(_) => Self::convex_line(),
            ShapeKind::Capsule(capsule) => self.convex_capsule(a, poly, b, capsule, just_test),
            ShapeKind::Heightfield(field) => self.convex_heightfield(a, poly, b, field, just_test),
            _ => 0,
        }
    }

    /// Polygon against polygon by reference-face clipping.
    ///
    /// The polygon whose face separates the pair best becomes the reference;
    /// the most anti-parallel face of the other is clipped against the side
    /// planes of the reference face. Up to two contacts, each with the
    /// reference body as body A.
    pub fn convex_convex(
        &mut self,
        a: &Collider<'_>,
        poly_a: &Convex,
        b: &Collider<'_>,
        poly_b: &Convex,
        just_test: bool,
    ) -> usize {
        let world_a = WorldPolygon::new(poly_a, &a.position, a.angle);
        let world_b = WorldPolygon::new(poly_b, &b.position, b.angle);

        let (edge_a, separation_a) = find_max_separation(&world_a, &world_b);
        if separation_a > 0.0 {
            return 0;
        }
        let (edge_b, separation_b) = find_max_separation(&world_b, &world_a);
        if separation_b > 0.0 {
            return 0;
        }

        let flip = separation_b > separation_a + REFERENCE_FACE_TOLERANCE;
        let (reference, reference_collider, incident, incident_collider, edge) = if flip {
            (&world_b, b, &world_a, a, edge_b)
        } else {
            (&world_a, a, &world_b, b, edge_a)
        };

        let normal = reference.normals[edge];
        let (incident_0, incident_1) = find_incident_edge(&normal, incident);
        let (v11, v12) = reference.edge(edge);
        let tangent = normalize_or_zero(&(v12 - v11));

        let front_offset = normal.dot(&v11);
        let side_offset_1 = -tangent.dot(&v11);
        let side_offset_2 = tangent.dot(&v12);

        let clip_1 = clip_segment_to_line([incident_0, incident_1], &-tangent, side_offset_1);
        if clip_1.len() < 2 {
            return 0;
        }
        let clip_2 = clip_segment_to_line([clip_1[0], clip_1[1]], &tangent, side_offset_2);
        if clip_2.len() < 2 {
            return 0;
        }

        let mut count = 0;
        for point in clip_2 {
            let separation = normal.dot(&point) - front_offset;
            if separation <= 0.0 {
                if just_test {
                    return 1;
                }
                let index = self.push_contact(
                    reference_collider,
                    incident_collider,
                    normal,
                    point - normal * separation,
                    point,
                );
                self.manifold_contact_friction(index);
                count += 1;
            }
        }
        self.finish_manifold(count);
        count
    }

    /// Polygon against capsule: both end circles, then the middle rectangle.
    pub fn convex_capsule(
        &mut self,
        a: &Collider<'_>,
        poly: &Convex,
        b: &Collider<'_>,
        capsule: &Capsule,
        just_test: bool,
    ) -> usize {
        let ends = capsule.end_points(&b.position, b.angle);
        let radius = capsule.radius();
        let count = self.without_friction(|np| {
            let mut count = 0;
            for end in ends {
                count += np.circle_convex(&b.at(end, b.angle), radius, a, poly, just_test);
                if just_test && count > 0 {
                    return count;
                }
            }
            count + np.convex_convex(a, poly, b, capsule.middle(), just_test)
        });
        if just_test {
            return count.min(1);
        }
        self.finish_manifold(count);
        count
    }

    /// Capsule against capsule: the four end circle pairs, each set of end
    /// circles against the other middle rectangle, then the two rectangles.
    pub fn capsule_capsule(
        &mut self,
        a: &Collider<'_>,
        capsule_a: &Capsule,
        b: &Collider<'_>,
        capsule_b: &Capsule,
        just_test: bool,
    ) -> usize {
        let ends_a = capsule_a.end_points(&a.position, a.angle);
        let ends_b = capsule_b.end_points(&b.position, b.angle);
        let (ra, rb) = (capsule_a.radius(), capsule_b.radius());

        let count = self.without_friction(|np| {
            let mut count = 0;
            for end_a in ends_a {
                for end_b in ends_b {
                    count += np.circle_circle(&a.at(end_a, a.angle), ra, &b.at(end_b, b.angle), rb, just_test);
                    if just_test && count > 0 {
                        return count;
                    }
                }
            }
            for end_b in ends_b {
                count += np.circle_convex(&b.at(end_b, b.angle), rb, a, capsule_a.middle(), just_test);
            }
            for end_a in ends_a {
                count += np.circle_convex(&a.at(end_a, a.angle), ra, b, capsule_b.middle(), just_test);
            }
            if just_test && count > 0 {
                return count;
            }
            count + np.convex_convex(a, capsule_a.middle(), b, capsule_b.middle(), just_test)
        });
        if just_test {
            return count.min(1);
        }
        self.finish_manifold(count);
        count
    }

    /// Polygon against heightfield.
    ///
    /// Every segment under the polygon's bounding box becomes a tile that
    /// reaches [`TILE_DEPTH`] below the segment, and the tiles are collided
    /// as polygons.
    pub fn convex_heightfield(
        &mut self,
        a: &Collider<'_>,
        poly: &Convex,
        b: &Collider<'_>,
        field: &Heightfield,
        just_test: bool,
    ) -> usize {
        let aabb = poly.aabb(&a.position, a.angle);
        let Some((first, last)) =
            sample_range(field, aabb.lower_bound.x - b.position.x, aabb.upper_bound.x - b.position.x)
        else {
            return 0;
        };
        let heights = field.heights();
        let max_height = heights[first..=last].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if aabb.lower_bound.y - b.position.y > max_height {
            return 0;
        }
        let w = field.element_width();

        let count = self.without_friction(|np| {
            let mut count = 0;
            for i in first..last {
                let v0 = vec2(i as f64 * w, heights[i]);
                let v1 = vec2((i + 1) as f64 * w, heights[i + 1]);
                let tile_position = vec2((v0.x + v1.x) / 2.0, (v0.y + v1.y - TILE_DEPTH) / 2.0);
                let down = vec2(0.0, TILE_DEPTH);
                let tile = Convex::from_vertices(vec![
                    v1 - tile_position,
                    v0 - tile_position,
                    v0 - tile_position - down,
                    v1 - tile_position - down,
                ]);
                let tile_collider = b.at(b.position + tile_position, 0.0);
                count += np.convex_convex(a, poly, &tile_collider, &tile, just_test);
                if just_test && count > 0 {
                    return count;
                }
            }
            count
        });
        if just_test {
            return count.min(1);
        }
        self.finish_manifold(count);
        count
    }

    // ========================================================================
    // Unsupported pairs
    // ========================================================================

    /// Polygon against line. Lines have no area, so this never reports.
    pub(crate) fn convex_line() -> usize {
        0
    }

    /// Line against box. Never reports.
    pub(crate) fn line_box() -> usize {
        0
    }

    /// Line against capsule. Never reports.
    pub(crate) fn line_capsule() -> usize {
        0
    }

    /// Line against line. Never reports.
    pub(crate) fn line_line() -> usize {
        0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::shape::Shape;
    use approx::assert_relative_eq;
    use planar_types::math::rotate90cw;
    use proptest::prelude::*;

    fn body(shape: Shape, x: f64, y: f64, angle: f64) -> Body {
        Body::dynamic(1.0).with_position(vec2(x, y)).with_angle(angle).with_shape(shape)
    }

    fn ground(shape: Shape, x: f64, y: f64, angle: f64) -> Body {
        Body::static_body().with_position(vec2(x, y)).with_angle(angle).with_shape(shape)
    }

    fn collide(np: &mut Narrowphase, a: &Body, b: &Body, just_test: bool) -> usize {
        let ca = Collider::new(a, 0, &a.shapes()[0]);
        let cb = Collider::new(b, 1, &b.shapes()[0]);
        np.collide(&ca, &cb, just_test)
    }

    #[test]
    fn test_circle_circle_touching_counts() {
        let mut np = Narrowphase::new();
        let a = body(Shape::circle(1.0), 0.0, 0.0, 0.0);
        let b = body(Shape::circle(1.0), 2.0, 0.0, 0.0);
        assert_eq!(collide(&mut np, &a, &b, false), 1);

        let c = body(Shape::circle(1.0), 2.0 + 1e-9, 0.0, 0.0);
        np.reset();
        assert_eq!(collide(&mut np, &a, &c, false), 0);
        assert!(np.contact_equations().is_empty());
    }

    #[test]
    fn test_circle_circle_contact_geometry() {
        let mut np = Narrowphase::new();
        let a = body(Shape::circle(1.0), 0.0, 0.0, 0.0);
        let b = body(Shape::circle(0.5), 1.25, 0.0, 0.0);
        assert_eq!(collide(&mut np, &a, &b, false), 1);

        let eq = &np.contact_equations()[0];
        let c = eq.as_contact().unwrap();
        assert_eq!((eq.body_a, eq.body_b), (0, 1));
        assert_relative_eq!(c.normal_a, vec2(1.0, 0.0));
        assert_relative_eq!(c.contact_point_a, vec2(1.0, 0.0));
        assert_relative_eq!(c.contact_point_b, vec2(-0.5, 0.0));
        assert!(c.first_impact);
        assert_eq!(np.friction_equations().len(), 1);
        assert_relative_eq!(np.friction_equations()[0].as_friction().unwrap().t, vec2(0.0, -1.0));
    }

    #[test]
    fn test_just_test_generates_nothing() {
        let mut np = Narrowphase::new();
        let a = body(Shape::rectangle(1.0, 1.0), 0.0, 0.4, 0.0);
        let plane = ground(Shape::plane(), 0.0, 0.0, 0.0);
        assert_eq!(collide(&mut np, &a, &plane, true), 1);
        assert!(np.contact_equations().is_empty());
        assert!(np.friction_equations().is_empty());
    }

    #[test]
    fn test_circle_plane_puts_plane_first() {
        let mut np = Narrowphase::new();
        let plane = ground(Shape::plane(), 0.0, 0.0, 0.0);
        let ball = body(Shape::circle(0.5), 3.0, 0.4, 0.0);
        assert_eq!(collide(&mut np, &ball, &plane, false), 1);

        let eq = &np.contact_equations()[0];
        let c = eq.as_contact().unwrap();
        assert_eq!(eq.body_a, 1);
        assert_relative_eq!(c.normal_a, vec2(0.0, 1.0));
        assert_relative_eq!(c.contact_point_a, vec2(3.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(c.contact_point_b, vec2(0.0, -0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_particle_plane_needs_penetration() {
        let mut np = Narrowphase::new();
        let plane = ground(Shape::plane(), 0.0, 0.0, 0.0);
        let above = body(Shape::particle(), 0.0, 0.01, 0.0);
        let below = body(Shape::particle(), 0.0, -0.01, 0.0);
        assert_eq!(collide(&mut np, &above, &plane, false), 0);
        assert_eq!(collide(&mut np, &below, &plane, false), 1);
    }

    #[test]
    fn test_plane_convex_counts_corners_below() {
        let mut np = Narrowphase::new();
        let plane = ground(Shape::plane(), 0.0, 0.0, 0.0);
        let tilted = body(Shape::rectangle(2.0, 1.0), 0.0, 0.5, 0.1);
        assert_eq!(collide(&mut np, &plane, &tilted, false), 1);

        np.reset();
        let resting = body(Shape::rectangle(2.0, 1.0), 0.0, 0.49, 0.0);
        assert_eq!(collide(&mut np, &plane, &resting, false), 2);
        assert_eq!(np.friction_equations().len(), 1);
        let f = np.friction_equations()[0].as_friction().unwrap();
        assert_eq!(f.contacts.len(), 2);
        assert_relative_eq!(f.t, rotate90cw(&vec2(0.0, 1.0)));
    }

    #[test]
    fn test_friction_per_contact_without_reduction() {
        let mut np = Narrowphase::new();
        np.enable_friction_reduction = false;
        let plane = ground(Shape::plane(), 0.0, 0.0, 0.0);
        let resting = body(Shape::rectangle(2.0, 1.0), 0.0, 0.49, 0.0);
        assert_eq!(collide(&mut np, &plane, &resting, false), 2);
        assert_eq!(np.friction_equations().len(), 2);
    }

    #[test]
    fn test_stacked_boxes_give_two_contacts() {
        let mut np = Narrowphase::new();
        let lower = body(Shape::rectangle(1.0, 1.0), 0.0, 0.0, 0.0);
        let upper = body(Shape::rectangle(1.0, 1.0), 0.1, 0.99, 0.0);
        assert_eq!(collide(&mut np, &lower, &upper, false), 2);
        for eq in np.contact_equations() {
            let c = eq.as_contact().unwrap();
            let sign = if eq.body_a == 0 { 1.0 } else { -1.0 };
            assert_relative_eq!(c.normal_a * sign, vec2(0.0, 1.0), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_separated_boxes_do_not_collide() {
        let mut np = Narrowphase::new();
        let a = body(Shape::rectangle(1.0, 1.0), 0.0, 0.0, 0.0);
        let b = body(Shape::rectangle(1.0, 1.0), 1.01, 0.0, 0.0);
        assert_eq!(collide(&mut np, &a, &b, false), 0);
    }

    #[test]
    fn test_circle_convex_edge_and_corner() {
        let mut np = Narrowphase::new();
        let boxed = body(Shape::rectangle(2.0, 2.0), 0.0, 0.0, 0.0);
        let on_face = body(Shape::circle(0.5), 0.0, 1.4, 0.0);
        assert_eq!(collide(&mut np, &on_face, &boxed, false), 1);
        let c = np.contact_equations()[0].as_contact().unwrap();
        assert_relative_eq!(c.normal_a, vec2(0.0, -1.0), epsilon = 1e-12);

        np.reset();
        let near_corner = body(Shape::circle(0.5), 1.3, 1.3, 0.0);
        assert_eq!(collide(&mut np, &near_corner, &boxed, false), 1);
        let far_corner = body(Shape::circle(0.5), 1.4, 1.4, 0.0);
        assert_eq!(collide(&mut np, &far_corner, &boxed, false), 0);
    }

    #[test]
    fn test_circle_capsule_edge_and_end() {
        let mut np = Narrowphase::new();
        let capsule = body(Shape::capsule(2.0, 0.5), 0.0, 0.0, 0.0);
        let above = body(Shape::circle(0.5), 0.0, 0.9, 0.0);
        assert_eq!(collide(&mut np, &above, &capsule, false), 1);
        let beyond_end = body(Shape::circle(0.5), 1.8, 0.0, 0.0);
        assert_eq!(collide(&mut np, &beyond_end, &capsule, false), 1);
        let clear = body(Shape::circle(0.5), 0.0, 1.1, 0.0);
        assert_eq!(collide(&mut np, &clear, &capsule, false), 0);
    }

    #[test]
    fn test_plane_capsule_lying_flat() {
        let mut np = Narrowphase::new();
        let plane = ground(Shape::plane(), 0.0, 0.0, 0.0);
        let capsule = body(Shape::capsule(2.0, 0.5), 0.0, 0.45, 0.0);
        assert_eq!(collide(&mut np, &plane, &capsule, false), 2);
        assert_eq!(np.friction_equations().len(), 1);
    }

    #[test]
    fn test_capsule_capsule_crossed() {
        let mut np = Narrowphase::new();
        let a = body(Shape::capsule(2.0, 0.25), 0.0, 0.0, 0.0);
        let b = body(Shape::capsule(2.0, 0.25), 0.0, 0.45, 0.0);
        assert!(collide(&mut np, &a, &b, false) > 0);
        assert_eq!(np.friction_equations().len(), 1);

        np.reset();
        let far = body(Shape::capsule(2.0, 0.25), 0.0, 0.6, 0.0);
        assert_eq!(collide(&mut np, &a, &far, false), 0);
    }

    #[test]
    fn test_circle_heightfield_face_contact() {
        let mut np = Narrowphase::new();
        let field = ground(Shape::heightfield(vec![0.0, 0.0, 0.0, 0.0], 1.0).unwrap(), 0.0, 0.0, 0.0);
        let ball = body(Shape::circle(0.5), 1.5, 0.45, 0.0);
        assert_eq!(collide(&mut np, &ball, &field, false), 1);
        let eq = &np.contact_equations()[0];
        assert_eq!(eq.body_a, 1);
        assert_relative_eq!(eq.as_contact().unwrap().normal_a, vec2(0.0, 1.0), epsilon = 1e-12);

        np.reset();
        let outside = body(Shape::circle(0.5), 10.0, 0.45, 0.0);
        assert_eq!(collide(&mut np, &outside, &field, false), 0);
        let high = body(Shape::circle(0.5), 1.5, 0.6, 0.0);
        assert_eq!(collide(&mut np, &high, &field, false), 0);
    }

    #[test]
    fn test_convex_heightfield_box_on_flat_terrain() {
        let mut np = Narrowphase::new();
        let field = ground(Shape::heightfield(vec![0.0; 6], 1.0).unwrap(), 0.0, 0.0, 0.0);
        let crate_box = body(Shape::rectangle(1.0, 1.0), 2.5, 0.49, 0.0);
        assert!(collide(&mut np, &crate_box, &field, false) >= 2);
        assert_eq!(np.friction_equations().len(), 1);
    }

    #[test]
    fn test_unsupported_pairs_report_nothing() {
        let mut np = Narrowphase::new();
        let a = body(Shape::line(2.0), 0.0, 0.0, 0.0);
        let b = body(Shape::line(2.0), 0.0, 0.0, 0.5);
        assert_eq!(collide(&mut np, &a, &b, false), 0);
        let boxed = body(Shape::rectangle(1.0, 1.0), 0.0, 0.0, 0.0);
        assert_eq!(collide(&mut np, &a, &boxed, false), 0);
    }

    #[test]
    fn test_first_impact_cleared_after_reset() {
        let mut np = Narrowphase::new();
        let a = body(Shape::circle(1.0), 0.0, 0.0, 0.0);
        let b = body(Shape::circle(1.0), 1.5, 0.0, 0.0);
        collide(&mut np, &a, &b, false);
        np.reset();
        assert!(np.collided_last_step(b.id(), a.id()));
        collide(&mut np, &a, &b, false);
        assert!(!np.contact_equations()[0].as_contact().unwrap().first_impact);
    }

    #[test]
    fn test_has_routine_is_symmetric() {
        use crate::shape::ShapeType::*;
        assert!(Narrowphase::has_routine(Plane, Circle));
        assert!(Narrowphase::has_routine(Heightfield, Box));
        assert!(Narrowphase::has_routine(Line, Line));
        assert!(!Narrowphase::has_routine(Plane, Plane));
        assert!(!Narrowphase::has_routine(Heightfield, Capsule));
        assert!(!Narrowphase::has_routine(Particle, Particle));
    }

    proptest! {
        #[test]
        fn prop_collide_is_order_independent(
            x in -2.0f64..2.0,
            y in -2.0f64..2.0,
            angle in -3.0f64..3.0,
            kind in 0usize..4,
        ) {
            let shape = |k: usize| match k {
                0 => Shape::circle(0.6),
                1 => Shape::rectangle(1.0, 0.7),
                2 => Shape::capsule(1.2, 0.3),
                _ => Shape::convex(vec![vec2(-0.5, -0.4), vec2(0.6, -0.3), vec2(0.0, 0.7)]).unwrap(),
            };
            let a = body(shape(kind), 0.0, 0.0, 0.0);
            let b = body(shape((kind + 1) % 4), x, y, angle);
            let mut np = Narrowphase::new();
            let forward = collide(&mut np, &a, &b, true);
            let backward = collide(&mut np, &b, &a, true);
            prop_assert_eq!(forward, backward);
        }
    }
}
