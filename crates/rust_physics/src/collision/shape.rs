//! Fixture shapes
//!
//! Shapes are stored in body-local coordinates and only transformed into
//! world space while a query runs. A shape is split into one or more
//! *children*; the broad phase keeps one proxy per child.

use thiserror::Error;

use crate::collision::aabb::AABB;
use crate::collision::ray::{RayCastInput, RayCastOutput};
use crate::foundation::math::{cross, Transform2, Vec2};

/// Errors raised while building shapes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// Not enough vertices for the shape kind
    #[error("{kind} needs at least {required} vertices, got {actual}")]
    TooFewVertices {
        /// Shape kind being built
        kind: &'static str,
        /// Minimum vertex count
        required: usize,
        /// Supplied vertex count
        actual: usize,
    },

    /// Polygon has zero area or is wound clockwise
    #[error("polygon is degenerate or not counter-clockwise")]
    Degenerate,

    /// Circle radius must be positive and finite
    #[error("invalid circle radius {0}")]
    InvalidRadius(f32),
}

/// Discriminant of a [`Shape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    /// Solid circle
    Circle,
    /// Convex polygon
    Polygon,
    /// Open chain of edges
    Chain,
}

/// Mass properties of a shape, relative to the body origin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MassData {
    /// Mass in kilograms
    pub mass: f32,
    /// Center of mass in body-local coordinates
    pub center: Vec2,
    /// Rotational inertia about the body origin
    pub inertia: f32,
}

/// Solid circle
#[derive(Debug, Clone, PartialEq)]
pub struct CircleShape {
    /// Radius of the circle
    pub radius: f32,
    /// Center in body-local coordinates
    pub position: Vec2,
}

/// Convex polygon with counter-clockwise winding
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonShape {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
    centroid: Vec2,
}

/// Open chain of line segments; child `i` is the edge `v[i] -> v[i + 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ChainShape {
    vertices: Vec<Vec2>,
}

/// Geometry variant of a [`Shape`]
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Solid circle
    Circle(CircleShape),
    /// Convex polygon
    Polygon(PolygonShape),
    /// Chain of edges
    Chain(ChainShape),
}

/// Geometry plus density, as attached to a fixture
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// The geometry
    pub kind: ShapeKind,
    /// Mass per unit area; chains are always massless
    pub density: f32,
}

impl CircleShape {
    fn world_center(&self, xf: &Transform2) -> Vec2 {
        xf.transform_point(self.position)
    }

    fn compute_aabb(&self, xf: &Transform2) -> AABB {
        let r = Vec2::new(self.radius, self.radius);
        AABB::from_center_half_extents(self.world_center(xf), r)
    }

    fn test_point(&self, xf: &Transform2, point: Vec2) -> bool {
        (point - self.world_center(xf)).norm_squared() <= self.radius * self.radius
    }

    fn ray_cast(&self, input: &RayCastInput, xf: &Transform2) -> Option<RayCastOutput> {
        // Solve |p1 + t*d - c|^2 = r^2 for the smaller root.
        let s = input.p1 - self.world_center(xf);
        let b = s.norm_squared() - self.radius * self.radius;
        let r = input.p2 - input.p1;
        let c = s.dot(&r);
        let rr = r.norm_squared();
        let sigma = c * c - rr * b;

        if sigma < 0.0 || rr < f32::EPSILON {
            return None;
        }

        let a = -(c + sigma.sqrt());
        if a >= 0.0 && a <= input.max_fraction * rr {
            let fraction = a / rr;
            let normal = (s + r * fraction).normalize();
            return Some(RayCastOutput { normal, fraction });
        }
        None
    }

    fn compute_mass(&self, density: f32) -> MassData {
        let mass = density * std::f32::consts::PI * self.radius * self.radius;
        MassData {
            mass,
            center: self.position,
            inertia: mass * (0.5 * self.radius * self.radius + self.position.norm_squared()),
        }
    }
}

impl PolygonShape {
    /// Build a convex polygon from counter-clockwise vertices
    pub fn new(vertices: Vec<Vec2>) -> Result<Self, ShapeError> {
        if vertices.len() < 3 {
            return Err(ShapeError::TooFewVertices {
                kind: "polygon",
                required: 3,
                actual: vertices.len(),
            });
        }

        let n = vertices.len();
        let mut normals = Vec::with_capacity(n);
        for i in 0..n {
            let edge = vertices[(i + 1) % n] - vertices[i];
            if edge.norm_squared() <= f32::EPSILON * f32::EPSILON {
                return Err(ShapeError::Degenerate);
            }
            normals.push(Vec2::new(edge.y, -edge.x).normalize());
        }

        let centroid = polygon_centroid(&vertices).ok_or(ShapeError::Degenerate)?;
        Ok(Self { vertices, normals, centroid })
    }

    /// Axis-aligned box centered on `center`
    pub fn rect(half_width: f32, half_height: f32, center: Vec2) -> Result<Self, ShapeError> {
        Self::new(vec![
            center + Vec2::new(-half_width, -half_height),
            center + Vec2::new(half_width, -half_height),
            center + Vec2::new(half_width, half_height),
            center + Vec2::new(-half_width, half_height),
        ])
    }

    /// Vertices in body-local coordinates
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Outward edge normals in body-local coordinates
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    /// Area centroid in body-local coordinates
    pub fn centroid(&self) -> Vec2 {
        self.centroid
    }

    fn compute_aabb(&self, xf: &Transform2) -> AABB {
        let first = xf.transform_point(self.vertices[0]);
        let mut aabb = AABB::new(first, first);
        for v in &self.vertices[1..] {
            let p = xf.transform_point(*v);
            aabb.min = aabb.min.inf(&p);
            aabb.max = aabb.max.sup(&p);
        }
        aabb
    }

    fn test_point(&self, xf: &Transform2, point: Vec2) -> bool {
        let local = xf.inverse_transform_point(point);
        self.vertices
            .iter()
            .zip(&self.normals)
            .all(|(v, n)| n.dot(&(local - v)) <= 0.0)
    }

    fn ray_cast(&self, input: &RayCastInput, xf: &Transform2) -> Option<RayCastOutput> {
        let p1 = xf.inverse_transform_point(input.p1);
        let p2 = xf.inverse_transform_point(input.p2);
        let d = p2 - p1;

        let mut lower = 0.0_f32;
        let mut upper = input.max_fraction;
        let mut index = None;

        for (i, (v, n)) in self.vertices.iter().zip(&self.normals).enumerate() {
            let numerator = n.dot(&(v - p1));
            let denominator = n.dot(&d);

            if denominator == 0.0 {
                if numerator < 0.0 {
                    return None;
                }
            } else if denominator < 0.0 && numerator < lower * denominator {
                lower = numerator / denominator;
                index = Some(i);
            } else if denominator > 0.0 && numerator < upper * denominator {
                upper = numerator / denominator;
            }

            if upper < lower {
                return None;
            }
        }

        index.map(|i| RayCastOutput {
            normal: xf.transform_vector(self.normals[i]),
            fraction: lower,
        })
    }

    fn compute_mass(&self, density: f32) -> MassData {
        const INV3: f32 = 1.0 / 3.0;
        let origin = self.vertices[0];
        let n = self.vertices.len();

        let mut area = 0.0;
        let mut center = Vec2::zeros();
        let mut inertia = 0.0;

        for i in 0..n {
            let e1 = self.vertices[i] - origin;
            let e2 = self.vertices[(i + 1) % n] - origin;
            let d = cross(&e1, &e2);
            let tri_area = 0.5 * d;
            area += tri_area;
            center += (e1 + e2) * (tri_area * INV3);

            let int_x2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
            let int_y2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
            inertia += (0.25 * INV3 * d) * (int_x2 + int_y2);
        }

        let mass = density * area;
        center /= area;
        let world_center = center + origin;
        // Shift from the reference vertex to the body origin.
        let inertia = density * inertia
            + mass * (world_center.norm_squared() - center.norm_squared());

        MassData { mass, center: world_center, inertia }
    }
}

impl ChainShape {
    /// Build an open chain through `vertices`
    pub fn new(vertices: Vec<Vec2>) -> Result<Self, ShapeError> {
        if vertices.len() < 2 {
            return Err(ShapeError::TooFewVertices {
                kind: "chain",
                required: 2,
                actual: vertices.len(),
            });
        }
        Ok(Self { vertices })
    }

    /// Vertices in body-local coordinates
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    fn edge(&self, child: usize) -> (Vec2, Vec2) {
        (self.vertices[child], self.vertices[child + 1])
    }

    fn compute_aabb(&self, xf: &Transform2, child: usize) -> AABB {
        let (a, b) = self.edge(child);
        let a = xf.transform_point(a);
        let b = xf.transform_point(b);
        AABB::new(a.inf(&b), a.sup(&b))
    }

    fn ray_cast(&self, input: &RayCastInput, xf: &Transform2, child: usize) -> Option<RayCastOutput> {
        let p1 = xf.inverse_transform_point(input.p1);
        let p2 = xf.inverse_transform_point(input.p2);
        let d = p2 - p1;

        let (v1, v2) = self.edge(child);
        let e = v2 - v1;
        let rr = e.norm_squared();
        if rr == 0.0 {
            return None;
        }
        let normal = Vec2::new(e.y, -e.x).normalize();

        let numerator = normal.dot(&(v1 - p1));
        let denominator = normal.dot(&d);
        if denominator == 0.0 {
            return None;
        }

        let t = numerator / denominator;
        if t < 0.0 || input.max_fraction < t {
            return None;
        }

        let q = p1 + d * t;
        let s = (q - v1).dot(&e) / rr;
        if !(0.0..=1.0).contains(&s) {
            return None;
        }

        let facing = if numerator > 0.0 { -normal } else { normal };
        Some(RayCastOutput {
            normal: xf.transform_vector(facing),
            fraction: t,
        })
    }
}

impl Shape {
    /// Solid circle centered at `position` in body-local space
    pub fn circle(radius: f32, position: Vec2, density: f32) -> Result<Self, ShapeError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ShapeError::InvalidRadius(radius));
        }
        Ok(Self {
            kind: ShapeKind::Circle(CircleShape { radius, position }),
            density,
        })
    }

    /// Convex polygon from counter-clockwise vertices
    pub fn polygon(vertices: Vec<Vec2>, density: f32) -> Result<Self, ShapeError> {
        Ok(Self {
            kind: ShapeKind::Polygon(PolygonShape::new(vertices)?),
            density,
        })
    }

    /// Axis-aligned box centered at `center` in body-local space
    pub fn rect(half_width: f32, half_height: f32, center: Vec2, density: f32) -> Result<Self, ShapeError> {
        Ok(Self {
            kind: ShapeKind::Polygon(PolygonShape::rect(half_width, half_height, center)?),
            density,
        })
    }

    /// Open chain of edges; chains carry no mass
    pub fn chain(vertices: Vec<Vec2>) -> Result<Self, ShapeError> {
        Ok(Self {
            kind: ShapeKind::Chain(ChainShape::new(vertices)?),
            density: 0.0,
        })
    }

    /// Shape discriminant
    pub fn shape_type(&self) -> ShapeType {
        match &self.kind {
            ShapeKind::Circle(_) => ShapeType::Circle,
            ShapeKind::Polygon(_) => ShapeType::Polygon,
            ShapeKind::Chain(_) => ShapeType::Chain,
        }
    }

    /// Number of broad-phase children
    pub fn child_count(&self) -> usize {
        match &self.kind {
            ShapeKind::Circle(_) | ShapeKind::Polygon(_) => 1,
            ShapeKind::Chain(chain) => chain.vertices.len() - 1,
        }
    }

    /// World-space bounds of one child under `xf`
    ///
    /// `child` must be below [`Shape::child_count`]; callers check this.
    pub fn compute_aabb(&self, xf: &Transform2, child: usize) -> AABB {
        match &self.kind {
            ShapeKind::Circle(circle) => circle.compute_aabb(xf),
            ShapeKind::Polygon(polygon) => polygon.compute_aabb(xf),
            ShapeKind::Chain(chain) => chain.compute_aabb(xf, child),
        }
    }

    /// Whether a world-space point is inside the shape; chains have no interior
    pub fn test_point(&self, xf: &Transform2, point: Vec2) -> bool {
        match &self.kind {
            ShapeKind::Circle(circle) => circle.test_point(xf, point),
            ShapeKind::Polygon(polygon) => polygon.test_point(xf, point),
            ShapeKind::Chain(_) => false,
        }
    }

    /// Cast a world-space ray against one child
    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform2, child: usize) -> Option<RayCastOutput> {
        match &self.kind {
            ShapeKind::Circle(circle) => circle.ray_cast(input, xf),
            ShapeKind::Polygon(polygon) => polygon.ray_cast(input, xf),
            ShapeKind::Chain(chain) => chain.ray_cast(input, xf, child),
        }
    }

    /// Mass properties at this shape's density
    pub fn compute_mass(&self) -> MassData {
        match &self.kind {
            ShapeKind::Circle(circle) => circle.compute_mass(self.density),
            ShapeKind::Polygon(polygon) => polygon.compute_mass(self.density),
            ShapeKind::Chain(_) => MassData::default(),
        }
    }
}

fn polygon_centroid(vertices: &[Vec2]) -> Option<Vec2> {
    let origin = vertices[0];
    let n = vertices.len();
    let mut area = 0.0;
    let mut center = Vec2::zeros();

    for i in 1..n - 1 {
        let e1 = vertices[i] - origin;
        let e2 = vertices[i + 1] - origin;
        let tri_area = 0.5 * cross(&e1, &e2);
        area += tri_area;
        center += (e1 + e2) * (tri_area / 3.0);
    }

    (area > f32::EPSILON).then(|| center / area + origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circle_aabb_follows_transform() {
        let shape = Shape::circle(1.0, Vec2::new(1.0, 0.0), 1.0).unwrap();
        let xf = Transform2::new(Vec2::new(5.0, 5.0), std::f32::consts::FRAC_PI_2);
        let aabb = shape.compute_aabb(&xf, 0);
        assert_relative_eq!(aabb.min.x, 4.0, epsilon = 1e-5);
        assert_relative_eq!(aabb.min.y, 5.0, epsilon = 1e-5);
        assert_relative_eq!(aabb.max.x, 6.0, epsilon = 1e-5);
        assert_relative_eq!(aabb.max.y, 7.0, epsilon = 1e-5);
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        assert!(Shape::circle(0.0, Vec2::zeros(), 1.0).is_err());
        assert!(Shape::polygon(vec![Vec2::zeros(), Vec2::new(1.0, 0.0)], 1.0).is_err());
        // Clockwise winding yields negative area.
        let cw = vec![Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0)];
        assert_eq!(Shape::polygon(cw, 1.0).unwrap_err(), ShapeError::Degenerate);
        assert!(Shape::chain(vec![Vec2::zeros()]).is_err());
    }

    #[test]
    fn test_rect_mass() {
        let shape = Shape::rect(1.0, 1.0, Vec2::zeros(), 1.0).unwrap();
        let mass = shape.compute_mass();
        assert_relative_eq!(mass.mass, 4.0, epsilon = 1e-5);
        assert_relative_eq!(mass.center.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(mass.center.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(mass.inertia, 8.0 / 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_circle_mass() {
        let shape = Shape::circle(2.0, Vec2::zeros(), 0.5).unwrap();
        let mass = shape.compute_mass();
        assert_relative_eq!(mass.mass, 2.0 * std::f32::consts::PI, epsilon = 1e-5);
        assert_relative_eq!(mass.inertia, mass.mass * 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_polygon_test_point() {
        let shape = Shape::rect(1.0, 1.0, Vec2::zeros(), 1.0).unwrap();
        let xf = Transform2::from_position(Vec2::new(10.0, 0.0));
        assert!(shape.test_point(&xf, Vec2::new(10.5, 0.5)));
        assert!(!shape.test_point(&xf, Vec2::new(0.5, 0.5)));
    }

    #[test]
    fn test_ray_casts() {
        let xf = Transform2::identity();
        let input = RayCastInput::new(Vec2::new(-4.0, 0.0), Vec2::new(4.0, 0.0), 1.0);

        let circle = Shape::circle(1.0, Vec2::zeros(), 1.0).unwrap();
        let hit = circle.ray_cast(&input, &xf, 0).unwrap();
        assert_relative_eq!(hit.fraction, 3.0 / 8.0, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-5);

        let rect = Shape::rect(2.0, 1.0, Vec2::zeros(), 1.0).unwrap();
        let hit = rect.ray_cast(&input, &xf, 0).unwrap();
        assert_relative_eq!(hit.fraction, 0.25, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-5);

        let wall = Shape::chain(vec![
            Vec2::new(1.0, -5.0),
            Vec2::new(1.0, 5.0),
            Vec2::new(3.0, 5.0),
        ])
        .unwrap();
        let hit = wall.ray_cast(&input, &xf, 0).unwrap();
        assert_relative_eq!(hit.fraction, 5.0 / 8.0, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-5);
        assert!(wall.ray_cast(&input, &xf, 1).is_none());
    }

    #[test]
    fn test_chain_children() {
        let chain = Shape::chain(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 3.0),
        ])
        .unwrap();
        assert_eq!(chain.child_count(), 2);
        let second = chain.compute_aabb(&Transform2::identity(), 1);
        assert_eq!(second, AABB::from_coords(2.0, 0.0, 2.0, 3.0));
        assert_eq!(chain.compute_mass(), MassData::default());
    }
}
