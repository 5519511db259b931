//! CPU-side triangle meshes and primitive generation.
//!
//! Front faces wind counter-clockwise seen from outside. Builders for closed shapes fix the
//! winding themselves, so callers only list corners.

use engine_core::Aabb;
use glam::Vec3;

use crate::palette::Material;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub indices: [u32; 3],
    pub material: Material,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for v in &self.vertices {
            bounds.include(*v);
        }
        bounds
    }

    fn push_vertex(&mut self, v: Vec3) -> u32 {
        self.vertices.push(v);
        (self.vertices.len() - 1) as u32
    }

    pub fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, material: Material) {
        let indices = [self.push_vertex(a), self.push_vertex(b), self.push_vertex(c)];
        self.triangles.push(Triangle { indices, material });
    }

    /// Quad from four corners in cyclic order, split along the 0-2 diagonal.
    pub fn push_quad(&mut self, corners: [Vec3; 4], material: Material) {
        let i: Vec<u32> = corners.iter().map(|c| self.push_vertex(*c)).collect();
        self.triangles.push(Triangle { indices: [i[0], i[1], i[2]], material });
        self.triangles.push(Triangle { indices: [i[0], i[2], i[3]], material });
    }

    /// Convex polygon whose winding is flipped if needed so its normal points away from
    /// `interior`.
    fn push_face_outward(&mut self, mut corners: Vec<Vec3>, interior: Vec3, material: Material) {
        if corners.len() < 3 {
            return;
        }
        let normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
        let centroid = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;
        if normal.dot(centroid - interior) < 0.0 {
            corners.reverse();
        }
        let base = self.vertices.len() as u32;
        self.vertices.extend(corners.iter().copied());
        for k in 1..(corners.len() as u32 - 1) {
            self.triangles.push(Triangle {
                indices: [base, base + k, base + k + 1],
                material,
            });
        }
    }

    /// Horizontal rectangle at height `y`, facing up.
    pub fn flat_rect(min_x: f32, min_z: f32, max_x: f32, max_z: f32, y: f32, material: Material) -> Self {
        let mut mesh = Self::new();
        mesh.push_quad(
            [
                Vec3::new(min_x, y, max_z),
                Vec3::new(max_x, y, max_z),
                Vec3::new(max_x, y, min_z),
                Vec3::new(min_x, y, min_z),
            ],
            material,
        );
        mesh
    }

    /// Axis-aligned box.
    pub fn cuboid(center: Vec3, size: Vec3, material: Material) -> Self {
        let h = size * 0.5;
        let corner = |i: usize| {
            center
                + Vec3::new(
                    if i & 1 != 0 { h.x } else { -h.x },
                    if i & 2 != 0 { h.y } else { -h.y },
                    if i & 4 != 0 { h.z } else { -h.z },
                )
        };
        const FACES: [[usize; 4]; 6] = [
            [0, 2, 6, 4],
            [1, 3, 7, 5],
            [0, 1, 5, 4],
            [2, 3, 7, 6],
            [0, 1, 3, 2],
            [4, 5, 7, 6],
        ];
        let mut mesh = Self::new();
        for face in FACES {
            mesh.push_face_outward(face.iter().map(|&i| corner(i)).collect(), center, material);
        }
        mesh
    }

    /// Square-based pyramid standing on `base_center`.
    pub fn pyramid(base_center: Vec3, width: f32, height: f32, material: Material) -> Self {
        let h = width * 0.5;
        let base = [
            base_center + Vec3::new(-h, 0.0, -h),
            base_center + Vec3::new(h, 0.0, -h),
            base_center + Vec3::new(h, 0.0, h),
            base_center + Vec3::new(-h, 0.0, h),
        ];
        let apex = base_center + Vec3::Y * height;
        let interior = base_center + Vec3::Y * (height * 0.25);
        let mut mesh = Self::new();
        mesh.push_face_outward(base.to_vec(), interior, material);
        for k in 0..4 {
            mesh.push_face_outward(vec![base[k], base[(k + 1) % 4], apex], interior, material);
        }
        mesh
    }

    /// Triangular prism running along Z: a gable roof of `width` x `length` rising `height`
    /// above `base_center`.
    pub fn gable(base_center: Vec3, width: f32, length: f32, height: f32, material: Material) -> Self {
        let (hw, hl) = (width * 0.5, length * 0.5);
        let front = [
            base_center + Vec3::new(-hw, 0.0, hl),
            base_center + Vec3::new(hw, 0.0, hl),
            base_center + Vec3::new(0.0, height, hl),
        ];
        let back = front.map(|v| v - Vec3::Z * length);
        let interior = base_center + Vec3::Y * (height / 3.0);
        let mut mesh = Self::new();
        mesh.push_face_outward(front.to_vec(), interior, material);
        mesh.push_face_outward(back.to_vec(), interior, material);
        for k in 0..3 {
            let n = (k + 1) % 3;
            mesh.push_face_outward(vec![front[k], front[n], back[n], back[k]], interior, material);
        }
        mesh
    }

    /// Merge `other` into this mesh.
    pub fn append(&mut self, other: &Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(other.triangles.iter().map(|t| Triangle {
            indices: t.indices.map(|i| i + base),
            material: t.material,
        }));
    }

    pub fn with(mut self, other: Mesh) -> Self {
        self.append(&other);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward(mesh: &Mesh, interior: Vec3) {
        for t in &mesh.triangles {
            let [a, b, c] = t.indices.map(|i| mesh.vertices[i as usize]);
            let n = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid - interior) > 0.0, "inward face {:?}", t);
        }
    }

    #[test]
    fn cuboid_faces_point_outward() {
        let mesh = Mesh::cuboid(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 4.0, 6.0), Material::Hangar);
        assert_eq!(mesh.triangles.len(), 12);
        assert_outward(&mesh, Vec3::new(1.0, 2.0, 3.0));
        let b = mesh.bounds();
        assert_eq!(b.size(), Vec3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn pyramid_and_gable_are_closed_and_outward() {
        let p = Mesh::pyramid(Vec3::ZERO, 2.0, 3.0, Material::Foliage);
        assert_eq!(p.triangles.len(), 6);
        assert_outward(&p, Vec3::new(0.0, 0.75, 0.0));
        let g = Mesh::gable(Vec3::ZERO, 4.0, 10.0, 2.0, Material::Roof);
        assert_eq!(g.triangles.len(), 8);
        assert_outward(&g, Vec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn flat_rect_faces_up() {
        let m = Mesh::flat_rect(-1.0, -1.0, 1.0, 1.0, 0.0, Material::Grass);
        for t in &m.triangles {
            let [a, b, c] = t.indices.map(|i| m.vertices[i as usize]);
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn append_offsets_indices() {
        let a = Mesh::cuboid(Vec3::ZERO, Vec3::ONE, Material::Wing);
        let merged = a.clone().with(Mesh::cuboid(Vec3::X * 5.0, Vec3::ONE, Material::Fuselage));
        assert_eq!(merged.triangles.len(), 24);
        assert_eq!(merged.triangles[12].indices[0], a.vertices.len() as u32);
        assert_eq!(merged.triangles[12].material, Material::Fuselage);
    }
}
