//! Procedural mesh generators.
//!
//! The generators produce CPU-side [`MeshData`] that can be displaced or inspected
//! before it is uploaded with [`MeshData::upload`]. All meshes use counter-clockwise
//! front faces.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Vector3, Zero};

use crate::data_structures::model::{Mesh, ModelVertex};

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// A flat grid in the XZ plane centred on the origin, facing +Y.
    ///
    /// Rows run from `-depth / 2` to `depth / 2` along Z so there are
    /// `(segments_x + 1) * (segments_z + 1)` vertices.
    pub fn plane(width: f32, depth: f32, segments_x: u32, segments_z: u32) -> Self {
        let segments_x = segments_x.max(1);
        let segments_z = segments_z.max(1);
        let row = segments_x + 1;
        let step_x = width / segments_x as f32;
        let step_z = depth / segments_z as f32;

        let mut vertices = Vec::with_capacity((row * (segments_z + 1)) as usize);
        for iz in 0..=segments_z {
            let z = iz as f32 * step_z - depth / 2.0;
            for ix in 0..=segments_x {
                let x = ix as f32 * step_x - width / 2.0;
                vertices.push(ModelVertex {
                    position: [x, 0.0, z],
                    normal: [0.0, 1.0, 0.0],
                    tex_coords: [
                        ix as f32 / segments_x as f32,
                        iz as f32 / segments_z as f32,
                    ],
                });
            }
        }

        let mut indices = Vec::with_capacity((segments_x * segments_z * 6) as usize);
        for iz in 0..segments_z {
            for ix in 0..segments_x {
                let a = ix + row * iz;
                let b = ix + row * (iz + 1);
                let c = ix + 1 + row * (iz + 1);
                let d = ix + 1 + row * iz;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self { vertices, indices }
    }

    /// A UV sphere with poles on the Y axis.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let row = width_segments + 1;

        let mut vertices = Vec::with_capacity((row * (height_segments + 1)) as usize);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let (sin_phi, cos_phi) = (u * 2.0 * PI).sin_cos();
                let normal = [-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta];
                vertices.push(ModelVertex {
                    position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                    normal,
                    tex_coords: [u, v],
                });
            }
        }

        let mut indices = Vec::new();
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                // the pole rows collapse to single triangles
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    /// A capped cone standing on the Y axis: apex at `height / 2`, base disc of
    /// `radius` at `-height / 2`.
    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        let radial_segments = radial_segments.max(3);
        let half = height / 2.0;
        let slope = radius / height;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // lateral surface: one row at the apex, one at the base
        for (row_radius, y, v) in [(0.0, half, 0.0), (radius, -half, 1.0)] {
            for x in 0..=radial_segments {
                let u = x as f32 / radial_segments as f32;
                let (sin, cos) = (u * 2.0 * PI).sin_cos();
                let normal = Vector3::new(sin, slope, cos).normalize();
                vertices.push(ModelVertex {
                    position: [row_radius * sin, y, row_radius * cos],
                    normal: normal.into(),
                    tex_coords: [u, v],
                });
            }
        }
        let row = radial_segments + 1;
        for x in 0..radial_segments {
            let b = row + x;
            let c = row + x + 1;
            let d = x + 1;
            indices.extend_from_slice(&[b, c, d]);
        }

        // base cap
        let centre_start = vertices.len() as u32;
        for x in 0..radial_segments {
            let u = (x as f32 + 0.5) / radial_segments as f32;
            vertices.push(ModelVertex {
                position: [0.0, -half, 0.0],
                normal: [0.0, -1.0, 0.0],
                tex_coords: [u, 0.5],
            });
        }
        let ring_start = vertices.len() as u32;
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let (sin, cos) = (u * 2.0 * PI).sin_cos();
            vertices.push(ModelVertex {
                position: [radius * sin, -half, radius * cos],
                normal: [0.0, -1.0, 0.0],
                tex_coords: [cos * 0.5 + 0.5, sin * 0.5 + 0.5],
            });
        }
        for x in 0..radial_segments {
            let centre = centre_start + x;
            let i = ring_start + x;
            indices.extend_from_slice(&[i + 1, i, centre]);
        }

        Self { vertices, indices }
    }

    /// Recompute smooth normals from the triangles (area weighted).
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3::<f32>::zero(); self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa: Vector3<f32> = self.vertices[a].position.into();
            let pb: Vector3<f32> = self.vertices[b].position.into();
            let pc: Vector3<f32> = self.vertices[c].position.into();
            let face = (pb - pa).cross(pc - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            if normal.magnitude2() > 0.0 {
                vertex.normal = normal.normalize().into();
            }
        }
    }

    pub fn upload(&self, device: &wgpu::Device, name: &str) -> Mesh {
        Mesh::new(device, name, &self.vertices, &self.indices)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn assert_unit_normals(mesh: &MeshData) {
        for vertex in &mesh.vertices {
            let n: Vector3<f32> = vertex.normal.into();
            assert_relative_eq!(n.magnitude(), 1.0, epsilon = 1e-4);
        }
    }

    fn assert_indices_in_range(mesh: &MeshData) {
        assert_eq!(mesh.indices.len() % 3, 0);
        let count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));
    }

    #[test]
    fn plane_has_grid_vertex_count() {
        let plane = MeshData::plane(500.0, 500.0, 128, 128);
        assert_eq!(plane.vertices.len(), 129 * 129);
        assert_eq!(plane.indices.len(), 128 * 128 * 6);
        assert_indices_in_range(&plane);
        assert_unit_normals(&plane);
    }

    #[test]
    fn plane_spans_its_size() {
        let plane = MeshData::plane(10.0, 4.0, 2, 2);
        let first = plane.vertices[0].position;
        let last = plane.vertices[plane.vertices.len() - 1].position;
        assert_eq!(first, [-5.0, 0.0, -2.0]);
        assert_eq!(last, [5.0, 0.0, 2.0]);
    }

    #[test]
    fn plane_triangles_face_up() {
        let mut plane = MeshData::plane(2.0, 2.0, 1, 1);
        plane.compute_vertex_normals();
        for vertex in &plane.vertices {
            assert_relative_eq!(vertex.normal[1], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn sphere_counts_and_normals() {
        let sphere = MeshData::sphere(15.0, 8, 6);
        assert_eq!(sphere.vertices.len(), 9 * 7);
        // the two pole rows only contribute one triangle per segment
        assert_eq!(sphere.indices.len(), 8 * (2 * 6 - 2) * 3);
        assert_indices_in_range(&sphere);
        assert_unit_normals(&sphere);
        for vertex in &sphere.vertices {
            let p: Vector3<f32> = vertex.position.into();
            assert_relative_eq!(p.magnitude(), 15.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn cone_counts_and_normals() {
        let cone = MeshData::cone(0.5, 2.0, 8);
        // two lateral rows, base centres and base ring
        assert_eq!(cone.vertices.len(), 2 * 9 + 8 + 9);
        assert_eq!(cone.indices.len(), 8 * 3 * 2);
        assert_indices_in_range(&cone);
        assert_unit_normals(&cone);
        let top = cone.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        let bottom = cone.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        assert_eq!(top, 1.0);
        assert_eq!(bottom, -1.0);
    }

    #[test]
    fn cone_lateral_faces_point_outwards() {
        let cone = MeshData::cone(0.5, 2.0, 8);
        for tri in cone.indices.chunks_exact(3).take(8) {
            let p: Vec<Vector3<f32>> = tri
                .iter()
                .map(|&i| cone.vertices[i as usize].position.into())
                .collect();
            let normal = (p[1] - p[0]).cross(p[2] - p[0]);
            let centroid = (p[0] + p[1] + p[2]) / 3.0;
            let outward = Vector3::new(centroid.x, 0.0, centroid.z);
            assert!(normal.dot(outward) > 0.0);
        }
    }

    #[test]
    fn displaced_grid_gets_tilted_normals() {
        let mut plane = MeshData::plane(2.0, 2.0, 2, 2);
        for vertex in plane.vertices.iter_mut() {
            vertex.position[1] = vertex.position[0];
        }
        plane.compute_vertex_normals();
        let n = plane.vertices[4].normal;
        // the slope rises along +X so the normal leans towards -X
        assert!(n[0] < 0.0);
        assert_relative_eq!(n[0], -std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-4);
        assert_relative_eq!(n[1], std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-4);
    }
}
