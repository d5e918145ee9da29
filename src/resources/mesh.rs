//! Primitive meshes: geometry generation and the mesh provider.
//!
//! Every [`MeshKind`] has to be loaded once through a [`MeshProvider`] before it
//! can be drawn. A draw consumes the [`DrawState`] captured for it and nothing
//! else.

use std::{
    collections::HashMap,
    f32::consts::{PI, TAU},
};

use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::data_structures::draw_state::DrawState;

const SPHERE_STACKS: u32 = 18;
const ROUND_SLICES: u32 = 36;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Plane,
    Box,
    Sphere,
    Cylinder,
    Cone,
}

impl MeshKind {
    pub const ALL: [MeshKind; 5] = [
        MeshKind::Plane,
        MeshKind::Box,
        MeshKind::Sphere,
        MeshKind::Cylinder,
        MeshKind::Cone,
    ];

    /// Local-space geometry of the primitive.
    ///
    /// * plane: 2x2 in XZ centred on the origin, facing +Y
    /// * box: unit cube centred on the origin
    /// * sphere: radius 1 around the origin
    /// * cylinder: radius 1, from y = 0 to y = 1, capped
    /// * cone: base of radius 1 at y = 0, apex at y = 1, capped
    pub fn geometry(self) -> Geometry {
        match self {
            MeshKind::Plane => plane(),
            MeshKind::Box => cube(),
            MeshKind::Sphere => sphere(SPHERE_STACKS, ROUND_SLICES),
            MeshKind::Cylinder => cylinder(ROUND_SLICES),
            MeshKind::Cone => cone(ROUND_SLICES),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum MeshError {
    #[error("{0:?} mesh was drawn before it was loaded")]
    NotLoaded(MeshKind),
}

/// The external mesh collaborator: load each primitive once, then draw it as
/// often as needed.
pub trait MeshProvider {
    /// Loading an already loaded kind is a no-op.
    fn load_mesh(&mut self, kind: MeshKind);

    fn draw_mesh(&mut self, kind: MeshKind, state: DrawState) -> Result<(), MeshError>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl MeshVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    fn vertex(&mut self, position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> u32 {
        self.vertices.push(MeshVertex {
            position,
            normal,
            tex_coords,
        });
        self.vertices.len() as u32 - 1
    }

    fn quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }

    /// Flat disc at height `y` facing `normal_y` (+1 or -1).
    fn disc(&mut self, y: f32, normal_y: f32, slices: u32) {
        let centre = self.vertex([0.0, y, 0.0], [0.0, normal_y, 0.0], [0.5, 0.5]);
        let first = self.vertices.len() as u32;
        for i in 0..=slices {
            let (sin, cos) = (TAU * i as f32 / slices as f32).sin_cos();
            self.vertex(
                [cos, y, sin],
                [0.0, normal_y, 0.0],
                [0.5 + 0.5 * cos, 0.5 + 0.5 * sin],
            );
        }
        for i in 0..slices {
            let (a, b) = (first + i, first + i + 1);
            if normal_y > 0.0 {
                self.indices.extend_from_slice(&[centre, b, a]);
            } else {
                self.indices.extend_from_slice(&[centre, a, b]);
            }
        }
    }
}

fn plane() -> Geometry {
    let mut g = Geometry::default();
    let up = [0.0, 1.0, 0.0];
    let a = g.vertex([-1.0, 0.0, 1.0], up, [0.0, 0.0]);
    let b = g.vertex([1.0, 0.0, 1.0], up, [1.0, 0.0]);
    let c = g.vertex([1.0, 0.0, -1.0], up, [1.0, 1.0]);
    let d = g.vertex([-1.0, 0.0, -1.0], up, [0.0, 1.0]);
    g.quad(a, b, c, d);
    g
}

fn cube() -> Geometry {
    let mut g = Geometry::default();
    // (normal, tangent u, tangent v) with u x v == normal
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];
    for (n, u, v) in faces {
        let corner = |su: f32, sv: f32| {
            [
                0.5 * (n[0] + su * u[0] + sv * v[0]),
                0.5 * (n[1] + su * u[1] + sv * v[1]),
                0.5 * (n[2] + su * u[2] + sv * v[2]),
            ]
        };
        let a = g.vertex(corner(-1.0, -1.0), n, [0.0, 0.0]);
        let b = g.vertex(corner(1.0, -1.0), n, [1.0, 0.0]);
        let c = g.vertex(corner(1.0, 1.0), n, [1.0, 1.0]);
        let d = g.vertex(corner(-1.0, 1.0), n, [0.0, 1.0]);
        g.quad(a, b, c, d);
    }
    g
}

fn sphere(stacks: u32, slices: u32) -> Geometry {
    let mut g = Geometry::default();
    for stack in 0..=stacks {
        let v = stack as f32 / stacks as f32;
        let (sin_phi, cos_phi) = (PI * v).sin_cos();
        for slice in 0..=slices {
            let u = slice as f32 / slices as f32;
            let (sin_theta, cos_theta) = (TAU * u).sin_cos();
            // phi runs from the north pole (+Y) down
            let p = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            g.vertex(p, p, [u, 1.0 - v]);
        }
    }
    let row = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = stack * row + slice;
            let b = a + row;
            g.quad(a, a + 1, b + 1, b);
        }
    }
    g
}

fn cylinder(slices: u32) -> Geometry {
    let mut g = Geometry::default();
    let first = g.vertices.len() as u32;
    for i in 0..=slices {
        let u = i as f32 / slices as f32;
        let (sin, cos) = (TAU * u).sin_cos();
        g.vertex([cos, 0.0, sin], [cos, 0.0, sin], [u, 0.0]);
        g.vertex([cos, 1.0, sin], [cos, 0.0, sin], [u, 1.0]);
    }
    for i in 0..slices {
        let bottom = first + 2 * i;
        let top = bottom + 1;
        g.quad(bottom, top, top + 2, bottom + 2);
    }
    g.disc(1.0, 1.0, slices);
    g.disc(0.0, -1.0, slices);
    g
}

fn cone(slices: u32) -> Geometry {
    let mut g = Geometry::default();
    // slant normal of a unit-radius, unit-height cone
    let k = std::f32::consts::FRAC_1_SQRT_2;
    for i in 0..slices {
        let u0 = i as f32 / slices as f32;
        let u1 = (i + 1) as f32 / slices as f32;
        let um = 0.5 * (u0 + u1);
        let (s0, c0) = (TAU * u0).sin_cos();
        let (s1, c1) = (TAU * u1).sin_cos();
        let (sm, cm) = (TAU * um).sin_cos();
        let a = g.vertex([c0, 0.0, s0], [c0 * k, k, s0 * k], [u0, 0.0]);
        let b = g.vertex([c1, 0.0, s1], [c1 * k, k, s1 * k], [u1, 0.0]);
        let apex = g.vertex([0.0, 1.0, 0.0], [cm * k, k, sm * k], [um, 1.0]);
        g.indices.extend_from_slice(&[a, apex, b]);
    }
    g.disc(0.0, -1.0, slices);
    g
}

/// GPU buffers of one loaded primitive.
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

/// wgpu mesh provider. Loaded primitives stay resident; draws are queued with
/// their state until the renderer takes them for the frame.
pub struct ShapeMeshes {
    device: wgpu::Device,
    meshes: HashMap<MeshKind, GpuMesh>,
    queued: Vec<(MeshKind, DrawState)>,
}

impl ShapeMeshes {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            device: device.clone(),
            meshes: HashMap::new(),
            queued: Vec::new(),
        }
    }

    pub fn get(&self, kind: MeshKind) -> Option<&GpuMesh> {
        self.meshes.get(&kind)
    }

    pub fn take_draws(&mut self) -> Vec<(MeshKind, DrawState)> {
        std::mem::take(&mut self.queued)
    }
}

impl MeshProvider for ShapeMeshes {
    fn load_mesh(&mut self, kind: MeshKind) {
        if self.meshes.contains_key(&kind) {
            return;
        }
        let geometry = kind.geometry();
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", kind)),
                contents: bytemuck::cast_slice(&geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", kind)),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        log::debug!(
            "Loaded {:?} mesh with {} vertices",
            kind,
            geometry.vertices.len()
        );
        self.meshes.insert(
            kind,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                num_elements: geometry.indices.len() as u32,
            },
        );
    }

    fn draw_mesh(&mut self, kind: MeshKind, state: DrawState) -> Result<(), MeshError> {
        if !self.meshes.contains_key(&kind) {
            return Err(MeshError::NotLoaded(kind));
        }
        self.queued.push((kind, state));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn bounds(g: &Geometry) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in &g.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }
        (min, max)
    }

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(a, b)| (a - b).abs() < 1e-5)
    }

    #[test]
    fn every_primitive_is_well_formed() {
        for kind in MeshKind::ALL {
            let g = kind.geometry();
            assert!(!g.indices.is_empty(), "{kind:?}");
            assert_eq!(g.indices.len() % 3, 0, "{kind:?}");
            assert!(
                g.indices.iter().all(|&i| (i as usize) < g.vertices.len()),
                "{kind:?} indexes past its vertices"
            );
            for v in &g.vertices {
                let len = Vector3::from(v.normal).magnitude();
                assert!((len - 1.0).abs() < 1e-4, "{kind:?} normal {:?}", v.normal);
            }
        }
    }

    #[test]
    fn primitives_have_the_documented_extents() {
        let expected = [
            (MeshKind::Plane, [-1.0, 0.0, -1.0], [1.0, 0.0, 1.0]),
            (MeshKind::Box, [-0.5; 3], [0.5; 3]),
            (MeshKind::Sphere, [-1.0; 3], [1.0; 3]),
            (MeshKind::Cylinder, [-1.0, 0.0, -1.0], [1.0, 1.0, 1.0]),
            (MeshKind::Cone, [-1.0, 0.0, -1.0], [1.0, 1.0, 1.0]),
        ];
        for (kind, min, max) in expected {
            let (actual_min, actual_max) = bounds(&kind.geometry());
            assert!(close(actual_min, min), "{kind:?} min {actual_min:?}");
            assert!(close(actual_max, max), "{kind:?} max {actual_max:?}");
        }
    }

    #[test]
    fn cube_faces_wind_counter_clockwise_seen_from_outside() {
        let g = MeshKind::Box.geometry();
        for tri in g.indices.chunks(3) {
            let p = |i: u32| Vector3::from(g.vertices[i as usize].position);
            let face_normal = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            let vertex_normal = Vector3::from(g.vertices[tri[0] as usize].normal);
            assert!(face_normal.dot(vertex_normal) > 0.0);
        }
    }
}
