//! Frame recording.
//!
//! The scene script hands every draw to the mesh provider as a [`DrawState`].
//! The [`Renderer`] packs those states into one uniform buffer, addressed per
//! draw with a dynamic offset, and records a single pass over them.

use std::iter;

use cgmath::{Matrix, Matrix4, SquareMatrix};

use crate::{
    context::Context,
    data_structures::{
        draw_state::{DrawState, LightingState},
        light::POINT_LIGHT_SLOTS,
    },
    pipelines::basic::{self, OBJECT_UNIFORM_SIZE},
    resources::{
        mesh::{MeshKind, ShapeMeshes},
        texture::WgpuTextures,
    },
};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    position: [f32; 3],
    enabled: u32,
    ambient: [f32; 3],
    _padding: f32,
    diffuse: [f32; 3],
    _padding2: f32,
    specular: [f32; 3],
    _padding3: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    view_position: [f32; 3],
    use_lighting: u32,
    spot_light_active: u32,
    _padding: [u32; 3],
    point_lights: [PointLightRaw; POINT_LIGHT_SLOTS],
}

impl SceneUniform {
    pub fn new(view_proj: Matrix4<f32>, lighting: &LightingState) -> Self {
        let mut point_lights = [PointLightRaw::default(); POINT_LIGHT_SLOTS];
        for (raw, light) in point_lights.iter_mut().zip(lighting.point_lights.iter()) {
            *raw = PointLightRaw {
                position: light.position,
                enabled: light.active as u32,
                ambient: light.ambient,
                diffuse: light.diffuse,
                specular: light.specular,
                ..Default::default()
            };
        }
        Self {
            view_proj: view_proj.into(),
            view_position: lighting.view_position,
            use_lighting: lighting.use_lighting as u32,
            spot_light_active: lighting.spot_light_active as u32,
            _padding: [0; 3],
            point_lights,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    object_color: [f32; 4],
    uv_scale: [f32; 2],
    use_texture: u32,
    _padding: u32,
    ambient_color: [f32; 3],
    ambient_strength: f32,
    diffuse_color: [f32; 3],
    shininess: f32,
    specular_color: [f32; 3],
    _padding2: f32,
}

impl From<&DrawState> for ObjectUniform {
    fn from(state: &DrawState) -> Self {
        // Degenerate scales have no inverse; their normals are meaningless anyway.
        let normal_matrix = state
            .model
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(state.model);
        let shading = &state.shading;
        Self {
            model: state.model.into(),
            normal_matrix: normal_matrix.into(),
            object_color: state.object_color,
            uv_scale: state.uv_scale,
            use_texture: state.use_texture as u32,
            _padding: 0,
            ambient_color: shading.ambient_color,
            ambient_strength: shading.ambient_strength,
            diffuse_color: shading.diffuse_color,
            shininess: shading.shininess,
            specular_color: shading.specular_color,
            _padding2: 0.0,
        }
    }
}

/// Where a frame goes: a colour view and a matching depth view.
pub struct FrameTarget<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
    pub clear_colour: wgpu::Color,
}

pub struct Renderer {
    pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_capacity: usize,
    object_stride: u64,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        textures: &WgpuTextures,
    ) -> Self {
        let scene_layout = basic::scene_layout(device);
        let object_layout = basic::object_layout(device);
        let pipeline = basic::mk_scene_pipeline(
            device,
            color_format,
            &scene_layout,
            &object_layout,
            textures.layout(),
        );

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Buffer"),
            size: std::mem::size_of::<SceneUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
            label: Some("scene_bind_group"),
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let object_stride = OBJECT_UNIFORM_SIZE.div_ceil(alignment) * alignment;
        let object_capacity = 32;
        let (object_buffer, object_bind_group) =
            Self::object_storage(device, &object_layout, object_stride, object_capacity);

        Self {
            pipeline,
            scene_buffer,
            scene_bind_group,
            object_layout,
            object_buffer,
            object_bind_group,
            object_capacity,
            object_stride,
        }
    }

    fn object_storage(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(OBJECT_UNIFORM_SIZE),
                }),
            }],
            label: Some("object_bind_group"),
        });
        (buffer, bind_group)
    }

    /// Upload the scene block and one object block per draw, growing the object
    /// buffer when the frame has more draws than it holds.
    fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneUniform,
        draws: &[(MeshKind, DrawState)],
    ) {
        queue.write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(scene));

        if draws.len() > self.object_capacity {
            self.object_capacity = draws.len().next_power_of_two();
            log::debug!("Growing object buffer to {} draws", self.object_capacity);
            let (buffer, bind_group) = Self::object_storage(
                device,
                &self.object_layout,
                self.object_stride,
                self.object_capacity,
            );
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
        }

        let stride = self.object_stride as usize;
        let mut bytes = vec![0u8; stride * draws.len()];
        for (i, (_, state)) in draws.iter().enumerate() {
            let uniform = ObjectUniform::from(state);
            let start = i * stride;
            bytes[start..start + OBJECT_UNIFORM_SIZE as usize]
                .copy_from_slice(bytemuck::bytes_of(&uniform));
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.object_buffer, 0, &bytes);
        }
    }

    /// Record the frame into `target` and submit it.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: FrameTarget,
        view_proj: Matrix4<f32>,
        lighting: &LightingState,
        draws: &[(MeshKind, DrawState)],
        meshes: &ShapeMeshes,
        textures: &WgpuTextures,
    ) {
        self.upload(device, queue, &SceneUniform::new(view_proj, lighting), draws);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(target.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.scene_bind_group, &[]);
            for (i, (kind, state)) in draws.iter().enumerate() {
                let Some(mesh) = meshes.get(*kind) else {
                    log::warn!("{:?} was queued but never loaded, skipping it", kind);
                    continue;
                };
                let offset = (i as u64 * self.object_stride) as u32;
                render_pass.set_bind_group(1, &self.object_bind_group, &[offset]);
                render_pass.set_bind_group(2, textures.bind_group(state.sampled_slot()), &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.num_elements, 0, 0..1);
            }
        }
        queue.submit(iter::once(encoder.finish()));
    }

    /// Render one frame to the window surface and present it.
    pub fn render(
        &mut self,
        ctx: &Context,
        lighting: &LightingState,
        draws: &[(MeshKind, DrawState)],
        meshes: &ShapeMeshes,
        textures: &WgpuTextures,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.record(
            &ctx.device,
            &ctx.queue,
            FrameTarget {
                color: &view,
                depth: &ctx.depth_texture.view,
                clear_colour: ctx.clear_colour,
            },
            ctx.view_projection(),
            lighting,
            draws,
            meshes,
            textures,
        );
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data_structures::draw_state::PointLightState, pipelines::basic::SCENE_UNIFORM_SIZE};

    #[test]
    fn uniform_sizes_match_the_shader_layout() {
        assert_eq!(std::mem::size_of::<PointLightRaw>(), 64);
        assert_eq!(std::mem::size_of::<SceneUniform>() as u64, SCENE_UNIFORM_SIZE);
        assert_eq!(std::mem::size_of::<ObjectUniform>() as u64, OBJECT_UNIFORM_SIZE);
    }

    #[test]
    fn disabled_lights_are_packed_as_disabled() {
        let mut lighting = LightingState {
            use_lighting: true,
            view_position: [4.0, 1.0, 4.0],
            ..Default::default()
        };
        lighting.point_lights[1] = PointLightState {
            active: true,
            position: [-77.0, 10.0, -27.0],
            ..Default::default()
        };

        let scene = SceneUniform::new(Matrix4::identity(), &lighting);
        assert_eq!(scene.use_lighting, 1);
        assert_eq!(scene.point_lights[0].enabled, 0);
        assert_eq!(scene.point_lights[1].enabled, 1);
        assert_eq!(scene.point_lights[1].position, [-77.0, 10.0, -27.0]);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let state = DrawState {
            model: Matrix4::from_nonuniform_scale(2.0, 4.0, 1.0),
            object_color: [1.0; 4],
            use_texture: false,
            texture_slot: -1,
            uv_scale: [1.0, 1.0],
            shading: Default::default(),
        };
        let uniform = ObjectUniform::from(&state);
        assert_eq!(uniform.normal_matrix[0][0], 0.5);
        assert_eq!(uniform.normal_matrix[1][1], 0.25);
        assert_eq!(uniform.model[1][1], 4.0);
    }
}
