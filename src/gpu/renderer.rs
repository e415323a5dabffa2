// SPDX-License-Identifier: GPL-3.0-only

//! Offscreen renderer for the relief scene
//!
//! All GPU resources are sized once from the first scene. Per frame only the
//! resources whose generation changed are re-uploaded, the two uniform
//! blocks are rewritten, and the color target is read back as RGBA8.

use super::params::ReliefParams;
use super::{GpuDeviceInfo, RELIEF_SHADER, create_device};
use crate::constants::{RENDERER_HEIGHT, RENDERER_WIDTH, max_index_count};
use crate::depth::Raster;
use crate::errors::{AppResult, GpuError};
use crate::frame_loop::{FrameRenderer, RenderedFrame};
use crate::scene::{SceneGenerations, SceneState};
use glam::Mat4;
use std::sync::Arc;
use tracing::{debug, info};
use wgpu::util::DeviceExt;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Normal, color and uv of one vertex; never changes after creation
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct StaticAttributes {
    normal: [f32; 3],
    color: [f32; 3],
    uv: [f32; 2],
}

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const STATIC_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![1 => Float32x3, 2 => Float32x3, 3 => Float32x2];

/// Buffers and uniforms of one draw
struct DrawResources {
    positions: wgpu::Buffer,
    attributes: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    params: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// wgpu renderer drawing the relief and background to an offscreen target
pub struct ReliefRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    info: GpuDeviceInfo,
    pipeline: wgpu::RenderPipeline,
    depth_channel: wgpu::Texture,
    color_channel: wgpu::Texture,
    relief: DrawResources,
    background: DrawResources,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    padded_bytes_per_row: u32,
    raster_width: u32,
    raster_height: u32,
    uploaded: SceneGenerations,
}

impl ReliefRenderer {
    /// Create the device and every resource the scene needs
    pub async fn new(scene: &SceneState) -> Result<Self, GpuError> {
        let (device, queue, info) = create_device("relief").await?;

        info!(
            adapter_name = %info.adapter_name,
            adapter_backend = ?info.backend,
            "GPU device created for relief rendering"
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("relief_shader"),
            source: wgpu::ShaderSource::Wgsl(RELIEF_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("relief_bind_group_layout"),
            entries: &[
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Depth channel
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Color channel
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("relief_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("relief_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &POSITION_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<StaticAttributes>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &STATIC_ATTRIBUTES,
                    },
                ],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        let (raster_width, raster_height) = scene.dimensions();
        let depth_channel = create_channel_texture(&device, "depth_channel", raster_width, raster_height);
        let color_channel = create_channel_texture(&device, "color_channel", raster_width, raster_height);
        let depth_channel_view = depth_channel.create_view(&wgpu::TextureViewDescriptor::default());
        let color_channel_view = color_channel.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("channel_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let make_bind_group = |label: &str, params: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&depth_channel_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&color_channel_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            })
        };

        // Relief: positions rewritten on refresh, index buffer sized for the worst case
        let grid = scene.mesh().grid();
        let relief_attributes: Vec<StaticAttributes> = grid
            .normals()
            .iter()
            .zip(grid.colors())
            .zip(grid.uvs())
            .map(|((normal, color), uv)| StaticAttributes {
                normal: *normal,
                color: *color,
                uv: *uv,
            })
            .collect();
        let relief_params = create_params_buffer(&device, "relief_params");
        let relief = DrawResources {
            positions: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("relief_positions"),
                contents: bytemuck::cast_slice(grid.positions()),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            }),
            attributes: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("relief_attributes"),
                contents: bytemuck::cast_slice(&relief_attributes),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            indices: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("relief_indices"),
                size: (max_index_count(raster_width, raster_height) * std::mem::size_of::<u32>()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            index_count: 0,
            bind_group: make_bind_group("relief_bind_group", &relief_params),
            params: relief_params,
        };

        // Background: static plane geometry
        let plane = scene.background().geometry();
        let background_attributes: Vec<StaticAttributes> = plane
            .normals
            .iter()
            .zip(&plane.uvs)
            .map(|(normal, uv)| StaticAttributes {
                normal: *normal,
                color: [1.0, 1.0, 1.0],
                uv: *uv,
            })
            .collect();
        let background_params = create_params_buffer(&device, "background_params");
        let background = DrawResources {
            positions: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("background_positions"),
                contents: bytemuck::cast_slice(&plane.positions),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            attributes: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("background_attributes"),
                contents: bytemuck::cast_slice(&background_attributes),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("background_indices"),
                contents: bytemuck::cast_slice(&plane.indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: plane.indices.len() as u32,
            bind_group: make_bind_group("background_bind_group", &background_params),
            params: background_params,
        };

        // Output surface
        let target_size = wgpu::Extent3d {
            width: RENDERER_WIDTH,
            height: RENDERER_HEIGHT,
            depth_or_array_layers: 1,
        };
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("relief_target"),
            size: target_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("relief_depth_target"),
            size: target_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_target.create_view(&wgpu::TextureViewDescriptor::default());

        let padded_bytes_per_row = padded_bytes_per_row(RENDERER_WIDTH);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("relief_readback"),
            size: padded_bytes_per_row as u64 * RENDERER_HEIGHT as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        debug!(
            raster_width,
            raster_height,
            vertex_count = grid.len(),
            "Relief GPU resources created"
        );

        Ok(Self {
            device,
            queue,
            info,
            pipeline,
            depth_channel,
            color_channel,
            relief,
            background,
            target,
            target_view,
            depth_view,
            readback,
            padded_bytes_per_row,
            raster_width,
            raster_height,
            uploaded: SceneGenerations::never_uploaded(),
        })
    }

    pub fn device_info(&self) -> &GpuDeviceInfo {
        &self.info
    }

    /// Upload every resource whose generation moved since the last frame
    fn sync(&mut self, scene: &SceneState) -> Result<(), GpuError> {
        if scene.dimensions() != (self.raster_width, self.raster_height) {
            let (w, h) = scene.dimensions();
            return Err(GpuError::ResourceMismatch(format!(
                "scene is {}x{}, resources were sized for {}x{}",
                w, h, self.raster_width, self.raster_height
            )));
        }

        let current = scene.generations();
        let mesh = scene.mesh();

        if current.positions != self.uploaded.positions {
            self.queue
                .write_buffer(&self.relief.positions, 0, bytemuck::cast_slice(mesh.positions()));
        }

        if current.indices != self.uploaded.indices {
            if !mesh.indices().is_empty() {
                self.queue
                    .write_buffer(&self.relief.indices, 0, bytemuck::cast_slice(mesh.indices()));
            }
            self.relief.index_count = mesh.indices().len() as u32;
        }

        if current.depth_texture != self.uploaded.depth_texture {
            self.write_channel(&self.depth_channel, scene.depth_texture());
        }

        if current.color_texture != self.uploaded.color_texture {
            self.write_channel(&self.color_channel, scene.color_texture());
        }

        self.uploaded = current;
        Ok(())
    }

    fn write_channel(&self, texture: &wgpu::Texture, raster: &Raster) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            raster.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(raster.width() * 4),
                rows_per_image: Some(raster.height()),
            },
            wgpu::Extent3d {
                width: raster.width(),
                height: raster.height(),
                depth_or_array_layers: 1,
            },
        );
    }

    /// Draw one frame and read it back
    pub async fn render_async(&mut self, scene: &SceneState) -> Result<RenderedFrame, GpuError> {
        self.sync(scene)?;

        let camera = scene.camera();
        let (w, h) = (self.raster_width, self.raster_height);
        let relief_params = ReliefParams::new(camera, Mat4::IDENTITY, w, h);
        let background_params = ReliefParams::new(camera, scene.background().model_matrix(), w, h);
        self.queue
            .write_buffer(&self.relief.params, 0, bytemuck::bytes_of(&relief_params));
        self.queue
            .write_buffer(&self.background.params, 0, bytemuck::bytes_of(&background_params));

        let [r, g, b] = scene.clear_color().to_array();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("relief_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("relief_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);

            if scene.background().visible {
                draw(&mut pass, &self.background);
            }
            if self.relief.index_count > 0 {
                draw(&mut pass, &self.relief);
            }
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(RENDERER_HEIGHT),
                },
            },
            wgpu::Extent3d {
                width: RENDERER_WIDTH,
                height: RENDERER_HEIGHT,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let rgba = self.read_back().await?;
        Ok(RenderedFrame {
            rgba,
            width: RENDERER_WIDTH,
            height: RENDERER_HEIGHT,
        })
    }

    async fn read_back(&self) -> Result<Vec<u8>, GpuError> {
        let buffer_slice = self.readback.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());

        receiver
            .await
            .map_err(|_| GpuError::Readback("Failed to receive buffer mapping result".into()))?
            .map_err(|e| GpuError::Readback(format!("Failed to map buffer: {:?}", e)))?;

        // Read data, removing row padding if necessary
        let row_bytes = (RENDERER_WIDTH * 4) as usize;
        let mut output = Vec::with_capacity(row_bytes * RENDERER_HEIGHT as usize);
        {
            let data = buffer_slice.get_mapped_range();
            for row in 0..RENDERER_HEIGHT as usize {
                let start = row * self.padded_bytes_per_row as usize;
                output.extend_from_slice(&data[start..start + row_bytes]);
            }
        }
        self.readback.unmap();

        Ok(output)
    }
}

impl FrameRenderer for ReliefRenderer {
    fn render(&mut self, scene: &SceneState) -> AppResult<RenderedFrame> {
        Ok(pollster::block_on(self.render_async(scene))?)
    }
}

fn draw(pass: &mut wgpu::RenderPass<'_>, resources: &DrawResources) {
    pass.set_bind_group(0, &resources.bind_group, &[]);
    pass.set_vertex_buffer(0, resources.positions.slice(..));
    pass.set_vertex_buffer(1, resources.attributes.slice(..));
    pass.set_index_buffer(resources.indices.slice(..), wgpu::IndexFormat::Uint32);
    pass.draw_indexed(0..resources.index_count, 0, 0..1);
}

fn create_channel_texture(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn create_params_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<ReliefParams>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Row pitch of a texture-to-buffer copy of `width` RGBA8 texels
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}
