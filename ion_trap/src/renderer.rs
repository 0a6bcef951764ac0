//! GPU rendering of the trap
//!
//! Everything is drawn as camera-facing sphere billboards (ions, halos, markers)
//! or colored line segments (electrodes, beams, links, level bars). The frame
//! geometry is assembled on the CPU by [`build_frame`] and uploaded every frame.

use crate::constants::ION_RADIUS;
use crate::effects::wavy_curve;
use crate::ion::IonId;
use crate::scene::{Placed, SceneObject};
use crate::trap::IonTrap;
use common::{Camera3D, CameraUniform, GraphicsContext};
use glam::Vec3;
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// Instance data for billboarded spheres
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

impl PointInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        2 => Float32x3,  // position
        3 => Float32,    // size
        4 => Float32x4,  // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }

    fn new(position: Vec3, size: f32, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            size,
            color,
        }
    }
}

/// Quad vertex for billboards
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

impl QuadVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

const QUAD_VERTICES: &[QuadVertex] = &[
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0] },
];

/// Line vertex for beams, links and trap geometry
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

pub type Line = (Vec3, Vec3, [f32; 4]);

/// CPU-side geometry for one frame
#[derive(Debug, Default)]
pub struct FrameGeometry {
    /// Drawn in order; no depth buffer, so halos come before their ions
    pub points: Vec<PointInstance>,
    pub lines: Vec<Line>,
}

const ELECTRODE_COLOR: [f32; 4] = [0.55, 0.58, 0.65, 0.8];
const ENDCAP_COLOR: [f32; 4] = [0.75, 0.6, 0.35, 0.8];
const LEVEL_BAR_COLOR: [f32; 4] = [0.9, 0.9, 0.9, 1.0];
const LINK_SEGMENTS: usize = 48;

fn fade(color: [f32; 4], opacity: f32) -> [f32; 4] {
    [color[0], color[1], color[2], color[3] * opacity.clamp(0.0, 1.0)]
}

/// Assemble trap, ions and transient effects for the current frame
pub fn build_frame(trap: &IonTrap) -> FrameGeometry {
    let mut frame = FrameGeometry::default();
    let positions: HashMap<IonId, Vec3> = trap.ion_positions().into_iter().collect();

    push_trap_electrodes(&mut frame, trap);

    for ion in trap.state.ions.iter() {
        let pos = positions.get(&ion.id).copied().unwrap_or(ion.base_position);
        if ion.is_selected {
            frame.points.push(PointInstance::new(
                pos,
                ION_RADIUS * 1.7,
                trap.config.palette.selection_halo,
            ));
        }
        frame.points.push(PointInstance::new(pos, ION_RADIUS, ion.color));
    }

    let time = trap.elapsed();
    for (_, placed) in trap.stage.scene.iter() {
        push_object(&mut frame, placed, &positions, time);
    }

    frame
}

/// Four rods along the trap axis plus a ring electrode at each end
fn push_trap_electrodes(frame: &mut FrameGeometry, trap: &IonTrap) {
    const ROD_OFFSET: f32 = 0.9;
    const RING_RADIUS: f32 = 0.7;
    const RING_SEGMENTS: usize = 24;

    let half_len = trap
        .state
        .ions
        .iter()
        .map(|ion| ion.base_position.x.abs())
        .fold(0.0f32, f32::max)
        + 2.0;

    for (y, z) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
        let offset = Vec3::new(0.0, y * ROD_OFFSET, z * ROD_OFFSET);
        frame.lines.push((
            Vec3::new(-half_len, 0.0, 0.0) + offset,
            Vec3::new(half_len, 0.0, 0.0) + offset,
            ELECTRODE_COLOR,
        ));
    }

    for x in [-half_len, half_len] {
        for i in 0..RING_SEGMENTS {
            let a0 = i as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
            let a1 = (i + 1) as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
            frame.lines.push((
                Vec3::new(x, a0.cos() * RING_RADIUS, a0.sin() * RING_RADIUS),
                Vec3::new(x, a1.cos() * RING_RADIUS, a1.sin() * RING_RADIUS),
                ENDCAP_COLOR,
            ));
        }
    }
}

fn push_object(frame: &mut FrameGeometry, placed: &Placed, positions: &HashMap<IonId, Vec3>, time: f32) {
    match &placed.object {
        SceneObject::LaserBeam { target, width, color } => {
            let color = fade(*color, placed.opacity);
            if *width > 0.0 {
                // Sheet of parallel beams across the trap
                const STRANDS: usize = 7;
                for i in 0..STRANDS {
                    let z = (i as f32 / (STRANDS - 1) as f32 - 0.5) * width;
                    let offset = Vec3::new(0.0, 0.0, z);
                    frame.lines.push((placed.position + offset, *target + offset, color));
                }
            } else {
                frame.lines.push((placed.position, *target, color));
                frame.points.push(PointInstance::new(*target, 0.12, color));
            }
        }
        SceneObject::EntanglementLink { a, b, color } => {
            let (Some(&pa), Some(&pb)) = (positions.get(a), positions.get(b)) else {
                return;
            };
            let color = fade(*color, placed.opacity);
            let curve = wavy_curve(pa, pb, time, LINK_SEGMENTS);
            frame
                .lines
                .extend(curve.windows(2).map(|w| (w[0], w[1], color)));
        }
        SceneObject::EnergyPopup(popup) => {
            let s = placed.scale.max(0.0);
            if s <= f32::EPSILON {
                return;
            }
            let height = 0.5 * s;
            let half_width = 0.25 * s;
            let base = placed.position;
            let bar_color = fade(LEVEL_BAR_COLOR, placed.opacity);

            for level in [0.0, 1.0] {
                let y = Vec3::Y * level * height;
                frame.lines.push((
                    base + y - Vec3::X * half_width,
                    base + y + Vec3::X * half_width,
                    bar_color,
                ));
            }

            let marker_color = fade(popup.color, placed.opacity);
            let size = 0.07 * s;
            if popup.split <= f32::EPSILON {
                frame.points.push(PointInstance::new(
                    base + Vec3::Y * popup.marker_level * height,
                    size,
                    marker_color,
                ));
            } else {
                // Marker splits into one population on each bar
                for level in [0.0, 1.0] {
                    let y = popup.marker_level + (level - popup.marker_level) * popup.split;
                    let x = (level - 0.5) * half_width * popup.split;
                    frame.points.push(PointInstance::new(
                        base + Vec3::new(x, y * height, 0.0),
                        size,
                        marker_color,
                    ));
                }
            }
        }
    }
}

fn blended_target(format: wgpu::TextureFormat) -> [Option<wgpu::ColorTargetState>; 1] {
    [Some(wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        }),
        write_mask: wgpu::ColorWrites::ALL,
    })]
}

struct PipelineSpec<'a> {
    label: &'a str,
    vs_entry: &'a str,
    fs_entry: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    spec: PipelineSpec<'_>,
) -> wgpu::RenderPipeline {
    let targets = blended_target(format);
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: spec.vs_entry,
            buffers: spec.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: spec.fs_entry,
            targets: &targets,
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.01,
    g: 0.015,
    b: 0.04,
    a: 1.0,
};

/// Point and line renderer sharing one camera uniform
pub struct TrapRenderer {
    point_pipeline: wgpu::RenderPipeline,
    quad_buffer: wgpu::Buffer,
    point_buffer: wgpu::Buffer,
    max_points: usize,

    line_pipeline: wgpu::RenderPipeline,
    line_buffer: wgpu::Buffer,
    max_lines: usize,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
}

impl TrapRenderer {
    pub fn new(ctx: &GraphicsContext, max_points: usize, max_lines: usize) -> Self {
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Trap Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/trap.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Trap Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let point_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            ctx.config.format,
            PipelineSpec {
                label: "Point Pipeline",
                vs_entry: "vs_point",
                fs_entry: "fs_point",
                buffers: &[QuadVertex::layout(), PointInstance::layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
            },
        );

        let line_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            ctx.config.format,
            PipelineSpec {
                label: "Line Pipeline",
                vs_entry: "vs_line",
                fs_entry: "fs_line",
                buffers: &[LineVertex::layout()],
                topology: wgpu::PrimitiveTopology::LineList,
            },
        );

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Buffer"),
            contents: bytemuck::cast_slice(QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let point_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Instance Buffer"),
            size: (std::mem::size_of::<PointInstance>() * max_points) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let line_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Buffer"),
            size: (std::mem::size_of::<LineVertex>() * max_lines * 2) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            point_pipeline,
            quad_buffer,
            point_buffer,
            max_points,
            line_pipeline,
            line_buffer,
            max_lines,
            camera_buffer,
            camera_bind_group,
        }
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera3D) {
        let uniform = CameraUniform::from_camera_3d(camera);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Upload a frame; returns the point and line counts actually uploaded
    pub fn upload(&self, queue: &wgpu::Queue, frame: &FrameGeometry) -> (u32, u32) {
        if frame.points.len() > self.max_points || frame.lines.len() > self.max_lines {
            log::warn!(
                "Frame truncated: {} points (max {}), {} lines (max {})",
                frame.points.len(),
                self.max_points,
                frame.lines.len(),
                self.max_lines
            );
        }

        let points = &frame.points[..frame.points.len().min(self.max_points)];
        queue.write_buffer(&self.point_buffer, 0, bytemuck::cast_slice(points));

        let vertices: Vec<LineVertex> = frame
            .lines
            .iter()
            .take(self.max_lines)
            .flat_map(|(v1, v2, color)| {
                [
                    LineVertex {
                        position: v1.to_array(),
                        color: *color,
                    },
                    LineVertex {
                        position: v2.to_array(),
                        color: *color,
                    },
                ]
            })
            .collect();
        queue.write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(&vertices));

        (points.len() as u32, (vertices.len() / 2) as u32)
    }

    /// Clear the target and draw lines, then points on top
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        num_points: u32,
        num_lines: u32,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Trap Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        if num_lines > 0 {
            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_vertex_buffer(0, self.line_buffer.slice(..));
            render_pass.draw(0..(num_lines * 2), 0..1);
        }

        if num_points > 0 {
            render_pass.set_pipeline(&self.point_pipeline);
            render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.point_buffer.slice(..));
            render_pass.draw(0..6, 0..num_points);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::PulseKind;
    use std::time::Duration;

    #[test]
    fn idle_trap_draws_ions_and_electrodes() {
        let trap = IonTrap::default();
        let frame = build_frame(&trap);
        assert_eq!(frame.points.len(), 5);
        // 4 rods + 2 rings of 24 segments
        assert_eq!(frame.lines.len(), 4 + 48);
    }

    #[test]
    fn selected_ion_gets_halo_before_it() {
        let mut trap = IonTrap::default();
        trap.toggle(IonId(2)).unwrap();
        let frame = build_frame(&trap);
        assert_eq!(frame.points.len(), 6);
        assert_eq!(frame.points[2].color, trap.config.palette.selection_halo);
        assert!(frame.points[2].size > frame.points[3].size);
    }

    #[test]
    fn entanglement_link_is_drawn_as_curve() {
        let mut trap = IonTrap::default();
        let idle_lines = build_frame(&trap).lines.len();
        trap.toggle(IonId(0)).unwrap();
        trap.toggle(IonId(1)).unwrap();
        trap.entangle().unwrap();
        let frame = build_frame(&trap);
        assert_eq!(frame.lines.len(), idle_lines + LINK_SEGMENTS);
    }

    #[test]
    fn hidden_popup_draws_nothing() {
        let mut trap = IonTrap::default();
        trap.toggle(IonId(0)).unwrap();
        trap.pulse(PulseKind::Pi).unwrap();
        let frame = build_frame(&trap);
        // Laser line + impact glow; popup still at scale zero
        assert_eq!(frame.points.len(), 5 + 1);

        trap.update(Duration::from_millis(300));
        let frame = build_frame(&trap);
        assert_eq!(frame.points.len(), 5 + 1 + 1);
    }

    #[test]
    fn fade_scales_alpha_only() {
        assert_eq!(fade([0.2, 0.4, 0.6, 0.8], 0.5), [0.2, 0.4, 0.6, 0.4]);
        assert_eq!(fade([1.0; 4], 2.0), [1.0; 4]);
    }
}
