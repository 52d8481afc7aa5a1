//! 粒子顶点格式
//!
//! 每个粒子展开为两个三角形（6 个顶点），交错存放位置、纹理坐标和透明度。

use crate::render::graphics::{ScalarType, VertexElement};

/// 粒子顶点
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleVertex {
    /// 世界坐标
    pub position: [f32; 3],
    /// 纹理坐标
    pub uv: [f32; 2],
    /// 透明度
    pub alpha: f32,
}

/// 每个粒子的顶点数
pub const VERTICES_PER_PARTICLE: usize = 6;

/// 单个顶点的字节数
pub const PARTICLE_VERTEX_SIZE: usize = std::mem::size_of::<ParticleVertex>();

/// 顶点声明
pub const PARTICLE_VERTEX_ELEMENTS: [VertexElement; 3] = [
    VertexElement::new("position", 0, 3, ScalarType::Float),
    VertexElement::new("texcoord0", 1, 2, ScalarType::Float),
    VertexElement::new("alpha", 2, 1, ScalarType::Float),
];

/// 容纳 `max_particles` 个粒子所需的暂存缓冲区字节数
pub fn vertex_buffer_size(max_particles: usize) -> usize {
    max_particles * VERTICES_PER_PARTICLE * PARTICLE_VERTEX_SIZE
}
