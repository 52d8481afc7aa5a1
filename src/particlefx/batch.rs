//! 渲染批次收集
//!
//! 模拟引擎遍历内部粒子缓冲区时，每遇到一段共享材质/纹理/混合模式的连续顶点
//! 就回调一次；这里只负责把引擎参数翻译成 [`RenderObject`] 并追加。

use super::engine::{BlendMode, RenderInstanceSink};
use crate::core::error::{RenderError, RenderResult};
use crate::render::graphics::{VertexBufferHandle, VertexDeclarationHandle};
use crate::render::render_object::{
    BlendFactor, MaterialHandle, PrimitiveType, RenderObject, TextureHandle,
};

/// 混合模式对应的 (源, 目标) 混合因子
pub fn blend_factors(blend_mode: BlendMode) -> RenderResult<(BlendFactor, BlendFactor)> {
    match blend_mode {
        BlendMode::Alpha => Ok((BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)),
        BlendMode::Add => Ok((BlendFactor::One, BlendFactor::One)),
        BlendMode::AddAlpha => Ok((BlendFactor::SrcAlpha, BlendFactor::One)),
        BlendMode::Mult => Ok((BlendFactor::Zero, BlendFactor::SrcColor)),
        BlendMode::Unknown(raw) => Err(RenderError::UnknownBlendMode(raw)),
    }
}

/// 设置混合因子；未知模式时保持原值并返回错误
pub fn set_blend_factors(ro: &mut RenderObject, blend_mode: BlendMode) -> RenderResult<()> {
    let (source, destination) = blend_factors(blend_mode)?;
    ro.source_blend_factor = source;
    ro.destination_blend_factor = destination;
    Ok(())
}

/// 批次收集器
pub struct BatchEmitter<'a> {
    batches: &'a mut Vec<RenderObject>,
    vertex_buffer: VertexBufferHandle,
    vertex_declaration: VertexDeclarationHandle,
    unknown_blend_modes: u32,
}

impl<'a> BatchEmitter<'a> {
    pub fn new(
        batches: &'a mut Vec<RenderObject>,
        vertex_buffer: VertexBufferHandle,
        vertex_declaration: VertexDeclarationHandle,
    ) -> Self {
        Self {
            batches,
            vertex_buffer,
            vertex_declaration,
            unknown_blend_modes: 0,
        }
    }

    /// 本次收集中遇到的未知混合模式数
    pub fn unknown_blend_modes(&self) -> u32 {
        self.unknown_blend_modes
    }
}

impl RenderInstanceSink for BatchEmitter<'_> {
    fn render_instance(
        &mut self,
        material: MaterialHandle,
        texture: TextureHandle,
        blend_mode: BlendMode,
        vertex_index: u32,
        vertex_count: u32,
    ) {
        let mut ro = RenderObject {
            material,
            texture,
            vertex_buffer: self.vertex_buffer,
            vertex_declaration: self.vertex_declaration,
            vertex_start: vertex_index,
            vertex_count,
            primitive_type: PrimitiveType::Triangles,
            calculate_depth_key: true,
            set_blend_factors: true,
            ..Default::default()
        };
        if let Err(e) = set_blend_factors(&mut ro, blend_mode) {
            tracing::error!(target: "particlefx", "{}", e);
            self.unknown_blend_modes += 1;
        }
        self.batches.push(ro);
    }
}
