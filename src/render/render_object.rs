//! 渲染对象与提交接口
//!
//! `RenderObject` 描述一段共享材质、纹理和混合状态的连续顶点，
//! 由渲染器负责后续的排序和绘制。

use glam::{Vec3, Vec4};

use super::graphics::{VertexBufferHandle, VertexDeclarationHandle};

/// 材质句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialHandle(pub u64);

/// 纹理句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureHandle(pub u64);

/// 混合因子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    DstAlpha,
}

/// 图元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Lines,
    Triangles,
    TriangleStrip,
}

/// 渲染批次描述
#[derive(Debug, Clone, PartialEq)]
pub struct RenderObject {
    pub material: MaterialHandle,
    pub texture: TextureHandle,
    pub vertex_buffer: VertexBufferHandle,
    pub vertex_declaration: VertexDeclarationHandle,
    /// 起始顶点
    pub vertex_start: u32,
    /// 顶点数量
    pub vertex_count: u32,
    pub primitive_type: PrimitiveType,
    pub source_blend_factor: BlendFactor,
    pub destination_blend_factor: BlendFactor,
    /// 使用上面的混合因子覆盖材质默认值
    pub set_blend_factors: bool,
    /// 渲染器需要为该对象计算深度排序键
    pub calculate_depth_key: bool,
}

impl Default for RenderObject {
    fn default() -> Self {
        Self {
            material: MaterialHandle::default(),
            texture: TextureHandle::default(),
            vertex_buffer: VertexBufferHandle::default(),
            vertex_declaration: VertexDeclarationHandle::default(),
            vertex_start: 0,
            vertex_count: 0,
            primitive_type: PrimitiveType::Triangles,
            source_blend_factor: BlendFactor::One,
            destination_blend_factor: BlendFactor::Zero,
            set_blend_factors: false,
            calculate_depth_key: false,
        }
    }
}

impl RenderObject {
    /// 顶点范围（半开区间）
    pub fn vertex_range(&self) -> std::ops::Range<u32> {
        self.vertex_start..self.vertex_start + self.vertex_count
    }
}

/// 渲染提交协作者
pub trait RenderSink {
    /// 接收一个批次，稍后排序和绘制
    fn add_to_render(&mut self, object: &RenderObject);

    /// 绘制一条调试线段
    fn draw_line(&mut self, start: Vec3, end: Vec3, color: Vec4);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_object_default() {
        let ro = RenderObject::default();
        assert_eq!(ro.primitive_type, PrimitiveType::Triangles);
        assert_eq!(ro.source_blend_factor, BlendFactor::One);
        assert_eq!(ro.destination_blend_factor, BlendFactor::Zero);
        assert!(!ro.set_blend_factors);
    }

    #[test]
    fn test_vertex_range() {
        let ro = RenderObject {
            vertex_start: 12,
            vertex_count: 6,
            ..Default::default()
        };
        assert_eq!(ro.vertex_range(), 12..18);
    }
}
