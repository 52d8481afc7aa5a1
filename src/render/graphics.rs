//! 图形缓冲区接口
//!
//! 粒子特效使用的底层图形 API：流式顶点缓冲区和顶点声明。
//! 具体后端见 [`super::wgpu_device::WgpuGraphicsDevice`]。

use crate::core::error::{GraphicsError, GraphicsResult};

/// 顶点缓冲区句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexBufferHandle(pub u64);

/// 顶点声明句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexDeclarationHandle(pub u64);

/// 缓冲区用途提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    /// 每帧整体重写
    StreamDraw,
}

/// 顶点分量标量类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Float,
    Int,
    UnsignedInt,
}

impl ScalarType {
    /// 单个分量的字节数
    pub fn size_in_bytes(&self) -> usize {
        match self {
            ScalarType::Float | ScalarType::Int | ScalarType::UnsignedInt => 4,
        }
    }
}

/// 顶点声明中的一个元素 (名称, 槽位, 分量数, 标量类型)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexElement {
    pub name: &'static str,
    pub slot: u32,
    pub size: u32,
    pub scalar_type: ScalarType,
}

impl VertexElement {
    pub const fn new(name: &'static str, slot: u32, size: u32, scalar_type: ScalarType) -> Self {
        Self {
            name,
            slot,
            size,
            scalar_type,
        }
    }

    /// 元素在顶点中占用的字节数
    pub fn byte_size(&self) -> usize {
        self.size as usize * self.scalar_type.size_in_bytes()
    }
}

/// 检查顶点元素列表是否合法，返回紧密排列时的顶点跨度
pub fn vertex_stride(elements: &[VertexElement]) -> GraphicsResult<usize> {
    if elements.is_empty() {
        return Err(GraphicsError::InvalidVertexElement(
            "empty element list".to_string(),
        ));
    }
    let mut stride = 0;
    for element in elements {
        if element.name.is_empty() || !(1..=4).contains(&element.size) {
            return Err(GraphicsError::InvalidVertexElement(format!(
                "{} (slot {}, size {})",
                element.name, element.slot, element.size
            )));
        }
        stride += element.byte_size();
    }
    Ok(stride)
}

/// 图形设备
///
/// 所有调用都发生在帧循环所在的线程上。
pub trait GraphicsDevice {
    /// 创建固定容量的顶点缓冲区
    fn new_vertex_buffer(
        &mut self,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> GraphicsResult<VertexBufferHandle>;

    /// 重写缓冲区内容；空切片表示丢弃旧内容
    fn set_vertex_buffer_data(
        &mut self,
        buffer: VertexBufferHandle,
        data: &[u8],
        usage: BufferUsage,
    ) -> GraphicsResult<()>;

    fn delete_vertex_buffer(&mut self, buffer: VertexBufferHandle);

    fn new_vertex_declaration(
        &mut self,
        elements: &[VertexElement],
    ) -> GraphicsResult<VertexDeclarationHandle>;

    fn delete_vertex_declaration(&mut self, declaration: VertexDeclarationHandle);
}
