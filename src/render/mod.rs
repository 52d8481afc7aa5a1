//! 渲染抽象
//!
//! - `graphics` - 顶点缓冲区与顶点声明的设备接口
//! - `render_object` - 渲染对象描述符与渲染器接口
//! - `wgpu_device` - 基于 wgpu 的设备实现

pub mod graphics;
pub mod render_object;
pub mod wgpu_device;

pub use graphics::{
    vertex_stride, BufferUsage, GraphicsDevice, ScalarType, VertexBufferHandle,
    VertexDeclarationHandle, VertexElement,
};
pub use render_object::{
    BlendFactor, MaterialHandle, PrimitiveType, RenderObject, RenderSink, TextureHandle,
};
pub use wgpu_device::WgpuGraphicsDevice;
