//! wgpu 图形后端
//!
//! 顶点缓冲区使用 `VERTEX | COPY_DST`，通过 `Queue::write_buffer` 上传；
//! 顶点声明保存为紧密排列的 `wgpu::VertexAttribute` 列表，供管线创建时使用。

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::{Buffer, BufferUsages, Device, Queue, VertexAttribute, VertexFormat};

use super::graphics::{
    vertex_stride, BufferUsage, GraphicsDevice, ScalarType, VertexBufferHandle,
    VertexDeclarationHandle, VertexElement,
};
use crate::core::error::{GraphicsError, GraphicsResult};

struct GpuVertexBuffer {
    buffer: Buffer,
    capacity: usize,
    /// 最近一次上传的字节数
    len: usize,
}

struct GpuVertexDeclaration {
    attributes: Vec<VertexAttribute>,
    stride: u64,
}

/// 基于 wgpu 的图形设备
pub struct WgpuGraphicsDevice {
    device: Arc<Device>,
    queue: Arc<Queue>,
    buffers: HashMap<u64, GpuVertexBuffer>,
    declarations: HashMap<u64, GpuVertexDeclaration>,
    next_id: u64,
}

impl WgpuGraphicsDevice {
    pub fn new(device: Arc<Device>, queue: Arc<Queue>) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
            declarations: HashMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// 获取 GPU 缓冲区及其有效字节数
    pub fn vertex_buffer(&self, handle: VertexBufferHandle) -> Option<(&Buffer, usize)> {
        self.buffers.get(&handle.0).map(|b| (&b.buffer, b.len))
    }

    /// 获取顶点声明对应的缓冲区布局
    pub fn vertex_buffer_layout(
        &self,
        handle: VertexDeclarationHandle,
    ) -> Option<wgpu::VertexBufferLayout<'_>> {
        self.declarations
            .get(&handle.0)
            .map(|decl| wgpu::VertexBufferLayout {
                array_stride: decl.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &decl.attributes,
            })
    }
}

/// 顶点元素到 wgpu 顶点格式的映射
pub fn vertex_format(element: &VertexElement) -> Option<VertexFormat> {
    let format = match (element.scalar_type, element.size) {
        (ScalarType::Float, 1) => VertexFormat::Float32,
        (ScalarType::Float, 2) => VertexFormat::Float32x2,
        (ScalarType::Float, 3) => VertexFormat::Float32x3,
        (ScalarType::Float, 4) => VertexFormat::Float32x4,
        (ScalarType::Int, 1) => VertexFormat::Sint32,
        (ScalarType::Int, 2) => VertexFormat::Sint32x2,
        (ScalarType::Int, 3) => VertexFormat::Sint32x3,
        (ScalarType::Int, 4) => VertexFormat::Sint32x4,
        (ScalarType::UnsignedInt, 1) => VertexFormat::Uint32,
        (ScalarType::UnsignedInt, 2) => VertexFormat::Uint32x2,
        (ScalarType::UnsignedInt, 3) => VertexFormat::Uint32x3,
        (ScalarType::UnsignedInt, 4) => VertexFormat::Uint32x4,
        _ => return None,
    };
    Some(format)
}

/// 按声明顺序紧密排列的顶点属性
pub fn vertex_attributes(elements: &[VertexElement]) -> GraphicsResult<Vec<VertexAttribute>> {
    let mut offset = 0u64;
    let mut attributes = Vec::with_capacity(elements.len());
    for element in elements {
        let format = vertex_format(element)
            .ok_or_else(|| GraphicsError::InvalidVertexElement(element.name.to_string()))?;
        attributes.push(VertexAttribute {
            format,
            offset,
            shader_location: element.slot,
        });
        offset += element.byte_size() as u64;
    }
    Ok(attributes)
}

/// 向上对齐到 wgpu 的复制对齐要求
fn align_copy_size(size: usize) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    (size as u64 + align - 1) & !(align - 1)
}

/// 写入缓冲区；长度不满足复制对齐时补零
fn write_padded(queue: &Queue, buffer: &Buffer, data: &[u8]) {
    let aligned = align_copy_size(data.len()) as usize;
    if aligned == data.len() {
        queue.write_buffer(buffer, 0, data);
    } else {
        let mut padded = Vec::with_capacity(aligned);
        padded.extend_from_slice(data);
        padded.resize(aligned, 0);
        queue.write_buffer(buffer, 0, &padded);
    }
}

impl GraphicsDevice for WgpuGraphicsDevice {
    fn new_vertex_buffer(
        &mut self,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> GraphicsResult<VertexBufferHandle> {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(match usage {
                BufferUsage::StreamDraw => "Particle Stream Vertex Buffer",
                _ => "Particle Vertex Buffer",
            }),
            size: align_copy_size(size.max(1)),
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut len = 0;
        if let Some(data) = data {
            if data.len() > size {
                return Err(GraphicsError::BufferOverflow {
                    size: data.len(),
                    capacity: size,
                });
            }
            if !data.is_empty() {
                write_padded(&self.queue, &buffer, data);
                len = data.len();
            }
        }

        let id = self.allocate_id();
        self.buffers.insert(
            id,
            GpuVertexBuffer {
                buffer,
                capacity: size,
                len,
            },
        );
        Ok(VertexBufferHandle(id))
    }

    fn set_vertex_buffer_data(
        &mut self,
        buffer: VertexBufferHandle,
        data: &[u8],
        _usage: BufferUsage,
    ) -> GraphicsResult<()> {
        let gpu_buffer = self
            .buffers
            .get_mut(&buffer.0)
            .ok_or(GraphicsError::InvalidBuffer)?;

        if data.len() > gpu_buffer.capacity {
            return Err(GraphicsError::BufferOverflow {
                size: data.len(),
                capacity: gpu_buffer.capacity,
            });
        }

        // 空上传只丢弃旧内容
        gpu_buffer.len = data.len();
        if !data.is_empty() {
            write_padded(&self.queue, &gpu_buffer.buffer, data);
        }
        Ok(())
    }

    fn delete_vertex_buffer(&mut self, buffer: VertexBufferHandle) {
        if let Some(gpu_buffer) = self.buffers.remove(&buffer.0) {
            gpu_buffer.buffer.destroy();
        }
    }

    fn new_vertex_declaration(
        &mut self,
        elements: &[VertexElement],
    ) -> GraphicsResult<VertexDeclarationHandle> {
        let stride = vertex_stride(elements)? as u64;
        let attributes = vertex_attributes(elements)?;
        let id = self.allocate_id();
        self.declarations
            .insert(id, GpuVertexDeclaration { attributes, stride });
        Ok(VertexDeclarationHandle(id))
    }

    fn delete_vertex_declaration(&mut self, declaration: VertexDeclarationHandle) {
        self.declarations.remove(&declaration.0);
    }
}
