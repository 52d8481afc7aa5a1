//! 统一错误处理模块
//!
//! 粒子特效组件范围内的错误类型定义
//!
//! ## 错误类型分层
//!
//! - **组件层错误** (`ParticleFxError`): 池容量、句柄、销毁不匹配等
//! - **动画查询错误** (`AnimationError`): 返回给模拟引擎，由引擎决定如何降级
//! - **渲染错误** (`RenderError`): 混合模式映射失败等，记录后继续
//! - **图形接口错误** (`GraphicsError`): 顶点缓冲区/顶点声明操作失败
//!
//! 所有错误都以返回值或日志的形式报告，帧循环始终完整执行。

use bevy_ecs::entity::Entity;
use thiserror::Error;

use crate::config::ConfigError;

/// 粒子特效组件错误类型
#[derive(Error, Debug)]
pub enum ParticleFxError {
    #[error("Particle component buffer is full ({capacity}), component disregarded")]
    CapacityExceeded { capacity: usize },

    #[error("Object {0:?} already hosts a particle effect in this world")]
    AlreadyAttached(Entity),

    #[error("Destroyed emitter for object {0:?} could not be found")]
    NotFoundOnDestroy(Entity),

    #[error("Particle effect handle is stale or was never issued")]
    InvalidHandle,

    #[error("Particle effect handle belongs to another world")]
    ForeignHandle,

    #[error("Simulation engine refused to create an instance")]
    EngineRejected,

    #[error("Graphics error: {0}")]
    Graphics(#[from] GraphicsError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// 瓦片动画查询错误
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationError {
    /// 瓦片源中不存在该动画
    #[error("Animation not found in tile source")]
    NotFound,

    /// 瓦片源存在动画定义但没有计算出的纹理坐标
    #[error("Tile source has animations but no texture coordinates")]
    UnknownError,
}

/// 渲染错误
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    #[error("Unknown blend mode: {0}")]
    UnknownBlendMode(u32),
}

/// 图形接口错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    #[error("Invalid vertex buffer handle")]
    InvalidBuffer,

    #[error("Upload of {size} bytes exceeds buffer capacity {capacity}")]
    BufferOverflow { size: usize, capacity: usize },

    #[error("Invalid vertex element: {0}")]
    InvalidVertexElement(String),

    #[error("Invalid vertex declaration handle")]
    InvalidDeclaration,
}

pub type ParticleFxResult<T> = Result<T, ParticleFxError>;
pub type AnimationResult<T> = Result<T, AnimationError>;
pub type RenderResult<T> = Result<T, RenderError>;
pub type GraphicsResult<T> = Result<T, GraphicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let graphics_err = GraphicsError::InvalidBuffer;
        let err: ParticleFxError = graphics_err.into();
        assert!(matches!(err, ParticleFxError::Graphics(_)));
    }

    #[test]
    fn test_error_display() {
        let err = ParticleFxError::CapacityExceeded { capacity: 64 };
        assert_eq!(
            err.to_string(),
            "Particle component buffer is full (64), component disregarded"
        );
        assert_eq!(
            RenderError::UnknownBlendMode(7).to_string(),
            "Unknown blend mode: 7"
        );
    }
}
