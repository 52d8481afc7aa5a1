//! 核心模块
//!
//! 包含组件的公共基础设施：
//! - `error` - 错误类型定义
//! - `logging` - 日志初始化
//! - `macros` - 公共宏

pub mod error;
pub mod logging;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{
    AnimationError, AnimationResult, GraphicsError, GraphicsResult, ParticleFxError,
    ParticleFxResult, RenderError, RenderResult,
};

pub use logging::init_logging;
