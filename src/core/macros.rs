//! 核心宏定义
//!
//! 提供统一的宏来减少代码重复

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use particlefx::impl_default;
///
/// struct EmitterSettings {
///     rate: f32,
///     looping: bool,
/// }
///
/// impl_default!(EmitterSettings {
///     rate: 10.0,
///     looping: true,
/// });
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
