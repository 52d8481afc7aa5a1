//! 控制消息路由
//!
//! 把发给某个特效实例的命名消息翻译为引擎实例命令。
//! 同一对象上的其他组件也会收到消息，所以未知名称直接忽略。

use std::fmt;
use std::str::FromStr;

use super::engine::{EngineInstanceId, ParticleEngine};

/// 特效控制消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleFxMessage {
    /// 开始发射
    Start,
    /// 重置模拟状态并开始发射
    Restart,
    /// 停止发射新粒子
    Stop,
}

impl ParticleFxMessage {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "restart" => Some(Self::Restart),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Restart => "restart",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for ParticleFxMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 未识别的消息名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMessage(pub String);

impl FromStr for ParticleFxMessage {
    type Err = UnknownMessage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownMessage(s.to_string()))
    }
}

/// 消息处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Routed(ParticleFxMessage),
    Ignored,
}

/// 把消息转发到引擎实例
pub fn route_message<E: ParticleEngine + ?Sized>(
    engine: &mut E,
    instance: EngineInstanceId,
    message: ParticleFxMessage,
) {
    match message {
        ParticleFxMessage::Start => engine.start_instance(instance),
        ParticleFxMessage::Restart => engine.restart_instance(instance),
        ParticleFxMessage::Stop => engine.stop_instance(instance),
    }
}

/// 按名称路由；未知名称返回 `Ignored`
pub fn route_named<E: ParticleEngine + ?Sized>(
    engine: &mut E,
    instance: EngineInstanceId,
    name: &str,
) -> MessageOutcome {
    match ParticleFxMessage::from_name(name) {
        Some(message) => {
            route_message(engine, instance, message);
            MessageOutcome::Routed(message)
        }
        None => {
            tracing::trace!(target: "particlefx", "Ignoring message '{}'", name);
            MessageOutcome::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("start".parse(), Ok(ParticleFxMessage::Start));
        assert_eq!("restart".parse(), Ok(ParticleFxMessage::Restart));
        assert_eq!("stop".parse(), Ok(ParticleFxMessage::Stop));
        assert_eq!(
            "play_animation".parse::<ParticleFxMessage>(),
            Err(UnknownMessage("play_animation".to_string()))
        );
    }

    #[test]
    fn test_display_roundtrip() {
        for message in [
            ParticleFxMessage::Start,
            ParticleFxMessage::Restart,
            ParticleFxMessage::Stop,
        ] {
            assert_eq!(ParticleFxMessage::from_name(&message.to_string()), Some(message));
        }
    }
}
