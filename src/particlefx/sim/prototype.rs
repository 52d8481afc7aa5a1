//! 特效原型
//!
//! 一个特效由若干发射器组成，每个发射器决定自己的材质、纹理、混合模式
//! 以及发射和生命周期参数。

use std::ops::Range;
use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};
use rand::Rng;

use crate::particlefx::animation::{AnimationId, TileSource};
use crate::particlefx::engine::BlendMode;
use crate::render::render_object::{MaterialHandle, TextureHandle};

// ============================================================================
// 发射形状
// ============================================================================

/// 发射形状（发射器局部空间）
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ParticleShape {
    /// 点发射
    #[default]
    Point,
    /// 球形发射
    Sphere { radius: f32 },
    /// 圆形发射（XY 平面）
    Circle { radius: f32 },
    /// 盒子发射
    Box { half_extents: Vec3 },
    /// 圆锥发射，沿 +Y 方向张开
    Cone { angle: f32, height: f32 },
}

impl ParticleShape {
    /// 在形状内采样一个局部坐标
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec3 {
        match self {
            Self::Point => Vec3::ZERO,
            Self::Sphere { radius } => {
                let dir = random_unit_vector(rng);
                dir * *radius * rng.gen::<f32>().cbrt()
            }
            Self::Circle { radius } => {
                let angle = rng.gen::<f32>() * std::f32::consts::TAU;
                let r = radius * rng.gen::<f32>().sqrt();
                Vec3::new(angle.cos() * r, angle.sin() * r, 0.0)
            }
            Self::Box { half_extents } => Vec3::new(
                sample_range(rng, &(-half_extents.x..half_extents.x)),
                sample_range(rng, &(-half_extents.y..half_extents.y)),
                sample_range(rng, &(-half_extents.z..half_extents.z)),
            ),
            Self::Cone { angle, height } => {
                let t = rng.gen::<f32>();
                let spread = (angle * 0.5).tan() * height * t;
                let theta = rng.gen::<f32>() * std::f32::consts::TAU;
                Vec3::new(theta.cos() * spread, height * t, theta.sin() * spread)
            }
        }
    }
}

fn random_unit_vector<R: Rng>(rng: &mut R) -> Vec3 {
    let z = rng.gen::<f32>() * 2.0 - 1.0;
    let theta = rng.gen::<f32>() * std::f32::consts::TAU;
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

/// 在区间内采样；空区间返回起点
pub fn sample_range<R: Rng>(rng: &mut R, range: &Range<f32>) -> f32 {
    if range.end > range.start {
        rng.gen_range(range.clone())
    } else {
        range.start
    }
}

/// 逐分量采样
pub fn sample_vec3<R: Rng>(rng: &mut R, range: &Range<Vec3>) -> Vec3 {
    Vec3::new(
        sample_range(rng, &(range.start.x..range.end.x)),
        sample_range(rng, &(range.start.y..range.end.y)),
        sample_range(rng, &(range.start.z..range.end.z)),
    )
}

// ============================================================================
// 生命周期曲线
// ============================================================================

/// 大小曲线类型
#[derive(Clone, Debug, PartialEq)]
pub enum SizeOverLifetime {
    /// 线性变化
    Linear { start: f32, end: f32 },
    /// 分段线性曲线，值为初始大小的倍数
    Curve { points: Vec<(f32, f32)> },
}

impl SizeOverLifetime {
    /// 采样大小倍数
    pub fn sample(&self, t: f32) -> f32 {
        match self {
            Self::Linear { start, end } => start + (end - start) * t.clamp(0.0, 1.0),
            Self::Curve { points } => sample_curve(points, t),
        }
    }
}

/// 分段线性曲线采样，点按时间排序
pub fn sample_curve(points: &[(f32, f32)], t: f32) -> f32 {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return 1.0,
    };

    let t = t.clamp(0.0, 1.0);
    if t <= first.0 {
        return first.1;
    }

    for pair in points.windows(2) {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        if t >= t0 && t <= t1 {
            if t1 <= t0 {
                return v1;
            }
            let local_t = (t - t0) / (t1 - t0);
            return v0 + (v1 - v0) * local_t;
        }
    }

    last.1
}

// ============================================================================
// 发射器与特效原型
// ============================================================================

/// 瓦片动画纹理源
#[derive(Clone, Debug)]
pub struct TileAnimationSource {
    pub tile_source: Arc<TileSource>,
    pub animation: AnimationId,
}

/// 发射器原型
#[derive(Clone, Debug)]
pub struct EmitterPrototype {
    pub material: MaterialHandle,
    /// 没有瓦片动画时使用的纹理
    pub texture: TextureHandle,
    pub blend_mode: BlendMode,
    /// 瓦片动画纹理源，优先于 `texture`
    pub tile_animation: Option<TileAnimationSource>,
    /// 发射器自身的粒子上限
    pub max_particles: u32,
    /// 每秒发射数量
    pub emission_rate: f32,
    /// 发射持续时间（None = 无限）
    pub duration: Option<f32>,
    /// 持续时间结束后是否循环
    pub looping: bool,
    /// 粒子生命周期范围（秒）
    pub lifetime: Range<f32>,
    /// 初始速度范围（发射器局部空间）
    pub initial_velocity: Range<Vec3>,
    /// 重力（世界空间）
    pub gravity: Vec3,
    /// 阻力系数
    pub drag: f32,
    /// 初始大小范围
    pub start_size: Range<f32>,
    pub size_over_lifetime: Option<SizeOverLifetime>,
    /// 透明度曲线 (t, alpha)
    pub alpha_over_lifetime: Vec<(f32, f32)>,
    /// 发射形状
    pub shape: ParticleShape,
}

impl Default for EmitterPrototype {
    fn default() -> Self {
        Self {
            material: MaterialHandle::default(),
            texture: TextureHandle::default(),
            blend_mode: BlendMode::Alpha,
            tile_animation: None,
            max_particles: 128,
            emission_rate: 10.0,
            duration: None,
            looping: true,
            lifetime: 1.0..1.0,
            initial_velocity: Vec3::ZERO..Vec3::ZERO,
            gravity: Vec3::ZERO,
            drag: 0.0,
            start_size: 1.0..1.0,
            size_over_lifetime: None,
            alpha_over_lifetime: vec![(0.0, 1.0), (1.0, 0.0)],
            shape: ParticleShape::Point,
        }
    }
}

impl EmitterPrototype {
    pub fn new(material: MaterialHandle, texture: TextureHandle) -> Self {
        Self {
            material,
            texture,
            ..Default::default()
        }
    }

    /// 设置混合模式
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// 设置瓦片动画
    pub fn with_tile_animation(mut self, tile_source: Arc<TileSource>, animation: AnimationId) -> Self {
        self.tile_animation = Some(TileAnimationSource {
            tile_source,
            animation,
        });
        self
    }

    /// 设置发射速率
    pub fn with_emission_rate(mut self, rate: f32) -> Self {
        self.emission_rate = rate;
        self
    }

    /// 设置粒子上限
    pub fn with_max_particles(mut self, max_particles: u32) -> Self {
        self.max_particles = max_particles;
        self
    }

    /// 设置发射持续时间
    pub fn with_duration(mut self, duration: f32, looping: bool) -> Self {
        self.duration = Some(duration);
        self.looping = looping;
        self
    }

    /// 设置生命周期
    pub fn with_lifetime(mut self, min: f32, max: f32) -> Self {
        self.lifetime = min..max;
        self
    }

    /// 设置初始速度
    pub fn with_velocity(mut self, min: Vec3, max: Vec3) -> Self {
        self.initial_velocity = min..max;
        self
    }

    /// 设置重力
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// 设置大小
    pub fn with_size(mut self, min: f32, max: f32) -> Self {
        self.start_size = min..max;
        self
    }

    /// 设置发射形状
    pub fn with_shape(mut self, shape: ParticleShape) -> Self {
        self.shape = shape;
        self
    }

    /// 透明度
    pub fn alpha_at(&self, t: f32) -> f32 {
        sample_curve(&self.alpha_over_lifetime, t).clamp(0.0, 1.0)
    }

    /// 大小
    pub fn size_at(&self, start_size: f32, t: f32) -> f32 {
        match &self.size_over_lifetime {
            Some(curve) => start_size * curve.sample(t),
            None => start_size,
        }
    }

    /// 按实例变换生成新粒子的位置和速度
    pub fn spawn<R: Rng>(&self, rng: &mut R, position: Vec3, rotation: Quat) -> (Vec3, Vec3) {
        let local = self.shape.sample(rng);
        let velocity = sample_vec3(rng, &self.initial_velocity);
        (position + rotation * local, rotation * velocity)
    }
}

/// 特效原型
#[derive(Clone, Debug, Default)]
pub struct ParticleFxPrototype {
    pub emitters: Vec<EmitterPrototype>,
}

impl ParticleFxPrototype {
    pub fn new(emitters: Vec<EmitterPrototype>) -> Self {
        Self { emitters }
    }

    pub fn with_emitter(mut self, emitter: EmitterPrototype) -> Self {
        self.emitters.push(emitter);
        self
    }
}

/// 粒子四边形的四个角（局部偏移，逆时针）
pub fn quad_corners(size: f32, rotation: Quat) -> [Vec3; 4] {
    let h = size * 0.5;
    [
        Vec2::new(-h, -h),
        Vec2::new(h, -h),
        Vec2::new(h, h),
        Vec2::new(-h, h),
    ]
    .map(|c| rotation * c.extend(0.0))
}
