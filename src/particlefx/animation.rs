//! 瓦片动画解析
//!
//! 把瓦片源和动画标识解析为帧几何与播放参数，供模拟引擎在更新时使用。
//! 动画数量通常很少，按标识线性查找。

use serde::{Deserialize, Serialize};

use super::engine::AnimationFetcher;
use crate::core::error::{AnimationError, AnimationResult};
use crate::render::render_object::TextureHandle;

/// 每个瓦片的纹理坐标分量数 (u0, v0, u1, v1)
pub const TEX_COORDS_PER_TILE: usize = 4;

/// 动画标识（名称的 64 位 FNV-1a 哈希）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

impl AnimationId {
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            i += 1;
        }
        AnimationId(hash)
    }
}

impl From<&str> for AnimationId {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

/// 播放模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Playback {
    #[default]
    None,
    OnceForward,
    OnceBackward,
    LoopForward,
    LoopBackward,
    LoopPingpong,
}

/// 瓦片源中的一个动画定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileAnimation {
    pub name: String,
    /// 起始瓦片（含）
    pub start_tile: u32,
    /// 结束瓦片（含）
    pub end_tile: u32,
    pub fps: u32,
    pub playback: Playback,
    #[serde(default)]
    pub flip_horizontal: bool,
    #[serde(default)]
    pub flip_vertical: bool,
}

impl TileAnimation {
    pub fn new(name: impl Into<String>, start_tile: u32, end_tile: u32) -> Self {
        Self {
            name: name.into(),
            start_tile,
            end_tile,
            fps: 30,
            playback: Playback::LoopForward,
            flip_horizontal: false,
            flip_vertical: false,
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_playback(mut self, playback: Playback) -> Self {
        self.playback = playback;
        self
    }

    pub fn with_flip(mut self, horizontal: bool, vertical: bool) -> Self {
        self.flip_horizontal = horizontal;
        self.flip_vertical = vertical;
        self
    }
}

/// 瓦片源资源
#[derive(Debug, Clone)]
pub struct TileSource {
    pub texture: TextureHandle,
    /// 与 `animations` 一一对应
    pub animation_ids: Vec<AnimationId>,
    pub animations: Vec<TileAnimation>,
    /// 所有瓦片的纹理坐标，每瓦片 `TEX_COORDS_PER_TILE` 个分量
    pub tex_coords: Vec<f32>,
}

impl TileSource {
    /// 从规则网格构建，瓦片按行优先编号
    pub fn from_grid(
        texture: TextureHandle,
        columns: u32,
        rows: u32,
        animations: Vec<TileAnimation>,
    ) -> Self {
        let mut tex_coords =
            Vec::with_capacity((columns * rows) as usize * TEX_COORDS_PER_TILE);
        if columns > 0 && rows > 0 {
            let tile_w = 1.0 / columns as f32;
            let tile_h = 1.0 / rows as f32;
            for row in 0..rows {
                for col in 0..columns {
                    let u0 = col as f32 * tile_w;
                    let v0 = row as f32 * tile_h;
                    tex_coords.extend_from_slice(&[u0, v0, u0 + tile_w, v0 + tile_h]);
                }
            }
        }

        Self::with_tex_coords(texture, animations, tex_coords)
    }

    /// 使用已计算好的纹理坐标构建
    pub fn with_tex_coords(
        texture: TextureHandle,
        animations: Vec<TileAnimation>,
        tex_coords: Vec<f32>,
    ) -> Self {
        let animation_ids = animations
            .iter()
            .map(|a| AnimationId::from_name(&a.name))
            .collect();
        Self {
            texture,
            animation_ids,
            animations,
            tex_coords,
        }
    }

    /// 瓦片数量
    pub fn tile_count(&self) -> usize {
        self.tex_coords.len() / TEX_COORDS_PER_TILE
    }
}

/// 解析结果，借用瓦片源的纹理坐标表
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationData<'a> {
    pub texture: TextureHandle,
    pub tex_coords: &'a [f32],
    pub fps: u32,
    pub start_tile: u32,
    pub end_tile: u32,
    pub hflip: bool,
    pub vflip: bool,
    pub playback: Playback,
}

impl<'a> AnimationData<'a> {
    /// 动画包含的帧数
    pub fn frame_count(&self) -> u32 {
        self.end_tile.saturating_sub(self.start_tile).saturating_add(1)
    }

    /// 经过 `elapsed` 秒后应显示的瓦片
    pub fn tile_at(&self, elapsed: f32) -> u32 {
        // 帧范围可达整个 u32，按 u64 计算
        let count = u64::from(self.end_tile.saturating_sub(self.start_tile)) + 1;
        let last = count - 1;
        let step = if self.fps == 0 || elapsed <= 0.0 {
            0
        } else {
            (elapsed * self.fps as f32) as u64
        };

        let frame = match self.playback {
            Playback::None => 0,
            Playback::OnceForward => step.min(last),
            Playback::OnceBackward => last - step.min(last),
            Playback::LoopForward => step % count,
            Playback::LoopBackward => last - step % count,
            Playback::LoopPingpong => {
                if count <= 1 {
                    0
                } else {
                    let period = 2 * count - 2;
                    let p = step % period;
                    if p < count {
                        p
                    } else {
                        period - p
                    }
                }
            }
        };
        // frame <= end_tile - start_tile
        self.start_tile + frame as u32
    }

    /// 瓦片的纹理坐标 (u0, v0, u1, v1)，已应用翻转
    pub fn tile_uv(&self, tile: u32) -> Option<[f32; 4]> {
        let begin = tile as usize * TEX_COORDS_PER_TILE;
        let coords = self.tex_coords.get(begin..begin + TEX_COORDS_PER_TILE)?;
        let [mut u0, mut v0, mut u1, mut v1] = [coords[0], coords[1], coords[2], coords[3]];
        if self.hflip {
            std::mem::swap(&mut u0, &mut u1);
        }
        if self.vflip {
            std::mem::swap(&mut v0, &mut v1);
        }
        Some([u0, v0, u1, v1])
    }
}

/// 在瓦片源中查找动画
///
/// 标识不存在时返回 `NotFound`；找到了定义但瓦片源没有纹理坐标时返回
/// `UnknownError`，表示资源尚未就绪或已损坏。
pub fn resolve_animation(
    tile_source: &TileSource,
    animation: AnimationId,
) -> AnimationResult<AnimationData<'_>> {
    let index = tile_source
        .animation_ids
        .iter()
        .position(|id| *id == animation)
        .ok_or(AnimationError::NotFound)?;

    if tile_source.tex_coords.is_empty() {
        return Err(AnimationError::UnknownError);
    }
    let definition = tile_source
        .animations
        .get(index)
        .ok_or(AnimationError::UnknownError)?;

    Ok(AnimationData {
        texture: tile_source.texture,
        tex_coords: &tile_source.tex_coords,
        fps: definition.fps,
        start_tile: definition.start_tile,
        end_tile: definition.end_tile,
        hflip: definition.flip_horizontal,
        vflip: definition.flip_vertical,
        playback: definition.playback,
    })
}

/// 基于瓦片源的动画解析器
#[derive(Debug, Default, Clone, Copy)]
pub struct TileSetAnimationResolver;

impl AnimationFetcher for TileSetAnimationResolver {
    fn fetch_animation<'a>(
        &self,
        tile_source: &'a TileSource,
        animation: AnimationId,
    ) -> AnimationResult<AnimationData<'a>> {
        resolve_animation(tile_source, animation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile_source() -> TileSource {
        TileSource::from_grid(
            TextureHandle(7),
            4,
            2,
            vec![
                TileAnimation::new("idle", 0, 0).with_playback(Playback::None),
                TileAnimation::new("spin", 2, 5)
                    .with_fps(10)
                    .with_playback(Playback::LoopPingpong)
                    .with_flip(true, false),
            ],
        )
    }

    #[test]
    fn test_resolve_found() {
        let source = tile_source();
        let data = resolve_animation(&source, AnimationId::from_name("spin")).unwrap();
        assert_eq!(data.texture, TextureHandle(7));
        assert_eq!(data.start_tile, 2);
        assert_eq!(data.end_tile, 5);
        assert_eq!(data.fps, 10);
        assert_eq!(data.playback, Playback::LoopPingpong);
        assert!(data.hflip);
        assert!(!data.vflip);
        assert_eq!(data.tex_coords.len(), 8 * TEX_COORDS_PER_TILE);
    }

    #[test]
    fn test_resolve_not_found() {
        let source = tile_source();
        assert_eq!(
            resolve_animation(&source, AnimationId::from_name("walk")),
            Err(AnimationError::NotFound)
        );
    }

    #[test]
    fn test_resolve_without_tex_coords_is_unknown_error() {
        let source = TileSource::with_tex_coords(
            TextureHandle(1),
            vec![TileAnimation::new("spin", 0, 3)],
            Vec::new(),
        );
        assert_eq!(
            resolve_animation(&source, AnimationId::from_name("spin")),
            Err(AnimationError::UnknownError)
        );
        // 缺失的标识仍然是 NotFound
        assert_eq!(
            resolve_animation(&source, AnimationId::from_name("walk")),
            Err(AnimationError::NotFound)
        );
    }

    #[test]
    fn test_every_playback_mode_passes_through() {
        let modes = [
            Playback::None,
            Playback::OnceForward,
            Playback::OnceBackward,
            Playback::LoopForward,
            Playback::LoopBackward,
            Playback::LoopPingpong,
        ];
        for mode in modes {
            let source = TileSource::from_grid(
                TextureHandle(1),
                2,
                2,
                vec![TileAnimation::new("anim", 1, 3).with_playback(mode)],
            );
            let data = TileSetAnimationResolver
                .fetch_animation(&source, AnimationId::from_name("anim"))
                .unwrap();
            assert_eq!(data.playback, mode);
        }
    }

    #[test]
    fn test_tile_at_playback() {
        let source = tile_source();
        let mut data = resolve_animation(&source, AnimationId::from_name("spin")).unwrap();

        // 4 帧 ping-pong: 2 3 4 5 4 3 2 3 ...
        let tiles: Vec<u32> = (0..8).map(|i| data.tile_at(i as f32 * 0.1 + 0.01)).collect();
        assert_eq!(tiles, vec![2, 3, 4, 5, 4, 3, 2, 3]);

        data.playback = Playback::OnceForward;
        assert_eq!(data.tile_at(10.0), 5);
        data.playback = Playback::OnceBackward;
        assert_eq!(data.tile_at(0.0), 5);
        assert_eq!(data.tile_at(10.0), 2);
        data.playback = Playback::LoopForward;
        assert_eq!(data.tile_at(0.41), 2);
        data.playback = Playback::LoopBackward;
        assert_eq!(data.tile_at(0.11), 4);
        data.playback = Playback::None;
        assert_eq!(data.tile_at(3.0), 2);
    }

    #[test]
    fn test_tile_at_full_u32_range() {
        let mut data = AnimationData {
            texture: TextureHandle(1),
            tex_coords: &[],
            fps: 30,
            start_tile: 0,
            end_tile: u32::MAX,
            hflip: false,
            vflip: false,
            playback: Playback::LoopForward,
        };
        assert_eq!(data.frame_count(), u32::MAX);
        assert_eq!(data.tile_at(1.0), 30);

        data.end_tile = 1 << 31;
        data.playback = Playback::LoopPingpong;
        assert_eq!(data.tile_at(1.0), 30);
        data.playback = Playback::LoopBackward;
        assert_eq!(data.tile_at(1.0), (1 << 31) - 30);
        data.playback = Playback::OnceBackward;
        assert_eq!(data.tile_at(0.0), 1 << 31);

        // 结束帧小于起始帧时只有一帧
        data.start_tile = 10;
        data.end_tile = 3;
        assert_eq!(data.tile_at(5.0), 10);
    }

    #[test]
    fn test_tile_uv_flip() {
        let source = tile_source();
        let data = resolve_animation(&source, AnimationId::from_name("spin")).unwrap();
        let uv = data.tile_uv(1).unwrap();
        assert_eq!(uv, [0.5, 0.0, 0.25, 0.5]);
        assert!(data.tile_uv(100).is_none());
    }

    #[test]
    fn test_animation_id_hash_is_stable() {
        assert_eq!(AnimationId::from_name(""), AnimationId(0xcbf2_9ce4_8422_2325));
        assert_eq!(AnimationId::from("spin"), AnimationId::from_name("spin"));
        assert_ne!(AnimationId::from_name("spin"), AnimationId::from_name("idle"));
    }
}
