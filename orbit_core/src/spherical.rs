//! 球面坐标状态
//!
//! 以目标点为原点记录相机位置：距离 `radius`、极角 `polar_angle`
//! (从 +Y 轴量起) 与方位角 `azimuth_angle` (水平面内，从 +Z 轴朝 +X 轴量起)。

use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// 球面坐标转换错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SphericalError {
    /// 相机与目标点重合，无法确定角度
    #[error("相机偏移向量长度为零")]
    DegenerateOffset,
}

/// 相机相对目标点的球面坐标
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SphericalState {
    /// 摄像机到目标点的距离
    pub radius: f32,
    /// 极角 (垂直角度，PI/2 为水平)
    pub polar_angle: f32,
    /// 方位角 (水平角度，自动旋转只修改这个值)
    pub azimuth_angle: f32,
}

impl Default for SphericalState {
    fn default() -> Self {
        Self {
            radius: 5.0,
            polar_angle: PI / 2.0,
            azimuth_angle: 0.0,
        }
    }
}

impl SphericalState {
    /// 偏移向量被视为零向量的长度阈值
    pub const DEGENERATE_EPSILON: f32 = 1e-6;

    pub fn new(radius: f32, polar_angle: f32, azimuth_angle: f32) -> Self {
        Self {
            radius,
            polar_angle,
            azimuth_angle,
        }
    }

    /// 从 相机位置 - 目标点 向量计算球面坐标
    ///
    /// 方位角被归一化到 `[0, 2π)`。
    pub fn from_offset(offset: Vec3) -> Result<Self, SphericalError> {
        let radius = offset.length();
        if radius <= Self::DEGENERATE_EPSILON {
            return Err(SphericalError::DegenerateOffset);
        }
        let polar_angle = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let azimuth_angle = offset.x.atan2(offset.z).rem_euclid(TAU);
        Ok(Self {
            radius,
            polar_angle,
            // rem_euclid 可能因舍入返回 TAU 本身
            azimuth_angle: if azimuth_angle >= TAU { 0.0 } else { azimuth_angle },
        })
    }

    /// 球面坐标转回偏移向量
    pub fn to_offset(&self) -> Vec3 {
        let sin_phi_radius = self.polar_angle.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.azimuth_angle.sin(),
            self.polar_angle.cos() * self.radius,
            sin_phi_radius * self.azimuth_angle.cos(),
        )
    }

    /// 超过 2π 时减去一圈
    ///
    /// 每帧增量远小于 2π，单次修正即可。
    pub fn wrap_azimuth(angle: f32) -> f32 {
        if angle >= TAU {
            angle - TAU
        } else {
            angle
        }
    }

    /// 从偏移向量重新同步；零向量时沿用已知角度并回退到安全距离
    ///
    /// 返回 `false` 表示发生了回退。
    pub fn sync_from_offset(&mut self, offset: Vec3, min_radius: f32) -> bool {
        match Self::from_offset(offset) {
            Ok(next) => {
                *self = next;
                true
            }
            Err(err) => {
                tracing::debug!("{}，沿用上次角度，距离回退为 {}", err, min_radius);
                self.radius = min_radius.max(Self::DEGENERATE_EPSILON * 2.0);
                false
            }
        }
    }
}
