//! 方块方位指示器
//!
//! 把相机朝向映射成页面上小方块的 CSS 旋转，更新频率受节流门限制。

use crate::timer::Throttle;
use glam::{EulerRot, Quat};

/// 指示器的旋转角 (度)
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct CubeRotation {
    pub rotate_y_deg: f32,
    pub rotate_x_deg: f32,
}

impl CubeRotation {
    /// 由相机朝向计算，`ratio` 为角度映射比例
    pub fn from_camera(orientation: Quat, ratio: f32) -> Self {
        let (x, y, _z) = orientation.to_euler(EulerRot::XYZ);
        Self {
            rotate_y_deg: -y.to_degrees() * ratio,
            rotate_x_deg: x.to_degrees() * ratio,
        }
    }

    /// CSS transform 文本
    pub fn css_transform(&self) -> String {
        format!("rotateY({}deg) rotateX({}deg)", self.rotate_y_deg, self.rotate_x_deg)
    }
}

/// 节流的方块指示器
#[derive(Debug, Clone)]
pub struct CubeIndicator {
    throttle: Throttle,
    ratio: f32,
    current: CubeRotation,
}

impl CubeIndicator {
    pub fn new(interval_ms: f64, ratio: f32) -> Self {
        Self {
            throttle: Throttle::new(interval_ms),
            ratio,
            current: CubeRotation::default(),
        }
    }

    pub fn current(&self) -> CubeRotation {
        self.current
    }

    /// 相机发生变化时调用；间隔内的重复请求被忽略
    pub fn request_update(&mut self, now_ms: f64) {
        self.throttle.trigger(now_ms);
    }

    /// 间隔结束时读取最新朝向并更新，返回新的旋转
    pub fn poll(&mut self, now_ms: f64, orientation: Quat) -> Option<CubeRotation> {
        if !self.throttle.poll(now_ms) {
            return None;
        }
        self.current = CubeRotation::from_camera(orientation, self.ratio);
        tracing::trace!(rotation = ?self.current, "方块指示器更新");
        Some(self.current)
    }

    /// 复位：清除挂起的更新并回到零旋转
    pub fn reset(&mut self) -> CubeRotation {
        self.throttle.clear();
        self.current = CubeRotation::default();
        self.current
    }
}
