use crate::config::ControlsConfig;
use crate::scene::look_at;
use crate::spherical::SphericalState;
use glam::{Quat, Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// 极角安全边界，避免相机越过极点翻转
const POLAR_EPSILON: f32 = 1e-6;
/// 位置变化小于该值 (平方) 时不算一次 change
const CHANGE_EPSILON: f32 = 1e-6;

/// 拖拽控制器发出的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// 交互开始 (指针按下或滚轮)
    Start,
    /// 相机位置发生变化
    Change,
    /// 交互结束
    End,
}

/// 轨道相机控制器
///
/// 持有相机位置与目标点；指针拖拽累积旋转量，`update` 按阻尼把旋转量
/// 应用到相机上。相机朝向始终由位置与目标点推出。
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// 相机位置
    pub position: Vec3,
    /// 目标点
    pub target: Vec3,
    /// 为 false 时忽略所有输入
    pub enabled: bool,
    pub config: ControlsConfig,
    /// 待应用的 (方位角, 极角) 增量
    spherical_delta: Vec2,
    /// 待应用的距离缩放
    scale: f32,
    /// 是否正在拖动
    is_dragging: bool,
    /// `save_state` 记录的 (位置, 目标点)
    saved: (Vec3, Vec3),
}

impl OrbitControls {
    pub fn new(position: Vec3, target: Vec3, config: ControlsConfig) -> Self {
        Self {
            position,
            target,
            enabled: true,
            config,
            spherical_delta: Vec2::ZERO,
            scale: 1.0,
            is_dragging: false,
            saved: (position, target),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    /// 相机 - 目标点
    pub fn offset(&self) -> Vec3 {
        self.position - self.target
    }

    /// 相机朝向 (看向目标点)
    pub fn orientation(&self) -> Quat {
        look_at(self.position, self.target)
    }

    /// 记录复位基准
    pub fn save_state(&mut self) {
        self.saved = (self.position, self.target);
    }

    /// 恢复到 `save_state` 记录的基准
    pub fn reset(&mut self) -> ControlEvent {
        (self.position, self.target) = self.saved;
        self.spherical_delta = Vec2::ZERO;
        self.scale = 1.0;
        self.is_dragging = false;
        ControlEvent::Change
    }

    /// 丢弃尚未应用的阻尼旋转与缩放
    pub fn stop_motion(&mut self) {
        self.spherical_delta = Vec2::ZERO;
        self.scale = 1.0;
    }

    pub fn pointer_down(&mut self) -> Option<ControlEvent> {
        if !self.enabled {
            return None;
        }
        self.is_dragging = true;
        Some(ControlEvent::Start)
    }

    /// 指针移动 `delta` 像素；视口高度对应一整圈
    pub fn pointer_move(&mut self, delta: Vec2, viewport_height: f32) -> Option<ControlEvent> {
        if !self.enabled || !self.is_dragging {
            return None;
        }
        let height = viewport_height.max(1.0);
        let speed = self.config.rotate_speed;
        self.spherical_delta.x -= TAU * delta.x / height * speed;
        self.spherical_delta.y -= TAU * delta.y / height * speed;
        self.update().then_some(ControlEvent::Change)
    }

    pub fn pointer_up(&mut self) -> Option<ControlEvent> {
        if !self.is_dragging {
            return None;
        }
        self.is_dragging = false;
        Some(ControlEvent::End)
    }

    /// 滚轮缩放：负值拉近，正值拉远
    pub fn wheel(&mut self, delta_y: f32) -> Vec<ControlEvent> {
        if !self.enabled || delta_y == 0.0 {
            return Vec::new();
        }
        let zoom_scale = 0.95_f32.powf(self.config.zoom_speed);
        if delta_y < 0.0 {
            self.scale *= zoom_scale;
        } else {
            self.scale /= zoom_scale;
        }
        let mut events = vec![ControlEvent::Start];
        if self.update() {
            events.push(ControlEvent::Change);
        }
        events.push(ControlEvent::End);
        events
    }

    /// 应用累积的旋转与缩放；相机实际移动时返回 `true`
    pub fn update(&mut self) -> bool {
        let last = self.position;
        let c = self.config;

        let mut s = SphericalState::from_offset(self.offset())
            .unwrap_or_else(|_| SphericalState::new(c.min_distance, PI / 2.0, 0.0));

        let factor = if c.enable_damping { c.damping_factor } else { 1.0 };
        s.azimuth_angle += self.spherical_delta.x * factor;
        s.polar_angle += self.spherical_delta.y * factor;

        let min_polar = c.min_polar_angle.max(POLAR_EPSILON);
        let max_polar = c.max_polar_angle.min(PI - POLAR_EPSILON);
        s.polar_angle = s.polar_angle.clamp(min_polar, max_polar);
        s.radius = (s.radius * self.scale).clamp(c.min_distance, c.max_distance);

        self.position = self.target + s.to_offset();

        if c.enable_damping {
            self.spherical_delta *= 1.0 - c.damping_factor;
        } else {
            self.spherical_delta = Vec2::ZERO;
        }
        self.scale = 1.0;

        if (self.position - last).length_squared() > CHANGE_EPSILON {
            return true;
        }
        // 低于阈值的移动不生效，相机与最后一次 change 保持一致
        self.position = last;
        if !self.is_dragging {
            self.stop_motion();
        }
        false
    }
}
