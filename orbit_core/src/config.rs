//! 查看器配置
//!
//! 默认值即产品页使用的固定常量；也可以用 RON 文本覆盖其中一部分。

use crate::scene::Transform;
use crate::tween::Easing;
use glam::{EulerRot, Quat, Vec3};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::f32::consts::PI;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置解析失败: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("配置无效: {0}")]
    Invalid(String),
}

/// 复位基准：启动后只读
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub camera_position: Vec3,
    pub controls_target: Vec3,
    pub model_position: Vec3,
    /// 欧拉角 (XYZ 顺序，弧度)
    pub model_rotation: Vec3,
    pub model_scale: Vec3,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            camera_position: Vec3::new(0.0, 0.0, 5.0),
            controls_target: Vec3::ZERO,
            model_position: Vec3::ZERO,
            model_rotation: Vec3::ZERO,
            model_scale: Vec3::splat(8.0),
        }
    }
}

impl InitialState {
    /// 模型的初始变换
    pub fn model_transform(&self) -> Transform {
        let r = self.model_rotation;
        Transform::from(
            self.model_position,
            Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
            self.model_scale,
        )
    }

    /// 初始相机偏移
    pub fn camera_offset(&self) -> Vec3 {
        self.camera_position - self.controls_target
    }
}

/// 拖拽控制器参数
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            min_distance: 2.0,
            max_distance: 10.0,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

/// 复位补间参数
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TweenConfig {
    pub duration_s: f32,
    pub easing: Easing,
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            duration_s: 0.5,
            easing: Easing::Power2Out,
        }
    }
}

/// 查看器配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// 模型键 -> 资源路径
    pub model_paths: BTreeMap<String, String>,
    /// 启动时加载的模型键
    pub default_model: Option<String>,
    pub initial: InitialState,
    /// 每帧方位角增量 (弧度，建议 0.001~0.003)
    pub auto_rotate_speed: f32,
    /// 拖拽后恢复自动旋转的延迟
    pub pause_duration_ms: f64,
    /// 启动 / 模型加载完成后启动自动旋转的延迟
    pub arm_delay_ms: f64,
    /// 复位完成后启动自动旋转的延迟
    pub reset_settle_ms: f64,
    /// 方块指示器更新的最小间隔
    pub indicator_throttle_ms: f64,
    /// 方块指示器角度映射比例
    pub indicator_ratio: f32,
    pub reset_tween: TweenConfig,
    pub controls: ControlsConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let model_paths = [
            ("model1", "static/red.glb"),
            ("model2", "static/your-product5.glb"),
            ("model3", "static/black.glb"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            model_paths,
            default_model: Some("model1".to_string()),
            initial: InitialState::default(),
            auto_rotate_speed: 0.001,
            pause_duration_ms: 3000.0,
            arm_delay_ms: 2000.0,
            reset_settle_ms: 1500.0,
            indicator_throttle_ms: 50.0,
            indicator_ratio: 0.7,
            reset_tween: TweenConfig::default(),
            controls: ControlsConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// 解析 RON 覆盖配置，缺省字段使用默认值
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// 检查数值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.controls;
        if !(c.min_distance > 0.0 && c.min_distance <= c.max_distance) {
            return Err(ConfigError::Invalid(format!(
                "距离范围 [{}, {}] 无效",
                c.min_distance, c.max_distance
            )));
        }
        if !(0.0..=PI).contains(&c.min_polar_angle)
            || !(0.0..=PI).contains(&c.max_polar_angle)
            || c.min_polar_angle > c.max_polar_angle
        {
            return Err(ConfigError::Invalid("极角范围必须在 [0, π] 内".to_string()));
        }
        if self.reset_tween.duration_s < 0.0 {
            return Err(ConfigError::Invalid("复位时长不能为负".to_string()));
        }
        if let Some(key) = &self.default_model {
            if !self.model_paths.contains_key(key) {
                return Err(ConfigError::Invalid(format!("默认模型【{}】未配置路径", key)));
            }
        }
        Ok(())
    }

    /// 查找模型路径
    pub fn model_path(&self, key: &str) -> Option<&str> {
        self.model_paths.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_page() {
        let config = ViewerConfig::default();
        assert_eq!(config.model_path("model1"), Some("static/red.glb"));
        assert_eq!(config.model_path("model9"), None);
        assert_eq!(config.pause_duration_ms, 3000.0);
        assert_eq!(config.arm_delay_ms, 2000.0);
        assert_eq!(config.indicator_throttle_ms, 50.0);
        assert_eq!(config.initial.camera_position, Vec3::new(0.0, 0.0, 5.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn ron_override_keeps_other_defaults() {
        let config = ViewerConfig::from_ron(
            "(auto_rotate_speed: 0.002, controls: (max_distance: 12.0))",
        )
        .unwrap();
        assert_eq!(config.auto_rotate_speed, 0.002);
        assert_eq!(config.controls.max_distance, 12.0);
        assert_eq!(config.controls.min_distance, 2.0);
        assert_eq!(config.pause_duration_ms, 3000.0);
    }

    #[test]
    fn rejects_inverted_distance_range() {
        let err = ViewerConfig::from_ron("(controls: (min_distance: 5.0, max_distance: 1.0))")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(ViewerConfig::from_ron("(auto_rotate_speed: )"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn model_transform_uses_initial_scale() {
        let t = InitialState::default().model_transform();
        assert_eq!(t.scale, Vec3::splat(8.0));
        assert_eq!(t.position, Vec3::ZERO);
    }
}
