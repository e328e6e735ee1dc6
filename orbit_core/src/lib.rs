//! Orbit 产品查看器核心模块
//!
//! 此模块包含相机轨道状态机：球面坐标状态、拖拽控制器、自动旋转、
//! 复位序列以及模型切换协调。渲染、DOM 与网络加载由外部负责。

pub mod assets;
pub mod auto_rotate;
pub mod config;
pub mod context;
pub mod controls;
pub mod error;
pub mod indicator;
pub mod input;
pub mod model;
pub mod reset;
pub mod spherical;
pub mod timer;
pub mod tween;

pub use auto_rotate::{AutoRotateController, RotationMode};
pub use config::{InitialState, ViewerConfig};
pub use context::{load_ticket, switch_model, FrameRenderer, FrameReport, ViewerContext};
pub use controls::{ControlEvent, OrbitControls};
pub use error::ViewerError;
pub use model::{LoadTicket, ModelLoader, ModelSlot, SceneModel};
pub use spherical::SphericalState;

/// 数学类型导出
pub mod math {
    pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
}

/// 场景系统
pub mod scene {
    use glam::{Mat4, Quat, Vec3};
    use serde::{Deserialize, Serialize};

    /// 变换组件
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Transform {
        pub position: Vec3,
        pub rotation: Quat,
        pub scale: Vec3,
    }

    impl Default for Transform {
        fn default() -> Self {
            Self {
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
            }
        }
    }

    impl Transform {
        /// 创建新的变换
        pub fn from(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
            Self {
                position,
                rotation,
                scale,
            }
        }

        /// 计算变换矩阵
        pub fn compute_matrix(&self) -> Mat4 {
            Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
        }
    }

    /// 每帧交给渲染器的相机姿态
    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    pub struct CameraPose {
        pub position: Vec3,
        pub target: Vec3,
        pub orientation: Quat,
        pub fov_y_degrees: f32,
        pub aspect: f32,
    }

    /// 计算从 `eye` 看向 `target` 的相机朝向 (+Y 向上)
    ///
    /// 相机本地 -Z 轴指向目标点。`eye` 与 `target` 重合时返回单位四元数。
    pub fn look_at(eye: Vec3, target: Vec3) -> Quat {
        let forward = target - eye;
        if forward.length_squared() <= f32::EPSILON {
            return Quat::IDENTITY;
        }
        // 视线平行于 Y 轴时，换一个参考上方向
        let up = if forward.normalize().cross(Vec3::Y).length_squared() <= 1e-12 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(eye, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        rotation.normalize()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn look_at_points_negative_z_toward_target() {
            let eye = Vec3::new(3.0, 2.0, 5.0);
            let target = Vec3::new(0.0, 0.5, 0.0);
            let q = look_at(eye, target);
            let forward = q * Vec3::NEG_Z;
            let expected = (target - eye).normalize();
            assert!((forward - expected).length() < 1e-4);
        }

        #[test]
        fn look_at_from_straight_above_is_finite() {
            let q = look_at(Vec3::new(0.0, 4.0, 0.0), Vec3::ZERO);
            assert!(q.is_finite());
            assert!(((q * Vec3::NEG_Z) - Vec3::NEG_Y).length() < 1e-4);
        }
    }
}
