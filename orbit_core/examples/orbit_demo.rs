//! 轨道相机状态机演示
//!
//! 以 60 fps 模拟一段会话：加载模型、自动旋转、拖拽暂停、复位视角。

use orbit_core::assets::{LoadedModel, MeshData};
use orbit_core::math::{Vec2, Vec3};
use orbit_core::scene::CameraPose;
use orbit_core::{FrameRenderer, ViewerConfig, ViewerContext};
use tracing::{info, Level};

const FRAME_MS: f64 = 1000.0 / 60.0;

/// 只打印相机位置的渲染器
struct LogRenderer {
    frames: u64,
}

impl FrameRenderer<LoadedModel> for LogRenderer {
    fn render(&mut self, pose: &CameraPose, model: Option<&LoadedModel>) {
        self.frames += 1;
        if self.frames % 60 == 0 {
            info!(
                "第 {} 帧: 相机 {:.3?}, 模型 {}",
                self.frames,
                pose.position,
                model.map(|m| m.name.as_str()).unwrap_or("无")
            );
        }
    }
}

fn demo_model(name: &str) -> LoadedModel {
    let mesh = MeshData {
        name: "Quad".to_string(),
        positions: vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ],
        normals: vec![Vec3::Z; 4],
        indices: vec![0, 1, 2, 2, 3, 0],
        material_index: None,
    };
    LoadedModel::new(name, vec![mesh], Vec::new())
}

fn run(viewer: &mut ViewerContext<LoadedModel>, renderer: &mut LogRenderer, until_ms: f64) {
    let mut t = viewer.now();
    while t < until_ms {
        t = (t + FRAME_MS).min(until_ms);
        viewer.frame(t, renderer);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let mut viewer = ViewerContext::new(ViewerConfig::default())?;
    let mut renderer = LogRenderer { frames: 0 };

    if let Some(ticket) = viewer.start(0.0)? {
        run(&mut viewer, &mut renderer, 300.0);
        viewer.complete_model::<String>(300.0, &ticket, Ok(demo_model("red")))?;
    }
    run(&mut viewer, &mut renderer, 4000.0);
    info!("模式: {:?}, 球面坐标: {:?}", viewer.mode(), viewer.spherical());

    viewer.pointer_down(4000.0, Vec2::new(640.0, 360.0));
    for i in 1..=10 {
        let t = 4000.0 + i as f64 * FRAME_MS;
        viewer.pointer_move(t, Vec2::new(640.0 - 8.0 * i as f32, 360.0 - 3.0 * i as f32));
        viewer.frame(t, &mut renderer);
    }
    viewer.pointer_up(viewer.now());
    run(&mut viewer, &mut renderer, 8000.0);
    info!("拖拽后: {:?}, 球面坐标: {:?}", viewer.mode(), viewer.spherical());

    if let Err(err) = viewer.request_model(8000.0, "model9") {
        info!("预期的失败: {}", err);
    }

    viewer.request_reset(8000.0)?;
    run(&mut viewer, &mut renderer, 11000.0);
    info!(
        "复位后: {:?}, 方块指示器: {}",
        viewer.mode(),
        viewer.cube_rotation().css_transform()
    );
    Ok(())
}
