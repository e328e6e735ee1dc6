use orbit_core::assets::{GltfLoader, LoadedModel, MaterialData, MeshData};
use orbit_core::math::Vec2;
use orbit_core::scene::{CameraPose, Transform};
use orbit_core::{load_ticket, switch_model, FrameRenderer, ModelLoader, SceneModel, ViewerConfig, ViewerContext};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

// 初始化日志与 panic 处理
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"日志已初始化".into());
    }
    log::info!("Orbit WebAssembly 模块已加载");
}

/// 浏览器端查看器
///
/// 宿主在 `requestAnimationFrame` 中调用 `frame`，把指针事件和按钮点击转发进来。
/// 渲染由 JS 回调完成：每帧收到相机姿态的 JSON 与当前模型的键。
#[wasm_bindgen]
pub struct WasmViewer {
    inner: Rc<RefCell<ViewerContext<LoadedModel>>>,
    render_callback: js_sys::Function,
    cube: Option<web_sys::HtmlElement>,
}

#[wasm_bindgen]
impl WasmViewer {
    /// 创建查看器；`config_ron` 为空时使用默认配置
    #[wasm_bindgen(constructor)]
    pub fn new(render_callback: js_sys::Function, config_ron: Option<String>) -> Result<WasmViewer, JsValue> {
        let config = match config_ron {
            Some(text) => ViewerConfig::from_ron(&text).map_err(to_js)?,
            None => ViewerConfig::default(),
        };
        let viewer = ViewerContext::new(config).map_err(to_js)?;
        Ok(WasmViewer {
            inner: Rc::new(RefCell::new(viewer)),
            render_callback,
            cube: None,
        })
    }

    /// 绑定方块指示器元素
    pub fn attach_cube(&mut self, element_id: &str) -> Result<(), JsValue> {
        let document = web_sys::window()
            .ok_or_else(|| JsValue::from_str("无法获取窗口"))?
            .document()
            .ok_or_else(|| JsValue::from_str("无法获取文档"))?;

        let element = document
            .get_element_by_id(element_id)
            .ok_or_else(|| JsValue::from_str("找不到指定的方块元素"))?
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(|_| JsValue::from_str("元素不是 HTMLElement"))?;
        self.cube = Some(element);
        Ok(())
    }

    /// 启动查看器并加载默认模型，Promise 在默认模型加载完成后兑现
    pub fn start(&self, on_progress: Option<js_sys::Function>) -> Result<js_sys::Promise, JsValue> {
        let ticket = self.inner.borrow_mut().start(now_ms()).map_err(to_js)?;
        let inner = self.inner.clone();
        Ok(future_to_promise(async move {
            if let Some(ticket) = ticket {
                let mut progress = progress_forwarder(on_progress);
                load_ticket(&*inner, &FetchLoader, ticket, now_ms, &mut progress)
                    .await
                    .map_err(to_js)?;
            }
            Ok(JsValue::UNDEFINED)
        }))
    }

    /// 按钮请求切换模型
    pub fn switch_model(&self, key: String, on_progress: Option<js_sys::Function>) -> js_sys::Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let mut progress = progress_forwarder(on_progress);
            switch_model(&*inner, &FetchLoader, &key, now_ms, &mut progress)
                .await
                .map_err(to_js)?;
            Ok(JsValue::from_str(&key))
        })
    }

    /// 方块按钮请求复位视角
    pub fn reset(&self) -> Result<(), JsValue> {
        self.inner.borrow_mut().request_reset(now_ms()).map_err(to_js)
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.inner.borrow_mut().resize(width, height);
    }

    pub fn pointer_down(&self, x: f32, y: f32) {
        self.inner.borrow_mut().pointer_down(now_ms(), Vec2::new(x, y));
    }

    pub fn pointer_move(&self, x: f32, y: f32) {
        self.inner.borrow_mut().pointer_move(now_ms(), Vec2::new(x, y));
    }

    pub fn pointer_up(&self) {
        self.inner.borrow_mut().pointer_up(now_ms());
    }

    pub fn wheel(&self, delta_y: f32) {
        self.inner.borrow_mut().wheel(now_ms(), delta_y);
    }

    /// 推进一帧并调用渲染回调
    ///
    /// 回调在释放内部借用之后才执行，回调里可以再调用查看器的方法。
    pub fn frame(&self, timestamp: f64) -> Result<(), JsValue> {
        let mut pending = PendingFrame::default();
        let report = self.inner.borrow_mut().frame(timestamp, &mut pending);

        if let (Some(cube), Some(rotation)) = (&self.cube, report.cube) {
            cube.style().set_property("transform", &rotation.css_transform())?;
        }
        if let Some(pose) = pending.pose {
            let pose_json = serde_json::to_string(&pose).map_err(to_js)?;
            let model = pending.model.map(JsValue::from).unwrap_or(JsValue::NULL);
            self.render_callback
                .call2(&JsValue::NULL, &JsValue::from(pose_json), &model)?;
        }
        Ok(())
    }

    /// 当前模型的几何体与材质 (JSON)，模型切换后由 JS 重新上传
    pub fn model_geometry(&self) -> Result<JsValue, JsValue> {
        let inner = self.inner.borrow();
        let Some(model) = inner.model() else {
            return Ok(JsValue::NULL);
        };
        let snapshot = ModelSnapshot::new(inner.model_slot().current_key().unwrap_or(""), model);
        let json = serde_json::to_string(&snapshot).map_err(to_js)?;
        Ok(JsValue::from(json))
    }

    pub fn mode(&self) -> String {
        format!("{:?}", self.inner.borrow().mode())
    }

    pub fn is_loading(&self) -> bool {
        self.inner.borrow().is_loading()
    }

    pub fn is_resetting(&self) -> bool {
        self.inner.borrow().is_resetting()
    }

    pub fn cube_transform(&self) -> String {
        self.inner.borrow().cube_rotation().css_transform()
    }
}

/// 记录一帧的渲染请求，等借用释放后再交给 JS
#[derive(Default)]
struct PendingFrame {
    pose: Option<CameraPose>,
    model: Option<String>,
}

impl FrameRenderer<LoadedModel> for PendingFrame {
    fn render(&mut self, pose: &CameraPose, model: Option<&LoadedModel>) {
        self.pose = Some(*pose);
        self.model = model.map(|m| m.name.clone());
    }
}

/// 交给 JS 渲染器的模型数据
#[derive(Serialize)]
struct ModelSnapshot<'a> {
    key: &'a str,
    name: &'a str,
    transform: Transform,
    meshes: &'a [MeshData],
    materials: &'a [MaterialData],
}

impl<'a> ModelSnapshot<'a> {
    fn new(key: &'a str, model: &'a LoadedModel) -> Self {
        Self {
            key,
            name: &model.name,
            transform: model.transform(),
            meshes: &model.meshes,
            materials: &model.materials,
        }
    }
}

/// 通过 fetch 获取字节并解析 glTF
struct FetchLoader;

impl ModelLoader for FetchLoader {
    type Model = LoadedModel;
    type Error = String;

    async fn load(&self, path: &str, on_progress: &mut dyn FnMut(f32)) -> Result<LoadedModel, String> {
        on_progress(0.0);
        let bytes = fetch_bytes(path).await.map_err(js_error_text)?;
        log::info!("glTF 模型下载完成，大小: {} 字节", bytes.len());
        let model = GltfLoader::parse(path, &bytes).map_err(|e| e.to_string())?;
        on_progress(1.0);
        Ok(model)
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("无法获取窗口"))?;
    let resp_value = JsFuture::from(window.fetch_with_str(url)).await?;

    let resp = resp_value
        .dyn_into::<web_sys::Response>()
        .map_err(|_| JsValue::from_str("响应不是有效的Response对象"))?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!("{} 请求失败: {}", url, resp.status())));
    }

    let array_buffer = JsFuture::from(resp.array_buffer()?).await?;
    Ok(js_sys::Uint8Array::new(&array_buffer).to_vec())
}

fn progress_forwarder(callback: Option<js_sys::Function>) -> impl FnMut(f32) {
    move |fraction| {
        if let Some(callback) = &callback {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_f64(f64::from(fraction))) {
                log::warn!("进度回调出错: {}", js_error_text(err));
            }
        }
    }
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn js_error_text(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
