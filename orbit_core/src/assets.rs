//! 资源加载
//!
//! 把 glTF / GLB 数据解析成查看器持有的 `LoadedModel`。

use crate::model::{ModelLoader, SceneModel};
use crate::scene::Transform;
use glam::{Vec3, Vec4};
use std::path::PathBuf;

/// 资源错误
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("解析错误: {0}")]
    Parse(String),
    #[error("资源未找到: {0}")]
    NotFound(String),
    #[error("不支持的格式: {0}")]
    UnsupportedFormat(String),
}

/// 网格数据
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub material_index: Option<usize>,
}

/// 材质数据
#[derive(Debug, Clone, serde::Serialize)]
pub struct MaterialData {
    pub name: String,
    pub base_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
}

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |b, p| Self {
            min: b.min.min(*p),
            max: b.max.max(*p),
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// 已加载的模型
///
/// 持有几何体与材质缓冲；`release` 之后缓冲被清空，模型不再可渲染。
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub name: String,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub bounds: Option<Aabb>,
    transform: Transform,
    released: bool,
}

impl LoadedModel {
    pub fn new(name: impl Into<String>, meshes: Vec<MeshData>, materials: Vec<MaterialData>) -> Self {
        let bounds = Aabb::from_points(meshes.iter().flat_map(|m| m.positions.iter()));
        Self {
            name: name.into(),
            meshes,
            materials,
            bounds,
            transform: Transform::default(),
            released: false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }
}

impl SceneModel for LoadedModel {
    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn release(&mut self) {
        tracing::debug!(
            "释放模型 {}: {} 个网格, {} 个材质",
            self.name,
            self.meshes.len(),
            self.materials.len()
        );
        self.meshes.clear();
        self.materials.clear();
        self.released = true;
    }
}

/// glTF 资源加载器
///
/// 原生环境下从 `root` 目录读取文件；浏览器端只使用 `parse`。
#[derive(Debug, Clone, Default)]
pub struct GltfLoader {
    pub root: PathBuf,
}

impl GltfLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 解析 `.gltf` (内嵌缓冲) 或 `.glb` 字节
    pub fn parse(name: &str, bytes: &[u8]) -> Result<LoadedModel, AssetError> {
        let (document, buffers, _images) = gltf::import_slice(bytes)
            .map_err(|e| AssetError::Parse(format!("glTF 导入失败: {}", e)))?;

        let materials = document
            .materials()
            .map(|material| {
                let pbr = material.pbr_metallic_roughness();
                MaterialData {
                    name: material
                        .name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Material_{}", material.index().unwrap_or(0))),
                    base_color: pbr.base_color_factor().into(),
                    metallic: pbr.metallic_factor(),
                    roughness: pbr.roughness_factor(),
                }
            })
            .collect();

        let mut meshes = Vec::new();
        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));
                let Some(pos_iter) = reader.read_positions() else {
                    continue;
                };
                let positions: Vec<Vec3> = pos_iter.map(Vec3::from).collect();
                let normals = reader
                    .read_normals()
                    .map(|n| n.map(Vec3::from).collect())
                    .unwrap_or_default();
                let indices = reader
                    .read_indices()
                    .map(|i| i.into_u32().collect())
                    .unwrap_or_else(|| (0..positions.len() as u32).collect());

                meshes.push(MeshData {
                    name: mesh.name().unwrap_or("Mesh").to_string(),
                    positions,
                    normals,
                    indices,
                    material_index: primitive.material().index(),
                });
            }
        }

        Ok(LoadedModel::new(name, meshes, materials))
    }

    /// 同步读取 `root` 下的文件
    pub fn load_file(&self, path: &str) -> Result<LoadedModel, AssetError> {
        let full = self.root.join(path);
        tracing::info!("正在从路径加载 glTF: {}", full.display());
        let bytes = std::fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(full.display().to_string()),
            _ => AssetError::Io(e),
        })?;
        match full.extension().and_then(|e| e.to_str()) {
            Some("glb") | Some("gltf") => Self::parse(path, &bytes),
            other => Err(AssetError::UnsupportedFormat(other.unwrap_or("").to_string())),
        }
    }
}

impl ModelLoader for GltfLoader {
    type Model = LoadedModel;
    type Error = AssetError;

    async fn load(&self, path: &str, on_progress: &mut dyn FnMut(f32)) -> Result<LoadedModel, AssetError> {
        on_progress(0.0);
        let model = self.load_file(path)?;
        on_progress(1.0);
        Ok(model)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 单个三角形，缓冲以 data URI 内嵌
    pub const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "name": "Tri" }],
        "meshes": [{
            "name": "Tri",
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }]
        }],
        "materials": [{
            "name": "Red",
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                "metallicFactor": 0.25,
                "roughnessFactor": 0.5
            }
        }],
        "buffers": [{
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA="
        }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    #[test]
    fn parses_embedded_triangle() {
        let model = GltfLoader::parse("tri", TRIANGLE_GLTF.as_bytes()).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.vertex_count(), 3);
        assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);
        assert_eq!(model.materials[0].name, "Red");
        assert_eq!(model.materials[0].base_color, Vec4::new(1.0, 0.0, 0.0, 1.0));
        let bounds = model.bounds.unwrap();
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn rejects_garbage() {
        let err = GltfLoader::parse("bad", b"not a gltf").unwrap_err();
        assert!(matches!(err, AssetError::Parse(_)));
    }

    #[test]
    fn release_frees_buffers() {
        let mut model = GltfLoader::parse("tri", TRIANGLE_GLTF.as_bytes()).unwrap();
        model.release();
        assert!(model.is_released());
        assert!(model.meshes.is_empty());
        assert!(model.materials.is_empty());
    }

    #[test]
    fn missing_file_is_not_found() {
        let loader = GltfLoader::new(std::env::temp_dir());
        let err = loader.load_file("orbit-core-missing-model.glb").unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[tokio::test]
    async fn loader_reads_file_and_reports_progress() {
        let dir = std::env::temp_dir().join("orbit-core-assets-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tri.gltf"), TRIANGLE_GLTF).unwrap();

        let loader = GltfLoader::new(&dir);
        let mut seen = Vec::new();
        let model = loader.load("tri.gltf", &mut |p| seen.push(p)).await.unwrap();
        assert_eq!(model.vertex_count(), 3);
        assert_eq!(seen, vec![0.0, 1.0]);
    }
}
