//! 查看器错误类型

/// 面向界面层的查看器错误
///
/// 所有用户可见的失败都以返回值形式交给调用方，不会以 panic 的方式传播。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewerError {
    /// 已有模型正在加载，本次请求被丢弃
    #[error("模型正在加载中，请稍等！")]
    AlreadyLoading,
    /// 模型键没有配置路径
    #[error("未配置【{0}】对应的模型路径！")]
    UnknownModel(String),
    /// 加载器报告失败 (网络、解析等)
    #[error("模型加载失败：{0}")]
    LoadFailure(String),
    /// 复位序列正在进行
    #[error("视角复位进行中")]
    Busy,
}

impl ViewerError {
    /// 从任意加载器错误构造 `LoadFailure`
    pub fn load_failure(err: impl std::fmt::Display) -> Self {
        Self::LoadFailure(err.to_string())
    }
}
