use thiserror::Error;

/// 应用错误
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置错误（缺失或非法的环境变量）
    #[error("配置错误: {0}")]
    Config(String),

    /// 借贷数据源错误（网络、HTTP 状态、GraphQL errors）
    #[error("数据源错误: {0}")]
    DataSource(String),

    /// 消息通道错误
    #[error("通知错误: {0}")]
    Notification(String),

    /// 持久化存储错误
    #[error("存储错误: {0}")]
    Store(String),

    /// 价格镜像（文档数据库）错误
    #[error("价格镜像错误: {0}")]
    Mirror(String),

    #[error("序列化错误: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
