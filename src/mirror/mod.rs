//! 价格镜像：把资产价格同步到外部文档数据库

pub mod firestore;

use anyhow::Result;

use crate::liqwid::AssetPrice;

pub use firestore::FirestoreMirror;

/// 文档数据库镜像接口
#[async_trait::async_trait]
pub trait PriceMirror: Send + Sync {
    /// 需要同步价格的资产列表
    async fn list_symbols(&self) -> Result<Vec<String>>;

    /// 写入价格，任一写入失败即返回错误
    async fn push_prices(&self, prices: &[AssetPrice], updated_at_ms: i64) -> Result<()>;
}
