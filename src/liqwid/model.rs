use serde::{Deserialize, Serialize};

/// 单个贷款的当前快照，每个周期重新拉取，不持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSnapshot {
    pub id: String,
    pub health_factor: f64,
    pub asset_symbol: String,
}

impl LoanSnapshot {
    pub fn new(id: impl Into<String>, health_factor: f64, asset_symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            health_factor,
            asset_symbol: asset_symbol.into(),
        }
    }
}

/// 资产价格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPrice {
    pub symbol: String,
    pub price: f64,
}

// ---- GraphQL 响应结构 ----

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LiqwidRoot<T> {
    pub liqwid: LiqwidData<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LiqwidData<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// 缺失时按单页处理
    #[serde(default)]
    pub pages_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoansData {
    pub loans: Page<LoanDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoanDto {
    pub id: String,
    /// 无债务时接口返回 null
    pub health_factor: Option<f64>,
    pub asset: AssetDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarketsData {
    pub markets: Page<MarketDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarketDto {
    pub asset: AssetDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssetDto {
    pub symbol: String,
    #[serde(default)]
    pub price: Option<f64>,
}

impl From<LoanDto> for LoanSnapshot {
    fn from(dto: LoanDto) -> Self {
        LoanSnapshot {
            id: dto.id,
            health_factor: dto.health_factor.unwrap_or(f64::INFINITY),
            asset_symbol: dto.asset.symbol,
        }
    }
}
