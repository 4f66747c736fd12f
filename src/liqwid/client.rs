use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::liqwid::model::{
    AssetPrice, GraphQlResponse, LiqwidRoot, LoanDto, LoanSnapshot, LoansData, MarketDto,
    MarketsData, Page,
};

/// 单次查询最多翻页数
const MAX_PAGES: u32 = 20;
const MARKETS_PER_PAGE: u32 = 100;

const LOANS_QUERY: &str = r#"
query Loans($input: LoansInput) {
  liqwid {
    data {
      loans(input: $input) {
        pagesCount
        results {
          id
          healthFactor
          asset { symbol }
        }
      }
    }
  }
}"#;

const MARKETS_QUERY: &str = r#"
query Markets($input: MarketsInput) {
  liqwid {
    data {
      markets(input: $input) {
        pagesCount
        results {
          asset { symbol price }
        }
      }
    }
  }
}"#;

/// 借贷数据源接口
#[async_trait::async_trait]
pub trait LoanSource: Send + Sync {
    /// 获取账户当前的全部贷款
    async fn fetch_loans(&self, account_id: &str) -> Result<Vec<LoanSnapshot>>;

    /// 获取指定资产的价格，只返回能查到的资产
    async fn fetch_prices(&self, symbols: &[String]) -> Result<Vec<AssetPrice>>;
}

/// Liqwid GraphQL 客户端
pub struct LiqwidClient {
    client: Client,
    api_url: String,
}

impl LiqwidClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
        }
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let body = json!({ "query": query, "variables": variables });
        let response = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::DataSource(format!("请求 {} 失败: {}", self.api_url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::DataSource(format!("读取响应失败: {}", e)))?;
        if !status.is_success() {
            return Err(AppError::DataSource(format!("HTTP {}: {}", status, text)).into());
        }

        parse_graphql(&text)
    }

    /// 从第 0 页开始翻页，直到 `pagesCount` 用尽或达到 `MAX_PAGES`
    async fn query_all_pages<D, T, F>(&self, query: &str, input: Value, page_of: F) -> Result<Vec<T>>
    where
        D: DeserializeOwned,
        F: Fn(D) -> Page<T>,
    {
        let mut items = Vec::new();
        let mut page = 0;
        loop {
            let mut variables = input.clone();
            variables["page"] = json!(page);
            let root: LiqwidRoot<D> = self.query(query, json!({ "input": variables })).await?;
            let current = page_of(root.liqwid.data);
            items.extend(current.results);

            match next_page(page, current.pages_count) {
                Some(next) if next < MAX_PAGES => page = next,
                Some(_) => {
                    warn!(
                        pages = MAX_PAGES,
                        pages_count = ?current.pages_count,
                        "分页超过上限，剩余数据被忽略"
                    );
                    break;
                }
                None => break,
            }
        }
        Ok(items)
    }
}

/// 下一页页码，已是最后一页时返回 `None`
pub(crate) fn next_page(current: u32, pages_count: Option<u32>) -> Option<u32> {
    let next = current + 1;
    match pages_count {
        Some(count) if next < count => Some(next),
        _ => None,
    }
}

/// 解析 GraphQL 响应：有 errors 或缺 data 都视为失败
pub(crate) fn parse_graphql<T: DeserializeOwned>(body: &str) -> Result<T> {
    let response: GraphQlResponse<T> =
        serde_json::from_str(body).context("GraphQL 响应解析失败")?;

    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(AppError::DataSource(format!("GraphQL errors: {}", messages.join("; "))).into());
    }
    response
        .data
        .ok_or_else(|| AppError::DataSource("GraphQL 响应缺少 data".to_string()).into())
}

pub(crate) fn into_loans(results: Vec<LoanDto>) -> Vec<LoanSnapshot> {
    results.into_iter().map(LoanSnapshot::from).collect()
}

pub(crate) fn into_prices(results: Vec<MarketDto>, symbols: &[String]) -> Vec<AssetPrice> {
    results
        .into_iter()
        .filter_map(|market| {
            let symbol = market.asset.symbol;
            let price = market.asset.price?;
            symbols
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&symbol))
                .then_some(AssetPrice { symbol, price })
        })
        .collect()
}

#[async_trait::async_trait]
impl LoanSource for LiqwidClient {
    async fn fetch_loans(&self, account_id: &str) -> Result<Vec<LoanSnapshot>> {
        let results = self
            .query_all_pages(
                LOANS_QUERY,
                json!({ "paymentKeys": [account_id] }),
                |data: LoansData| data.loans,
            )
            .await
            .with_context(|| format!("获取账户 {} 的贷款失败", account_id))?;

        let loans = into_loans(results);
        info!(account_id, count = loans.len(), "获取贷款数据成功");
        Ok(loans)
    }

    async fn fetch_prices(&self, symbols: &[String]) -> Result<Vec<AssetPrice>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let results = self
            .query_all_pages(
                MARKETS_QUERY,
                json!({ "perPage": MARKETS_PER_PAGE }),
                |data: MarketsData| data.markets,
            )
            .await
            .context("获取市场价格失败")?;

        let prices = into_prices(results, symbols);
        debug!(requested = symbols.len(), found = prices.len(), "获取资产价格");
        Ok(prices)
    }
}
