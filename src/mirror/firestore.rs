//! Firestore REST 实现
//!
//! 每个资产一个文档 `{collection}/{symbol}`，字段 `symbol`、`price`、`updatedAt`。

use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::AppError;
use crate::liqwid::AssetPrice;
use crate::mirror::PriceMirror;

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";

pub struct FirestoreMirror {
    client: Client,
    documents_url: String,
    collection: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldValue {
    string_value: Option<String>,
}

impl FirestoreMirror {
    pub fn new(
        project_id: &str,
        collection: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                FIRESTORE_BASE, project_id
            ),
            collection: collection.into(),
            api_key: api_key.into(),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.documents_url, self.collection)
    }
}

/// 优先取 `symbol` 字段，没有则取文档 ID
fn document_symbol(doc: &Document) -> Option<String> {
    doc.fields
        .get("symbol")
        .and_then(|f| f.string_value.clone())
        .or_else(|| doc.name.rsplit('/').next().map(str::to_string))
        .filter(|s| !s.is_empty())
}

fn parse_symbols(body: &str) -> Result<Vec<String>> {
    let response: ListDocumentsResponse =
        serde_json::from_str(body).context("Firestore 文档列表解析失败")?;
    Ok(response.documents.iter().filter_map(document_symbol).collect())
}

fn price_document(price: &AssetPrice, updated_at_ms: i64) -> serde_json::Value {
    json!({
        "fields": {
            "symbol": { "stringValue": price.symbol },
            "price": { "doubleValue": price.price },
            "updatedAt": { "integerValue": updated_at_ms.to_string() },
        }
    })
}

#[async_trait::async_trait]
impl PriceMirror for FirestoreMirror {
    async fn list_symbols(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.collection_url())
            .query(&[("key", self.api_key.as_str()), ("pageSize", "300")])
            .send()
            .await
            .map_err(|e| AppError::Mirror(format!("获取资产列表失败: {}", e.without_url())))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::Mirror(format!("获取资产列表失败: {} - {}", status, body)).into());
        }

        let symbols = parse_symbols(&body)?;
        debug!(count = symbols.len(), "镜像资产列表");
        Ok(symbols)
    }

    async fn push_prices(&self, prices: &[AssetPrice], updated_at_ms: i64) -> Result<()> {
        for price in prices {
            let url = format!("{}/{}", self.collection_url(), price.symbol);
            let response = self
                .client
                .patch(&url)
                .query(&[
                    ("key", self.api_key.as_str()),
                    ("updateMask.fieldPaths", "symbol"),
                    ("updateMask.fieldPaths", "price"),
                    ("updateMask.fieldPaths", "updatedAt"),
                ])
                .json(&price_document(price, updated_at_ms))
                .send()
                .await
                .map_err(|e| {
                    AppError::Mirror(format!("写入 {} 价格失败: {}", price.symbol, e.without_url()))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Mirror(format!(
                    "写入 {} 价格失败: {} - {}",
                    price.symbol, status, body
                ))
                .into());
            }
        }
        info!(count = prices.len(), "价格已同步到 Firestore");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols_prefers_field_then_document_id() {
        let body = r#"{"documents":[
            {"name":"projects/p/databases/(default)/documents/prices/ada-doc","fields":{"symbol":{"stringValue":"ADA"}}},
            {"name":"projects/p/databases/(default)/documents/prices/DJED","fields":{"price":{"doubleValue":1.0}}}
        ]}"#;
        assert_eq!(parse_symbols(body).unwrap(), vec!["ADA", "DJED"]);
    }

    #[test]
    fn test_parse_empty_collection() {
        assert!(parse_symbols("{}").unwrap().is_empty());
    }

    #[test]
    fn test_price_document_shape() {
        let doc = price_document(
            &AssetPrice {
                symbol: "ADA".to_string(),
                price: 0.5,
            },
            1_700_000_000_000,
        );
        assert_eq!(doc["fields"]["price"]["doubleValue"], 0.5);
        assert_eq!(doc["fields"]["updatedAt"]["integerValue"], "1700000000000");
    }
}
