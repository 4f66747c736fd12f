//! Liqwid 借贷数据源

pub mod client;
pub mod model;

pub use client::{LiqwidClient, LoanSource};
pub use model::{AssetPrice, LoanSnapshot};
