use crate::error::{AppError, AppResult};

/// 读取非空字符串，空白值视为未设置
pub fn env_non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 读取字符串环境变量，若不存在则返回默认值
pub fn env_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_non_empty(lookup, key).unwrap_or_else(|| default.to_string())
}

/// 读取必填字符串
pub fn env_required<F>(lookup: &F, key: &str) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    env_non_empty(lookup, key).ok_or_else(|| AppError::Config(format!("{} not set", key)))
}

/// 读取 f64，不存在返回默认值，解析失败返回配置错误
pub fn env_f64<F>(lookup: &F, key: &str, default: f64) -> AppResult<f64>
where
    F: Fn(&str) -> Option<String>,
{
    match env_non_empty(lookup, key) {
        Some(v) => v
            .parse::<f64>()
            .map_err(|e| AppError::Config(format!("{}={} 不是合法数字: {}", key, v, e))),
        None => Ok(default),
    }
}

/// 读取布尔型环境变量：支持 true/false/1/0（大小写不敏感）
pub fn env_is_true<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match env_non_empty(lookup, key) {
        Some(v) => v.eq_ignore_ascii_case("true") || v == "1",
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_blank_is_unset() {
        let env = lookup(&[("A", "  "), ("B", " x ")]);
        assert_eq!(env_non_empty(&env, "A"), None);
        assert_eq!(env_non_empty(&env, "B"), Some("x".to_string()));
        assert_eq!(env_or_default(&env, "A", "d"), "d");
    }

    #[test]
    fn test_parse_helpers() {
        let env = lookup(&[("F", "1.25"), ("BAD", "abc"), ("T", "TRUE"), ("O", "1")]);
        assert_eq!(env_f64(&env, "F", 0.0).unwrap(), 1.25);
        assert_eq!(env_f64(&env, "MISSING", 2.0).unwrap(), 2.0);
        assert!(env_f64(&env, "BAD", 0.0).is_err());
        assert!(env_is_true(&env, "T", false));
        assert!(env_is_true(&env, "O", false));
        assert!(!env_is_true(&env, "MISSING", false));
        assert!(env_required(&env, "MISSING").is_err());
    }
}
