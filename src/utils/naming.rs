//! 字段命名归一化
//!
//! 三个后端各有命名习惯: 关系库列名是 snake_case, 键值/图库属性名是
//! camelCase。对外统一呈现 camelCase, 写入关系库前再转回 snake_case,
//! 使同一条记录从任何后端取出时字段名完全一致。

use serde_json::{Map, Value};

/// snake_case → camelCase
///
/// `product_id` → `productId`。下划线被吃掉, 其后首字母大写;
/// 已是 camelCase 的输入原样返回 (幂等)。
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// camelCase → snake_case
///
/// `productId` → `product_id`。大写字母前补下划线并转小写;
/// 已是 snake_case 的输入原样返回 (幂等)。
pub fn snakeify(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// 记录键名整体转 camelCase, 值不动
pub fn camelize_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (camelize(&k), v)).collect()
}

/// 记录键名整体转 snake_case, 值不动
pub fn snakeify_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (snakeify(&k), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camelize_basic() {
        assert_eq!(camelize("product_id"), "productId");
        assert_eq!(camelize("company_name"), "companyName");
        assert_eq!(camelize("contact_title"), "contactTitle");
    }

    #[test]
    fn test_camelize_idempotent() {
        assert_eq!(camelize("productId"), "productId");
        assert_eq!(camelize("id"), "id");
    }

    #[test]
    fn test_snakeify_basic() {
        assert_eq!(snakeify("productId"), "product_id");
        assert_eq!(snakeify("companyName"), "company_name");
    }

    #[test]
    fn test_snakeify_idempotent() {
        assert_eq!(snakeify("product_id"), "product_id");
        assert_eq!(snakeify("id"), "id");
    }

    /// snake → camel → snake 往返后应回到原名
    #[test]
    fn test_round_trip() {
        for name in ["customer_id", "unit_price", "units_in_stock"] {
            assert_eq!(snakeify(&camelize(name)), name);
        }
    }

    #[test]
    fn test_camelize_map_keeps_values() {
        let mut m = Map::new();
        m.insert("product_id".into(), json!(1));
        m.insert("product_name".into(), json!("Chai"));
        let out = camelize_map(m);
        assert_eq!(out.get("productId"), Some(&json!(1)));
        assert_eq!(out.get("productName"), Some(&json!("Chai")));
        assert!(out.get("product_id").is_none());
    }

    #[test]
    fn test_snakeify_map_keeps_values() {
        let mut m = Map::new();
        m.insert("companyName".into(), json!("Acme"));
        let out = snakeify_map(m);
        assert_eq!(out.get("company_name"), Some(&json!("Acme")));
    }
}
