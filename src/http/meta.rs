use std::collections::HashMap;

use ::http::{HeaderMap, Method, Version, header};
use bytes::Bytes;

use crate::http::params::Params;

// 模拟请求的元数据，供测试 action 读取
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub method: Method,
    /// 请求目标，包括 query
    pub path: String,
    pub version: Version,
    pub headers: HeaderMap,
    pub cookies: HashMap<String, String>,
    pub params: Params,
    pub body: Bytes,
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            cookies: HashMap::new(),
            params: Params::new("/"),
            body: Bytes::new(),
        }
    }
}

impl RequestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// 不带 query 的路径部分
    pub fn pure_path(&self) -> &str {
        self.path.split('?').next().unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.params.query_value(key)
    }

    pub fn form(&self, key: &str) -> Option<&str> {
        self.params.form_value(key)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.param(key)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Cookie 头解析：`a=1; b=2`
    pub fn parse_cookies(header_value: &str) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for pair in header_value.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let mut kv = pair.splitn(2, '=');
            if let (Some(k), Some(v)) = (kv.next(), kv.next()) {
                map.insert(k.trim().to_string(), v.trim().to_string());
            }
        }
        map
    }
}
