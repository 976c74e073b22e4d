use std::collections::HashMap;

/// 模拟请求的 URL 参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// 原始请求目标，包括 query
    pub url: String,
    /// Path 参数，例如 /user/:id -> {"id": "123"}，测试中由调用方直接注入
    pub data: Option<HashMap<String, String>>,
    /// Query 参数，例如 ?active=true -> {"active": ["true"]}
    pub query: HashMap<String, Vec<String>>,
    pub form: Option<HashMap<String, Vec<String>>>,
}

impl Params {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let query = url
            .split_once('?')
            .map(|(_, qs)| Self::parse_pairs(qs))
            .unwrap_or_default();

        Self {
            url,
            data: None,
            query,
            form: None,
        }
    }

    /// 支持数组参数：同名 key 依次追加
    pub fn parse_pairs(pairs: &str) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (k, v) in form_urlencoded::parse(pairs.as_bytes()) {
            map.entry(k.into_owned()).or_default().push(v.into_owned());
        }
        map
    }

    pub fn set_form(&mut self, form: &str) {
        self.form = Some(Self::parse_pairs(form));
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.data.as_ref()?.get(key).map(String::as_str)
    }

    /// 第一个同名 query 值
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key)?.first().map(String::as_str)
    }

    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form.as_ref()?.get(key)?.first().map(String::as_str)
    }
}
