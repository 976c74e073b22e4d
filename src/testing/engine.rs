use std::collections::HashSet;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use ::http::{HeaderMap, HeaderName, HeaderValue, Method, Version, header};
use anyhow::{Context, bail};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{
    application::{config::ApplicationConfig, context::Application},
    http::{call::ApplicationCall, meta::RequestMetadata, params::Params},
};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// 模拟请求的构造器，由 `create_call` 的 setup 闭包填充
#[derive(Debug, Clone)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    version: Version,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    params: Vec<(String, String)>,
    body: Bytes,
}

impl Default for TestRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            uri: "/".to_string(),
            version: Version::HTTP_11,
            headers: Vec::new(),
            cookies: Vec::new(),
            params: Vec::new(),
            body: Bytes::new(),
        }
    }
}

impl TestRequestBuilder {
    pub fn method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    pub fn uri(&mut self, uri: impl Into<String>) -> &mut Self {
        self.uri = uri.into();
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = version;
        self
    }

    pub fn header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn cookie(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.cookies.push((key.into(), value.into()));
        self
    }

    /// Path 参数，相当于路由 `/user/:id` 匹配后的结果
    pub fn param(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// 以 x-www-form-urlencoded 编码写入 body
    pub fn form<K, V>(&mut self, pairs: &[(K, V)]) -> &mut Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
            .finish();
        self.body = Bytes::from(encoded);
        self.header(header::CONTENT_TYPE.as_str(), FORM_URLENCODED)
    }

    fn build(self, config: &ApplicationConfig, strict: bool) -> anyhow::Result<RequestMetadata> {
        if !self.uri.starts_with('/') {
            bail!("Request target must start with '/': {}", self.uri);
        }

        // 1. 应用默认头在前，请求自身的头可覆盖
        let mut headers = HeaderMap::new();
        let defaults = config
            .default_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()));
        for (k, v) in defaults {
            match parse_header(k, v) {
                Ok((name, value)) => {
                    headers.insert(name, value);
                }
                Err(e) if strict => return Err(e),
                Err(e) => warn!("Skipping invalid default header {:?}: {:#}", k, e),
            }
        }
        // 同名头第一次出现时替换默认值，之后追加
        let mut overridden = HashSet::new();
        for (k, v) in &self.headers {
            match parse_header(k, v) {
                Ok((name, value)) => {
                    if overridden.insert(name.clone()) {
                        headers.insert(name, value);
                    } else {
                        headers.append(name, value);
                    }
                }
                Err(e) if strict => return Err(e),
                Err(e) => warn!("Skipping invalid header {:?}: {:#}", k, e),
            }
        }

        // 2. Cookie：显式设置的 cookie 合并进 Cookie 头
        let mut pairs = Vec::with_capacity(self.cookies.len());
        for (k, v) in &self.cookies {
            let pair = format!("{}={}", k, v);
            match HeaderValue::from_str(&pair) {
                Ok(_) => pairs.push(pair),
                Err(e) if strict => {
                    return Err(e).with_context(|| format!("Invalid cookie value for {}", k));
                }
                Err(e) => warn!("Skipping invalid cookie {:?}: {}", k, e),
            }
        }
        if !pairs.is_empty() {
            let joined = pairs.join("; ");
            let value = match headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
                Some(existing) => format!("{}; {}", existing, joined),
                None => joined,
            };
            headers.insert(
                header::COOKIE,
                HeaderValue::from_str(&value).context("Invalid cookie value")?,
            );
        }
        let cookies = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(RequestMetadata::parse_cookies)
            .unwrap_or_default();

        if !self.body.is_empty() && !headers.contains_key(header::CONTENT_LENGTH) {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(self.body.len()));
        }

        // 3. 参数：query 来自 uri，form 来自 url-encoded body
        let mut params = Params::new(self.uri.clone());
        for (k, v) in self.params {
            params.set_param(k, v);
        }
        let is_form = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(FORM_URLENCODED));
        if is_form && !self.body.is_empty() {
            params.set_form(&String::from_utf8_lossy(&self.body));
        }

        Ok(RequestMetadata {
            method: self.method,
            path: self.uri,
            version: self.version,
            headers,
            cookies,
            params,
            body: self.body,
        })
    }
}

fn parse_header(key: &str, value: &str) -> anyhow::Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(key.as_bytes())
        .with_context(|| format!("Invalid header name: {}", key))?;
    let value =
        HeaderValue::from_str(value).with_context(|| format!("Invalid header value for {}", key))?;
    Ok((name, value))
}

/// 测试应用引擎：不监听端口，直接产出模拟调用
#[derive(Debug)]
pub struct TestApplicationEngine {
    application: Arc<Application>,
    running: AtomicBool,
}

impl Default for TestApplicationEngine {
    fn default() -> Self {
        Self::new(ApplicationConfig::default())
    }
}

impl TestApplicationEngine {
    /// 需要在 tokio runtime 内调用
    pub fn new(config: ApplicationConfig) -> Self {
        Self::with_application(Application::new(config))
    }

    pub fn with_application(application: Arc<Application>) -> Self {
        Self {
            application,
            running: AtomicBool::new(false),
        }
    }

    pub fn application(&self) -> &Arc<Application> {
        &self.application
    }

    pub fn start(&self) {
        if !self.running.swap(true, Ordering::SeqCst) {
            info!("[AEX] Test application '{}' started", self.application.name());
        }
    }

    /// 只改变引擎状态，不会取消应用作用域
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("[AEX] Test application '{}' stopped", self.application.name());
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 构造模拟调用，非法请求头会被记录并跳过
    pub fn create_call<F>(&self, setup: F) -> ApplicationCall
    where
        F: FnOnce(&mut TestRequestBuilder),
    {
        let mut builder = TestRequestBuilder::default();
        setup(&mut builder);
        let uri = builder.uri.clone();
        let request = match builder.build(&self.application.config, false) {
            Ok(request) => request,
            Err(e) => {
                warn!("Falling back to a bare request for {:?}: {:#}", uri, e);
                RequestMetadata::default()
            }
        };
        self.make_call(request)
    }

    /// 与 `create_call` 相同，但任何非法输入都会返回错误
    pub fn try_create_call<F>(&self, setup: F) -> anyhow::Result<ApplicationCall>
    where
        F: FnOnce(&mut TestRequestBuilder),
    {
        let mut builder = TestRequestBuilder::default();
        setup(&mut builder);
        let request = builder.build(&self.application.config, true)?;
        Ok(self.make_call(request))
    }

    fn make_call(&self, request: RequestMetadata) -> ApplicationCall {
        let call = ApplicationCall::new(self.application.clone(), request);
        debug!(
            "Created test call #{}: {} {}",
            call.id,
            call.request().method,
            call.request().path
        );
        call
    }
}

/// 启动测试应用、执行 block、停止应用，返回 block 的结果
pub fn with_test_application<R, F>(config: ApplicationConfig, block: F) -> R
where
    F: FnOnce(&TestApplicationEngine) -> R,
{
    let engine = TestApplicationEngine::new(config);
    engine.start();
    let result = block(&engine);
    engine.stop();
    result
}
