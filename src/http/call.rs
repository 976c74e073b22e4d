use std::{net::SocketAddr, sync::Arc};

use ::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::{
    application::context::{Application, TypeMap},
    http::meta::RequestMetadata,
};

#[derive(Debug, Clone)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    committed: bool,
}

/// 模拟调用的响应端
///
/// 通过 `&self` 即可写入，action 只拿到 `&ApplicationCall` 也能响应。
#[derive(Debug)]
pub struct TestResponse {
    state: Mutex<ResponseState>,
}

impl Default for TestResponse {
    fn default() -> Self {
        Self {
            state: Mutex::new(ResponseState {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Vec::new(),
                committed: false,
            }),
        }
    }
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.state.lock().status
    }

    pub fn set_status(&self, status: StatusCode) {
        self.state.lock().status = status;
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn headers(&self) -> HeaderMap {
        self.state.lock().headers.clone()
    }

    pub fn set_header(&self, name: &str, value: &str) -> anyhow::Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.state.lock().headers.insert(name, value);
        Ok(())
    }

    pub fn body(&self) -> Vec<u8> {
        self.state.lock().body.clone()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().body).into_owned()
    }

    pub fn is_committed(&self) -> bool {
        self.state.lock().committed
    }

    /// 写入完整响应，Content-Length 自动同步
    pub fn respond(&self, status: StatusCode, body: impl Into<Vec<u8>>) {
        let mut state = self.state.lock();
        state.status = status;
        state.body = body.into();
        let len = state.body.len();
        state
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        state.committed = true;
    }

    pub fn respond_text(&self, status: StatusCode, text: impl Into<String>) {
        self.respond(status, text.into().into_bytes());
        self.state.lock().headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
    }
}

/// 一次（模拟的）请求/响应配对
pub struct ApplicationCall {
    /// 应用内单调递增
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub peer_addr: SocketAddr,
    request: RequestMetadata,
    response: TestResponse,
    /// 请求级 TypeMap：用于存储临时变量
    pub attributes: TypeMap,
    application: Arc<Application>,
}

impl ApplicationCall {
    pub fn new(application: Arc<Application>, request: RequestMetadata) -> Self {
        Self {
            id: application.allocate_call_id(),
            created_at: Utc::now(),
            peer_addr: application.config.peer_addr,
            request,
            response: TestResponse::default(),
            attributes: TypeMap::default(),
            application,
        }
    }

    pub fn request(&self) -> &RequestMetadata {
        &self.request
    }

    pub fn response(&self) -> &TestResponse {
        &self.response
    }

    pub fn application(&self) -> &Arc<Application> {
        &self.application
    }
}

impl std::fmt::Debug for ApplicationCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationCall")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("peer_addr", &self.peer_addr)
            .field("request", &self.request)
            .field("response", &self.response)
            .field("attributes", &self.attributes.len())
            .finish()
    }
}
