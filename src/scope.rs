use std::{
    any::Any,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use anyhow::Context as _;
use thiserror::Error;
use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::sync::{CancellationToken, DropGuard};

/// 并发上下文：运行时句柄 + 取消信号
///
/// 由 `spawn` 启动的任务都挂在子 token 上，取消父作用域会连带取消所有子任务。
#[derive(Debug, Clone)]
pub struct Scope {
    handle: Handle,
    token: CancellationToken,
}

impl Scope {
    pub fn new(handle: Handle, token: CancellationToken) -> Self {
        Self { handle, token }
    }

    /// 基于当前 tokio runtime 创建根作用域，runtime 外调用会 panic
    pub fn current() -> Self {
        Self::new(Handle::current(), CancellationToken::new())
    }

    pub fn try_current() -> anyhow::Result<Self> {
        let handle = Handle::try_current().context("No tokio runtime available")?;
        Ok(Self::new(handle, CancellationToken::new()))
    }

    pub fn child(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// 在子作用域中启动任务，返回尚未完成的结果句柄
    pub fn spawn<F, T>(&self, fut: F) -> Deferred<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let token = self.token.child_token();
        let task_token = token.clone();

        let handle = self.handle.spawn(async move {
            tokio::select! {
                // 已取消的作用域中启动的任务不会执行
                biased;
                _ = task_token.cancelled() => None,
                value = fut => Some(value),
            }
        });

        Deferred {
            handle,
            _guard: token.clone().drop_guard(),
            token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeferredError {
    #[error("deferred task was cancelled")]
    Cancelled,

    #[error("deferred task panicked: {0}")]
    Panicked(String),
}

/// 异步计算结果的句柄，必须显式 `.await`
///
/// 句柄被丢弃时任务随之取消，调用方被中止也不会留下孤儿任务。
#[derive(Debug)]
pub struct Deferred<T> {
    handle: JoinHandle<Option<T>>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl<T> Deferred<T> {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, DeferredError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Some(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(None)) => Poll::Ready(Err(DeferredError::Cancelled)),
            Poll::Ready(Err(e)) if e.is_panic() => {
                Poll::Ready(Err(DeferredError::Panicked(panic_message(e.into_panic()))))
            }
            Poll::Ready(Err(_)) => Poll::Ready(Err(DeferredError::Cancelled)),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
