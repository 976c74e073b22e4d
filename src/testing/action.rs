use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::{debug, trace};

use crate::{
    application::config::ApplicationConfig,
    http::call::ApplicationCall,
    pipeline::PipelineContext,
    scope::{Deferred, Scope},
    testing::engine::{TestApplicationEngine, with_test_application},
};

/// 只用于测试的管道上下文
///
/// 满足 [`PipelineContext`] 的契约，但背后没有真正的管道：`finish`、`proceed`、
/// `proceed_with` 都是空操作，subject 恒为 `()`。适合测试不依赖多阶段推进的
/// 单个处理逻辑，不能用来测试链式执行。
#[derive(Debug, Clone)]
pub struct TestActionPipelineContext {
    call: Arc<ApplicationCall>,
    scope: Scope,
    subject: (),
}

impl TestActionPipelineContext {
    pub fn new(call: impl Into<Arc<ApplicationCall>>, scope: Scope) -> Self {
        Self {
            call: call.into(),
            scope,
            subject: (),
        }
    }

    pub fn call(&self) -> Arc<ApplicationCall> {
        self.call.clone()
    }
}

impl PipelineContext<(), ApplicationCall> for TestActionPipelineContext {
    fn context(&self) -> &ApplicationCall {
        &self.call
    }

    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn subject(&self) -> &() {
        &self.subject
    }

    fn finish(&mut self) {
        trace!("finish() on test context of call #{} ignored", self.call.id);
    }

    fn proceed(&mut self) -> BoxFuture<'_, ()> {
        trace!("proceed() on test context of call #{} ignored", self.call.id);
        future::ready(()).boxed()
    }

    fn proceed_with(&mut self, _subject: ()) -> BoxFuture<'_, ()> {
        trace!("proceed_with() on test context of call #{} ignored", self.call.id);
        future::ready(()).boxed()
    }
}

/// 以默认的空白模拟调用运行 action
///
/// ```no_run
/// # use aex_action_test::testing::with_action_test_context;
/// # use futures::FutureExt;
/// # async fn demo() {
/// let deferred = with_action_test_context(|_ctx| async { 42 }.boxed()).await;
/// assert_eq!(deferred.await.unwrap(), 42);
/// # }
/// ```
pub async fn with_action_test_context<T, A>(action: A) -> Deferred<T>
where
    A: for<'a> FnOnce(&'a mut TestActionPipelineContext) -> BoxFuture<'a, T> + Send + 'static,
    T: Send + 'static,
{
    with_action_test_context_using(|engine| engine.create_call(|_| {}), action).await
}

/// 由 `call` 在测试应用上产出模拟调用，再运行 action
pub async fn with_action_test_context_using<T, P, A>(call: P, action: A) -> Deferred<T>
where
    P: FnOnce(&TestApplicationEngine) -> ApplicationCall,
    A: for<'a> FnOnce(&'a mut TestActionPipelineContext) -> BoxFuture<'a, T> + Send + 'static,
    T: Send + 'static,
{
    with_action_test_context_config(ApplicationConfig::default(), call, action).await
}

/// 同 `with_action_test_context_using`，测试应用使用给定配置
pub async fn with_action_test_context_config<T, P, A>(
    config: ApplicationConfig,
    call: P,
    action: A,
) -> Deferred<T>
where
    P: FnOnce(&TestApplicationEngine) -> ApplicationCall,
    A: for<'a> FnOnce(&'a mut TestActionPipelineContext) -> BoxFuture<'a, T> + Send + 'static,
    T: Send + 'static,
{
    let mut context = with_test_application(config, |engine| {
        TestActionPipelineContext::new(call(engine), engine.application().scope().clone())
    });

    debug!("Launching test action for call #{}", context.call.id);

    // action 挂在应用作用域下，取消应用作用域即取消 action
    let scope = context.scope.clone();
    scope.spawn(async move { action(&mut context).await })
}
