use futures::future::BoxFuture;

use crate::{http::call::ApplicationCall, scope::Scope};

/// 管道中正在执行的一步
///
/// `S` 是沿管道传递的 subject，`C` 是执行所在的上下文（通常是 [`ApplicationCall`]）。
pub trait PipelineContext<S, C>: Send {
    /// 管道执行所在的上下文对象
    fn context(&self) -> &C;

    /// 继承的并发上下文
    fn scope(&self) -> &Scope;

    /// 沿管道传递的 subject
    fn subject(&self) -> &S;

    /// 结束当前管道执行
    fn finish(&mut self);

    /// 以当前 subject 继续执行后续阶段
    fn proceed(&mut self) -> BoxFuture<'_, ()>;

    /// 以给定 subject 继续执行后续阶段
    fn proceed_with(&mut self, subject: S) -> BoxFuture<'_, ()>;
}

/// 处理 `ApplicationCall` 且 subject 为 `()` 的管道上下文
pub type ApplicationPipelineContext = dyn PipelineContext<(), ApplicationCall>;
