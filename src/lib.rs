//! aex 管道的 action 测试工具
//!
//! 提供一个空操作的 [`PipelineContext`](pipeline::PipelineContext) 实现，以及
//! [`with_action_test_context`]：创建测试应用、构造模拟调用并在其上运行 action：
//!
//! ```no_run
//! use aex_action_test::testing::with_action_test_context;
//! use aex_action_test::pipeline::PipelineContext;
//! use futures::FutureExt;
//!
//! # async fn demo() {
//! let deferred = with_action_test_context(|ctx| {
//!     async move { ctx.context().request().path.clone() }.boxed()
//! })
//! .await;
//!
//! assert_eq!(deferred.await.unwrap(), "/");
//! # }
//! ```

pub mod application;
pub mod http;
pub mod pipeline;
pub mod scope;
pub mod testing;

pub use testing::action::{
    TestActionPipelineContext, with_action_test_context, with_action_test_context_using,
};
