//! 测试支架：产出模拟调用的测试应用引擎，以及基于它的 action 运行器

pub mod action;
pub mod engine;

pub use action::{
    TestActionPipelineContext, with_action_test_context, with_action_test_context_config,
    with_action_test_context_using,
};
pub use engine::{TestApplicationEngine, TestRequestBuilder, with_test_application};

use tracing_subscriber::EnvFilter;

/// 为测试安装日志输出，重复调用无副作用
///
/// 日志级别由 `RUST_LOG` 控制，默认 `warn`。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
