use std::any::{Any, TypeId};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{application::config::ApplicationConfig, scope::Scope};

/// 类型索引的扩展存储（TypeMap 抽象）
pub type TypeMap = dashmap::DashMap<TypeId, Box<dyn Any + Send + Sync>>;

pub trait TypeMapExt {
    fn get_value<T: Clone + 'static>(&self) -> Option<T>;
    fn set_value<T: Send + Sync + 'static>(&self, val: T);
    fn has_value<T: 'static>(&self) -> bool;
}

impl TypeMapExt for TypeMap {
    /// 基于 TypeId 查找，而不是基于 Key 值
    fn get_value<T: Clone + 'static>(&self) -> Option<T> {
        self.get(&TypeId::of::<T>())
            .and_then(|r| r.value().downcast_ref::<T>().cloned())
    }

    fn set_value<T: Send + Sync + 'static>(&self, val: T) {
        self.insert(TypeId::of::<T>(), Box::new(val));
    }

    fn has_value<T: 'static>(&self) -> bool {
        self.contains_key(&TypeId::of::<T>())
    }
}

// --- [Application] ---

/// 一个应用实例：配置、根作用域以及全局扩展
pub struct Application {
    pub config: ApplicationConfig,
    /// 应用级 TypeMap：数据库连接池、全局配置等
    pub extensions: TypeMap,
    scope: Scope,
    next_call_id: AtomicU64,
}

impl Application {
    /// 需要在 tokio runtime 内调用
    pub fn new(config: ApplicationConfig) -> Arc<Self> {
        Self::with_scope(config, Scope::current())
    }

    pub fn with_scope(config: ApplicationConfig, scope: Scope) -> Arc<Self> {
        Arc::new(Self {
            config,
            extensions: TypeMap::default(),
            scope,
            next_call_id: AtomicU64::new(1),
        })
    }

    /// 应用的并发上下文，所有调用共享
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn name(&self) -> &str {
        &self.config.server_name
    }

    pub(crate) fn allocate_call_id(&self) -> u64 {
        self.next_call_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .field("extensions", &self.extensions.len())
            .field("scope", &self.scope)
            .finish()
    }
}
