//! 命令定义缓存
//!
//! 每次加载在私有的 [`CacheBuilder`] 中构建完整目录，再一次性替换当前快照。
//! 读者只会看到旧的完整目录或新的完整目录。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::models::CommandDefinition;

#[derive(Debug, Default)]
struct CacheSnapshot {
    /// 按加载时的插入顺序排列
    entries: Vec<Arc<CommandDefinition>>,
    index: HashMap<String, usize>,
}

/// 新一轮加载使用的构建器，从空开始
#[derive(Debug, Default)]
pub struct CacheBuilder {
    snapshot: CacheSnapshot,
}

impl CacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入定义；同名条目原位替换，保留最初的位置
    pub fn insert(&mut self, definition: CommandDefinition) {
        let snapshot = &mut self.snapshot;
        match snapshot.index.get(&definition.name).copied() {
            Some(position) => snapshot.entries[position] = Arc::new(definition),
            None => {
                snapshot
                    .index
                    .insert(definition.name.clone(), snapshot.entries.len());
                snapshot.entries.push(Arc::new(definition));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.entries.is_empty()
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    /// 所有容器的字节数之和
    pub container_bytes: usize,
}

/// 进程级命令定义缓存
#[derive(Debug, Default)]
pub struct DefinitionCache {
    current: RwLock<Arc<CacheSnapshot>>,
}

impl DefinitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按名称查找
    pub fn get(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        let snapshot = self.snapshot();
        snapshot
            .index
            .get(name)
            .map(|&position| Arc::clone(&snapshot.entries[position]))
    }

    /// 全部定义，按上一次加载的插入顺序
    pub fn all(&self) -> Vec<Arc<CommandDefinition>> {
        self.snapshot().entries.clone()
    }

    pub fn size(&self) -> usize {
        self.snapshot().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// 用构建好的目录整体替换当前内容，返回新的条目数
    pub fn publish(&self, builder: CacheBuilder) -> usize {
        let snapshot = Arc::new(builder.snapshot);
        let size = snapshot.entries.len();
        *self.current.write() = snapshot;
        size
    }

    /// 清空缓存
    pub fn clear(&self) {
        *self.current.write() = Arc::new(CacheSnapshot::default());
    }

    pub fn stats(&self) -> CacheStats {
        let snapshot = self.snapshot();
        CacheStats {
            total_entries: snapshot.entries.len(),
            container_bytes: snapshot.entries.iter().map(|d| d.container.len()).sum(),
        }
    }

    fn snapshot(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&self.current.read())
    }
}
