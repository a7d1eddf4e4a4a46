//! 解析上下文
//!
//! 记录当前正在解析的请求键链，用于运行期检测循环依赖和限制嵌套深度。

use infrastructure_common::{ConfigurationError, RequestKey};

/// 默认最大解析深度
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 100;

/// 解析上下文
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前解析链，用于检测循环依赖
    resolution_chain: Vec<RequestKey>,
    /// 最大递归深度
    max_depth: usize,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_RESOLUTION_DEPTH)
    }

    /// 指定最大深度
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            resolution_chain: Vec::new(),
            max_depth,
        }
    }

    /// 进入请求键的解析
    pub fn push_key(&mut self, key: &RequestKey) -> Result<(), ConfigurationError> {
        if self.resolution_chain.contains(key) {
            return Err(ConfigurationError::CyclicBinding {
                cycle: format!("{} -> {}", self.chain(), key),
            });
        }
        if self.resolution_chain.len() >= self.max_depth {
            return Err(ConfigurationError::MaxDepthExceeded {
                max_depth: self.max_depth,
                chain: self.chain(),
            });
        }
        self.resolution_chain.push(key.clone());
        Ok(())
    }

    /// 从解析链中移除最近的请求键
    pub fn pop_key(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    /// 解析链的文本形式
    pub fn chain(&self) -> String {
        self.resolution_chain
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new()
    }
}
