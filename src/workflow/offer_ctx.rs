//! 活动处理上下文
//!
//! 封装"我正在处理第几个活动"这一信息

use std::fmt::Display;

/// 活动处理上下文
#[derive(Debug, Clone)]
pub struct OfferCtx {
    /// 活动ID
    pub activity_id: String,

    /// 活动在本次运行中的序号（从1开始，仅用于日志显示）
    pub offer_index: usize,

    /// 本次运行待评分的活动总数
    pub total: usize,
}

impl OfferCtx {
    pub fn new(activity_id: String, offer_index: usize, total: usize) -> Self {
        Self {
            activity_id,
            offer_index,
            total,
        }
    }
}

impl Display for OfferCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[活动 #{}/{} id={}]",
            self.offer_index, self.total, self.activity_id
        )
    }
}
