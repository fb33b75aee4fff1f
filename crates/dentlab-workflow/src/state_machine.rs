//! 工序状态机
//!
//! 单个工序只能沿 待处理 → 进行中 → 已完成 单向推进

use dentlab_core::{LabError, Result, StepStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 工序状态转换事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StepEvent {
    Start,
    Complete,
}

/// 工序状态机
#[derive(Debug)]
pub struct StepStateMachine {
    transitions: HashMap<(StepStatus, StepEvent), StepStatus>,
}

impl StepStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        transitions.insert((StepStatus::Pending, StepEvent::Start), StepStatus::InProgress);
        transitions.insert((StepStatus::InProgress, StepEvent::Complete), StepStatus::Completed);

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: StepStatus, event: StepEvent) -> bool {
        self.transitions.contains_key(&(from, event))
    }

    /// 执行状态转换
    pub fn transition(&self, from: StepStatus, event: StepEvent) -> Result<StepStatus> {
        match self.transitions.get(&(from, event)) {
            Some(to) => Ok(*to),
            None => Err(LabError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 获取状态的所有可能事件
    pub fn get_possible_events(&self, current: StepStatus) -> Vec<StepEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| *state == current)
            .map(|(_, event)| *event)
            .collect()
    }
}

impl Default for StepStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
