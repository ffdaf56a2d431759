// window.rs — 主窗口的显示状态
// 只有两个状态：可见，或隐藏（最小化）。隐藏不是终态，任何切换都不影响获取和定时逻辑。

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    #[default]
    Visible,
    Hidden,
}

impl WindowState {
    /// 关闭或最小化：Visible → Hidden，返回是否发生了切换
    pub fn hide(&mut self) -> bool {
        let changed = *self == WindowState::Visible;
        *self = WindowState::Hidden;
        changed
    }

    /// 从托盘恢复：Hidden → Visible，返回是否发生了切换
    pub fn restore(&mut self) -> bool {
        let changed = *self == WindowState::Hidden;
        *self = WindowState::Visible;
        changed
    }

    pub fn is_hidden(&self) -> bool {
        *self == WindowState::Hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hide_then_restore() {
        let mut state = WindowState::default();
        assert!(state.hide());
        assert!(state.is_hidden());
        assert!(state.restore());
        assert_eq!(state, WindowState::Visible);
    }

    #[test]
    fn repeated_transitions_are_noops() {
        let mut state = WindowState::Hidden;
        assert!(!state.hide());
        assert!(state.is_hidden());

        let mut state = WindowState::Visible;
        assert!(!state.restore());
        assert!(!state.is_hidden());
    }
}
