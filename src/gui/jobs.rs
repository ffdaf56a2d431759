// jobs.rs — 后台任务的串行化
// 同一时刻最多一个获取/设置任务。手动操作在忙时被拒绝（按钮置灰），
// 定时触发在忙时排队，等当前任务结束后再执行。

#[derive(Debug, Default)]
pub struct JobGate {
    busy: bool,
    scheduled_pending: bool,
}

impl JobGate {
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn has_pending(&self) -> bool {
        self.scheduled_pending
    }

    /// 手动操作：空闲时占用并返回 true，忙时返回 false
    pub fn try_start(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// 定时触发：空闲时立即占用并返回 true；忙时记为待执行并返回 false。
    /// 多次排队的触发合并为一次。
    pub fn on_scheduled(&mut self) -> bool {
        if self.try_start() {
            return true;
        }
        self.scheduled_pending = true;
        false
    }

    /// 当前任务结束。若有排队的定时触发，保持占用并返回 true，调用方应立即执行它
    pub fn finish(&mut self) -> bool {
        if self.scheduled_pending {
            self.scheduled_pending = false;
            self.busy = true;
            return true;
        }
        self.busy = false;
        false
    }
}
