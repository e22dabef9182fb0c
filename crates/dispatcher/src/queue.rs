use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use scheduler_core::{SharedTask, TaskPriority};

/// 任务进入队列的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QueueOrigin {
    /// 从Worker回收的未完成任务
    Requeued,
    /// 新调度的任务
    Fresh,
}

#[derive(Debug)]
struct QueuedTask {
    priority: TaskPriority,
    origin: QueueOrigin,
    seq: u64,
    task: SharedTask,
}

impl QueuedTask {
    fn key(&self) -> (TaskPriority, QueueOrigin, u64) {
        (self.priority, self.origin, self.seq)
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// 调度器的待分配任务队列
///
/// 出队顺序：优先级（HIGH 最先），同优先级下回收的任务先于新任务，
/// 其余按首次入队顺序。
///
/// 任务的入队序号在首次入队时分配，回收后重新入队沿用原序号，
/// 因此对同一批任务反复分发得到相同的出队顺序。
#[derive(Debug, Default)]
pub struct PriorityTaskQueue {
    heap: BinaryHeap<Reverse<QueuedTask>>,
    next_seq: u64,
    /// 任务ID -> 首次入队序号
    arrivals: HashMap<String, u64>,
}

impl PriorityTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_fresh(&mut self, task: SharedTask) {
        self.push(task, QueueOrigin::Fresh);
    }

    pub fn push_requeued(&mut self, task: SharedTask) {
        self.push(task, QueueOrigin::Requeued);
    }

    /// 入队。已见过的任务沿用首次入队序号，新任务分配新序号
    pub fn push(&mut self, task: SharedTask, origin: QueueOrigin) {
        let next_seq = &mut self.next_seq;
        let seq = *self.arrivals.entry(task.id().to_string()).or_insert_with(|| {
            let seq = *next_seq;
            *next_seq += 1;
            seq
        });
        self.heap.push(Reverse(QueuedTask {
            priority: task.priority(),
            origin,
            seq,
            task,
        }));
    }

    pub fn pop(&mut self) -> Option<SharedTask> {
        self.heap.pop().map(|Reverse(entry)| entry.task)
    }

    pub fn peek(&self) -> Option<&SharedTask> {
        self.heap.peek().map(|Reverse(entry)| &entry.task)
    }

    /// 任务执行结束后丢弃其入队序号，同ID的任务再次提交时重新排队
    pub fn forget(&mut self, task_id: &str) {
        self.arrivals.remove(task_id);
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
