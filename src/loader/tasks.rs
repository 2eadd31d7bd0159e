use std::cell::RefCell;
use std::collections::VecDeque;

use futures::channel::oneshot;

type Task = Box<dyn FnOnce()>;

/// FIFO of deferred work drained a few items per frame, keeping expensive
/// decode steps from landing in a single frame.
#[derive(Default)]
pub struct TaskScheduler
{
        queue: RefCell<VecDeque<Task>>,
}

impl std::fmt::Debug for TaskScheduler
{
        fn fmt(
                &self,
                f: &mut std::fmt::Formatter<'_>,
        ) -> std::fmt::Result
        {
                f.debug_struct("TaskScheduler").field("pending", &self.pending()).finish()
        }
}

impl TaskScheduler
{
        pub fn new() -> Self
        {
                Self::default()
        }

        pub fn enqueue_task<F>(
                &self,
                task: F,
        ) where
                F: FnOnce() + 'static,
        {
                self.queue.borrow_mut().push_back(Box::new(task));
        }

        /// Queues `task` and returns a receiver for its result.
        ///
        /// Dropping the scheduler with the task still queued cancels the
        /// receiver.
        pub fn schedule<T, F>(
                &self,
                task: F,
        ) -> oneshot::Receiver<T>
        where
                T: 'static,
                F: FnOnce() -> T + 'static,
        {
                let (tx, rx) = oneshot::channel();

                self.enqueue_task(move || {
                        let _ = tx.send(task());
                });

                rx
        }

        /// Runs up to `budget` tasks and returns how many ran.
        pub fn run(
                &self,
                budget: usize,
        ) -> usize
        {
                let mut ran = 0;

                while ran < budget
                {
                        // Popped separately so a task may enqueue more work.
                        let task = self.queue.borrow_mut().pop_front();

                        match task
                        {
                                Some(task) =>
                                {
                                        task();
                                        ran += 1;
                                }
                                None => break,
                        }
                }

                ran
        }

        pub fn pending(&self) -> usize
        {
                self.queue.borrow().len()
        }
}

#[cfg(test)]
mod tests
{
        use std::rc::Rc;

        use super::*;

        #[test]
        fn runs_in_fifo_order_within_budget()
        {
                let tasks = TaskScheduler::new();
                let log = Rc::new(RefCell::new(Vec::new()));

                for i in 0..3
                {
                        let log = log.clone();
                        tasks.enqueue_task(move || log.borrow_mut().push(i));
                }

                assert_eq!(tasks.run(2), 2);
                assert_eq!(*log.borrow(), vec![0, 1]);
                assert_eq!(tasks.pending(), 1);

                assert_eq!(tasks.run(5), 1);
                assert_eq!(*log.borrow(), vec![0, 1, 2]);
        }

        #[test]
        fn scheduled_result_arrives_after_run()
        {
                let tasks = TaskScheduler::new();
                let mut result = tasks.schedule(|| 6 * 7);

                assert_eq!(result.try_recv(), Ok(None));
                tasks.run(1);
                assert_eq!(result.try_recv(), Ok(Some(42)));
        }

        #[test]
        fn task_may_enqueue_follow_up_work()
        {
                let tasks = Rc::new(TaskScheduler::new());
                let handle = tasks.clone();

                tasks.enqueue_task(move || handle.enqueue_task(|| {}));

                assert_eq!(tasks.run(1), 1);
                assert_eq!(tasks.pending(), 1);
        }
}
