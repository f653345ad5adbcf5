//! Setup/teardown hook stack.
//!
//! Two ordered lists of (before, after) pairs: batch-scoped and
//! request-scoped. The stack tracks exactly how many before hooks completed
//! so that, on any exit, only their matching after hooks run, in reverse
//! order. A before hook failing partway leaves later hooks untouched.

use gqx_core::{BatchError, Context};
use std::sync::Arc;

/// A hook running once around the whole batch.
pub trait BatchHook: Send + Sync {
    /// Name shown in hook failure errors.
    fn name(&self) -> &str;

    /// Runs before any request executes.
    fn before(&self) -> Result<(), String> {
        Ok(())
    }

    /// Runs after the batch finishes, only if `before` completed.
    fn after(&self) {}
}

/// A hook running around each request of the batch.
pub trait RequestHook: Send + Sync {
    /// Name shown in hook failure errors.
    fn name(&self) -> &str;

    /// Runs before the request executes.
    fn before(&self, _ctx: &mut Context) -> Result<(), String> {
        Ok(())
    }

    /// Runs after the request finishes, only if `before` completed.
    fn after(&self, _ctx: &mut Context) {}
}

/// How far setup got; teardown unwinds exactly this much.
#[derive(Debug, Clone, Default)]
pub struct SetupProgress {
    pub batch_completed: usize,
    pub request_completed: Vec<usize>,
}

/// The ordered hook lists shared by one coordinator.
#[derive(Default)]
pub struct HookStack {
    batch: Vec<Arc<dyn BatchHook>>,
    request: Vec<Arc<dyn RequestHook>>,
}

impl HookStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a batch-scoped hook.
    pub fn add_batch_hook(&mut self, hook: Arc<dyn BatchHook>) {
        self.batch.push(hook);
    }

    /// Appends a request-scoped hook.
    pub fn add_request_hook(&mut self, hook: Arc<dyn RequestHook>) {
        self.request.push(hook);
    }

    /// Runs every before hook in order: batch hooks first, then each
    /// request's hooks.
    ///
    /// On failure the returned progress still reflects the completed
    /// prefix, so teardown unwinds only what actually ran.
    pub fn setup(&self, contexts: &mut [Context]) -> (SetupProgress, Option<BatchError>) {
        let mut progress = SetupProgress {
            batch_completed: 0,
            request_completed: vec![0; contexts.len()],
        };

        for hook in &self.batch {
            if let Err(reason) = hook.before() {
                let error = BatchError::Hook {
                    name: hook.name().to_string(),
                    reason,
                };
                return (progress, Some(error));
            }
            progress.batch_completed += 1;
        }

        for (index, ctx) in contexts.iter_mut().enumerate() {
            for hook in &self.request {
                if let Err(reason) = hook.before(ctx) {
                    let error = BatchError::Hook {
                        name: hook.name().to_string(),
                        reason,
                    };
                    return (progress, Some(error));
                }
                progress.request_completed[index] += 1;
            }
        }

        (progress, None)
    }

    /// Unwinds one request's completed before hooks, in reverse order.
    pub fn request_teardown(&self, completed: usize, ctx: &mut Context) {
        for hook in self.request[..completed].iter().rev() {
            hook.after(ctx);
        }
    }

    /// Unwinds the completed batch hooks, in reverse order. Runs after all
    /// request teardowns.
    pub fn batch_teardown(&self, completed: usize) {
        for hook in self.batch[..completed].iter().rev() {
            hook.after();
        }
    }
}

impl std::fmt::Debug for HookStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookStack")
            .field("batch", &self.batch.len())
            .field("request", &self.request.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        label: String,
        fail_before: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recording {
        fn new(label: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                label: label.to_string(),
                fail_before: false,
                log: Arc::clone(log),
            })
        }

        fn failing(label: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                label: label.to_string(),
                fail_before: true,
                log: Arc::clone(log),
            })
        }

        fn record(&self, phase: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, phase));
        }
    }

    impl BatchHook for Recording {
        fn name(&self) -> &str {
            &self.label
        }

        fn before(&self) -> Result<(), String> {
            self.record("before");
            if self.fail_before {
                return Err("refused".to_string());
            }
            Ok(())
        }

        fn after(&self) {
            self.record("after");
        }
    }

    impl RequestHook for Recording {
        fn name(&self) -> &str {
            &self.label
        }

        fn before(&self, _ctx: &mut Context) -> Result<(), String> {
            self.record("before");
            if self.fail_before {
                return Err("refused".to_string());
            }
            Ok(())
        }

        fn after(&self, _ctx: &mut Context) {
            self.record("after");
        }
    }

    #[test]
    fn test_full_setup_and_teardown_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = HookStack::new();
        stack.add_batch_hook(Recording::new("b1", &log));
        stack.add_batch_hook(Recording::new("b2", &log));
        stack.add_request_hook(Recording::new("r1", &log));
        stack.add_request_hook(Recording::new("r2", &log));

        let mut contexts = vec![Context::new()];
        let (progress, error) = stack.setup(&mut contexts);
        assert!(error.is_none());

        stack.request_teardown(progress.request_completed[0], &mut contexts[0]);
        stack.batch_teardown(progress.batch_completed);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "b1:before", "b2:before", "r1:before", "r2:before",
                "r2:after", "r1:after", "b2:after", "b1:after",
            ]
        );
    }

    #[test]
    fn test_failing_kth_hook_unwinds_first_k_minus_one() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = HookStack::new();
        stack.add_request_hook(Recording::new("r1", &log));
        stack.add_request_hook(Recording::new("r2", &log));
        stack.add_request_hook(Recording::failing("r3", &log));
        stack.add_request_hook(Recording::new("r4", &log));

        let mut contexts = vec![Context::new()];
        let (progress, error) = stack.setup(&mut contexts);
        assert!(matches!(error, Some(BatchError::Hook { ref name, .. }) if name == "r3"));
        assert_eq!(progress.request_completed[0], 2);

        stack.request_teardown(progress.request_completed[0], &mut contexts[0]);
        stack.batch_teardown(progress.batch_completed);

        // r3's before ran and failed; only r1/r2 unwind, r4 never starts.
        assert_eq!(
            *log.lock().unwrap(),
            vec!["r1:before", "r2:before", "r3:before", "r2:after", "r1:after"]
        );
    }

    #[test]
    fn test_failing_batch_hook_skips_request_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = HookStack::new();
        stack.add_batch_hook(Recording::failing("b1", &log));
        stack.add_request_hook(Recording::new("r1", &log));

        let mut contexts = vec![Context::new(), Context::new()];
        let (progress, error) = stack.setup(&mut contexts);
        assert!(error.is_some());
        assert_eq!(progress.batch_completed, 0);
        assert_eq!(progress.request_completed, vec![0, 0]);

        for (index, ctx) in contexts.iter_mut().enumerate() {
            stack.request_teardown(progress.request_completed[index], ctx);
        }
        stack.batch_teardown(progress.batch_completed);

        assert_eq!(*log.lock().unwrap(), vec!["b1:before"]);
    }

    #[test]
    fn test_second_request_failure_keeps_first_request_progress() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = HookStack::new();
        stack.add_request_hook(Recording::new("r1", &log));

        // Fail by making the hook refuse only on the second context.
        struct SecondFails {
            calls: Mutex<usize>,
        }
        impl RequestHook for SecondFails {
            fn name(&self) -> &str {
                "second_fails"
            }
            fn before(&self, _ctx: &mut Context) -> Result<(), String> {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                if *calls == 2 {
                    Err("second".to_string())
                } else {
                    Ok(())
                }
            }
        }
        stack.add_request_hook(Arc::new(SecondFails {
            calls: Mutex::new(0),
        }));

        let mut contexts = vec![Context::new(), Context::new()];
        let (progress, error) = stack.setup(&mut contexts);
        assert!(error.is_some());
        assert_eq!(progress.request_completed, vec![2, 1]);
    }
}
