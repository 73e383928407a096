//! Hookable host
//!
//! Owns the shared context, the operations defined on it and their hook
//! tables. Registering the first hook for an operation installs the chain
//! engine around it; the operation itself is never modified.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::config::HookConfig;
use crate::chain::{self, Chain, Done};
use crate::core::{HookError, HookResult, Outcome};
use crate::hooks::{HookFn, HookTable, MethodMatcher, Operation, Phase};

/// An operation slot on the host
enum Method<H> {
    /// Not hooked yet; calls go straight to the operation
    Plain(Operation<H>),
    /// Wrapped by the chain engine around the captured original
    Installed(Operation<H>),
}

impl<H> Method<H> {
    fn is_installed(&self) -> bool {
        matches!(self, Method::Installed(_))
    }
}

/// A host whose operations can be wrapped with before and after hooks
///
/// # Example
///
/// ```ignore
/// let mut store = Hookable::new(Mutex::new(Vec::new()));
/// store.define("save", Operation::new(|_store, args, done| done.ok(args)))?;
///
/// store.before("save", HookFn::new(|_store, mut args, next| {
///     args.push(json!("stamped"));
///     next.replace(args)
/// }))?;
///
/// let outcome = store.call_async("save", vec![json!("doc")]).await?;
/// assert_eq!(outcome.values, vec![json!("doc"), json!("stamped")]);
/// ```
pub struct Hookable<H> {
    /// Shared context every hook and operation receives
    context: Arc<H>,

    /// Operations keyed by name
    methods: HashMap<String, Method<H>>,

    /// Before/after hook lists keyed by name
    table: HookTable<H>,

    config: HookConfig,
}

impl<H: Send + Sync + 'static> Hookable<H> {
    /// Create a host around a context with the default configuration
    pub fn new(context: H) -> Self {
        Self::with_config(context, HookConfig::default())
    }

    /// Create a host around a context
    pub fn with_config(context: H, config: HookConfig) -> Self {
        Self::from_arc(Arc::new(context), config)
    }

    /// Create a host around an already shared context
    pub fn from_arc(context: Arc<H>, config: HookConfig) -> Self {
        Self {
            context,
            methods: HashMap::new(),
            table: HookTable::new(),
            config,
        }
    }

    /// Shared context
    pub fn context(&self) -> &Arc<H> {
        &self.context
    }

    /// Host configuration
    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    /// Hook lists of every operation
    pub fn table(&self) -> &HookTable<H> {
        &self.table
    }

    /// Names of all defined operations, sorted
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Define an operation under `name`
    ///
    /// Fails once `name` is installed, since the wrapper already captured the
    /// operation it runs.
    pub fn define(&mut self, name: &str, operation: Operation<H>) -> HookResult<&mut Self> {
        if self.is_installed(name) {
            return Err(HookError::AlreadyInstalled(name.to_string()));
        }
        tracing::debug!(host = %self.config.label, "[Hookable] Defining operation: {}", name);
        self.methods
            .insert(name.to_string(), Method::Plain(operation));
        Ok(self)
    }

    /// Define an operation and install the chain engine around it
    pub fn hook(&mut self, name: &str, operation: Operation<H>) -> HookResult<&mut Self> {
        self.define(name, operation)?;
        self.install(name)?;
        Ok(self)
    }

    /// Install the chain engine around `name`
    ///
    /// Idempotent: returns `Ok(true)` when the wrapper was installed by this
    /// call and `Ok(false)` when it already was.
    pub fn install(&mut self, name: &str) -> HookResult<bool> {
        let method = self
            .methods
            .remove(name)
            .ok_or_else(|| HookError::NotCallable(name.to_string()))?;

        let (method, installed_now) = match method {
            Method::Plain(original) => (Method::Installed(original), true),
            installed @ Method::Installed(_) => (installed, false),
        };
        self.methods.insert(name.to_string(), method);

        if installed_now {
            tracing::info!(host = %self.config.label, "[Hookable] Installed hooks around '{}'", name);
        }
        Ok(installed_now)
    }

    /// Check whether the chain engine wraps `name`
    pub fn is_installed(&self, name: &str) -> bool {
        self.methods
            .get(name)
            .map(Method::is_installed)
            .unwrap_or(false)
    }

    /// Add a hook that runs before `name`
    pub fn before(&mut self, name: &str, hook: HookFn<H>) -> HookResult<&mut Self> {
        self.register(Phase::Before, name, hook)
    }

    /// Add a hook that runs after `name` completes
    pub fn after(&mut self, name: &str, hook: HookFn<H>) -> HookResult<&mut Self> {
        self.register(Phase::After, name, hook)
    }

    /// Install `name` if needed, then append `hook` to its `phase` list
    pub fn register(&mut self, phase: Phase, name: &str, hook: HookFn<H>) -> HookResult<&mut Self> {
        self.install(name)?;
        self.table.register(phase, name, hook);

        if self.config.log_registrations {
            tracing::info!(
                host = %self.config.label,
                "[Hookable] Registered {} hook #{} on '{}'",
                phase,
                self.table.hook_count(phase, name),
                name
            );
        }
        Ok(self)
    }

    /// Add a before-hook to every defined operation whose name matches `pattern`
    ///
    /// Returns the number of operations the hook was added to.
    pub fn before_matching(&mut self, pattern: &str, hook: HookFn<H>) -> HookResult<usize> {
        self.register_matching(Phase::Before, pattern, hook)
    }

    /// Add an after-hook to every defined operation whose name matches `pattern`
    pub fn after_matching(&mut self, pattern: &str, hook: HookFn<H>) -> HookResult<usize> {
        self.register_matching(Phase::After, pattern, hook)
    }

    fn register_matching(&mut self, phase: Phase, pattern: &str, hook: HookFn<H>) -> HookResult<usize> {
        let matcher = MethodMatcher::new(pattern)?;
        let names: Vec<String> = self
            .methods()
            .into_iter()
            .filter(|name| matcher.matches(name))
            .map(str::to_string)
            .collect();

        for name in &names {
            self.register(phase, name, hook.clone())?;
        }
        Ok(names.len())
    }

    /// Remove one before-hook of `name` (by identity), or all of them with `None`
    ///
    /// Returns the number of hooks removed.
    pub fn remove_before(&mut self, name: &str, hook: Option<&HookFn<H>>) -> usize {
        self.unregister(Phase::Before, name, hook)
    }

    /// Remove one after-hook of `name` (by identity), or all of them with `None`
    pub fn remove_after(&mut self, name: &str, hook: Option<&HookFn<H>>) -> usize {
        self.unregister(Phase::After, name, hook)
    }

    fn unregister(&mut self, phase: Phase, name: &str, hook: Option<&HookFn<H>>) -> usize {
        let removed = self.table.remove(phase, name, hook);
        if self.config.log_registrations {
            tracing::info!(
                host = %self.config.label,
                "[Hookable] Removed {} {} hook(s) from '{}'",
                removed,
                phase,
                name
            );
        }
        removed
    }

    /// Check if `name` has any hooks in a phase
    pub fn has_hooks(&self, phase: Phase, name: &str) -> bool {
        self.table.has_hooks(phase, name)
    }

    /// Get the number of hooks `name` has in a phase
    pub fn hook_count(&self, phase: Phase, name: &str) -> usize {
        self.table.hook_count(phase, name)
    }

    /// Call the operation `name`
    ///
    /// `receiver` gets exactly one [`Outcome`]: the error that stopped the call,
    /// or the values left after the after-hooks ran. It may be invoked on
    /// another thread if a hook resumes its chain from there.
    ///
    /// Returns `Err` only for configuration errors, which never reach
    /// `receiver`.
    pub fn call<F>(&self, name: &str, args: Vec<Value>, receiver: F) -> HookResult<()>
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        match self.methods.get(name) {
            None => Err(HookError::NotCallable(name.to_string())),
            Some(Method::Plain(operation)) => {
                let done = Done::new(move |outcome| {
                    receiver(outcome);
                    Ok(())
                });
                operation.invoke(&self.context, args, done)
            }
            Some(Method::Installed(original)) => {
                let (before, after) = self.table.snapshot(name);
                let chain = Chain::new(
                    name,
                    Arc::clone(&self.context),
                    original.clone(),
                    before,
                    after,
                    args,
                    Box::new(receiver),
                    self.config.trace_transitions,
                );
                chain::run(chain)
            }
        }
    }

    /// Call the operation `name` and wait for its outcome
    ///
    /// Fails with [`HookError::Stalled`] if the chain can never deliver because
    /// every pending continuation was dropped.
    pub async fn call_async(&self, name: &str, args: Vec<Value>) -> HookResult<Outcome> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.call(name, args, move |outcome| {
            let _ = tx.send(outcome);
        })?;
        rx.await.map_err(|_| HookError::Stalled(name.to_string()))
    }
}

impl<H> std::fmt::Debug for Hookable<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let methods: HashMap<&str, bool> = self
            .methods
            .iter()
            .map(|(name, method)| (name.as_str(), method.is_installed()))
            .collect();
        f.debug_struct("Hookable")
            .field("label", &self.config.label)
            .field("installed", &methods)
            .field("hooks", &self.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::hooks::{AsyncHook, Flow};

    type Journal = Mutex<Vec<String>>;

    fn record(host: &Arc<Journal>, entry: impl Into<String>) {
        host.lock().unwrap().push(entry.into());
    }

    fn journal(host: &Hookable<Journal>) -> Vec<String> {
        host.context().lock().unwrap().clone()
    }

    /// `save(foo, bar)` succeeds with `("bar", bar + 1)` when `foo == "foo"`
    fn store() -> Hookable<Journal> {
        let mut host = Hookable::new(Mutex::new(Vec::new()));
        host.define(
            "save",
            Operation::new(|host, args, done| {
                record(host, "save");
                let foo = args.first().and_then(Value::as_str).unwrap_or_default();
                let bar = args.get(1).and_then(Value::as_i64).unwrap_or_default();
                if foo == "foo" {
                    done.ok(vec![json!("bar"), json!(bar + 1)])
                } else {
                    done.fail(anyhow::anyhow!("unexpected foo: {}", foo))
                }
            }),
        )
        .unwrap();
        host
    }

    fn capture() -> (impl FnOnce(Outcome) + Send + 'static, mpsc::Receiver<Outcome>) {
        let (tx, rx) = mpsc::channel();
        (move |outcome: Outcome| tx.send(outcome).unwrap(), rx)
    }

    /// Receive the single delivery and check no second one can arrive
    fn delivered(rx: mpsc::Receiver<Outcome>) -> Outcome {
        let outcome = rx.try_recv().expect("receiver was not called");
        assert!(rx.try_recv().is_err(), "receiver was called twice");
        outcome
    }

    fn tagging(tag: &'static str) -> HookFn<Journal> {
        HookFn::new(move |host, _values, next| {
            record(host, tag);
            next.pass()
        })
    }

    fn bump_second() -> HookFn<Journal> {
        HookFn::new(|host, mut values, next| {
            record(host, "bump");
            if let Some(n) = values.get(1).and_then(Value::as_i64) {
                values[1] = json!(n + 1);
            }
            next.replace(values)
        })
    }

    #[test]
    fn test_save_scenario() {
        let mut host = store();
        host.before("save", tagging("validate"))
            .unwrap()
            .after("save", bump_second())
            .unwrap();

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(0)], receiver).unwrap();
        let outcome = delivered(rx);
        assert!(!outcome.is_err());
        assert_eq!(outcome.values, vec![json!("bar"), json!(2)]);

        let (receiver, rx) = capture();
        host.call("save", vec![json!("baz"), json!(0)], receiver).unwrap();
        let outcome = delivered(rx);
        assert_eq!(
            outcome.into_result().unwrap_err().to_string(),
            "unexpected foo: baz"
        );

        // After-hook only ran for the successful call
        assert_eq!(
            journal(&host),
            vec!["validate", "save", "bump", "validate", "save"]
        );
    }

    #[test]
    fn test_before_override_reaches_target() {
        let mut host = store();
        host.before("save", bump_second()).unwrap();

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(0)], receiver).unwrap();
        assert_eq!(delivered(rx).values, vec![json!("bar"), json!(2)]);
    }

    #[test]
    fn test_hooks_run_in_registration_order() {
        let mut host = store();
        host.before("save", tagging("b0"))
            .unwrap()
            .before("save", tagging("b1"))
            .unwrap()
            .before("save", tagging("b2"))
            .unwrap()
            .after("save", tagging("a0"))
            .unwrap()
            .after("save", tagging("a1"))
            .unwrap();

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(0)], receiver).unwrap();
        delivered(rx);

        assert_eq!(journal(&host), vec!["b0", "b1", "b2", "save", "a0", "a1"]);
    }

    #[test]
    fn test_before_error_skips_rest() {
        let mut host = store();
        host.before("save", tagging("b0"))
            .unwrap()
            .before(
                "save",
                HookFn::new(|host, _values, next| {
                    record(host, "b1");
                    next.fail(anyhow::anyhow!("vetoed"))
                }),
            )
            .unwrap()
            .before("save", tagging("b2"))
            .unwrap()
            .after("save", tagging("a0"))
            .unwrap();

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(0)], receiver).unwrap();

        let outcome = delivered(rx);
        assert_eq!(outcome.error.unwrap().to_string(), "vetoed");
        assert!(outcome.values.is_empty());
        assert_eq!(journal(&host), vec!["b0", "b1"]);
    }

    #[test]
    fn test_target_error_skips_after_hooks() {
        let mut host = store();
        host.after("save", tagging("a0")).unwrap();

        let (receiver, rx) = capture();
        host.call("save", vec![json!("nope"), json!(0)], receiver).unwrap();

        assert!(delivered(rx).is_err());
        assert_eq!(journal(&host), vec!["save"]);
    }

    #[test]
    fn test_after_error_skips_rest() {
        let mut host = store();
        host.after("save", tagging("a0"))
            .unwrap()
            .after(
                "save",
                HookFn::from_flow(|host, _values| {
                    record(host, "a1");
                    Flow::abort(anyhow::anyhow!("rejected result"))
                }),
            )
            .unwrap()
            .after("save", tagging("a2"))
            .unwrap();

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(0)], receiver).unwrap();

        let outcome = delivered(rx);
        assert_eq!(outcome.error.unwrap().to_string(), "rejected result");
        assert!(outcome.values.is_empty());
        assert_eq!(journal(&host), vec!["save", "a0", "a1"]);
    }

    #[test]
    fn test_override_and_pass_through() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut host = Hookable::new(Mutex::new(Vec::<String>::new()));
        let target_seen = Arc::clone(&seen);
        host.define(
            "op",
            Operation::new(move |_host, args, done| {
                target_seen.lock().unwrap().push(args.clone());
                done.ok(args)
            }),
        )
        .unwrap();

        let second_seen = Arc::clone(&seen);
        host.before(
            "op",
            HookFn::new(|_host, _values, next| next.replace(vec![json!("a"), json!("b")])),
        )
        .unwrap()
        .before(
            "op",
            HookFn::new(move |_host, values, next| {
                second_seen.lock().unwrap().push(values);
                next.pass()
            }),
        )
        .unwrap()
        .before(
            "op",
            HookFn::new(|_host, _values, next| next.resume(None, vec![])),
        )
        .unwrap();

        let (receiver, rx) = capture();
        host.call("op", vec![json!(1), json!(2), json!(3)], receiver).unwrap();

        let expected = vec![json!("a"), json!("b")];
        assert_eq!(*seen.lock().unwrap(), vec![expected.clone(), expected.clone()]);
        assert_eq!(delivered(rx).values, expected);
    }

    #[test]
    fn test_after_hooks_can_grow_results() {
        let mut host = store();
        host.after(
            "save",
            HookFn::new(|_host, mut values, next| {
                values.push(json!("audited"));
                next.replace(values)
            }),
        )
        .unwrap()
        .after("save", tagging("a1"))
        .unwrap();

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(41)], receiver).unwrap();
        assert_eq!(
            delivered(rx).values,
            vec![json!("bar"), json!(42), json!("audited")]
        );
    }

    #[test]
    fn test_install_is_idempotent() {
        let mut host = store();
        assert!(!host.is_installed("save"));
        assert!(host.install("save").unwrap());
        assert!(!host.install("save").unwrap());

        for _ in 0..3 {
            host.before("save", tagging("b")).unwrap();
        }
        assert!(host.is_installed("save"));

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(0)], receiver).unwrap();
        delivered(rx);

        let saves = journal(&host).iter().filter(|e| *e == "save").count();
        assert_eq!(saves, 1);
    }

    #[test]
    fn test_install_unknown_operation_fails() {
        let mut host = store();
        let err = host.before("load", tagging("b")).unwrap_err();
        assert!(matches!(err, HookError::NotCallable(name) if name == "load"));
        assert!(!host.has_hooks(Phase::Before, "load"));
    }

    #[test]
    fn test_redefine_installed_operation_fails() {
        let mut host = store();
        host.define("save", Operation::new(|_host, args, done| done.ok(args)))
            .unwrap();
        host.install("save").unwrap();

        let err = host
            .define("save", Operation::new(|_host, args, done| done.ok(args)))
            .unwrap_err();
        assert!(matches!(err, HookError::AlreadyInstalled(_)));
    }

    #[test]
    fn test_call_unknown_operation() {
        let host = store();
        let (receiver, rx) = capture();
        let err = host.call("load", vec![], receiver).unwrap_err();
        assert!(matches!(err, HookError::NotCallable(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_plain_call_without_hooks() {
        let host = store();
        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(5)], receiver).unwrap();
        assert_eq!(delivered(rx).values, vec![json!("bar"), json!(6)]);
    }

    #[test]
    fn test_removal() {
        let mut host = store();
        let keep = tagging("keep");
        let dropped = tagging("drop");
        host.before("save", keep.clone())
            .unwrap()
            .before("save", dropped.clone())
            .unwrap()
            .after("save", tagging("a0"))
            .unwrap();

        assert_eq!(host.remove_before("save", Some(&dropped)), 1);
        assert_eq!(host.remove_after("save", None), 1);

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(0)], receiver).unwrap();
        delivered(rx);
        assert_eq!(journal(&host), vec!["keep", "save"]);

        assert_eq!(host.remove_before("save", None), 1);
        assert!(!host.has_hooks(Phase::Before, "save"));
        assert!(host.is_installed("save"));
    }

    #[test]
    fn test_zero_arity_hook_is_fatal() {
        let mut host = store();
        host.before("save", tagging("b0"))
            .unwrap()
            .before("save", HookFn::with_params(0, |_host, _values, _next| Ok(())))
            .unwrap();

        let (receiver, rx) = capture();
        let err = host
            .call("save", vec![json!("foo"), json!(0)], receiver)
            .unwrap_err();

        assert!(matches!(
            err,
            HookError::MissingContinuation { phase: Phase::Before, index: 1, .. }
        ));
        assert!(rx.try_recv().is_err());
        assert_eq!(journal(&host), vec!["b0"]);
    }

    #[test]
    fn test_zero_arity_after_hook_is_fatal() {
        let mut host = store();
        host.after("save", HookFn::with_params(0, |_host, _values, next| next.pass()))
            .unwrap();

        let (receiver, _rx) = capture();
        let err = host
            .call("save", vec![json!("foo"), json!(0)], receiver)
            .unwrap_err();
        assert!(matches!(
            err,
            HookError::MissingContinuation { phase: Phase::After, index: 0, .. }
        ));
        assert_eq!(journal(&host), vec!["save"]);
    }

    #[test]
    fn test_register_matching() {
        let mut host = store();
        host.define("saveAll", Operation::new(|_host, args, done| done.ok(args)))
            .unwrap()
            .define("find", Operation::new(|_host, args, done| done.ok(args)))
            .unwrap();

        assert_eq!(host.before_matching("^save", tagging("b")).unwrap(), 2);
        assert_eq!(host.after_matching("^find$", tagging("a")).unwrap(), 1);
        assert!(host.is_installed("saveAll"));
        assert!(host.is_installed("find"));
        assert!(host.before_matching("(", tagging("b")).is_err());
    }

    #[test]
    fn test_long_synchronous_chain() {
        let mut host = store();
        let hook = HookFn::new(|_host, values, next| next.replace(values));
        for _ in 0..50_000 {
            host.table.register(Phase::Before, "save", hook.clone());
        }
        host.install("save").unwrap();

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(0)], receiver).unwrap();
        assert_eq!(delivered(rx).values, vec![json!("bar"), json!(1)]);
    }

    #[test]
    fn test_hook_resumed_from_another_thread() {
        let mut host = store();
        host.before(
            "save",
            HookFn::new(|_host, values, next| {
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(20));
                    let mut values = values;
                    values[1] = json!(10);
                    next.replace(values)
                });
                Ok(())
            }),
        )
        .unwrap()
        .after("save", tagging("a0"))
        .unwrap();

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(0)], receiver).unwrap();

        let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.values, vec![json!("bar"), json!(11)]);
        assert_eq!(journal(&host), vec!["save", "a0"]);
    }

    #[test]
    fn test_host_context_is_shared() {
        let mut host = Hookable::new(AtomicUsize::new(0));
        host.define(
            "count",
            Operation::new(|counter: &Arc<AtomicUsize>, _args, done| {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                done.ok(vec![json!(n)])
            }),
        )
        .unwrap();
        let bump = HookFn::new(|counter: &Arc<AtomicUsize>, _values, next| {
            counter.fetch_add(10, Ordering::SeqCst);
            next.pass()
        });
        host.before("count", bump.clone())
            .unwrap()
            .after("count", bump)
            .unwrap();

        let (tx, rx) = mpsc::channel();
        host.call("count", vec![], move |outcome| tx.send(outcome).unwrap())
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().values, vec![json!(11)]);
        assert_eq!(host.context().load(Ordering::SeqCst), 21);
    }

    struct SlowApproval;

    #[async_trait]
    impl AsyncHook<Journal> for SlowApproval {
        async fn call(&self, host: Arc<Journal>, values: Vec<Value>) -> Flow {
            tokio::time::sleep(Duration::from_millis(10)).await;
            record(&host, "approved");
            match values.first().and_then(Value::as_str) {
                Some("foo") => Flow::Pass,
                _ => Flow::abort(anyhow::anyhow!("not approved")),
            }
        }
    }

    #[tokio::test]
    async fn test_async_hook_with_call_async() {
        let mut host = store();
        host.before("save", HookFn::from_async(SlowApproval))
            .unwrap()
            .after("save", bump_second())
            .unwrap();

        let outcome = host
            .call_async("save", vec![json!("foo"), json!(0)])
            .await
            .unwrap();
        assert_eq!(outcome.values, vec![json!("bar"), json!(2)]);

        let outcome = host
            .call_async("save", vec![json!("baz"), json!(0)])
            .await
            .unwrap();
        assert_eq!(outcome.error.unwrap().to_string(), "not approved");

        assert_eq!(journal(&host), vec!["approved", "save", "bump", "approved"]);
    }

    #[tokio::test]
    async fn test_dropped_continuation_stalls() {
        let mut host = store();
        host.before("save", HookFn::new(|_host, _values, next| {
            drop(next);
            Ok(())
        }))
        .unwrap();

        let err = host
            .call_async("save", vec![json!("foo"), json!(0)])
            .await
            .unwrap_err();
        assert!(matches!(err, HookError::Stalled(name) if name == "save"));
        assert!(journal(&host).is_empty());
    }

    #[test]
    fn test_async_hook_outside_runtime_stalls() {
        let mut host = store();
        host.before("save", HookFn::from_async(SlowApproval)).unwrap();

        let (receiver, rx) = capture();
        host.call("save", vec![json!("foo"), json!(0)], receiver).unwrap();

        assert!(rx.try_recv().is_err());
        assert!(journal(&host).is_empty());
    }

    #[test]
    fn test_many_chains_resumed_from_threads() {
        let mut host = Hookable::new(());
        host.define(
            "scale",
            Operation::new(|_host: &Arc<()>, args, done| {
                std::thread::spawn(move || {
                    let n = args.first().and_then(Value::as_i64).unwrap_or_default();
                    let _ = done.ok(vec![json!(n * 10)]);
                });
                Ok(())
            }),
        )
        .unwrap();

        let increment_later = HookFn::new(|_host: &Arc<()>, values, next| {
            std::thread::spawn(move || {
                let n = values.first().and_then(Value::as_i64).unwrap_or_default();
                let _ = next.replace(vec![json!(n + 1)]);
            });
            Ok(())
        });
        let increment = HookFn::new(|_host: &Arc<()>, values, next| {
            let n = values.first().and_then(Value::as_i64).unwrap_or_default();
            next.replace(vec![json!(n + 1)])
        });
        for _ in 0..5 {
            host.before("scale", increment_later.clone())
                .unwrap()
                .after("scale", increment.clone())
                .unwrap();
        }

        let (tx, rx) = mpsc::channel();
        for _ in 0..200 {
            let tx = tx.clone();
            host.call("scale", vec![json!(0)], move |outcome: Outcome| {
                tx.send(outcome.values).unwrap()
            })
            .unwrap();
        }
        drop(tx);

        for _ in 0..200 {
            let values = rx.recv_timeout(Duration::from_secs(10)).unwrap();
            assert_eq!(values, vec![json!(55)]);
        }
        assert!(rx.recv_timeout(Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_debug_output() {
        let mut host = store();
        host.before("save", tagging("b")).unwrap();
        let debug = format!("{:?}", host);
        assert!(debug.contains("save"));
        assert!(debug.contains("before: 1"));
    }
}
