//! Hook Table
//!
//! Contains:
//! - `HookTable` - ordered before/after lists keyed by method name
//! - `MethodMatcher` - selects method names by regex pattern

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use super::types::{HookFn, Phase};

/// Matches method names by pattern
pub struct MethodMatcher {
    /// Regex pattern to match method names (None = match all)
    pattern: Option<Regex>,
}

impl MethodMatcher {
    /// Create a matcher that matches every method
    pub fn any() -> Self {
        Self { pattern: None }
    }

    /// Create a matcher with a regex pattern
    ///
    /// Pattern examples:
    /// - `"save"` - any method containing `save`
    /// - `"^(save|remove)$"` - exactly `save` or `remove`
    /// - `"^find"` - every finder
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Some(Regex::new(pattern)?),
        })
    }

    /// Check if this matcher applies to a method name
    pub fn matches(&self, method: &str) -> bool {
        match &self.pattern {
            Some(regex) => regex.is_match(method),
            None => true,
        }
    }
}

impl std::fmt::Debug for MethodMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodMatcher")
            .field("pattern", &self.pattern.as_ref().map(|r| r.as_str()))
            .finish()
    }
}

struct Lists<H> {
    before: Vec<HookFn<H>>,
    after: Vec<HookFn<H>>,
}

impl<H> Default for Lists<H> {
    fn default() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
        }
    }
}

impl<H> Lists<H> {
    fn get(&self, phase: Phase) -> &Vec<HookFn<H>> {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        }
    }

    fn get_mut(&mut self, phase: Phase) -> &mut Vec<HookFn<H>> {
        match phase {
            Phase::Before => &mut self.before,
            Phase::After => &mut self.after,
        }
    }
}

/// Ordered hook lists per method name
///
/// Insertion order is execution order. Lists are created on first
/// registration for a method.
///
/// # Example
///
/// ```ignore
/// let mut table = HookTable::new();
/// let audit = HookFn::new(|_host, _values, next| next.pass());
///
/// table.register(Phase::Before, "save", audit.clone());
/// assert_eq!(table.hook_count(Phase::Before, "save"), 1);
///
/// table.remove(Phase::Before, "save", Some(&audit));
/// assert!(!table.has_hooks(Phase::Before, "save"));
/// ```
pub struct HookTable<H> {
    entries: HashMap<String, Lists<H>>,
}

impl<H> HookTable<H> {
    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Append a hook to the `phase` list of `method`
    pub fn register(&mut self, phase: Phase, method: &str, hook: HookFn<H>) -> &mut Self {
        self.entries
            .entry(method.to_string())
            .or_default()
            .get_mut(phase)
            .push(hook);
        self
    }

    /// Remove hooks from the `phase` list of `method`
    ///
    /// With `Some(hook)`, removes the first entry sharing its identity and
    /// leaves other entries untouched. With `None`, clears the whole list.
    /// Returns the number of entries removed.
    pub fn remove(&mut self, phase: Phase, method: &str, hook: Option<&HookFn<H>>) -> usize {
        let Some(lists) = self.entries.get_mut(method) else {
            return 0;
        };
        let list = lists.get_mut(phase);

        match hook {
            Some(hook) => match list.iter().position(|h| h.same(hook)) {
                Some(pos) => {
                    list.remove(pos);
                    1
                }
                None => 0,
            },
            None => {
                let removed = list.len();
                list.clear();
                removed
            }
        }
    }

    /// Ordered hooks of the `phase` list of `method`
    pub fn list(&self, phase: Phase, method: &str) -> &[HookFn<H>] {
        self.entries
            .get(method)
            .map(|lists| lists.get(phase).as_slice())
            .unwrap_or(&[])
    }

    /// Copy both lists of `method` for one chain run
    pub fn snapshot(&self, method: &str) -> (Arc<[HookFn<H>]>, Arc<[HookFn<H>]>) {
        (
            self.list(Phase::Before, method).into(),
            self.list(Phase::After, method).into(),
        )
    }

    /// Check if there are any hooks in a list
    pub fn has_hooks(&self, phase: Phase, method: &str) -> bool {
        !self.list(phase, method).is_empty()
    }

    /// Get the number of hooks in a list
    pub fn hook_count(&self, phase: Phase, method: &str) -> usize {
        self.list(phase, method).len()
    }

    /// Drop both lists of `method`
    pub fn clear(&mut self, method: &str) {
        self.entries.remove(method);
    }
}

impl<H> Default for HookTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for HookTable<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (method, lists) in &self.entries {
            map.entry(
                method,
                &format!("before: {}, after: {}", lists.before.len(), lists.after.len()),
            );
        }
        map.finish()
    }
}
