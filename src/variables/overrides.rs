//! Context-local LIFO stack of temporary variable overrides.

use serde_json::Value;

#[derive(Debug, Clone)]
struct Frame {
    name: String,
    value: Value,
}

/// Ordered override frames plus the allow-external-set depth counter.
///
/// The stack is owned by one [`super::VariableStore`], never shared across
/// request contexts. Resolution scans from the top, so the most recently
/// pushed frame for a name wins.
#[derive(Debug, Default)]
pub(crate) struct OverrideStack {
    frames: Vec<Frame>,
    allow_set_depth: usize,
}

impl OverrideStack {
    pub(crate) fn get(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.name == name)
            .map(|frame| &frame.value)
    }

    /// Pushes a frame and returns the stack length before the push, which
    /// is the truncation point that undoes it.
    pub(crate) fn push(&mut self, name: &str, value: Value) -> usize {
        let depth = self.frames.len();
        self.frames.push(Frame { name: name.to_string(), value });
        depth
    }

    pub(crate) fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// Plain (non-scoped) write: replaces the topmost frame for `name` or
    /// pushes a new one.
    pub(crate) fn set(&mut self, name: &str, value: Value) {
        match self.frames.iter_mut().rev().find(|frame| frame.name == name) {
            Some(frame) => frame.value = value,
            None => {
                self.frames.push(Frame { name: name.to_string(), value });
            }
        }
    }

    /// Undoes the topmost frame for `name`, the stack analogue of the
    /// session's implicit reset on a default write.
    pub(crate) fn remove_topmost(&mut self, name: &str) {
        if let Some(idx) = self.frames.iter().rposition(|frame| frame.name == name) {
            self.frames.remove(idx);
        }
    }

    /// Removes every frame for `name`. Unsupported while a scoped guard
    /// for the same name is live; the guard truncates by depth.
    pub(crate) fn remove_all(&mut self, name: &str) {
        self.frames.retain(|frame| frame.name != name);
    }

    pub(crate) fn clear_frames(&mut self) {
        self.frames.clear();
    }

    pub(crate) fn allow_set(&self) -> bool {
        self.allow_set_depth > 0
    }

    pub(crate) fn enter_allow_set(&mut self) {
        self.allow_set_depth += 1;
    }

    pub(crate) fn exit_allow_set(&mut self) {
        self.allow_set_depth = self.allow_set_depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_topmost_frame_wins() {
        let mut stack = OverrideStack::default();
        stack.push("target_year", json!(2030));
        stack.push("target_year", json!(2025));
        assert_eq!(stack.get("target_year"), Some(&json!(2025)));
    }

    #[test]
    fn test_truncate_restores_enclosing_frame() {
        let mut stack = OverrideStack::default();
        let outer = stack.push("target_year", json!(2030));
        let inner = stack.push("target_year", json!(2025));

        stack.truncate(inner);
        assert_eq!(stack.get("target_year"), Some(&json!(2030)));
        stack.truncate(outer);
        assert_eq!(stack.get("target_year"), None);
    }

    #[test]
    fn test_set_replaces_topmost() {
        let mut stack = OverrideStack::default();
        stack.set("target_year", json!(2030));
        stack.set("target_year", json!(2025));
        assert_eq!(stack.get("target_year"), Some(&json!(2025)));
        stack.remove_topmost("target_year");
        assert_eq!(stack.get("target_year"), None);
    }

    #[test]
    fn test_allow_set_depth_nests() {
        let mut stack = OverrideStack::default();
        assert!(!stack.allow_set());
        stack.enter_allow_set();
        stack.enter_allow_set();
        stack.exit_allow_set();
        assert!(stack.allow_set());
        stack.exit_allow_set();
        assert!(!stack.allow_set());
    }
}
