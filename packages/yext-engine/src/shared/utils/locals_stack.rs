//! Locals stack for template calls
//!
//! Each `$this.<path>(k=v, ...)` call pushes a frame; `$local.<alias>`
//! lookups search frames most-recent first.

use serde_yaml::Value;

use crate::shared::models::Params;

#[derive(Debug, Clone, Default)]
pub struct LocalsStack {
    frames: Vec<Params>,
}

impl LocalsStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new frame
    pub fn push(&mut self, frame: Params) {
        self.frames.push(frame);
    }

    /// Pop the current frame
    pub fn pop(&mut self) -> Option<Params> {
        self.frames.pop()
    }

    /// Look a local up, innermost frame first
    pub fn lookup(&self, alias: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(alias))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Execute a closure with `frame` pushed; the frame is popped afterwards.
    pub fn with_frame<F, R>(&mut self, frame: Params, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.push(frame);
        let result = f(self);
        self.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_prefers_innermost_frame() {
        let mut stack = LocalsStack::new();
        stack.push(Params::from_pairs([("name", "outer"), ("only_outer", "x")]));
        stack.push(Params::from_pairs([("name", "inner")]));

        assert_eq!(stack.lookup("name"), Some(&Value::from("inner")));
        assert_eq!(stack.lookup("only_outer"), Some(&Value::from("x")));
        assert_eq!(stack.lookup("missing"), None);
    }

    #[test]
    fn test_with_frame_pops() {
        let mut stack = LocalsStack::new();
        let seen = stack.with_frame(Params::from_pairs([("a", 1)]), |s| {
            assert_eq!(s.depth(), 1);
            s.lookup("a").cloned()
        });
        assert_eq!(seen, Some(Value::from(1)));
        assert!(stack.is_empty());
    }
}
