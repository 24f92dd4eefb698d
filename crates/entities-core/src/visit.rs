//! Identity-keyed path tracking for walks over shared value graphs.

/// Addresses of the shared handles (entities and containers) on the current
/// walk, innermost last.
///
/// Walks over two graphs at once, like equality, track address pairs.
#[derive(Debug)]
pub(crate) struct VisitPath<A = usize> {
    stack: Vec<A>,
}

impl<A> Default for VisitPath<A> {
    fn default() -> Self {
        Self { stack: Vec::new() }
    }
}

impl<A: PartialEq> VisitPath<A> {
    /// Run `f` with `addr` pushed onto the path.
    ///
    /// Returns `None` without calling `f` when `addr` is already on the path.
    pub(crate) fn within<R>(&mut self, addr: A, f: impl FnOnce(&mut Self) -> R) -> Option<R> {
        if self.stack.contains(&addr) {
            return None;
        }

        self.stack.push(addr);
        let result = f(self);
        self.stack.pop();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_detects_revisit() {
        let mut path = VisitPath::default();

        let outer = path.within(1, |path| {
            let inner = path.within(2, |path| path.within(1, |_| ()));
            assert_eq!(inner, Some(None));
            "done"
        });

        assert_eq!(outer, Some("done"));
        assert!(path.stack.is_empty());
    }
}
