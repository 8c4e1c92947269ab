/// Runs a cleanup closure when dropped, including during a panic unwind.
///
/// Used to put the terminal back into cooked mode however the chat view ends.
///
/// # Examples
///
/// ```
/// use cadmium::utils::context::Context;
///
/// let mut restored = false;
/// {
///     let _guard = Context::with(|| restored = true);
/// }
/// assert!(restored);
/// ```
pub struct Context<AtExit: FnOnce()> {
    exit_cb: Option<AtExit>,
}

impl<F: FnOnce()> Context<F> {
    pub fn with(f: F) -> Self {
        Self { exit_cb: Some(f) }
    }
}

impl<F: FnOnce()> Drop for Context<F> {
    fn drop(&mut self) {
        if let Some(f) = self.exit_cb.take() {
            f()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_runs_on_drop() {
        let ran = Cell::new(0);
        {
            let _guard = Context::with(|| ran.set(ran.get() + 1));
        }
        assert_eq!(ran.get(), 1);
    }

    #[test]
    fn test_runs_on_unwind() {
        let ran = Cell::new(false);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = Context::with(|| ran.set(true));
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(ran.get());
    }
}
