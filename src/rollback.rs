/// Stack of deferred cleanup actions.
///
/// Each acquisition during a multi-step construction registers how to undo
/// itself. If construction bails out early the stack unwinds in reverse order
/// when dropped; once everything succeeded, [`Rollback::disarm`] forgets the
/// actions.
pub(crate) struct Rollback<'a> {
    actions: Vec<Box<dyn FnOnce() + 'a>>,
}

impl<'a> Rollback<'a> {
    pub(crate) fn new() -> Self {
        Self { actions: Vec::new() }
    }

    pub(crate) fn defer(&mut self, action: impl FnOnce() + 'a) {
        self.actions.push(Box::new(action));
    }

    pub(crate) fn disarm(mut self) {
        self.actions.clear();
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        while let Some(action) = self.actions.pop() {
            action();
        }
    }
}
