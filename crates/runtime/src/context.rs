//! Injected execution-context capability.
//!
//! Hosts that must marshal notification delivery onto a particular thread
//! (typically a UI dispatcher) implement [`ExecutionContext`]; everything
//! else uses [`NoopExecutionContext`], which runs work inline. The server is
//! never coupled to a concrete toolkit.

pub trait ExecutionContext: Send + Sync + 'static {
	fn post(&self, work: Box<dyn FnOnce() + Send>);
}

/// Runs posted work immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExecutionContext;

impl ExecutionContext for NoopExecutionContext {
	fn post(&self, work: Box<dyn FnOnce() + Send>) {
		work();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicBool, Ordering};
	use std::sync::Arc;

	#[test]
	fn noop_context_runs_inline() {
		let ran = Arc::new(AtomicBool::new(false));
		let flag = Arc::clone(&ran);
		NoopExecutionContext.post(Box::new(move || flag.store(true, Ordering::SeqCst)));
		assert!(ran.load(Ordering::SeqCst));
	}
}
