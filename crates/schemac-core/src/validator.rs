use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::compile::eval::{Cursor, Evaluator};
use crate::compile::ir::Node;
use crate::report::ValidationErrors;

struct Program {
    root: Node,
    procs: Vec<Node>,
    all_errors: bool,
}

/// A compiled schema.
///
/// Cloning is cheap; clones share the compiled program. Every call reports
/// only its own errors, so a validator can be used from many threads at once.
#[derive(Clone)]
pub struct ValidateFunction {
    program: Arc<Program>,
}

impl ValidateFunction {
    pub(crate) fn new(root: Node, procs: Vec<Node>, all_errors: bool) -> Self {
        Self {
            program: Arc::new(Program {
                root,
                procs,
                all_errors,
            }),
        }
    }

    /// Validate `data`, returning every recorded violation on failure.
    ///
    /// In fail-fast mode (the default) at most one error is returned.
    pub fn validate(&self, data: &Value) -> Result<(), ValidationErrors> {
        let program = &*self.program;
        let mut evaluator = Evaluator::new(&program.procs, program.all_errors);
        if evaluator.run(&program.root, &Cursor::root(data)) {
            return Ok(());
        }
        Err(ValidationErrors(evaluator.finish()))
    }

    /// Pass/fail only; stops at the first violation regardless of mode.
    pub fn is_valid(&self, data: &Value) -> bool {
        let program = &*self.program;
        Evaluator::new(&program.procs, false).run(&program.root, &Cursor::root(data))
    }
}

impl fmt::Debug for ValidateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateFunction")
            .field("root", &self.program.root)
            .field("procs", &self.program.procs.len())
            .field("all_errors", &self.program.all_errors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn validators_are_shareable() {
        assert_send_sync::<ValidateFunction>();
    }

    #[test]
    fn empty_program_accepts_everything() {
        let validator = ValidateFunction::new(Node::Pass, Vec::new(), true);
        assert!(validator.validate(&serde_json::json!([1, "two"])).is_ok());
        assert!(validator.is_valid(&Value::Null));
    }
}
