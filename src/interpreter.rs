// ABOUTME: The embedding surface — a reusable interpreter instance wrapping a root Context

use crate::context::Context;
use crate::error::EvalOutcome;
use crate::value::Value;
use tracing::{debug, info, warn};

/// One running instance of the interpreter: a root `Context` with the
/// bootstrap library loaded into it. Mirrors the teacher's `main.rs`
/// environment-setup sequence (`Environment::new()` + `register_builtins` +
/// stdlib module loading), packaged as a reusable struct instead of an
/// ad hoc startup routine (spec.md §6).
pub struct Interpreter {
    ctx: Context,
    output_sink: Option<Box<dyn FnMut(&str)>>,
}

impl Interpreter {
    /// Creates a fresh interpreter with built-ins registered and the
    /// bootstrap library loaded. Bootstrap failures indicate a bug in the
    /// bundled library itself, not user input, so they panic rather than
    /// surfacing as an `EvalOutcome`.
    pub fn new() -> Self {
        let ctx = Context::new_root();
        crate::stdlib::bootstrap(&ctx).expect("bundled bootstrap library failed to load");
        info!("bootstrap library loaded");
        Interpreter {
            ctx,
            output_sink: None,
        }
    }

    /// Creates an interpreter with only the built-in special forms and
    /// dotted built-ins registered, skipping the bundled bootstrap library.
    pub fn bare() -> Self {
        debug!("creating interpreter without the bootstrap library");
        Interpreter {
            ctx: Context::new_root(),
            output_sink: None,
        }
    }

    /// Discards all user-defined state and reloads a fresh bootstrap
    /// library, as if a new `Interpreter` had been created.
    pub fn reset(&mut self) {
        let ctx = Context::new_root();
        crate::stdlib::bootstrap(&ctx).expect("bundled bootstrap library failed to load");
        info!("interpreter state reset, bootstrap library reloaded");
        self.ctx = ctx;
    }

    /// Installs a custom output sink for `.print`, replacing the default
    /// (stdout). Takes effect on the next `evaluate` call.
    pub fn set_output_sink(&mut self, sink: Box<dyn FnMut(&str)>) {
        self.output_sink = Some(sink);
    }

    /// Lexes, parses, reader-macro-expands, and evaluates one source
    /// string containing one or more top-level forms, returning the value
    /// of the last form evaluated (or the first failure encountered).
    pub fn evaluate(&mut self, source: &str) -> EvalOutcome {
        if let Some(sink) = self.output_sink.take() {
            crate::builtins::set_output_sink(sink);
        }
        crate::builtins::set_current_context(self.ctx.clone());

        let tokens = match crate::lexer::lex(source) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "lex failure");
                return EvalOutcome::ReadFailure(e);
            }
        };
        let forms = match crate::parser::parse_all(&tokens, &self.ctx) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "parse failure");
                return EvalOutcome::ReadFailure(e);
            }
        };

        let mut result = Value::Nil;
        for form in &forms {
            let expanded = match crate::reader_macro::expand(form, &self.ctx) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "reader macro expansion failure");
                    return EvalOutcome::ReadFailure(e);
                }
            };
            match crate::eval::eval(&expanded, &self.ctx) {
                Ok(Value::Recur(_)) => {
                    warn!("recur escaped to top level outside a loop or fn");
                    return EvalOutcome::EvalFailure(crate::error::EvalError::RecurMisuse);
                }
                Ok(v) => result = v,
                Err(e) => {
                    debug!(error = %e, "eval failure");
                    return EvalOutcome::EvalFailure(e);
                }
            }
        }
        EvalOutcome::Success(result)
    }

    /// Renders a value the way the REPL prints results, using this
    /// interpreter's own interner for symbol/keyword names.
    pub fn display(&self, value: &Value) -> String {
        format!("{}", crate::value::Printer { value, ctx: &self.ctx })
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
