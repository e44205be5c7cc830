// ABOUTME: Version and welcome-message constants for the Lisp interpreter

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "Lisp Interpreter";
pub const WELCOME_SUBTITLE: &str = "A Clojure-flavored Lisp in Rust";

pub const HELP_TEXT: &str = r#"
Available commands:
  (quit) or (exit)     - Exit the REPL
  (help)               - Show this help message

Type any Lisp expression to evaluate it. Use Ctrl-D or (quit) to exit.
"#;
