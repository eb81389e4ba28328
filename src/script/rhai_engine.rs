use std::cell::RefCell;
use std::io::{Write, stdout};
use std::rc::Rc;

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use log::{debug, warn};
use rhai::{AST, Dynamic, Engine, Scope};

use super::{Evaluator, ScriptError};

/// Upper bound on operations per evaluation, so a runaway script errors out
/// instead of freezing the loop.
const MAX_OPERATIONS: u64 = 5_000_000;

/// Where `print`, `debug` and `clear_screen()` from scripts end up.
#[derive(Clone)]
pub enum Output {
    /// The controlling terminal. Lines end in `\r\n` so they stay aligned in
    /// raw mode.
    Terminal,
    /// In-memory lines; `clear_screen()` empties them.
    Capture(Rc<RefCell<Vec<String>>>),
}

impl Output {
    fn line(&self, text: &str) {
        match self {
            Output::Terminal => {
                let mut out = stdout().lock();
                let _ = write!(out, "{text}\r\n");
                let _ = out.flush();
            }
            Output::Capture(lines) => lines.borrow_mut().push(text.to_string()),
        }
    }

    fn clear(&self) {
        match self {
            Output::Terminal => {
                let _ = execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0));
            }
            Output::Capture(lines) => lines.borrow_mut().clear(),
        }
    }
}

/// Rhai-backed evaluator.
///
/// Top-level `let` bindings persist in one scope. Functions defined by any
/// evaluation are folded into a function library that later evaluations run
/// against, so the payload can call into the library and vice versa.
pub struct RhaiEvaluator {
    engine: Engine,
    scope: Scope<'static>,
    functions: AST,
    bootstrapped: bool,
}

impl RhaiEvaluator {
    pub fn new(output: Output) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(MAX_OPERATIONS);

        let print_out = output.clone();
        engine.on_print(move |text| print_out.line(text));
        let debug_out = output.clone();
        engine.on_debug(move |text, _source, pos| {
            debug!("script debug at {}: {}", pos, text);
            debug_out.line(text);
        });
        engine.register_fn("clear_screen", move || output.clear());

        Self {
            engine,
            scope: Scope::new(),
            functions: AST::empty(),
            bootstrapped: false,
        }
    }

    /// Compile `source` against the current scope and run it together with
    /// every function defined so far.
    fn run(&mut self, source: &str) -> Result<Dynamic, String> {
        let ast = self
            .engine
            .compile_with_scope(&self.scope, source)
            .map_err(|e| e.to_string())?;
        let program = self.functions.merge(&ast);
        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut self.scope, &program);
        // Definitions stay even if the statements failed part way.
        self.functions = self.functions.merge(&ast.clone_functions_only());
        result.map_err(|e| e.to_string())
    }
}

impl Evaluator for RhaiEvaluator {
    fn bootstrap(&mut self, library: &str, payload: &str) -> Result<(), ScriptError> {
        if self.bootstrapped {
            return Err(ScriptError::AlreadyBootstrapped);
        }
        self.bootstrapped = true;

        let library_result = self.run(library).map(|_| ()).map_err(ScriptError::Library);
        if let Err(e) = &library_result {
            warn!("{}; evaluating the payload anyway", e);
        }
        let payload_result = self.run(payload).map(|_| ()).map_err(ScriptError::Payload);
        library_result.and(payload_result)
    }

    fn eval(&mut self, source: &str) -> Result<String, ScriptError> {
        if !self.bootstrapped {
            return Err(ScriptError::NotBootstrapped);
        }
        let value = self.run(source).map_err(|message| ScriptError::Command {
            source: source.to_string(),
            message,
        })?;
        Ok(if value.is_unit() {
            String::new()
        } else {
            value.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::BOOT_LIBRARY;

    const TINY_GAME: &str = r#"
        fn setup() {
            this.title = "tiny";
            this.rows = 1;
            this.cols = 3;
            this.cells = [0, 1, 0];
        }
        fn step(dr, dc) {
            let i = 0;
            while this.cells[i] != 1 { i += 1; }
            i += dc;
            if i < 0 || i >= 3 { return false; }
            this.cells = [0, 0, 0];
            this.cells[i] = 1;
            true
        }
        fn glyph(v) { if v == 1 { "@" } else { "." } }
        board.reset();
    "#;

    fn captured() -> (RhaiEvaluator, Rc<RefCell<Vec<String>>>) {
        let lines = Rc::new(RefCell::new(Vec::new()));
        (RhaiEvaluator::new(Output::Capture(lines.clone())), lines)
    }

    #[test]
    fn test_eval_before_bootstrap_fails() {
        let (mut eval, _) = captured();
        assert_eq!(eval.eval("1 + 1"), Err(ScriptError::NotBootstrapped));
    }

    #[test]
    fn test_bootstrap_only_once() {
        let (mut eval, _) = captured();
        eval.bootstrap("", "").unwrap();
        assert_eq!(eval.bootstrap("", ""), Err(ScriptError::AlreadyBootstrapped));
    }

    #[test]
    fn test_bindings_and_functions_persist() {
        let (mut eval, _) = captured();
        eval.bootstrap("let total = 1; fn twice(x) { x * 2 }", "total += 1;")
            .unwrap();
        assert_eq!(eval.eval("twice(total)").unwrap(), "4");
        eval.eval("fn thrice(x) { x * 3 }").unwrap();
        assert_eq!(eval.eval("thrice(total)").unwrap(), "6");
    }

    #[test]
    fn test_unit_value_is_empty() {
        let (mut eval, _) = captured();
        eval.bootstrap("", "").unwrap();
        assert_eq!(eval.eval("let x = 3;").unwrap(), "");
    }

    #[test]
    fn test_library_evaluated_before_payload() {
        let (mut eval, _) = captured();
        eval.bootstrap("let order = [\"lib\"];", "order.push(\"payload\");")
            .unwrap();
        assert_eq!(eval.eval("order.len()").unwrap(), "2");
        assert_eq!(eval.eval("order[1]").unwrap(), "payload");
    }

    #[test]
    fn test_broken_library_still_runs_payload() {
        let (mut eval, _) = captured();
        let err = eval.bootstrap("let = ;", "let ready = true;").unwrap_err();
        assert!(matches!(err, ScriptError::Library(_)));
        assert_eq!(eval.eval("ready").unwrap(), "true");
    }

    #[test]
    fn test_broken_payload_reported() {
        let (mut eval, _) = captured();
        let err = eval.bootstrap("", "throw \"nope\";").unwrap_err();
        assert!(matches!(err, ScriptError::Payload(_)));
    }

    #[test]
    fn test_command_error_keeps_going() {
        let (mut eval, _) = captured();
        eval.bootstrap("let n = 1;", "").unwrap();
        let err = eval.eval("n += 1; no_such_fn();").unwrap_err();
        match err {
            ScriptError::Command { source, .. } => assert!(source.contains("no_such_fn")),
            other => panic!("unexpected {other:?}"),
        }
        // The statement before the failure already ran.
        assert_eq!(eval.eval("n").unwrap(), "2");
    }

    #[test]
    fn test_runaway_script_is_stopped() {
        let (mut eval, _) = captured();
        eval.bootstrap("", "").unwrap();
        assert!(eval.eval("loop { }").is_err());
        assert_eq!(eval.eval("40 + 2").unwrap(), "42");
    }

    #[test]
    fn test_board_library_drives_payload_methods() {
        let (mut eval, lines) = captured();
        eval.bootstrap(BOOT_LIBRARY, TINY_GAME).unwrap();

        eval.eval("board.render();").unwrap();
        assert_eq!(lines.borrow()[0], "tiny");
        assert_eq!(lines.borrow()[2], ".@.");

        eval.eval("board.update(\"e\"); board.render();").unwrap();
        assert_eq!(lines.borrow()[2], "..@");
        assert_eq!(eval.eval("board.moves").unwrap(), "1");

        // Blocked move does not count.
        eval.eval("board.update(\"e\");").unwrap();
        assert_eq!(eval.eval("board.moves").unwrap(), "1");

        eval.eval("board.reset(); board.render();").unwrap();
        assert_eq!(lines.borrow()[2], ".@.");
        assert_eq!(eval.eval("board.moves").unwrap(), "0");
    }

    #[test]
    fn test_unknown_direction_is_an_error() {
        let (mut eval, _) = captured();
        eval.bootstrap(BOOT_LIBRARY, TINY_GAME).unwrap();
        let err = eval.eval("board.update(\"x\");").unwrap_err();
        assert!(err.to_string().contains("unknown direction"), "{err}");
    }
}
