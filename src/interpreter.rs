use tracing::{debug, trace};

use crate::comments::strip_comments;
use crate::env::Environment;
use crate::error::{ErrorKind, RuleError};
use crate::lexer::{Scanner, Word};
use crate::sink::{LogSink, NoopSink};
use crate::substitute::substitute;
use crate::validator::{self, EvalError};

/// Interpreter settings.
pub struct Config<'s> {
    sink: Box<dyn LogSink + 's>,
    log_substitution: bool,
}

impl<'s> Config<'s> {
    pub fn new() -> Self {
        Config {
            sink: Box::new(NoopSink),
            log_substitution: false,
        }
    }

    /// Where `log` statements go.
    pub fn with_sink(mut self, sink: impl LogSink + 's) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Expand `$(...)` references in `log` words before they are sent.
    pub fn with_log_substitution(mut self, enabled: bool) -> Self {
        self.log_substitution = enabled;
        self
    }
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `script` against `env` with the default configuration.
///
/// Mutations made before a failing statement are kept.
pub fn parse(env: &mut Environment<'_>, script: &[u8]) -> Result<(), RuleError> {
    Interpreter::new(Config::default()).run(env, script)
}

pub struct Interpreter<'s> {
    config: Config<'s>,
}

impl<'s> Interpreter<'s> {
    pub fn new(config: Config<'s>) -> Self {
        Interpreter { config }
    }

    /// Execute a whole script, stopping at the first error.
    pub fn run(&mut self, env: &mut Environment<'_>, script: &[u8]) -> Result<(), RuleError> {
        let script = strip_comments(script);
        let mut run = Run {
            scanner: Scanner::new(&script),
            frames: Frames::new(),
            env,
            config: &mut self.config,
        };
        run.execute()
    }
}

/// Per-depth block state.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Statements at this depth take effect.
    active: bool,
    /// Whether the next `{` opened at this depth runs.
    next: bool,
    /// Some branch of the current if-chain at this depth has matched.
    matched: bool,
}

impl Frame {
    fn new(active: bool) -> Self {
        Frame {
            active,
            next: true,
            matched: false,
        }
    }
}

struct Frames {
    stack: Vec<Frame>,
}

impl Frames {
    fn new() -> Self {
        Frames {
            stack: vec![Frame::new(true)],
        }
    }

    fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn active(&self) -> bool {
        self.stack.last().is_some_and(|f| f.active)
    }

    fn open(&mut self) {
        let top = self.top();
        let child = Frame::new(top.active && top.next);
        self.stack.push(child);
    }

    fn close(&mut self) -> bool {
        if self.stack.len() == 1 {
            return false;
        }
        self.stack.pop();
        true
    }
}

struct Run<'r, 'e, 's> {
    scanner: Scanner<'r>,
    frames: Frames,
    env: &'r mut Environment<'e>,
    config: &'r mut Config<'s>,
}

impl Run<'_, '_, '_> {
    fn execute(&mut self) -> Result<(), RuleError> {
        while let Some(word) = self.scanner.next_word() {
            trace!(line = word.line, word = %word.text, active = self.frames.active(), "statement");
            match word.text.as_str() {
                "" => {}
                "if" | "elseif" => self.condition(&word)?,
                "else" => self.otherwise(),
                "{" => {
                    self.frames.open();
                    debug!(depth = self.frames.depth(), active = self.frames.active(), "enter block");
                }
                "}" => {
                    if !self.frames.close() {
                        return Err(RuleError::syntax(
                            "unexpected '}' without matching '{'",
                            word.line,
                        ));
                    }
                    debug!(depth = self.frames.depth(), "leave block");
                }
                "var" => self.declare(&word)?,
                "log" => self.log(&word)?,
                _ => self.assignment(&word)?,
            }
        }

        if self.frames.depth() != 0 {
            return Err(RuleError::syntax(
                format!("{} block(s) left open at end of script", self.frames.depth()),
                self.scanner.line(),
            ));
        }
        Ok(())
    }

    /// Next word as an operand of `keyword`; end of input is a syntax error.
    fn operand(&mut self, keyword: &Word, what: &str, ordinal: &str) -> Result<String, RuleError> {
        match self.scanner.next_word() {
            Some(word) => Ok(word.text),
            None => Err(RuleError::syntax(
                format!(
                    "expected {what} as {ordinal} parameter to '{}'",
                    keyword.text
                ),
                keyword.line,
            )),
        }
    }

    fn expand(&mut self, keyword: &Word, word: &str) -> Result<String, RuleError> {
        substitute(self.env, word).into_result().map_err(|err| {
            RuleError::access(
                format_args!("error parsing value '{word}' of '{}'", keyword.text),
                &err,
                keyword.line,
            )
        })
    }

    /// `if` / `elseif`: value validator value.
    fn condition(&mut self, keyword: &Word) -> Result<(), RuleError> {
        let p1 = self.operand(keyword, "value", "1st")?;
        let validator = self.operand(keyword, "validator", "2nd")?;
        let p2 = self.operand(keyword, "value", "3rd")?;

        if !self.frames.active() {
            self.frames.top().next = false;
            return Ok(());
        }

        let is_if = keyword.text == "if";
        if is_if {
            self.frames.top().matched = false;
        } else if self.frames.top().matched {
            self.frames.top().next = false;
            return Ok(());
        }

        let p1 = self.expand(keyword, &p1)?;
        let p2 = self.expand(keyword, &p2)?;
        let result = validator::eval(&p1, &validator, &p2)
            .map_err(|err| eval_error(keyword, &err))?;
        trace!(line = keyword.line, %p1, %validator, %p2, result, "condition");

        let frame = self.frames.top();
        frame.next = result;
        frame.matched |= result;
        Ok(())
    }

    /// `else`: runs when nothing earlier in the chain matched.
    fn otherwise(&mut self) {
        let active = self.frames.active();
        let frame = self.frames.top();
        if !active {
            frame.next = false;
            return;
        }
        frame.next = !frame.matched;
        frame.matched = true;
    }

    /// `var name value`
    fn declare(&mut self, keyword: &Word) -> Result<(), RuleError> {
        let name = self.operand(keyword, "resource variable", "1st")?;
        let value = self.operand(keyword, "set variable", "2nd")?;
        if !self.frames.active() {
            return Ok(());
        }
        self.frames.top().next = true;

        if self.env.contains(&name) {
            return Err(RuleError::syntax(
                format!("variable resource with the name '{name}' already exists"),
                keyword.line,
            ));
        }
        trace!(line = keyword.line, %name, %value, "declare");
        self.env.insert_owned(name, value);
        Ok(())
    }

    /// `log word`
    fn log(&mut self, keyword: &Word) -> Result<(), RuleError> {
        let message = self.operand(keyword, "string", "1st")?;
        if !self.frames.active() {
            return Ok(());
        }
        self.frames.top().next = true;

        let message = if self.config.log_substitution {
            self.expand(keyword, &message)?
        } else {
            message
        };
        self.config.sink.log(keyword.line, &message);
        Ok(())
    }

    /// `path = value`, `path unset`, `path replace_regex pattern replacement`
    fn assignment(&mut self, target: &Word) -> Result<(), RuleError> {
        let path = target.text.as_str();
        // Variables declared in a skipped block never exist, so an unknown
        // bare word there is only rejected once its operator gives it away.
        let known = self.env.contains(path) || path.contains('.');
        if !known && self.frames.active() {
            return Err(unexpected_item(target));
        }

        let operator = self.operand(target, "operator", "1st")?;
        match operator.as_str() {
            "=" => {
                let value = self.operand(target, "value", "2nd")?;
                if !self.active_statement() {
                    return Ok(());
                }
                let value = self.expand(target, &value)?;
                trace!(line = target.line, path, %value, "assign");
                self.env.write(path, &value).map_err(|err| {
                    RuleError::access(
                        format_args!("error modifying '{path}' to '{value}'"),
                        &err,
                        target.line,
                    )
                })
            }
            "unset" => {
                if !self.active_statement() {
                    return Ok(());
                }
                trace!(line = target.line, path, "unset");
                self.env.clear(path).map_err(|err| {
                    RuleError::access(format_args!("error unsetting '{path}'"), &err, target.line)
                })
            }
            "replace_regex" => {
                let pattern = self.operand(target, "pattern", "2nd")?;
                let replacement = self.operand(target, "replacement", "3rd")?;
                if !self.active_statement() {
                    return Ok(());
                }
                self.replace_regex(target, &pattern, &replacement)
            }
            _ if !known => Err(unexpected_item(target)),
            other => Err(RuleError::new(
                ErrorKind::Validator,
                format!("unknown operator '{other}' after variable '{path}'"),
                target.line,
            )),
        }
    }

    fn replace_regex(
        &mut self,
        target: &Word,
        pattern: &str,
        replacement: &str,
    ) -> Result<(), RuleError> {
        let path = target.text.as_str();
        let re = validator::compile(pattern).map_err(|err| eval_error(target, &err))?;
        let replacement = self.expand(target, replacement)?;
        let current = self.env.read(path).map_err(|err| {
            RuleError::access(format_args!("error reading '{path}'"), &err, target.line)
        })?;
        let current = current.to_string();
        let updated = re.replace_all(&current, replacement.as_str());
        trace!(line = target.line, path, %current, %updated, "replace_regex");
        self.env.write(path, &updated).map_err(|err| {
            RuleError::access(
                format_args!("error modifying '{path}' to '{updated}'"),
                &err,
                target.line,
            )
        })
    }

    /// Whether a plain statement applies; it also lets a following bare block run.
    fn active_statement(&mut self) -> bool {
        if !self.frames.active() {
            return false;
        }
        self.frames.top().next = true;
        true
    }
}

fn unexpected_item(word: &Word) -> RuleError {
    RuleError::syntax(
        format!(
            "unexpected item in script logic. '{}' does not make sense",
            word.text
        ),
        word.line,
    )
}

fn eval_error(keyword: &Word, err: &EvalError) -> RuleError {
    RuleError::new(
        err.kind(),
        format!("failed to validate '{}': {err}", keyword.text),
        keyword.line,
    )
}
