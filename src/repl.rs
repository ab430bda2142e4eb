// File: src/repl.rs
//
// Interactive REPL for writing and analyzing candidates.
// Provides an interactive shell with:
// - Multi-line input support for functions, loops, and control structures
// - Command history with up/down arrow navigation
// - Definitions (func, let) collected into a candidate that :analyze measures
// - Special commands (:help, :analyze, :policy, :json, :source, :quit)

use crate::analysis::{estimate_complexity, Reporter};
use crate::ast::Stmt;
use crate::config::{ClassifierKind, Config, SamplerPolicy};
use crate::errors::AnalysisError;
use crate::interpreter::{Interpreter, Limits, Value};
use crate::parser;
use crate::sandbox::{run_on_worker, Sandbox};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fs;
use std::time::Instant;

/// REPL session that maintains interpreter state and the candidate under construction
pub struct Repl {
    interpreter: Interpreter,
    editor: DefaultEditor,
    config: Config,
    /// Definitions entered so far; this is what :analyze compiles
    source: String,
    json: bool,
}

impl Repl {
    pub fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let editor = DefaultEditor::new()?;
        Ok(Repl {
            interpreter: Self::fresh_interpreter(&config),
            editor,
            config,
            source: String::new(),
            json: false,
        })
    }

    fn fresh_interpreter(config: &Config) -> Interpreter {
        Interpreter::with_limits(Limits {
            deadline: None,
            max_call_depth: config.max_call_depth,
            max_collection_len: config.max_collection_len,
        })
    }

    fn show_banner(&self) {
        println!("{}", "╔══════════════════════════════════════════════════════╗".bright_cyan());
        println!("{}", "║          ruff-bigo - complexity workbench            ║".bright_cyan());
        println!("{}", "╚══════════════════════════════════════════════════════╝".bright_cyan());
        println!();
        println!(
            "  {} Define {} and type {}",
            "Welcome!".bright_green(),
            format!("func {}(n) {{ ... }}", self.config.entry_point).bright_yellow(),
            ":analyze".bright_yellow()
        );
        println!("  {} Multi-line input: End with unclosed braces", "Tip:".bright_magenta());
        println!();
    }

    /// Starts the REPL loop
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                "bigo> ".bright_green().to_string()
            } else {
                "....> ".bright_blue().to_string()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    // Commands only count outside multi-line input
                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim()) {
                            continue;
                        } else {
                            break;
                        }
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if is_input_complete(&buffer) {
                        self.eval_input(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (Ctrl+C to interrupt, :quit to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "\nGoodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    eprintln!("{} {}", "Error:".bright_red(), err);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handles special REPL commands starting with ':'
    /// Returns true to continue REPL, false to quit
    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let arg = parts.next();

        match cmd {
            ":help" | ":h" => self.show_help(),
            ":quit" | ":q" | ":exit" => {
                println!("{}", "Goodbye!".bright_cyan());
                return false;
            }
            ":clear" | ":c" => {
                print!("\x1B[2J\x1B[1;1H");
                self.show_banner();
            }
            ":analyze" | ":a" => self.analyze(),
            ":policy" | ":p" => match arg.map(str::to_lowercase).as_deref() {
                Some("fixed") => self.set_policy(SamplerPolicy::Fixed),
                Some("adaptive") => self.set_policy(SamplerPolicy::Adaptive),
                Some("progressive") => self.set_policy(SamplerPolicy::Progressive),
                _ => println!(
                    "  policy: {:?} (choose fixed, adaptive or progressive)",
                    self.config.sampler_policy
                ),
            },
            ":classifier" => {
                match arg {
                    Some("exponent") => self.config.classifier = Some(ClassifierKind::Exponent),
                    Some("ratio") => self.config.classifier = Some(ClassifierKind::Ratio),
                    Some("auto") => self.config.classifier = None,
                    _ => {}
                }
                println!("  classifier: {:?}", self.config.classifier_kind());
            }
            ":json" => {
                self.json = !self.json;
                println!("  JSON output {}", if self.json { "on" } else { "off" });
            }
            ":source" | ":s" => {
                if self.source.is_empty() {
                    println!("  {}", "(no definitions yet)".dimmed());
                } else {
                    println!("{}", self.source.trim_end());
                }
            }
            ":load" | ":l" => match arg {
                Some(path) => self.load(path),
                None => println!("{} usage: :load <file>", "Error:".bright_red()),
            },
            ":vars" | ":v" => self.show_variables(),
            ":reset" | ":r" => {
                self.interpreter = Self::fresh_interpreter(&self.config);
                self.source.clear();
                println!("{}", "✓ Environment reset".bright_green());
            }
            _ => println!(
                "{} Unknown command: {}. Type {}{}{}",
                "Error:".bright_red(),
                cmd.bright_yellow(),
                ":".bright_blue(),
                "help".bright_yellow(),
                " for available commands.".bright_blue()
            ),
        }
        true
    }

    fn show_help(&self) {
        println!();
        println!("{}", "REPL Commands:".bright_cyan().bold());
        println!();
        println!("  {}{}  Estimate the complexity of the current candidate", ":analyze".bright_yellow(), " or :a     ".dimmed());
        println!("  {}{}  Show or set the sampler policy", ":policy".bright_yellow(), " or :p      ".dimmed());
        println!("  {}{}  Set exponent, ratio or auto", ":classifier".bright_yellow(), "          ".dimmed());
        println!("  {}{}  Toggle JSON reports", ":json".bright_yellow(), "                ".dimmed());
        println!("  {}{}  Show collected definitions", ":source".bright_yellow(), " or :s      ".dimmed());
        println!("  {}{}  Load definitions from a file", ":load".bright_yellow(), " or :l        ".dimmed());
        println!("  {}{}  Show defined variables and functions", ":vars".bright_yellow(), " or :v        ".dimmed());
        println!("  {}{}  Reset environment", ":reset".bright_yellow(), " or :r       ".dimmed());
        println!("  {}{}  Clear the screen", ":clear".bright_yellow(), " or :c       ".dimmed());
        println!("  {}{}  Exit the REPL", ":quit".bright_yellow(), " or :q        ".dimmed());
        println!();
        println!("{}", "Examples:".bright_cyan().bold());
        println!();
        println!("  {}", "bigo> func algoritmo(n) {".dimmed());
        println!("  {}", "....>     mut s := 0".dimmed());
        println!("  {}", "....>     for i in range(n) { s := s + i }".dimmed());
        println!("  {}", "....>     return s".dimmed());
        println!("  {}", "....> }".dimmed());
        println!("  {}", "bigo> algoritmo(100)".dimmed());
        println!("  {}", "bigo> :analyze".dimmed());
        println!();
    }

    fn show_variables(&self) {
        println!();
        println!("{}", "Defined Variables:".bright_cyan().bold());
        for name in self.interpreter.env().names() {
            if let Some(value) = self.interpreter.env().get(&name) {
                println!("  {} = {}", name.bright_yellow(), format_value(value));
            }
        }
        println!("{}", "Functions:".bright_cyan().bold());
        for name in self.interpreter.function_names() {
            println!("  {}", name.bright_yellow());
        }
        println!();
    }

    fn set_policy(&mut self, policy: SamplerPolicy) {
        self.config.sampler_policy = policy;
        println!("  policy: {:?}, classifier: {:?}", policy, self.config.classifier_kind());
    }

    fn load(&mut self, path: &str) {
        match fs::read_to_string(path) {
            Ok(text) => {
                self.eval_input(&text);
                println!("{} loaded {}", "✓".bright_green(), path);
            }
            Err(e) => println!("{} cannot read '{}': {}", "Error:".bright_red(), path, e),
        }
    }

    fn analyze(&self) {
        if self.source.trim().is_empty() {
            println!(
                "{} define {} first",
                "Error:".bright_red(),
                format!("func {}(n)", self.config.entry_point).bright_yellow()
            );
            return;
        }
        println!("{}", "Measuring...".dimmed());
        match estimate_complexity(&self.source, &self.config) {
            Ok(report) if self.json => match Reporter::to_json(&report) {
                Ok(text) => println!("{}", text),
                Err(err) => print_error(&err),
            },
            Ok(report) => Reporter::print(&report),
            Err(err) => print_error(&err),
        }
    }

    /// Evaluates input, echoing the value of a trailing expression.
    /// Inputs made only of definitions become part of the candidate source.
    fn eval_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }
        let stmts = match parser::parse_program(input) {
            Ok(stmts) => stmts,
            Err(err) => {
                print_error(&err.with_source_from(input));
                return;
            }
        };

        // Runaway input is cut off after the analysis budget
        let deadline = Instant::now() + self.config.global_budget();
        let interpreter = &mut self.interpreter;
        let result = run_on_worker(self.config.max_call_depth, || {
            interpreter.set_deadline(Some(deadline));
            let result = interpreter.eval_interactive(&stmts);
            interpreter.set_deadline(None);
            result
        });

        match result {
            Ok(value) => {
                if is_definition_only(&stmts) {
                    self.source.push_str(input.trim_end());
                    self.source.push('\n');
                    self.check_entry();
                }
                if let Some(value) = value {
                    println!("{} {}", "=>".bright_blue(), format_value(&value));
                }
            }
            Err(err) => print_error(&err.with_source_from(input)),
        }
    }

    /// Tells the user when the collected source already compiles as a candidate
    fn check_entry(&self) {
        if self.interpreter.function(&self.config.entry_point).is_none() {
            return;
        }
        match Sandbox::compile(&self.source, &self.config) {
            Ok(_) => println!(
                "  {} {} is ready for {}",
                "✓".bright_green(),
                self.config.entry_point.bright_yellow(),
                ":analyze".bright_yellow()
            ),
            Err(err) => print_error(&err),
        }
    }
}

fn is_definition_only(stmts: &[Stmt]) -> bool {
    stmts
        .iter()
        .all(|s| matches!(s, Stmt::FuncDef(_) | Stmt::Let { .. } | Stmt::Assign { .. }))
}

/// Checks if the input is syntactically complete
/// Returns true if all brackets/braces/parentheses are balanced
pub fn is_input_complete(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return true;
    }

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape_next = false;
    let mut in_comment = false;
    let mut prev = '\0';

    for ch in trimmed.chars() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            prev = ch;
            continue;
        }
        if escape_next {
            escape_next = false;
            prev = ch;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '#' if !in_string => in_comment = true,
            '/' if !in_string && prev == '/' => in_comment = true,
            '{' | '[' | '(' if !in_string => depth += 1,
            '}' | ']' | ')' if !in_string => depth -= 1,
            _ => {}
        }
        prev = ch;
    }

    !in_string && depth <= 0
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("\"{}\"", s).bright_green().to_string(),
        Value::Bool(b) => b.to_string().bright_magenta().to_string(),
        Value::Function(def) => format!("<func {}({})>", def.name, def.params.join(", ")).bright_cyan().to_string(),
        Value::Null => "null".dimmed().to_string(),
        other => other.to_string().bright_white().to_string(),
    }
}

fn print_error(err: &AnalysisError) {
    print!("{}", err);
}
