//! `parley calc` — Evaluate an expression with the calculator tool.

use parley_tools::calculator;

/// One line describing the outcome: the value, or the error kind and reason.
fn describe(expression: &str) -> String {
    match calculator::evaluate(expression) {
        Ok(value) => calculator::format_value(value),
        Err(e) => format!("{}: {e}", e.kind()),
    }
}

pub fn run(expression: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", describe(expression));
    Ok(())
}
