//! Arithmetic expression tool.

use super::{ParamSpec, Tool, ToolArgs};
use crate::error::ToolError;
use async_trait::async_trait;
use serde::Deserialize;

/// Deepest parenthesis nesting accepted before evaluation.
const MAX_NESTING: usize = 256;

/// Evaluates a single arithmetic expression.
pub struct CalculatorTool;

#[derive(Debug, Deserialize)]
struct CalculatorArgs {
    expression: String,
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Useful for performing math. Input is a string expression."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required_string(
            "expression",
            "The math to solve, e.g. '25 * 5'",
        )]
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let args: CalculatorArgs = args.parse()?;
        Ok(calculate(&args.expression))
    }
}

/// Evaluate an expression and format the outcome as tool output.
fn calculate(expression: &str) -> String {
    match evaluate(expression) {
        Ok(value) => format_number(value),
        Err(CalcError::Parse(msg)) => format!("Error parsing expression: {}", msg),
        Err(CalcError::Eval(msg)) => format!("Error calculating: {}", msg),
    }
}

/// Shortest round-trip form; integral values print without a fraction.
fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalcError {
    Parse(String),
    Eval(String),
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcError::Parse(msg) => write!(f, "parse error: {}", msg),
            CalcError::Eval(msg) => write!(f, "evaluation error: {}", msg),
        }
    }
}

impl std::error::Error for CalcError {}

/// Reject input whose parentheses nest deeper than [`MAX_NESTING`].
fn check_nesting(expression: &str) -> Result<(), CalcError> {
    let mut depth = 0usize;
    for c in expression.chars() {
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(CalcError::Parse("expression nested too deeply".to_string()));
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Evaluate an arithmetic expression to a finite `f64`.
///
/// Supports `+ - * / %`, `^` (also written `**`) for powers, unary signs,
/// parentheses, and the usual math functions and constants (`sqrt`, `abs`,
/// `ln`, `pi`, `e`, ...). Syntax problems are [`CalcError::Parse`]; unknown
/// names and non-finite results such as `1 / 0` are [`CalcError::Eval`].
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    if expression.trim().is_empty() {
        return Err(CalcError::Parse("empty expression".to_string()));
    }
    check_nesting(expression)?;

    let expr: meval::Expr = expression
        .replace("**", "^")
        .parse()
        .map_err(|e: meval::Error| CalcError::Parse(e.to_string()))?;
    let value = expr.eval().map_err(|e| CalcError::Eval(e.to_string()))?;

    if !value.is_finite() {
        return Err(CalcError::Eval("result is not a finite number".to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nested(depth: usize) -> String {
        format!("{}1{}", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn test_calculate_examples() {
        assert_eq!(calculate("25 * 4"), "100");
        assert_eq!(calculate("2 + 2"), "4");
        assert_eq!(calculate("25 * 5"), "125");
        assert_eq!(calculate("7 / 2"), "3.5");
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("2^10").unwrap(), 1024.0);
        assert_eq!(evaluate("2 ** 3").unwrap(), 8.0);
        assert_eq!(evaluate("17 % 5").unwrap(), 2.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
        assert_eq!(evaluate("1500 + 0.5").unwrap(), 1500.5);
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(evaluate("sqrt(16)").unwrap(), 4.0);
        assert_eq!(evaluate("abs(-2.5)").unwrap(), 2.5);
        assert!((evaluate("pi").unwrap() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_expressions_report_errors() {
        assert!(calculate("not math").starts_with("Error parsing expression:"));
        assert_eq!(calculate(""), "Error parsing expression: empty expression");
        assert!(calculate("(1 + 2").starts_with("Error parsing expression:"));
        assert!(calculate("1 +").starts_with("Error parsing expression:"));
        assert!(calculate("1 2").starts_with("Error parsing expression:"));
    }

    #[test]
    fn test_evaluation_errors() {
        let not_finite = "Error calculating: result is not a finite number";
        assert_eq!(calculate("1 / 0"), not_finite);
        assert_eq!(calculate("5 % 0"), not_finite);
        assert_eq!(calculate("10 ^ 400"), not_finite);
        assert!(calculate("foo + 1").starts_with("Error calculating:"));
    }

    #[test]
    fn test_negative_zero_prints_as_zero() {
        assert_eq!(calculate("-0"), "0");
        assert_eq!(calculate("0 * -1"), "0");
    }

    #[test]
    fn test_nesting_limit() {
        assert_eq!(evaluate(&nested(MAX_NESTING)).unwrap(), 1.0);
        assert_eq!(
            evaluate(&nested(MAX_NESTING + 1)),
            Err(CalcError::Parse("expression nested too deeply".to_string()))
        );
    }

    #[tokio::test]
    async fn test_deeply_nested_input_is_a_parse_error() {
        let tool = CalculatorTool;
        let arguments = json!({ "expression": nested(10_000) });
        let args =
            ToolArgs::validate("calculator", &tool.parameters(), arguments.as_object().unwrap())
                .unwrap();

        let result = tool.execute(args).await.unwrap();
        assert_eq!(result, "Error parsing expression: expression nested too deeply");
    }
}
