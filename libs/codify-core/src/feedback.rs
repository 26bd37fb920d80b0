/// Feedback Formatter - Per-Test Report Rendering
///
/// Renders the ordered list of test outcomes into the human-readable
/// feedback text stored on the submission row. Pure and deterministic:
/// same results in, same string out.

use serde::Serialize;
use serde_json::Value;

/// Outcome of a single test case, consumed by the formatter.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub test_name: String,
    pub passed: bool,
    pub input: Option<String>,
    pub expected_output: Option<Value>,
    pub actual_output: Option<Value>,
    pub error: Option<String>,
    pub message: String,
}

impl TestResult {
    pub fn pass(test_name: &str, input: &str, expected: Value, actual: Value) -> Self {
        Self {
            test_name: test_name.to_string(),
            passed: true,
            input: Some(input.to_string()),
            expected_output: Some(expected),
            actual_output: Some(actual),
            error: None,
            message: "Test passed!".to_string(),
        }
    }

    pub fn fail(test_name: &str, input: &str, expected: Value, actual: Value) -> Self {
        let message = format!("Test failed: Expected {expected} but got {actual}");
        Self {
            test_name: test_name.to_string(),
            passed: false,
            input: Some(input.to_string()),
            expected_output: Some(expected),
            actual_output: Some(actual),
            error: None,
            message,
        }
    }

    /// Execution never produced an output; the error text is carried on
    /// the result instead of the input/expected/actual triple.
    pub fn errored(test_name: &str, error: &str) -> Self {
        Self {
            test_name: test_name.to_string(),
            passed: false,
            input: None,
            expected_output: None,
            actual_output: None,
            error: Some(error.to_string()),
            message: format!("Error executing test: {error}"),
        }
    }
}

/// Render one block per result, blank-line separated.
///
/// A block is a status glyph + test name header, then either the error
/// line or the input/expected/actual lines with the outcome message.
pub fn format_feedback(results: &[TestResult]) -> String {
    results
        .iter()
        .map(format_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_block(result: &TestResult) -> String {
    let glyph = if result.passed { "✅" } else { "❌" };
    let header = format!("{glyph} Test: {}", result.test_name);

    if let Some(error) = &result.error {
        return format!("{header}\nError: {error}");
    }

    let input = match &result.input {
        Some(input) => Value::from(input.as_str()).to_string(),
        None => "null".to_string(),
    };
    let expected = render(result.expected_output.as_ref());
    let actual = render(result.actual_output.as_ref());

    format!(
        "{header}\nInput: {input}\nExpected: {expected}\nActual: {actual}\n{}\n",
        result.message
    )
}

fn render(value: Option<&Value>) -> String {
    value.map(Value::to_string).unwrap_or_else(|| "null".to_string())
}
