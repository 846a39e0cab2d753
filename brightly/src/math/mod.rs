//! Deterministic math fast path: detection, direct evaluation, equation
//! solving, and step-style explanations for derivative/integral/equation
//! questions.

mod calculus;
mod eval;
mod parser;

use std::sync::OnceLock;

use regex::Regex;

pub use parser::{parse, Expr};

fn math_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"d/dx|dx|differentiate|derive|integrate|roots|equation|simplify|sin|cos|tan|log|sqrt|=|[\d+\-*/^()]")
            .expect("math detector regex")
    })
}

/// Cheap detector deciding whether the math handlers should run at all.
/// Deliberately loose (any digit matches); the handlers themselves reject
/// non-expressions.
pub fn is_math_query(text: &str) -> bool {
    math_regex().is_match(&text.to_lowercase())
}

/// Canned concept answers served before any parsing.
pub fn concept_answer(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    if lower.contains("quadratic equations") {
        return Some(
            "A quadratic equation is of the form ax² + bx + c = 0. \
             The solutions are x = [-b ± √(b² - 4ac)] / 2a."
                .to_string(),
        );
    }
    None
}

fn normalize(text: &str) -> String {
    text.to_lowercase().replace('×', "*").replace('÷', "/")
}

/// Round to six decimal places and render integral values without a
/// decimal point.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

/// Direct evaluator: numeric expressions and linear/quadratic equations.
pub fn solve_expression(text: &str) -> Option<String> {
    let expr = normalize(text);

    if let Some((lhs, rhs)) = expr.split_once('=') {
        return solve_equation(lhs, rhs);
    }

    let parsed = parser::parse(&expr).ok()?;
    let value = eval::evaluate(&parsed).ok()?;
    Some(format!("The result is {}", format_number(value)))
}

fn solve_equation(lhs: &str, rhs: &str) -> Option<String> {
    let roots = equation_roots(lhs, rhs)?;

    match roots.len() {
        0 => Some("No real solution found.".to_string()),
        1 => Some(format!("The value of x is {}.", format_number(roots[0]))),
        _ => Some(format!(
            "Possible values of x are: {}.",
            roots
                .iter()
                .map(|r| format_number(*r))
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}

fn equation_roots(lhs: &str, rhs: &str) -> Option<Vec<f64>> {
    let lhs = parser::parse(lhs.trim()).ok()?;
    let rhs = parser::parse(rhs.trim()).ok()?;
    let difference = Expr::Sub(Box::new(lhs), Box::new(rhs));
    let coeffs = calculus::poly_coefficients(&difference)?;
    calculus::real_roots(&coeffs)
}

/// Step-explanation handler for derivative, integral, and equation
/// questions. `None` hands the question to the direct evaluator.
pub fn explain_step_by_step(text: &str) -> Option<String> {
    let expr = normalize(text);

    if expr.contains("differentiate") || expr.contains("derivative") || expr.contains("find dy/dx")
    {
        let target = expr.rsplit("of").next()?.trim();
        let parsed = parser::parse(target).ok()?;
        let derivative = calculus::differentiate(&parsed)?;
        return Some(format!(
            "The derivative of {parsed} with respect to x is: {derivative}"
        ));
    }

    if expr.contains("integrate") || expr.contains("integration") {
        let target = expr.rsplit("of").next()?.trim();
        let parsed = parser::parse(target).ok()?;
        let integral = calculus::integrate(&parsed)?;
        return Some(format!(
            "The integral of {parsed} with respect to x is: {integral} + C"
        ));
    }

    if let Some((lhs, rhs)) = expr.split_once('=') {
        let roots = equation_roots(lhs, rhs)?;
        let solution = if roots.is_empty() {
            "no real solution".to_string()
        } else {
            roots
                .iter()
                .map(|r| format_number(*r))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let (lhs, rhs) = (lhs.trim(), rhs.trim());
        let steps = [
            format!("Step 1: Start with {lhs} = {rhs}"),
            format!("Step 2: Move all terms to one side: ({lhs}) - ({rhs}) = 0"),
            "Step 3: Simplify and solve for x".to_string(),
            format!("Solution: x = {solution}"),
        ];
        return Some(steps.join("\n"));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_matches_expressions_and_keywords() {
        assert!(is_math_query("2+2"));
        assert!(is_math_query("differentiate x^2"));
        assert!(is_math_query("what is the sqrt of 16"));
        assert!(is_math_query("solve x = 5"));
        // Any digit trips the detector; handlers reject prose later.
        assert!(is_math_query("fees for class 5"));
        assert!(!is_math_query("who is the principal"));
    }

    #[test]
    fn direct_evaluation_rounds_to_six_places() {
        assert_eq!(solve_expression("2+2").unwrap(), "The result is 4");
        assert_eq!(solve_expression("10/3").unwrap(), "The result is 3.333333");
        assert_eq!(solve_expression("2^10").unwrap(), "The result is 1024");
    }

    #[test]
    fn trig_and_functions_evaluate() {
        assert_eq!(solve_expression("sin(30)").unwrap(), "The result is 0.5");
        assert_eq!(solve_expression("sqrt(16)").unwrap(), "The result is 4");
        assert_eq!(
            solve_expression("pow(2, 8)").unwrap(),
            "The result is 256"
        );
    }

    #[test]
    fn prose_is_not_evaluated() {
        assert!(solve_expression("what are the fees for class 5").is_none());
        assert!(solve_expression("hello there").is_none());
    }

    #[test]
    fn linear_equation_is_solved() {
        assert_eq!(
            solve_expression("2*x + 6 = 0").unwrap(),
            "The value of x is -3."
        );
    }

    #[test]
    fn quadratic_equation_lists_both_roots() {
        assert_eq!(
            solve_expression("x^2 - 5*x + 6 = 0").unwrap(),
            "Possible values of x are: 2, 3."
        );
    }

    #[test]
    fn impossible_equation_reports_no_solution() {
        assert_eq!(
            solve_expression("x^2 + 1 = 0").unwrap(),
            "No real solution found."
        );
    }

    #[test]
    fn derivative_explanation() {
        let answer = explain_step_by_step("differentiate of x^2").unwrap();
        assert!(answer.contains("derivative of x^2"));
        assert!(answer.contains("2*x"));
    }

    #[test]
    fn integral_explanation_adds_constant() {
        let answer = explain_step_by_step("integrate of cos(x)").unwrap();
        assert!(answer.contains("sin(x) + C"));
    }

    #[test]
    fn equation_explanation_lists_steps() {
        let answer = explain_step_by_step("x^2 - 4 = 0").unwrap();
        assert!(answer.contains("Step 1"));
        assert!(answer.contains("Solution: x = -2, 2"));
    }

    #[test]
    fn unsupported_forms_fall_through() {
        assert!(explain_step_by_step("differentiate of x^x").is_none());
        assert!(explain_step_by_step("what is 2+2").is_none());
    }

    #[test]
    fn concept_answers_win_before_parsing() {
        assert!(concept_answer("tell me about quadratic equations")
            .unwrap()
            .contains("ax² + bx + c"));
        assert!(concept_answer("2+2").is_none());
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(4.5), "4.5");
        assert_eq!(format_number(0.1234567), "0.123457");
        assert_eq!(format_number(-3.0), "-3");
    }
}
