use crate::math::parser::{Expr, Func};

#[derive(Debug, Clone, PartialEq)]
pub struct EvalError(pub String);

/// Numerically fold an expression. Fails on free variables and domain
/// errors (division by zero, sqrt of a negative, non-finite results).
pub fn evaluate(expr: &Expr) -> Result<f64, EvalError> {
    let value = eval_inner(expr)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError("result is not finite".to_string()))
    }
}

fn eval_inner(expr: &Expr) -> Result<f64, EvalError> {
    Ok(match expr {
        Expr::Num(v) => *v,
        Expr::Var => return Err(EvalError("expression contains a free variable".to_string())),
        Expr::Add(a, b) => eval_inner(a)? + eval_inner(b)?,
        Expr::Sub(a, b) => eval_inner(a)? - eval_inner(b)?,
        Expr::Mul(a, b) => eval_inner(a)? * eval_inner(b)?,
        Expr::Div(a, b) => {
            let denom = eval_inner(b)?;
            if denom == 0.0 {
                return Err(EvalError("division by zero".to_string()));
            }
            eval_inner(a)? / denom
        }
        Expr::Pow(a, b) => eval_inner(a)?.powf(eval_inner(b)?),
        Expr::Neg(a) => -eval_inner(a)?,
        Expr::Call(func, arg) => {
            let v = eval_inner(arg)?;
            match func {
                // Trig arguments are degrees, inverse trig results are
                // degrees: calculator conventions, not radians.
                Func::Sin => v.to_radians().sin(),
                Func::Cos => v.to_radians().cos(),
                Func::Tan => v.to_radians().tan(),
                Func::Asin => {
                    if !(-1.0..=1.0).contains(&v) {
                        return Err(EvalError("asin out of domain".to_string()));
                    }
                    v.asin().to_degrees()
                }
                Func::Acos => {
                    if !(-1.0..=1.0).contains(&v) {
                        return Err(EvalError("acos out of domain".to_string()));
                    }
                    v.acos().to_degrees()
                }
                Func::Atan => v.atan().to_degrees(),
                Func::Sqrt => {
                    if v < 0.0 {
                        return Err(EvalError("sqrt of a negative number".to_string()));
                    }
                    v.sqrt()
                }
                Func::Log => {
                    if v <= 0.0 {
                        return Err(EvalError("log of a non-positive number".to_string()));
                    }
                    v.log10()
                }
                Func::Ln => {
                    if v <= 0.0 {
                        return Err(EvalError("ln of a non-positive number".to_string()));
                    }
                    v.ln()
                }
                Func::Exp => v.exp(),
            }
        }
    })
}
