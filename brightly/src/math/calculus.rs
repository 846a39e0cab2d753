use crate::math::parser::{Expr, Func};

const MAX_POLY_DEGREE: usize = 8;

/// Symbolic derivative with respect to `x`. Returns `None` for forms
/// outside the supported rule set (inverse trig, variable exponents over
/// variable bases).
pub fn differentiate(expr: &Expr) -> Option<Expr> {
    let raw = diff(expr)?;
    Some(simplify(&raw))
}

fn diff(expr: &Expr) -> Option<Expr> {
    Some(match expr {
        Expr::Num(_) => Expr::Num(0.0),
        Expr::Var => Expr::Num(1.0),
        Expr::Add(a, b) => Expr::Add(Box::new(diff(a)?), Box::new(diff(b)?)),
        Expr::Sub(a, b) => Expr::Sub(Box::new(diff(a)?), Box::new(diff(b)?)),
        Expr::Mul(a, b) => Expr::Add(
            Box::new(Expr::Mul(Box::new(diff(a)?), b.clone())),
            Box::new(Expr::Mul(a.clone(), Box::new(diff(b)?))),
        ),
        Expr::Div(a, b) => Expr::Div(
            Box::new(Expr::Sub(
                Box::new(Expr::Mul(Box::new(diff(a)?), b.clone())),
                Box::new(Expr::Mul(a.clone(), Box::new(diff(b)?))),
            )),
            Box::new(Expr::Pow(b.clone(), Box::new(Expr::Num(2.0)))),
        ),
        Expr::Pow(base, exponent) => match (&**base, &**exponent) {
            // u^n: n * u^(n-1) * u'
            (_, Expr::Num(n)) => Expr::Mul(
                Box::new(Expr::Mul(
                    Box::new(Expr::Num(*n)),
                    Box::new(Expr::Pow(base.clone(), Box::new(Expr::Num(n - 1.0)))),
                )),
                Box::new(diff(base)?),
            ),
            // a^u: a^u * ln(a) * u'
            (Expr::Num(a), _) => Expr::Mul(
                Box::new(Expr::Mul(
                    Box::new(expr.clone()),
                    Box::new(Expr::Num(a.ln())),
                )),
                Box::new(diff(exponent)?),
            ),
            _ => return None,
        },
        Expr::Neg(a) => Expr::Neg(Box::new(diff(a)?)),
        Expr::Call(func, arg) => {
            let inner = diff(arg)?;
            let outer = match func {
                Func::Sin => Expr::Call(Func::Cos, arg.clone()),
                Func::Cos => Expr::Neg(Box::new(Expr::Call(Func::Sin, arg.clone()))),
                Func::Tan => Expr::Div(
                    Box::new(Expr::Num(1.0)),
                    Box::new(Expr::Pow(
                        Box::new(Expr::Call(Func::Cos, arg.clone())),
                        Box::new(Expr::Num(2.0)),
                    )),
                ),
                Func::Sqrt => Expr::Div(
                    Box::new(Expr::Num(1.0)),
                    Box::new(Expr::Mul(
                        Box::new(Expr::Num(2.0)),
                        Box::new(Expr::Call(Func::Sqrt, arg.clone())),
                    )),
                ),
                Func::Ln => Expr::Div(Box::new(Expr::Num(1.0)), arg.clone()),
                Func::Log => Expr::Div(
                    Box::new(Expr::Num(1.0)),
                    Box::new(Expr::Mul(
                        arg.clone(),
                        Box::new(Expr::Num(std::f64::consts::LN_10)),
                    )),
                ),
                Func::Exp => Expr::Call(Func::Exp, arg.clone()),
                Func::Asin | Func::Acos | Func::Atan => return None,
            };
            Expr::Mul(Box::new(outer), Box::new(inner))
        }
    })
}

/// Symbolic antiderivative with respect to `x` (no constant). Covers
/// polynomial-like terms, `c/x`, `sin`, `cos`, and `e^x`; anything else
/// returns `None`.
pub fn integrate(expr: &Expr) -> Option<Expr> {
    let raw = integral(expr)?;
    Some(simplify(&raw))
}

fn integral(expr: &Expr) -> Option<Expr> {
    Some(match expr {
        Expr::Num(c) => Expr::Mul(Box::new(Expr::Num(*c)), Box::new(Expr::Var)),
        Expr::Var => Expr::Div(
            Box::new(Expr::Pow(Box::new(Expr::Var), Box::new(Expr::Num(2.0)))),
            Box::new(Expr::Num(2.0)),
        ),
        Expr::Add(a, b) => Expr::Add(Box::new(integral(a)?), Box::new(integral(b)?)),
        Expr::Sub(a, b) => Expr::Sub(Box::new(integral(a)?), Box::new(integral(b)?)),
        Expr::Neg(a) => Expr::Neg(Box::new(integral(a)?)),
        Expr::Mul(a, b) => match (&**a, &**b) {
            (Expr::Num(c), other) | (other, Expr::Num(c)) => {
                Expr::Mul(Box::new(Expr::Num(*c)), Box::new(integral(other)?))
            }
            _ => return None,
        },
        Expr::Div(a, b) => match (&**a, &**b) {
            (Expr::Num(c), Expr::Var) => {
                Expr::Mul(Box::new(Expr::Num(*c)), Box::new(Expr::Call(Func::Ln, Box::new(Expr::Var))))
            }
            (other, Expr::Num(c)) if *c != 0.0 => {
                Expr::Div(Box::new(integral(other)?), Box::new(Expr::Num(*c)))
            }
            _ => return None,
        },
        Expr::Pow(base, exponent) => match (&**base, &**exponent) {
            (Expr::Var, Expr::Num(n)) if *n != -1.0 => Expr::Div(
                Box::new(Expr::Pow(Box::new(Expr::Var), Box::new(Expr::Num(n + 1.0)))),
                Box::new(Expr::Num(n + 1.0)),
            ),
            (Expr::Var, Expr::Num(_)) => Expr::Call(Func::Ln, Box::new(Expr::Var)),
            (Expr::Num(a), Expr::Var) if (*a - std::f64::consts::E).abs() < 1e-12 => {
                expr.clone()
            }
            _ => return None,
        },
        Expr::Call(Func::Sin, arg) if **arg == Expr::Var => {
            Expr::Neg(Box::new(Expr::Call(Func::Cos, Box::new(Expr::Var))))
        }
        Expr::Call(Func::Cos, arg) if **arg == Expr::Var => {
            Expr::Call(Func::Sin, Box::new(Expr::Var))
        }
        Expr::Call(Func::Exp, arg) if **arg == Expr::Var => {
            Expr::Call(Func::Exp, Box::new(Expr::Var))
        }
        _ => return None,
    })
}

/// Constant folding plus identity elimination, applied bottom-up until the
/// output is readable. Not a CAS; just enough that `3*x^2 + 0` prints as
/// `3*x^2`.
pub fn simplify(expr: &Expr) -> Expr {
    match expr {
        Expr::Num(_) | Expr::Var => expr.clone(),
        Expr::Add(a, b) => {
            let (a, b) = (simplify(a), simplify(b));
            match (&a, &b) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x + y),
                (Expr::Num(z), _) if *z == 0.0 => b,
                (_, Expr::Num(z)) if *z == 0.0 => a,
                _ => Expr::Add(Box::new(a), Box::new(b)),
            }
        }
        Expr::Sub(a, b) => {
            let (a, b) = (simplify(a), simplify(b));
            match (&a, &b) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x - y),
                (_, Expr::Num(z)) if *z == 0.0 => a,
                (Expr::Num(z), _) if *z == 0.0 => Expr::Neg(Box::new(b)),
                _ => Expr::Sub(Box::new(a), Box::new(b)),
            }
        }
        Expr::Mul(a, b) => {
            let (a, b) = (simplify(a), simplify(b));
            match (&a, &b) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x * y),
                (Expr::Num(z), _) | (_, Expr::Num(z)) if *z == 0.0 => Expr::Num(0.0),
                (Expr::Num(o), _) if *o == 1.0 => b,
                (_, Expr::Num(o)) if *o == 1.0 => a,
                // Hoist constants left and fold nested constant factors:
                // (c1 * e) * c2 and friends.
                (Expr::Mul(x, y), Expr::Num(c)) => match &**x {
                    Expr::Num(c1) => simplify(&Expr::Mul(
                        Box::new(Expr::Num(c1 * c)),
                        y.clone(),
                    )),
                    _ => Expr::Mul(Box::new(Expr::Num(*c)), Box::new(a.clone())),
                },
                (_, Expr::Num(c)) => Expr::Mul(Box::new(Expr::Num(*c)), Box::new(a)),
                (Expr::Num(c1), Expr::Mul(x, y)) => match &**x {
                    Expr::Num(c2) => simplify(&Expr::Mul(
                        Box::new(Expr::Num(c1 * c2)),
                        y.clone(),
                    )),
                    _ => Expr::Mul(Box::new(a), Box::new(b.clone())),
                },
                _ => Expr::Mul(Box::new(a), Box::new(b)),
            }
        }
        Expr::Div(a, b) => {
            let (a, b) = (simplify(a), simplify(b));
            match (&a, &b) {
                (Expr::Num(x), Expr::Num(y)) if *y != 0.0 => Expr::Num(x / y),
                (Expr::Num(z), _) if *z == 0.0 => Expr::Num(0.0),
                (_, Expr::Num(o)) if *o == 1.0 => a,
                _ => Expr::Div(Box::new(a), Box::new(b)),
            }
        }
        Expr::Pow(a, b) => {
            let (a, b) = (simplify(a), simplify(b));
            match (&a, &b) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x.powf(*y)),
                (_, Expr::Num(o)) if *o == 1.0 => a,
                (_, Expr::Num(z)) if *z == 0.0 => Expr::Num(1.0),
                _ => Expr::Pow(Box::new(a), Box::new(b)),
            }
        }
        Expr::Neg(a) => {
            let a = simplify(a);
            match a {
                Expr::Num(v) => Expr::Num(-v),
                Expr::Neg(inner) => *inner,
                _ => Expr::Neg(Box::new(a)),
            }
        }
        Expr::Call(func, arg) => Expr::Call(*func, Box::new(simplify(arg))),
    }
}

/// Extract polynomial coefficients in `x` (index = degree). `None` for
/// non-polynomial shapes or degrees above the cap.
pub fn poly_coefficients(expr: &Expr) -> Option<Vec<f64>> {
    let coeffs = match expr {
        Expr::Num(c) => vec![*c],
        Expr::Var => vec![0.0, 1.0],
        Expr::Add(a, b) => combine(poly_coefficients(a)?, poly_coefficients(b)?, 1.0),
        Expr::Sub(a, b) => combine(poly_coefficients(a)?, poly_coefficients(b)?, -1.0),
        Expr::Neg(a) => poly_coefficients(a)?.into_iter().map(|c| -c).collect(),
        Expr::Mul(a, b) => convolve(&poly_coefficients(a)?, &poly_coefficients(b)?)?,
        Expr::Div(a, b) => {
            let divisor = poly_coefficients(b)?;
            if divisor.len() != 1 || divisor[0] == 0.0 {
                return None;
            }
            poly_coefficients(a)?
                .into_iter()
                .map(|c| c / divisor[0])
                .collect()
        }
        Expr::Pow(base, exponent) => {
            let n = match &**exponent {
                Expr::Num(n) if *n >= 0.0 && n.fract() == 0.0 => *n as usize,
                _ => return None,
            };
            if n > MAX_POLY_DEGREE {
                return None;
            }
            let base = poly_coefficients(base)?;
            let mut acc = vec![1.0];
            for _ in 0..n {
                acc = convolve(&acc, &base)?;
            }
            acc
        }
        Expr::Call(..) => {
            // A constant-valued call (e.g. sqrt(4)) still counts.
            return crate::math::eval::evaluate(expr).ok().map(|v| vec![v]);
        }
    };

    if coeffs.len() > MAX_POLY_DEGREE + 1 {
        return None;
    }
    Some(coeffs)
}

fn combine(mut a: Vec<f64>, b: Vec<f64>, sign: f64) -> Vec<f64> {
    if b.len() > a.len() {
        a.resize(b.len(), 0.0);
    }
    for (i, coeff) in b.into_iter().enumerate() {
        a[i] += sign * coeff;
    }
    a
}

fn convolve(a: &[f64], b: &[f64]) -> Option<Vec<f64>> {
    if a.len() + b.len() > MAX_POLY_DEGREE + 2 {
        return None;
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    Some(out)
}

/// Real roots of the (≤ quadratic) polynomial `coeffs`, ascending.
/// `None` means the degree is unsupported; an empty vec means no real
/// solution exists.
pub fn real_roots(coeffs: &[f64]) -> Option<Vec<f64>> {
    let mut coeffs = coeffs.to_vec();
    while coeffs.len() > 1 && coeffs.last().is_some_and(|c| c.abs() < 1e-12) {
        coeffs.pop();
    }

    match coeffs.len() {
        0 | 1 => Some(Vec::new()),
        2 => Some(vec![-coeffs[0] / coeffs[1]]),
        3 => {
            let (c, b, a) = (coeffs[0], coeffs[1], coeffs[2]);
            let discriminant = b * b - 4.0 * a * c;
            if discriminant < 0.0 {
                return Some(Vec::new());
            }
            let sqrt_d = discriminant.sqrt();
            let mut roots = vec![(-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a)];
            roots.sort_by(|x, y| x.partial_cmp(y).unwrap());
            roots.dedup_by(|x, y| (*x - *y).abs() < 1e-12);
            Some(roots)
        }
        _ => None,
    }
}
