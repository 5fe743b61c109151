use crate::expression::ast::{BinaryOp, Expr, UnaryOp};
use crate::expression::error::ExprError;
use crate::expression::parser::parse_expr;
use crate::foundation::error::TileviewResult;

/// Named numeric bindings visible to an expression.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExprVars {
    slots: Vec<(&'static str, f64)>,
}

impl ExprVars {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any earlier value.
    pub(crate) fn set(&mut self, name: &'static str, value: f64) {
        match self.slots.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.slots.push((name, value)),
        }
    }

    /// Bind several names to one value (`in_w` and `iw`, for example).
    pub(crate) fn set_all(&mut self, names: &[&'static str], value: f64) {
        for name in names {
            self.set(name, value);
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<f64> {
        self.slots
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

/// A parsed expression kept together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledExpr {
    source: String,
    ast: Expr,
}

impl CompiledExpr {
    pub(crate) fn compile(source: &str) -> TileviewResult<Self> {
        let ast = parse_expr(source)?;
        Ok(Self {
            source: source.to_owned(),
            ast,
        })
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn eval(&self, vars: &ExprVars) -> Result<f64, ExprError> {
        eval_expr(&self.ast, &mut |name| vars.get(name))
    }
}

pub(crate) fn eval_expr(
    expr: &Expr,
    load_var: &mut dyn FnMut(&str) -> Option<f64>,
) -> Result<f64, ExprError> {
    match expr {
        Expr::Num(v) => Ok(*v),
        Expr::Var(name) => {
            load_var(name).ok_or_else(|| ExprError::new(0, format!("unknown variable '{name}'")))
        }
        Expr::Unary { op, expr } => {
            let v = eval_expr(expr, load_var)?;
            Ok(match op {
                UnaryOp::Neg => -v,
                UnaryOp::Not => truth(v == 0.0),
            })
        }
        Expr::Binary { op, left, right } => {
            let a = eval_expr(left, load_var)?;
            // Short-circuit the logical operators.
            match op {
                BinaryOp::And if a == 0.0 => return Ok(0.0),
                BinaryOp::Or if a != 0.0 => return Ok(1.0),
                _ => {}
            }
            let b = eval_expr(right, load_var)?;
            Ok(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Mod => a % b,
                BinaryOp::Eq => truth(a == b),
                BinaryOp::Ne => truth(a != b),
                BinaryOp::Lt => truth(a < b),
                BinaryOp::Le => truth(a <= b),
                BinaryOp::Gt => truth(a > b),
                BinaryOp::Ge => truth(a >= b),
                BinaryOp::And | BinaryOp::Or => truth(b != 0.0),
            })
        }
        Expr::Call { func, args } => call_builtin(func, args, load_var),
    }
}

fn truth(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn call_builtin(
    func: &str,
    args: &[Expr],
    load_var: &mut dyn FnMut(&str) -> Option<f64>,
) -> Result<f64, ExprError> {
    let arity = match func {
        "abs" | "floor" | "ceil" | "round" | "trunc" | "sqrt" => 1,
        "min" | "max" => 2,
        "clip" | "if" => 3,
        other => return Err(ExprError::new(0, format!("unknown function '{other}'"))),
    };
    if args.len() != arity {
        return Err(ExprError::new(
            0,
            format!("{func}() expects {arity} argument(s), got {}", args.len()),
        ));
    }

    // `if` evaluates only the selected branch.
    if func == "if" {
        let c = eval_expr(&args[0], load_var)?;
        let branch = if c != 0.0 { &args[1] } else { &args[2] };
        return eval_expr(branch, load_var);
    }

    let mut v = [0.0f64; 3];
    for (slot, arg) in v.iter_mut().zip(args) {
        *slot = eval_expr(arg, load_var)?;
    }
    Ok(match func {
        "abs" => v[0].abs(),
        "floor" => v[0].floor(),
        "ceil" => v[0].ceil(),
        "round" => v[0].round(),
        "trunc" => v[0].trunc(),
        "sqrt" => v[0].sqrt(),
        "min" => v[0].min(v[1]),
        "max" => v[0].max(v[1]),
        _ => {
            if v[1] > v[2] {
                return Err(ExprError::new(0, "clip() lower bound exceeds upper bound"));
            }
            v[0].clamp(v[1], v[2])
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/expression/eval.rs"]
mod tests;
