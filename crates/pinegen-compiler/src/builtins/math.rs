//! `math.*` lowered to host `math` calls.

use pinegen_core::CodegenError;
use pinegen_parser::ast::CallExpr;

use crate::expr::ExprLowerer;
use crate::host_expr::HostExpr;

type Result<T> = std::result::Result<T, CodegenError>;

/// The host function for a one- or two-argument math function.
fn host_function(short: &str) -> Option<(&'static str, usize)> {
    Some(match short {
        "abs" => ("math.Abs", 1),
        "sqrt" => ("math.Sqrt", 1),
        "floor" => ("math.Floor", 1),
        "ceil" => ("math.Ceil", 1),
        "round" => ("math.Round", 1),
        "log" => ("math.Log", 1),
        "exp" => ("math.Exp", 1),
        "pow" => ("math.Pow", 2),
        _ => return None,
    })
}

/// Lower a math call inline. Each argument is lowered as a float.
///
/// `max` and `min` take two or more arguments and nest pairwise.
pub fn lower_inline<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    call: &'ast CallExpr<'ast>,
    name: &str,
) -> Result<HostExpr> {
    let short = name.strip_prefix("math.").unwrap_or(name);
    let args = call
        .positional()
        .iter()
        .map(|arg| lowerer.lower_float(arg).map(|v| v.code))
        .collect::<Result<Vec<_>>>()?;

    if let Some((function, arity)) = host_function(short) {
        if args.len() != arity {
            let plural = if arity == 1 { "" } else { "s" };
            return Err(CodegenError::malformed(
                name,
                format!("expected {arity} argument{plural}, got {}", args.len()),
                call.span,
            ));
        }
        return Ok(HostExpr::float(format!("{function}({})", args.join(", "))));
    }

    let function = match short {
        "max" => "math.Max",
        "min" => "math.Min",
        _ => {
            return Err(CodegenError::unsupported(
                format!("math function '{name}'"),
                call.span,
            ));
        }
    };
    let mut args = args.into_iter();
    let (Some(first), Some(second)) = (args.next(), args.next()) else {
        return Err(CodegenError::malformed(
            name,
            "expected at least 2 arguments",
            call.span,
        ));
    };
    let folded = args.fold(format!("{function}({first}, {second})"), |acc, next| {
        format!("{function}({acc}, {next})")
    });
    Ok(HostExpr::float(folded))
}
