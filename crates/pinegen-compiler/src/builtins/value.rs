//! `na` and `nz`.

use pinegen_core::CodegenError;
use pinegen_parser::ast::CallExpr;

use crate::expr::ExprLowerer;
use crate::host_expr::HostExpr;

type Result<T> = std::result::Result<T, CodegenError>;

pub fn lower<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    call: &'ast CallExpr<'ast>,
    name: &str,
) -> Result<HostExpr> {
    let args = call.positional();
    match name {
        "na" => match args {
            [] => Ok(HostExpr::bool("true")),
            [x] => {
                let x = lowerer.lower_float(x)?;
                Ok(HostExpr::bool(format!("math.IsNaN({})", x.code)))
            }
            _ => Err(CodegenError::malformed(name, "expected at most 1 argument", call.span)),
        },
        "nz" => {
            let Some(source) = call.arg(0, "source") else {
                return Err(CodegenError::malformed(name, "expected a value", call.span));
            };
            if args.len() > 2 {
                return Err(CodegenError::malformed(
                    name,
                    "expected at most 2 arguments",
                    call.span,
                ));
            }
            let x = lowerer.lower_float(source)?;
            let replacement = match call.arg(1, "replacement") {
                Some(r) => lowerer.lower_float(r)?.code,
                None => "0.0".to_string(),
            };
            Ok(HostExpr::float(format!("value.Nz({}, {replacement})", x.code)))
        }
        _ => Err(CodegenError::internal(format!("'{name}' is not a value function"))),
    }
}
