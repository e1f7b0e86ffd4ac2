use pinegen_core::CodegenError;
use pinegen_parser::ast::ConditionalExpr;

use super::ExprLowerer;
use crate::boolean::BooleanConverter;
use crate::host_expr::HostExpr;

type Result<T> = std::result::Result<T, CodegenError>;

/// Lower `test ? a : b` to an immediately invoked host function.
///
/// The branches share the consequent's type: strings stay strings,
/// everything else returns `float64`.
pub fn lower_ternary<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    cond: &'ast ConditionalExpr<'ast>,
) -> Result<HostExpr> {
    let test = lowerer.lower_condition(cond.test)?;
    let consequent = lowerer.lower(cond.consequent)?;
    let alternate = lowerer.lower(cond.alternate)?;

    if consequent.is_string() != alternate.is_string() {
        return Err(CodegenError::unsupported(
            "ternary mixing string and numeric branches",
            cond.span,
        ));
    }
    if consequent.is_string() {
        return Ok(HostExpr::string(format!(
            "func() string {{ if {test} {{ return {} }} else {{ return {} }} }}()",
            consequent.code, alternate.code
        )));
    }

    let consequent = BooleanConverter::float_value(consequent);
    let alternate = BooleanConverter::float_value(alternate);
    Ok(HostExpr::float(format!(
        "func() float64 {{ if {test} {{ return {} }} else {{ return {} }} }}()",
        consequent.code, alternate.code
    )))
}
