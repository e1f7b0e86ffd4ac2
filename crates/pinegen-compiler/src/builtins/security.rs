//! Cross-timeframe reads: `request.security(symbol, timeframe, expr[, lookahead])`.
//!
//! The emitted block looks up the `symbol:timeframe` context, maps the
//! current bar's timestamp onto it and writes one value into the target
//! series. Bare OHLCV reads index the other context directly. Calls and
//! binary expressions are handed to the runtime's streaming bar evaluator
//! as serialized host `ast` literals, since the per-bar loop only advances
//! a single cursor.

use pinegen_core::{CodegenError, ConstantValue, quote, render_float};
use pinegen_parser::ast::{CallExpr, Expr, LiteralKind, MemberProperty, ObjectExpr, UnaryOp};
use pinegen_registry::{OhlcvField, canonical_name};
use tracing::trace;

use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;

type Result<T> = std::result::Result<T, CodegenError>;

/// The streaming evaluator shared by every cross-timeframe block.
pub const EVALUATOR: &str = "secBarEvaluator";

/// Emit a cross-timeframe read into `{target}Series`.
pub fn emit<'ast>(
    call: &'ast CallExpr<'ast>,
    name: &str,
    target: &str,
    lowerer: &ExprLowerer<'_, 'ast>,
    w: &mut CodeWriter,
) -> Result<()> {
    let symbol = call
        .arg(0, "symbol")
        .ok_or_else(|| CodegenError::malformed(name, "missing symbol", call.span))?;
    let timeframe = call
        .arg(1, "timeframe")
        .ok_or_else(|| CodegenError::malformed(name, "missing timeframe", call.span))?;
    let expression = call
        .arg(2, "expression")
        .ok_or_else(|| CodegenError::malformed(name, "missing expression", call.span))?;
    let lookahead = match call.arg(3, "lookahead") {
        Some(arg) => lowerer.ctx().resolver().resolve_bool(arg).ok_or_else(|| {
            CodegenError::malformed(
                name,
                format!("'lookahead' must be a constant boolean, found '{arg}'"),
                arg.span(),
            )
        })?,
        None => false,
    };

    let symbol = string_argument(lowerer, name, "symbol", symbol)?;
    let timeframe = string_argument(lowerer, name, "timeframe", timeframe)?;
    trace!(target, lookahead, "security block");

    let storage = format!("{target}Series");
    w.open("{");
    w.line(format!("secKey := fmt.Sprintf(\"%s:%s\", {symbol}, {timeframe})"));
    w.line("secCtx, secFound := securityContexts[secKey]");
    w.open("if !secFound {");
    w.line(format!("{storage}.Set(math.NaN())"));
    w.reopen("} else {");
    let finder = if lookahead {
        "FindBarIndexByTimestampWithLookahead"
    } else {
        "FindBarIndexByTimestamp"
    };
    w.line(format!(
        "secBarIdx := context.{finder}(secCtx, ctx.Data[ctx.BarIndex].Time)"
    ));
    w.open("if secBarIdx < 0 {");
    w.line(format!("{storage}.Set(math.NaN())"));
    w.reopen("} else {");
    emit_evaluation(expression, &storage, lowerer, w)?;
    w.close("}");
    w.close("}");
    w.close("}");
    Ok(())
}

/// A symbol or timeframe argument as a host string expression.
fn string_argument<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    function: &str,
    what: &str,
    expr: &'ast Expr<'ast>,
) -> Result<String> {
    let value = lowerer.lower(expr)?;
    if !value.is_string() {
        return Err(CodegenError::malformed(
            function,
            format!("{what} '{expr}' is not a string"),
            expr.span(),
        ));
    }
    Ok(value.code)
}

fn emit_evaluation<'ast>(
    expr: &'ast Expr<'ast>,
    storage: &str,
    lowerer: &ExprLowerer<'_, 'ast>,
    w: &mut CodeWriter,
) -> Result<()> {
    match expr {
        Expr::Ident(ident) => {
            match OhlcvField::from_name(ident.name) {
                Some(field) => w.line(format!(
                    "{storage}.Set(secCtx.Data[secBarIdx].{})",
                    field.host_field()
                )),
                None => w.line(format!("{storage}.Set(math.NaN())")),
            }
            Ok(())
        }
        Expr::Call(_) | Expr::Binary(_) => {
            let tree = serialize(expr, lowerer)?;
            w.open(format!("if {EVALUATOR} == nil {{"));
            w.line(format!("{EVALUATOR} = security.NewStreamingBarEvaluator()"));
            w.close("}");
            w.line(format!(
                "secValue, err := {EVALUATOR}.EvaluateAtBar({tree}, secCtx, secBarIdx)"
            ));
            w.open("if err != nil {");
            w.line(format!("{storage}.Set(math.NaN())"));
            w.reopen("} else {");
            w.line(format!("{storage}.Set(secValue)"));
            w.close("}");
            Ok(())
        }
        _ => Err(CodegenError::unsupported(
            format!("cross-timeframe expression '{expr}'"),
            expr.span(),
        )),
    }
}

// ==========================================================================
// Expression serialization
// ==========================================================================

fn ident_node(name: &str) -> String {
    format!("&ast.Identifier{{Name: {}}}", quote(name))
}

fn literal_node(value: &ConstantValue) -> String {
    let value = match value {
        ConstantValue::Bool(b) => b.to_string(),
        ConstantValue::Int(i) => render_float(*i as f64),
        ConstantValue::Float(f) => render_float(f.0),
        ConstantValue::String(s) => quote(s),
    };
    format!("&ast.Literal{{Value: {value}}}")
}

/// Serialize an expression as host `ast` composite literals.
///
/// Input constants and registry names fold to literals, so the runtime
/// evaluator never needs the script's constant table.
fn serialize(expr: &Expr<'_>, lowerer: &ExprLowerer<'_, '_>) -> Result<String> {
    let resolver = lowerer.ctx().resolver();
    match expr {
        Expr::Literal(lit) => Ok(literal_node(&match lit.kind {
            LiteralKind::Number(n) => ConstantValue::float(n),
            LiteralKind::Bool(b) => ConstantValue::Bool(b),
            LiteralKind::String(s) => ConstantValue::string(s),
        })),
        Expr::Unary(un) if un.op == UnaryOp::Neg && un.argument.as_number().is_some() => {
            let value = resolver.resolve(expr).ok_or_else(|| {
                CodegenError::internal(format!("negated literal '{expr}' did not fold"))
            })?;
            Ok(literal_node(&value))
        }
        Expr::Ident(ident) => match resolver.resolve(expr) {
            Some(value) => Ok(literal_node(&value)),
            None => Ok(ident_node(ident.name)),
        },
        Expr::Member(member) => {
            if let Some(value) = resolver.resolve(expr) {
                return Ok(literal_node(&value));
            }
            match member.property {
                MemberProperty::Field(field) => Ok(format!(
                    "&ast.MemberExpression{{Object: {}, Property: {}}}",
                    serialize(member.object, lowerer)?,
                    ident_node(field.name)
                )),
                MemberProperty::Index(_) => Err(CodegenError::unsupported(
                    format!("history reference '{expr}' in a cross-timeframe expression"),
                    expr.span(),
                )),
            }
        }
        Expr::Binary(bin) => Ok(format!(
            "&ast.BinaryExpression{{Operator: {}, Left: {}, Right: {}}}",
            quote(bin.op.as_str()),
            serialize(bin.left, lowerer)?,
            serialize(bin.right, lowerer)?
        )),
        Expr::Call(call) => serialize_call(call, lowerer),
        Expr::Object(obj) => serialize_object(obj, lowerer),
        _ => Err(CodegenError::unsupported(
            format!("'{expr}' in a cross-timeframe expression"),
            expr.span(),
        )),
    }
}

fn serialize_call(call: &CallExpr<'_>, lowerer: &ExprLowerer<'_, '_>) -> Result<String> {
    let Some(name) = call.callee_name() else {
        return Err(CodegenError::unsupported(
            format!("call of '{}'", call.callee),
            call.span,
        ));
    };
    let name = canonical_name(&name);
    let callee = match name.rsplit_once('.') {
        Some((object, property)) => format!(
            "&ast.MemberExpression{{Object: {}, Property: {}}}",
            ident_node(object),
            ident_node(property)
        ),
        None => ident_node(&name),
    };
    let args = call
        .arguments
        .iter()
        .map(|arg| serialize(arg, lowerer))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "&ast.CallExpression{{Callee: {callee}, Arguments: []ast.Expression{{{}}}}}",
        args.join(", ")
    ))
}

fn serialize_object(obj: &ObjectExpr<'_>, lowerer: &ExprLowerer<'_, '_>) -> Result<String> {
    let props = obj
        .properties
        .iter()
        .map(|prop| {
            Ok(format!(
                "{{Key: {}, Value: {}}}",
                ident_node(prop.key.name),
                serialize(&prop.value, lowerer)?
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "&ast.ObjectExpression{{Properties: []ast.Property{{{}}}}}",
        props.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::test_support::prepare;
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    fn emit_source(source: &str) -> Result<String> {
        let arena = Bump::new();
        let (ctx, expr) = prepare(&arena, source);
        let Expr::Call(call) = expr else {
            panic!("expected call");
        };
        let mut w = CodeWriter::new(0);
        emit(call, "request.security", "d", &ExprLowerer::new(&ctx), &mut w)?;
        assert_eq!(w.indent_level(), 0);
        Ok(w.finish())
    }

    #[test]
    fn bare_field_reads_other_context() {
        let out = emit_source("d = request.security(syminfo.tickerid, \"D\", close)\n").unwrap();
        assert_eq!(
            out,
            "{\n\
             \tsecKey := fmt.Sprintf(\"%s:%s\", ctx.Symbol, \"D\")\n\
             \tsecCtx, secFound := securityContexts[secKey]\n\
             \tif !secFound {\n\
             \t\tdSeries.Set(math.NaN())\n\
             \t} else {\n\
             \t\tsecBarIdx := context.FindBarIndexByTimestamp(secCtx, ctx.Data[ctx.BarIndex].Time)\n\
             \t\tif secBarIdx < 0 {\n\
             \t\t\tdSeries.Set(math.NaN())\n\
             \t\t} else {\n\
             \t\t\tdSeries.Set(secCtx.Data[secBarIdx].Close)\n\
             \t\t}\n\
             \t}\n\
             }\n"
        );
    }

    #[test]
    fn ta_goes_through_the_evaluator() {
        let out = emit_source("d = request.security(syminfo.tickerid, \"D\", ta.sma(close, 20))\n")
            .unwrap();
        assert!(out.contains("if secBarEvaluator == nil {"));
        assert!(out.contains(
            "secValue, err := secBarEvaluator.EvaluateAtBar(&ast.CallExpression{Callee: &ast.MemberExpression{Object: &ast.Identifier{Name: \"ta\"}, Property: &ast.Identifier{Name: \"sma\"}}, Arguments: []ast.Expression{&ast.Identifier{Name: \"close\"}, &ast.Literal{Value: 20.0}}}, secCtx, secBarIdx)"
        ));
        assert!(out.contains("dSeries.Set(secValue)"));
    }

    #[test]
    fn lookahead_selects_the_finder() {
        for source in [
            "d = request.security(syminfo.tickerid, \"D\", close, barmerge.lookahead_on)\n",
            "d = security(tickerid, \"D\", close, lookahead=barmerge.lookahead_on)\n",
            "d = request.security(syminfo.tickerid, \"D\", close, lookahead=true)\n",
        ] {
            let out = emit_source(source).unwrap();
            assert!(out.contains("context.FindBarIndexByTimestampWithLookahead(secCtx"), "{source}");
        }
        let out = emit_source(
            "d = request.security(syminfo.tickerid, \"D\", close, lookahead=barmerge.lookahead_off)\n",
        )
        .unwrap();
        assert!(out.contains("context.FindBarIndexByTimestamp(secCtx"));
    }

    #[test]
    fn inputs_fold_in_serialized_expressions() {
        let out = emit_source(
            "length = input.int(50)\nd = request.security(\"BTCUSDT\", \"1h\", sma(close, length) - open)\n",
        )
        .unwrap();
        assert!(out.contains("fmt.Sprintf(\"%s:%s\", \"BTCUSDT\", \"1h\")"));
        assert!(out.contains(
            "&ast.BinaryExpression{Operator: \"-\", Left: &ast.CallExpression{Callee: &ast.MemberExpression{Object: &ast.Identifier{Name: \"ta\"}, Property: &ast.Identifier{Name: \"sma\"}}, Arguments: []ast.Expression{&ast.Identifier{Name: \"close\"}, &ast.Literal{Value: 50.0}}}, Right: &ast.Identifier{Name: \"open\"}}"
        ));
    }

    #[test]
    fn malformed_arguments() {
        assert!(matches!(
            emit_source("d = request.security(syminfo.tickerid, \"D\")\n").unwrap_err(),
            CodegenError::MalformedCall { .. }
        ));
        assert!(matches!(
            emit_source("d = request.security(syminfo.tickerid, 5, close)\n").unwrap_err(),
            CodegenError::MalformedCall { .. }
        ));
        for source in [
            "d = request.security(syminfo.tickerid, \"D\", close, lookahead=close > open)\n",
            "d = request.security(syminfo.tickerid, \"D\", close, 1)\n",
            "d = request.security(syminfo.tickerid, \"D\", close, lookahead=\"on\")\n",
        ] {
            let err = emit_source(source).unwrap_err();
            assert!(
                matches!(err, CodegenError::MalformedCall { ref message, .. } if message.contains("'lookahead'")),
                "{source}: {err:?}"
            );
        }
    }
}
