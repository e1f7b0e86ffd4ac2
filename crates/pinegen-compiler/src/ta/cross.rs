//! `crossover` and `crossunder`.

use pinegen_core::{CodegenError, render_float};
use pinegen_parser::ast::{CallExpr, Expr};

use super::{TaCall, TaHandler, TaRegistry};
use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;

type Result<T> = std::result::Result<T, CodegenError>;

/// Writes 1.0 on the bar where `a` crosses `b`, else 0.0.
struct Cross {
    name: &'static str,
    above: bool,
}

impl Cross {
    /// Current and previous reads of one operand.
    fn reads<'ast>(call: &TaCall<'_, 'ast>, expr: &'ast Expr<'ast>) -> Result<(String, String)> {
        if let Some(n) = expr.as_number() {
            let literal = render_float(n);
            return Ok((literal.clone(), literal));
        }
        let accessor = call.source(expr)?.accessor();
        Ok((accessor.current(), accessor.previous()))
    }
}

impl TaHandler for Cross {
    fn name(&self) -> &'static str {
        self.name
    }

    fn period_arg<'ast>(&self, _: &CallExpr<'ast>) -> Option<&'ast Expr<'ast>> {
        None
    }

    fn source_args<'ast>(&self, call: &CallExpr<'ast>) -> Vec<&'ast Expr<'ast>> {
        call.positional().iter().take(2).collect()
    }

    fn accepts_literal_source(&self) -> bool {
        true
    }

    fn generate<'ast>(
        &self,
        call: &TaCall<'_, 'ast>,
        target: &str,
        _: &ExprLowerer<'_, 'ast>,
        w: &mut CodeWriter,
    ) -> Result<()> {
        call.check_arity(2, 2)?;
        let (a, b) = match call.call().positional() {
            [a, b] => (a, b),
            _ => return Err(call.malformed("expected two positional arguments")),
        };
        let (cur_a, prev_a) = Self::reads(call, a)?;
        let (cur_b, prev_b) = Self::reads(call, b)?;
        let (direction, now, before) = if self.above {
            ("above", ">", "<=")
        } else {
            ("below", "<", ">=")
        };

        w.line(format!(
            "// {}: {a} crosses {direction} {b}",
            if self.above { "Crossover" } else { "Crossunder" }
        ));
        w.open("if i > 0 {");
        w.line(format!("{target}_prev1 := {prev_a}"));
        w.line(format!("{target}_prev2 := {prev_b}"));
        w.line(format!(
            "{target}Series.Set(func() float64 {{ if {cur_a} {now} {cur_b} && {target}_prev1 {before} {target}_prev2 {{ return 1.0 }} else {{ return 0.0 }} }}())"
        ));
        w.reopen("} else {");
        w.line(format!("{target}Series.Set(0.0)"));
        w.close("}");
        Ok(())
    }
}

pub(super) fn register(registry: &mut TaRegistry) {
    registry.register(Box::new(Cross {
        name: "ta.crossover",
        above: true,
    }));
    registry.register(Box::new(Cross {
        name: "ta.crossunder",
        above: false,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::context::GenContext;
    use crate::symbols::{Symbol, SymbolKind};
    use bumpalo::Bump;
    use pinegen_core::{Span, TypeTag};
    use pinegen_parser::Parser;
    use pinegen_parser::ast::Stmt;
    use pretty_assertions::assert_eq;

    fn emit(source: &str, name: &str) -> String {
        let arena = Bump::new();
        let program = Parser::parse(source, &arena).unwrap();
        let Stmt::Expr(stmt) = program.body()[0] else {
            panic!("expected expression");
        };
        let Expr::Call(call) = stmt.expr else {
            panic!("expected call");
        };
        let mut ctx = GenContext::new(GeneratorConfig::default());
        ctx.symbols_mut()
            .declare(Symbol {
                name: "sma20",
                kind: SymbolKind::Series {
                    tag: TypeTag::Float,
                    persistent: false,
                },
                span: Span::default(),
            })
            .unwrap();
        let lowerer = ExprLowerer::new(&ctx);
        let mut w = CodeWriter::new(0);
        ctx.ta()
            .generate_inline(&TaCall::new(name, call, &ctx), "x", &lowerer, &mut w)
            .unwrap();
        w.finish()
    }

    #[test]
    fn crossover_of_close_and_series() {
        assert_eq!(
            emit("ta.crossover(close, sma20)\n", "ta.crossover"),
            "// Crossover: close crosses above sma20
if i > 0 {
\tx_prev1 := ctx.Data[i-1].Close
\tx_prev2 := sma20Series.Get(1)
\txSeries.Set(func() float64 { if bar.Close > sma20Series.GetCurrent() && x_prev1 <= x_prev2 { return 1.0 } else { return 0.0 } }())
} else {
\txSeries.Set(0.0)
}
"
        );
    }

    #[test]
    fn crossunder_against_literal() {
        let out = emit("ta.crossunder(sma20, 30)\n", "ta.crossunder");
        assert!(out.starts_with("// Crossunder: sma20 crosses below 30\n"));
        assert!(out.contains("\tx_prev2 := 30.0\n"));
        assert!(out.contains("if sma20Series.GetCurrent() < 30.0 && x_prev1 >= x_prev2"));
    }
}
