//! Structural classification of TA sources.

use pinegen_parser::ast::Expr;
use pinegen_registry::{Builtin, OhlcvField};

use super::accessor::{OhlcvAccessor, SeriesAccessor, SeriesVarAccessor};
use crate::context::GenContext;
use crate::symbols::SymbolKind;
use crate::temp_vars::NodeId;

/// Where a series-valued expression reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesSource {
    /// A builtin field, read from the bar array.
    Ohlcv(OhlcvField),
    /// A user, runtime or temp series, by storage name.
    Series(String),
}

impl SeriesSource {
    /// Build the offset accessor for this source.
    pub fn accessor(&self) -> Box<dyn SeriesAccessor> {
        match self {
            SeriesSource::Ohlcv(field) => Box::new(OhlcvAccessor::new(*field)),
            SeriesSource::Series(storage) => Box::new(SeriesVarAccessor::new(storage.clone())),
        }
    }
}

/// Classifies expressions by AST shape and the name environment.
pub struct SourceClassifier<'a, 'ast> {
    ctx: &'a GenContext<'ast>,
}

impl<'a, 'ast> SourceClassifier<'a, 'ast> {
    pub fn new(ctx: &'a GenContext<'ast>) -> Self {
        Self { ctx }
    }

    /// Classify an expression, including materialized calls and
    /// expression temps.
    pub fn classify(&self, expr: &'ast Expr<'ast>) -> Option<SeriesSource> {
        let temps = self.ctx.temps();
        if let Some(temp) = temps.lookup(NodeId::of_expr(expr)) {
            return Some(SeriesSource::Series(temp.storage()));
        }
        if let Expr::Call(call) = expr {
            return temps
                .lookup(NodeId::of_call(call))
                .map(|temp| SeriesSource::Series(temp.storage()));
        }
        self.classify_name(expr)
    }

    /// Classify a bare or qualified name: builtin fields, source aliases,
    /// user series and runtime values.
    pub fn classify_name(&self, expr: &Expr<'_>) -> Option<SeriesSource> {
        let name = match expr {
            Expr::Ident(ident) => ident.name.to_string(),
            Expr::Member(_) => expr.qualified_name()?,
            _ => return None,
        };

        if let Some(symbol) = self.ctx.symbols().get(&name) {
            return match &symbol.kind {
                SymbolKind::Series { .. } => symbol.storage().map(SeriesSource::Series),
                SymbolKind::SourceAlias(field) => Some(SeriesSource::Ohlcv(*field)),
                SymbolKind::Input(_) | SymbolKind::StringAlias(_) => None,
            };
        }

        match Builtin::lookup(&name)? {
            Builtin::Ohlcv(field) => Some(SeriesSource::Ohlcv(field)),
            Builtin::Runtime(value) => Some(SeriesSource::Series(value.series_name())),
            Builtin::Na | Builtin::Scalar(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::symbols::Symbol;
    use bumpalo::Bump;
    use pinegen_core::{ConstantValue, Span, TypeTag};
    use pinegen_parser::{Parser, ast::Stmt};

    fn exprs<'ast>(arena: &'ast Bump, source: &str) -> Vec<&'ast Expr<'ast>> {
        let program = Parser::parse(source, arena).unwrap();
        program
            .body()
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expr(s) => s.expr,
                _ => panic!("expected expression statement"),
            })
            .collect()
    }

    fn context<'ast>() -> GenContext<'ast> {
        let mut ctx = GenContext::new(GeneratorConfig::default());
        let symbols = ctx.symbols_mut();
        symbols
            .declare(Symbol {
                name: "fast",
                kind: SymbolKind::Series {
                    tag: TypeTag::Float,
                    persistent: false,
                },
                span: Span::default(),
            })
            .unwrap();
        symbols
            .declare(Symbol {
                name: "src",
                kind: SymbolKind::SourceAlias(OhlcvField::Low),
                span: Span::default(),
            })
            .unwrap();
        symbols
            .declare(Symbol {
                name: "length",
                kind: SymbolKind::Input(ConstantValue::Int(14)),
                span: Span::default(),
            })
            .unwrap();
        ctx
    }

    #[test]
    fn names_classify_structurally() {
        let arena = Bump::new();
        let ctx = context();
        let classifier = SourceClassifier::new(&ctx);
        let e = exprs(
            &arena,
            "close\nfast\nsrc\nstrategy.equity\nlength\nbar_index\nclose + 1\n",
        );

        assert_eq!(classifier.classify(e[0]), Some(SeriesSource::Ohlcv(OhlcvField::Close)));
        assert_eq!(classifier.classify(e[1]), Some(SeriesSource::Series("fastSeries".into())));
        assert_eq!(classifier.classify(e[2]), Some(SeriesSource::Ohlcv(OhlcvField::Low)));
        assert_eq!(
            classifier.classify(e[3]),
            Some(SeriesSource::Series("strategy_equitySeries".into()))
        );
        assert_eq!(classifier.classify(e[4]), None);
        assert_eq!(classifier.classify(e[5]), None);
        assert_eq!(classifier.classify(e[6]), None);
    }

    #[test]
    fn accessor_factory() {
        let accessor = SeriesSource::Series("fastSeries".into()).accessor();
        assert_eq!(accessor.at("j"), "fastSeries.Get(j)");
        assert!(accessor.needs_nan_check());
        let accessor = SeriesSource::Ohlcv(OhlcvField::High).accessor();
        assert_eq!(accessor.at("j"), "ctx.Data[i-j].High");
        assert!(!accessor.needs_nan_check());
    }
}
