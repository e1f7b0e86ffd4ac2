//! End-to-end generation tests.
//!
//! These compile complete scripts through the public facade and check the
//! shape of the emitted per-bar function.

mod test_harness;

use pretty_assertions::assert_eq;
use test_harness::{assert_series_lifecycle, body, compile, declared_series, load_script, position};

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_plain_assignment() {
    let out = body("x = close\n");
    assert_series_lifecycle(&out, "xSeries");
    assert!(out.contains("\t\txSeries.Set(bar.Close)\n"));
    assert!(position(&out, "xSeries.Set(bar.Close)") < position(&out, "xSeries.Next()"));
}

#[test]
fn test_sma_then_offset_read() {
    let out = body("sma20 = ta.sma(close, 20)\nprev = sma20[1]\n");
    assert_eq!(declared_series(&out)[5..], ["sma20Series", "prevSeries"]);

    assert!(out.contains("\t\t/* Inline sma(20) */\n\t\tif ctx.BarIndex < 19 {\n\t\t\tsma20Series.Set(math.NaN())\n"));
    assert!(out.contains("\t\t\tfor j := 0; j < 20; j++ {\n\t\t\t\tsum += ctx.Data[i-j].Close\n"));
    assert!(out.contains("\t\t\tsma20Series.Set(sum / 20.0)\n"));

    let sma_set = position(&out, "sma20Series.Set(sum / 20.0)");
    let prev_set = position(&out, "prevSeries.Set(sma20Series.Get(1))");
    let advance = position(&out, "// Advance Series cursors");
    assert!(sma_set < prev_set && prev_set < advance);
}

#[test]
fn test_ternary_signal() {
    let out = body("signal = close > close[1] ? 1 : 0\n");
    assert!(out.contains(
        "\t\tsignalSeries.Set(func() float64 { if bar.Close > func() float64 { if i-1 >= 0 { return ctx.Data[i-1].Close }; return math.NaN() }() { return 1.0 } else { return 0.0 } }())\n"
    ));
}

#[test]
fn test_nested_calls_materialize_innermost_first() {
    let out = body("up = rma(math.max(ta.change(close), 0), 9)\n");
    let temps: Vec<_> = declared_series(&out)
        .into_iter()
        .filter(|name| name.starts_with("ta_") || name.starts_with("math_"))
        .collect();
    assert_eq!(temps.len(), 3, "{temps:?}");
    assert!(temps[0].starts_with("ta_change_"));
    assert!(temps[1].starts_with("math_max_"));
    assert!(temps[2].starts_with("ta_rma_9_"));

    let change = position(&out, &format!("{}.Set(", temps[0]));
    let max = position(&out, &format!("{}.Set(", temps[1]));
    let rma = position(&out, &format!("{}.Set(", temps[2]));
    assert!(change < max && max < rma);
    assert!(out.contains(&format!("upSeries.Set({}.GetCurrent())", temps[2])));
}

#[test]
fn test_crossover_against_user_series() {
    let out = body("sma20 = ta.sma(close, 20)\nx = ta.crossover(close, sma20)\n");
    assert!(out.contains("\t\t// Crossover: close crosses above sma20\n\t\tif i > 0 {\n"));
    assert!(out.contains("\t\t\tx_prev1 := ctx.Data[i-1].Close\n"));
    assert!(out.contains("\t\t\tx_prev2 := sma20Series.Get(1)\n"));
    assert!(out.contains("bar.Close > sma20Series.GetCurrent() && x_prev1 <= x_prev2"));
    assert!(out.contains("\t\t} else {\n\t\t\txSeries.Set(0.0)\n\t\t}\n"));
}

#[test]
fn test_cross_timeframe_lookup() {
    let out = body("d = request.security(syminfo.tickerid, \"D\", ta.sma(close, 20))\n");
    assert!(out.contains("secKey := fmt.Sprintf(\"%s:%s\", ctx.Symbol, \"D\")"));
    assert!(out.contains("secCtx, secFound := securityContexts[secKey]"));
    assert!(out.contains("context.FindBarIndexByTimestamp(secCtx, ctx.Data[ctx.BarIndex].Time)"));
    assert!(out.contains("\tvar secBarEvaluator security.BarEvaluator\n"));
    assert!(out.contains("secBarEvaluator.EvaluateAtBar("));
    assert!(!out.contains("var ta_sma_20_"), "inner TA must not be materialized locally");

    let ahead = body(
        "d = request.security(syminfo.tickerid, \"D\", close, barmerge.lookahead_on)\n",
    );
    assert!(ahead.contains("context.FindBarIndexByTimestampWithLookahead(secCtx"));
    assert!(!ahead.contains("var secBarEvaluator"));
}

// =============================================================================
// Complete scripts
// =============================================================================

#[test]
fn test_ma_crossover_script() {
    let code = compile(&load_script("ma_crossover.pine"));
    let out = &code.function_body;
    assert_eq!(code.strategy_name, "MA Crossover");

    assert!(out.contains("\t// Input constants\n\tconst fastLength = 10\n\tconst slowLength = 30\n"));
    assert!(out.contains("/* Inline sma(10) */"));
    assert!(out.contains("/* Inline ema(30) */"));
    assert!(out.contains("\t\tif longSignalSeries.GetCurrent() != 0 {\n\t\t\tstrat.Entry(\"Long\", strategy.Long, 1)\n"));
    assert!(out.contains("\t\t} else if shortSignalSeries.GetCurrent() != 0 {\n\t\t\tstrat.Close(\"Long\", bar.Close, bar.Time)\n"));
    assert!(out.contains("collector.Add(\"Fast MA\", bar.Time, fastSeries.GetCurrent(), nil)"));
    assert!(out.contains("collector.Add(\"Slow MA\", bar.Time, slowSeries.GetCurrent(), nil)"));

    for storage in declared_series(out) {
        assert_series_lifecycle(out, &storage);
    }
}

#[test]
fn test_rsi_reversion_script() {
    let code = compile(&load_script("rsi_reversion.pine"));
    let out = &code.function_body;
    assert_eq!(code.strategy_name, "RSI Reversion");

    assert!(out.contains("\tconst oversold = 30.0\n"));
    assert!(out.contains("/* Inline atr(14) */"));
    assert!(out.contains("\t\tif i == 0 {\n\t\t\ttradesSeries.Set(0.0)\n"));
    assert!(out.contains("\t\tif rSeries.GetCurrent() < oversold {\n\t\t\tstrat.Entry(\"Long\", strategy.Long, 2)\n"));
    assert!(out.contains("\t\t\ttradesSeries.Set(tradesSeries.GetCurrent() + 1.0)\n"));
    assert!(out.contains("\t\t\tstrat.CloseAll(bar.Close, bar.Time)\n"));
    assert!(out.contains("collector.Add(\"RSI\", bar.Time, rSeries.GetCurrent(), nil)"));
    assert!(out.contains("math.IsNaN(atrValueSeries.GetCurrent())"));

    for storage in declared_series(out) {
        assert_series_lifecycle(out, &storage);
    }
}

#[test]
fn test_daily_trend_script() {
    let code = compile(&load_script("daily_trend.pine"));
    let out = &code.function_body;
    assert_eq!(code.strategy_name, "Daily Trend");

    assert_eq!(out.matches("secKey := fmt.Sprintf(").count(), 2);
    assert!(out.contains("fmt.Sprintf(\"%s:%s\", ctx.Symbol, \"W\")"));
    assert!(out.contains("weeklyCloseSeries.Set(secCtx.Data[secBarIdx].Close)"));
    assert!(out.contains("\tvar fixnanState_level = math.NaN()\n"));
    assert!(out.contains("levelSeries.Set(fixnanState_level)"));
    assert!(out.contains("collector.Add(\"weeklyClose\", bar.Time, weeklyCloseSeries.GetCurrent(), nil)"));

    let daily = position(out, "dailySeries.Set(");
    let trend = position(out, "trendSeries.Set(");
    assert!(daily < trend);

    for storage in declared_series(out) {
        assert_series_lifecycle(out, &storage);
    }
}

#[test]
fn test_scripts_are_reproducible() {
    for script in ["ma_crossover.pine", "rsi_reversion.pine", "daily_trend.pine"] {
        let source = load_script(script);
        assert_eq!(compile(&source), compile(&source), "{script}");
    }
}
