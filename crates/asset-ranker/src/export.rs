//! CSV Export
//!
//! Flattens already-computed rankings into one table for download.

use rust_decimal::Decimal;

use crate::model::RankingResult;
use crate::pipeline::PipelineRun;

pub const CSV_HEADER: &str = "asset_class,rank,symbol,display_name,window_return_pct,current_price";

/// One row per ranked entry, classes in the order given
pub fn rankings_to_csv<'a>(rankings: impl IntoIterator<Item = &'a RankingResult>) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for ranking in rankings {
        for (i, quote) in ranking.iter().enumerate() {
            let fields = [
                ranking.asset_class.as_str().to_string(),
                (i + 1).to_string(),
                escape(&quote.symbol),
                escape(&quote.display_name),
                decimal_field(quote.window_return_pct),
                decimal_field(quote.current_price),
            ];
            out.push_str(&fields.join(","));
            out.push('\n');
        }
    }

    out
}

/// Every class of a run, equities first
pub fn run_to_csv(run: &PipelineRun) -> String {
    rankings_to_csv(run.classes().map(|class| &class.ranking))
}

fn decimal_field(value: Option<Decimal>) -> String {
    value.map(|d| d.normalize().to_string()).unwrap_or_default()
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
