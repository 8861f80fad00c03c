//! Recommendation Responder
//!
//! Rule-based replies to a free-text question about the current ranking.
//! Intent is picked by the first matching rule in [`RULES`]; no state is
//! kept between calls, and the ranking is passed in on every call.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::{AssetClass, AssetQuote, RankingResult};

/// What the user is asking for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Which asset is ranked first
    TopAsset,
    /// General investing guidance
    InvestmentAdvice,
    /// Projected gain on the principal at the top return
    ReturnEstimate,
    /// Nothing matched
    Fallback,
}

/// Ordered classification rules, first match wins.
///
/// Keywords match word prefixes, so "investing" hits "invest". The names of
/// the ranked class (see [`AssetClass::aliases`]) also count as
/// [`Intent::TopAsset`] keywords.
pub const RULES: &[(Intent, &[&str])] = &[
    (Intent::TopAsset, &["best"]),
    (Intent::InvestmentAdvice, &["invest"]),
    (Intent::ReturnEstimate, &["return", "roi"]),
];

/// Classify a query about `asset_class`; case-insensitive
pub fn classify(query: &str, asset_class: AssetClass) -> Intent {
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mentions = |keyword: &&str| words.iter().any(|w| w.starts_with(keyword));

    RULES
        .iter()
        .find(|(intent, keywords)| {
            keywords.iter().any(mentions)
                || (*intent == Intent::TopAsset && asset_class.aliases().iter().any(mentions))
        })
        .map_or(Intent::Fallback, |(intent, _)| *intent)
}

/// Gain on `principal` if it earned the quote's window return
pub fn estimated_gain(principal: Decimal, quote: &AssetQuote) -> Option<Decimal> {
    let pct = quote.window_return_pct?;
    principal.checked_mul(pct)?.checked_div(dec!(100))
}

/// A rendered reply
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub intent: Intent,

    /// False when the ranking had no entries to talk about
    pub available: bool,

    /// Symbol the reply refers to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_gain: Option<Decimal>,

    pub text: String,
}

impl Reply {
    fn unavailable(intent: Intent, ranking: &RankingResult) -> Self {
        Self {
            intent,
            available: false,
            symbol: None,
            estimated_gain: None,
            text: format!(
                "Sorry, there is no {} data available right now, so I can't make a recommendation. Please try again later.",
                ranking.asset_class.label()
            ),
        }
    }
}

/// Answer `query` against `ranking` for the given principal.
///
/// An empty ranking always yields the unavailable reply; the top entry is
/// only read through [`RankingResult::top`].
pub fn respond(query: &str, ranking: &RankingResult, principal: Decimal) -> Reply {
    let intent = classify(query, ranking.asset_class);

    let top = match ranking.top() {
        Ok(top) => top,
        Err(e) => {
            tracing::debug!(?intent, "responder guard: {}", e);
            return Reply::unavailable(intent, ranking);
        }
    };

    let return_pct = top.window_return_pct.unwrap_or_default();

    match intent {
        Intent::TopAsset => Reply {
            intent,
            available: true,
            symbol: Some(top.symbol.clone()),
            estimated_gain: None,
            text: format!(
                "The top pick in {} right now is {} ({}) with a window return of {:+.2}%.",
                ranking.asset_class.label(),
                top.display_name,
                top.symbol,
                return_pct
            ),
        },
        Intent::InvestmentAdvice => Reply {
            intent,
            available: true,
            symbol: Some(top.symbol.clone()),
            estimated_gain: None,
            text: format!(
                "Spread your capital across several assets and asset classes instead of going all-in. \
                 {} leads {} at {:+.2}%, but past returns do not guarantee future results.",
                top.symbol,
                ranking.asset_class.label(),
                return_pct
            ),
        },
        Intent::ReturnEstimate => {
            let gain = estimated_gain(principal, top);
            let ending = gain.and_then(|g| principal.checked_add(g));
            let text = match gain.zip(ending) {
                Some((gain, ending)) => format!(
                    "If {:.2} had earned {}'s window return of {:+.2}%, it would have gained {:.2} (ending at {:.2}).",
                    principal,
                    top.symbol,
                    return_pct,
                    gain,
                    ending
                ),
                None => format!("I couldn't estimate a return for {}.", top.symbol),
            };
            Reply {
                intent,
                available: true,
                symbol: Some(top.symbol.clone()),
                estimated_gain: ending.and(gain),
                text,
            }
        }
        Intent::Fallback => Reply {
            intent,
            available: true,
            symbol: None,
            estimated_gain: None,
            text: "Got it. Ask me about the best asset, how to invest, or the expected return on your amount.".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::rank;

    fn crypto_ranking() -> RankingResult {
        let quotes = vec![
            AssetQuote::new("RNDR", AssetClass::Crypto)
                .with_name("Render")
                .with_price(dec!(7.10))
                .with_return(dec!(25)),
            AssetQuote::new("INJ", AssetClass::Crypto)
                .with_name("Injective")
                .with_price(dec!(21.40))
                .with_return(dec!(10)),
        ];
        rank(AssetClass::Crypto, quotes, 5)
    }

    #[test]
    fn test_classification_order() {
        let crypto = AssetClass::Crypto;
        assert_eq!(classify("What is the BEST coin?", crypto), Intent::TopAsset);
        assert_eq!(classify("should I be investing now", crypto), Intent::InvestmentAdvice);
        assert_eq!(classify("what ROI can I expect", crypto), Intent::ReturnEstimate);
        assert_eq!(classify("returns please", crypto), Intent::ReturnEstimate);
        assert_eq!(classify("hello there", crypto), Intent::Fallback);
        assert_eq!(classify("", crypto), Intent::Fallback);
        // First rule wins when several match
        assert_eq!(classify("best return to invest", crypto), Intent::TopAsset);
        assert_eq!(classify("invest for return", crypto), Intent::InvestmentAdvice);
    }

    #[test]
    fn test_keywords_match_words_not_substrings() {
        assert_eq!(classify("heroic effort", AssetClass::Crypto), Intent::Fallback);
    }

    #[test]
    fn test_class_names_follow_the_ranked_class() {
        assert_eq!(classify("which altcoins?", AssetClass::Crypto), Intent::TopAsset);
        assert_eq!(classify("top stocks?", AssetClass::Equity), Intent::TopAsset);
        assert_eq!(classify("any good FIIs", AssetClass::Reit), Intent::TopAsset);
        assert_eq!(classify("top stocks?", AssetClass::Crypto), Intent::Fallback);
        assert_eq!(classify("which altcoins?", AssetClass::Reit), Intent::Fallback);
    }

    #[test]
    fn test_top_asset_reply() {
        let reply = respond("best crypto?", &crypto_ranking(), dec!(1000));
        assert!(reply.available);
        assert_eq!(reply.intent, Intent::TopAsset);
        assert_eq!(reply.symbol.as_deref(), Some("RNDR"));
        assert!(reply.text.contains("Render"));
    }

    #[test]
    fn test_return_estimate() {
        let reply = respond("what's my roi", &crypto_ranking(), dec!(1000));
        assert_eq!(reply.intent, Intent::ReturnEstimate);
        assert_eq!(reply.estimated_gain, Some(dec!(250)));
        assert!(reply.text.contains("250.00"));
    }

    #[test]
    fn test_return_estimate_overflow_is_reported_not_raised() {
        let ranking = rank(
            AssetClass::Crypto,
            vec![AssetQuote::new("RNDR", AssetClass::Crypto).with_return(dec!(1))],
            5,
        );
        let principal: Decimal = "79000000000000000000000000000".parse().unwrap();

        let reply = respond("roi", &ranking, principal);
        assert_eq!(reply.intent, Intent::ReturnEstimate);
        assert!(reply.available);
        assert!(reply.estimated_gain.is_none());
        assert!(reply.text.contains("couldn't estimate"));
    }

    #[test]
    fn test_negative_return_estimate() {
        let quote = AssetQuote::new("LUNA", AssetClass::Crypto).with_return(dec!(-40));
        assert_eq!(estimated_gain(dec!(500), &quote), Some(dec!(-200)));
        assert_eq!(estimated_gain(dec!(500), &AssetQuote::new("X", AssetClass::Crypto)), None);
    }

    #[test]
    fn test_invest_and_fallback_replies() {
        let ranking = crypto_ranking();
        let advice = respond("how should I invest?", &ranking, dec!(100));
        assert_eq!(advice.intent, Intent::InvestmentAdvice);
        assert!(advice.available);
        assert!(advice.estimated_gain.is_none());

        let fallback = respond("thanks", &ranking, dec!(100));
        assert_eq!(fallback.intent, Intent::Fallback);
        assert!(fallback.symbol.is_none());
    }

    #[test]
    fn test_empty_ranking_is_unavailable_for_every_intent() {
        let empty = RankingResult::empty(AssetClass::Crypto);
        for query in ["best coin", "invest", "roi", "hi"] {
            let reply = respond(query, &empty, dec!(1000));
            assert!(!reply.available, "query {query:?}");
            assert!(reply.estimated_gain.is_none());
            assert!(reply.text.contains("no Crypto data"));
        }
    }
}
