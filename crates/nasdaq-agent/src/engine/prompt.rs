//! Prompt construction
//!
//! Prompts are rendered from MiniJinja templates. Every number is formatted
//! in Rust before rendering, and nothing time-dependent is read here, so the
//! same symbol, snapshot and query always give the same prompt.

use super::indicators::{self, HistoricalSummary};
use crate::model::MarketSnapshot;
use crate::resolver::ResolvedSymbol;
use minijinja::{Environment, Value};
use serde::Serialize;

const SYSTEM_TEMPLATE: &str = "\
You are a senior equity analyst covering NASDAQ-listed companies.
You give clear, balanced BUY, HOLD or SELL recommendations grounded in the data you are given.
When data is missing you say so and lower your confidence accordingly.
You always answer in the exact field format requested, with no extra preamble.";

const ANALYSIS_TEMPLATE: &str = "\
Analyze the following stock and give an investment recommendation.

Ticker: {{ ticker }}
{% if company %}
Company: {{ company }}
{% endif %}

{% if market %}
Current market data (as of {{ market.as_of }}):
- Current price: ${{ market.price }}
{% if market.change %}
- Day change: {{ market.change }}
{% endif %}
- Volume: {{ market.volume }}
- 52-week range: ${{ market.week52_low }} - ${{ market.week52_high }}
{% if history %}

Price history ({{ history.data_points }} trading days):
- Period return: {{ history.period_return }}
- Price range: ${{ history.range_low }} - ${{ history.range_high }}
- Trend (last 30 days vs previous 30): {{ history.trend }}
- Average daily volume: {{ history.average_volume }}
{% if history.volatility %}
- Annualized volatility: {{ history.volatility }}
{% endif %}
{% if history.sma20 %}
- SMA20: ${{ history.sma20 }}
{% endif %}
{% if history.sma50 %}
- SMA50: ${{ history.sma50 }}
{% endif %}
{% if history.rsi14 %}
- RSI(14): {{ history.rsi14 }}
{% endif %}
{% endif %}
{% else %}
Market data: UNAVAILABLE.
No current price, volume or price history could be retrieved for this ticker.
Base your view on general knowledge of the company only, and state that live data was missing.
{% endif %}

User question: \"{{ query }}\"

Respond using exactly this format:
RECOMMENDATION: [BUY, HOLD or SELL]
CONFIDENCE_SCORE: [integer from 0 to 100]
REASONING: [2-4 sentences explaining the recommendation]
KEY_FACTORS: [up to 5 factors, comma-separated]
RISK_ASSESSMENT: [main risks, separated by semicolons]
SUMMARY: [one sentence]";

#[derive(Serialize)]
struct MarketFacts {
    as_of: String,
    price: String,
    change: Option<String>,
    volume: String,
    week52_low: String,
    week52_high: String,
}

#[derive(Serialize)]
struct HistoryFacts {
    data_points: usize,
    period_return: String,
    range_low: String,
    range_high: String,
    trend: String,
    average_volume: String,
    volatility: Option<String>,
    sma20: Option<String>,
    sma50: Option<String>,
    rsi14: Option<String>,
}

#[derive(Serialize)]
struct AnalysisContext<'a> {
    ticker: &'a str,
    company: Option<&'a str>,
    query: &'a str,
    market: Option<MarketFacts>,
    history: Option<HistoryFacts>,
}

/// Renders the system and analysis prompts
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    /// Compile the prompt templates
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template("system", SYSTEM_TEMPLATE)?;
        env.add_template("analysis", ANALYSIS_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn system_prompt(&self) -> Result<String, minijinja::Error> {
        self.env.get_template("system")?.render(minijinja::context! {})
    }

    /// Prompt for one recommendation. `snapshot == None` renders an explicit
    /// "market data unavailable" block instead of any numbers.
    pub fn analysis_prompt(
        &self,
        symbol: &ResolvedSymbol,
        snapshot: Option<&MarketSnapshot>,
        query: &str,
    ) -> Result<String, minijinja::Error> {
        let context = AnalysisContext {
            ticker: symbol.ticker.as_str(),
            company: symbol.company_name.as_deref(),
            query: query.trim(),
            market: snapshot.map(market_facts),
            history: snapshot
                .and_then(|s| indicators::summarize(&s.history))
                .map(|h| history_facts(&h)),
        };

        self.env
            .get_template("analysis")?
            .render(Value::from_serialize(&context))
    }
}

fn market_facts(snapshot: &MarketSnapshot) -> MarketFacts {
    MarketFacts {
        as_of: snapshot.as_of.format("%Y-%m-%d %H:%M UTC").to_string(),
        price: format!("{:.2}", snapshot.price),
        change: snapshot.change_percent().map(|c| format!("{c:+.2}%")),
        volume: group_thousands(snapshot.volume),
        week52_low: format!("{:.2}", snapshot.week52_low),
        week52_high: format!("{:.2}", snapshot.week52_high),
    }
}

fn history_facts(summary: &HistoricalSummary) -> HistoryFacts {
    HistoryFacts {
        data_points: summary.data_points,
        period_return: format!("{:+.2}%", summary.period_return_pct),
        range_low: format!("{:.2}", summary.range_low),
        range_high: format!("{:.2}", summary.range_high),
        trend: format!("{:?}", summary.trend).to_lowercase(),
        average_volume: group_thousands(summary.average_volume.round() as u64),
        volatility: summary.annualized_volatility_pct.map(|v| format!("{v:.1}%")),
        sma20: summary.sma20.map(|v| format!("{v:.2}")),
        sma50: summary.sma50.map(|v| format!("{v:.2}")),
        rsi14: summary.rsi14.map(|v| format!("{v:.1}")),
    }
}

/// `1234567` → `"1,234,567"`
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
