//! Company name → ticker lookup table

use std::collections::HashMap;

/// Corporate suffixes and articles dropped before matching
const CORPORATE_STOPWORDS: &[&str] = &[
    "inc",
    "corp",
    "corporation",
    "company",
    "co",
    "ltd",
    "limited",
    "llc",
    "the",
];

/// Built-in NASDAQ companies: ticker, registered name, extra aliases
const NASDAQ_COMPANIES: &[(&str, &str, &[&str])] = &[
    ("AAPL", "Apple Inc.", &["apple", "apple computer"]),
    ("MSFT", "Microsoft Corporation", &["microsoft", "msft"]),
    ("GOOGL", "Alphabet Inc.", &["google", "alphabet"]),
    ("AMZN", "Amazon.com Inc.", &["amazon", "amazon.com"]),
    ("TSLA", "Tesla Inc.", &["tesla", "tesla motors"]),
    ("META", "Meta Platforms Inc.", &["meta", "facebook", "meta platforms"]),
    ("NFLX", "Netflix Inc.", &["netflix"]),
    ("NVDA", "NVIDIA Corporation", &["nvidia"]),
    ("INTC", "Intel Corporation", &["intel"]),
    ("CSCO", "Cisco Systems Inc.", &["cisco", "cisco systems"]),
    ("ORCL", "Oracle Corporation", &["oracle"]),
    ("CRM", "Salesforce Inc.", &["salesforce", "salesforce.com"]),
    ("ADBE", "Adobe Inc.", &["adobe", "adobe systems"]),
    ("PYPL", "PayPal Holdings Inc.", &["paypal", "paypal holdings"]),
    ("ZM", "Zoom Video Communications Inc.", &["zoom", "zoom video", "zoom communications"]),
    ("SPOT", "Spotify Technology S.A.", &["spotify", "spotify technology"]),
    ("UBER", "Uber Technologies Inc.", &["uber", "uber technologies"]),
    ("LYFT", "Lyft Inc.", &["lyft"]),
    ("ABNB", "Airbnb Inc.", &["airbnb", "air bnb"]),
    ("DASH", "DoorDash Inc.", &["doordash", "door dash"]),
    ("SNOW", "Snowflake Inc.", &["snowflake"]),
    ("PLTR", "Palantir Technologies Inc.", &["palantir", "palantir technologies"]),
    ("HOOD", "Robinhood Markets Inc.", &["robinhood", "robinhood markets", "robin hood"]),
    ("MRNA", "Moderna Inc.", &["moderna"]),
    ("BNTX", "BioNTech SE", &["biontech"]),
    ("GILD", "Gilead Sciences Inc.", &["gilead", "gilead sciences"]),
    ("COST", "Costco Wholesale Corporation", &["costco", "costco wholesale"]),
    ("SBUX", "Starbucks Corporation", &["starbucks"]),
    ("AMD", "Advanced Micro Devices Inc.", &["amd", "advanced micro devices"]),
    ("QCOM", "QUALCOMM Incorporated", &["qualcomm"]),
    ("AVGO", "Broadcom Inc.", &["broadcom"]),
];

/// Normalise free text for alias matching.
///
/// Lowercases, turns punctuation into spaces, drops corporate stopwords and
/// collapses whitespace: `"The Apple, Inc."` becomes `"apple"`.
pub fn clean_text(text: &str) -> String {
    let spaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced
        .split_whitespace()
        .filter(|word| !CORPORATE_STOPWORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One company in the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyEntry {
    pub ticker: String,
    pub name: String,
    /// Cleaned aliases, including the cleaned registered name
    pub aliases: Vec<String>,
}

/// Read-only lookup from company names and aliases to tickers
///
/// Built once at startup and shared behind an `Arc`. Iteration order is
/// insertion order, which is also the tie-break order for matching.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<CompanyEntry>,
    by_alias: HashMap<String, usize>,
    by_ticker: HashMap<String, usize>,
}

impl AliasTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with the built-in NASDAQ company list
    pub fn nasdaq() -> Self {
        NASDAQ_COMPANIES
            .iter()
            .fold(Self::new(), |table, (ticker, name, aliases)| {
                table.with_company(ticker, name, aliases)
            })
    }

    /// Add a company. The first company to claim an alias keeps it.
    pub fn with_company(mut self, ticker: &str, name: &str, aliases: &[&str]) -> Self {
        let ticker = ticker.trim().to_uppercase();
        let index = self.entries.len();

        let mut cleaned: Vec<String> = Vec::new();
        for alias in std::iter::once(name).chain(aliases.iter().copied()) {
            let alias = clean_text(alias);
            if !alias.is_empty() && !cleaned.contains(&alias) {
                cleaned.push(alias);
            }
        }

        for alias in &cleaned {
            self.by_alias.entry(alias.clone()).or_insert(index);
        }
        self.by_ticker.entry(ticker.clone()).or_insert(index);

        self.entries.push(CompanyEntry {
            ticker,
            name: name.to_string(),
            aliases: cleaned,
        });
        self
    }

    /// Look up a company by upper-case ticker
    pub fn by_ticker(&self, ticker: &str) -> Option<&CompanyEntry> {
        self.by_ticker.get(ticker).map(|&i| &self.entries[i])
    }

    /// Look up a company by an already cleaned alias
    pub fn by_alias(&self, alias: &str) -> Option<&CompanyEntry> {
        self.by_alias.get(alias).map(|&i| &self.entries[i])
    }

    /// Every (alias, company) pair in table order
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &CompanyEntry)> {
        self.entries
            .iter()
            .flat_map(|entry| entry.aliases.iter().map(move |a| (a.as_str(), entry)))
    }

    /// All companies in table order
    pub fn entries(&self) -> &[CompanyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
