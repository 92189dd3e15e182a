//! Finance Capabilities
//!
//! The market-data provider exposes a closed set of features. Each one maps
//! to exactly one tool; a `Capabilities` bitmask decides which are enabled.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One independently toggleable market-data feature
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinanceCapability {
    StockPrice,
    AnalystRecommendations,
    StockFundamentals,
    CompanyNews,
    HistoricalPrices,
}

impl FinanceCapability {
    pub const ALL: [Self; 5] = [
        Self::StockPrice,
        Self::AnalystRecommendations,
        Self::StockFundamentals,
        Self::CompanyNews,
        Self::HistoricalPrices,
    ];

    const fn bit(self) -> u8 {
        match self {
            Self::StockPrice => 1 << 0,
            Self::AnalystRecommendations => 1 << 1,
            Self::StockFundamentals => 1 << 2,
            Self::CompanyNews => 1 << 3,
            Self::HistoricalPrices => 1 << 4,
        }
    }

    /// Short configuration key
    pub const fn key(self) -> &'static str {
        match self {
            Self::StockPrice => "price",
            Self::AnalystRecommendations => "recommendations",
            Self::StockFundamentals => "fundamentals",
            Self::CompanyNews => "news",
            Self::HistoricalPrices => "history",
        }
    }

    /// Serialized variant name
    pub const fn snake_name(self) -> &'static str {
        match self {
            Self::StockPrice => "stock_price",
            Self::AnalystRecommendations => "analyst_recommendations",
            Self::StockFundamentals => "stock_fundamentals",
            Self::CompanyNews => "company_news",
            Self::HistoricalPrices => "historical_prices",
        }
    }

    /// Name of the tool that serves this capability
    pub const fn tool_name(self) -> &'static str {
        match self {
            Self::StockPrice => "get_current_stock_price",
            Self::AnalystRecommendations => "get_analyst_recommendations",
            Self::StockFundamentals => "get_stock_fundamentals",
            Self::CompanyNews => "get_company_news",
            Self::HistoricalPrices => "get_historical_stock_prices",
        }
    }
}

impl fmt::Display for FinanceCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FinanceCapability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| wanted == c.key() || wanted == c.tool_name() || wanted == c.snake_name())
            .ok_or_else(|| {
                format!(
                    "unknown finance feature '{s}' (expected one of: {})",
                    Capabilities::all()
                )
            })
    }
}

/// Set of enabled finance features
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Self = Self(0);

    pub const fn all() -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < FinanceCapability::ALL.len() {
            bits |= FinanceCapability::ALL[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn only(capability: FinanceCapability) -> Self {
        Self(capability.bit())
    }

    #[must_use]
    pub const fn with(self, capability: FinanceCapability) -> Self {
        Self(self.0 | capability.bit())
    }

    #[must_use]
    pub const fn without(self, capability: FinanceCapability) -> Self {
        Self(self.0 & !capability.bit())
    }

    pub const fn contains(self, capability: FinanceCapability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Enabled capabilities in declaration order
    pub fn iter(self) -> impl Iterator<Item = FinanceCapability> {
        FinanceCapability::ALL
            .into_iter()
            .filter(move |c| self.contains(*c))
    }
}

impl FromIterator<FinanceCapability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = FinanceCapability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<_> = self.iter().map(FinanceCapability::key).collect();
        f.write_str(&keys.join(","))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Parses `all` or a comma-separated list such as `price,news`
impl FromStr for Capabilities {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }

        let caps = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse::<FinanceCapability>)
            .collect::<Result<Self, _>>()?;

        if caps.is_empty() {
            return Err("at least one finance feature must be enabled".into());
        }
        Ok(caps)
    }
}
