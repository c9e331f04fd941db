// Instrument identity
// A signal is tracked per (symbol, strike, option type) triple

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Option side of a strike: call (CE) or put (PE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(rename = "CE")]
    Ce,
    #[serde(rename = "PE")]
    Pe,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Ce => write!(f, "CE"),
            OptionType::Pe => write!(f, "PE"),
        }
    }
}

/// Key identifying one tracked instrument. Keys never alias across
/// symbols, strikes or option types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalKey {
    pub symbol: String,
    pub strike: Decimal,
    pub option_type: OptionType,
}

impl SignalKey {
    pub fn new(symbol: impl Into<String>, strike: Decimal, option_type: OptionType) -> Self {
        Self {
            symbol: symbol.into(),
            strike,
            option_type,
        }
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.symbol, self.strike, self.option_type)
    }
}
