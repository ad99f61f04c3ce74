//! Balance bookkeeping: assets, amounts, swap pricing
//!
//! Every mutation is expressed as a list of [`Leg`]s applied to a copy of
//! the balances; the caller commits the returned copy or drops it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, WalletError};

/// Fractional digits kept for every amount and balance
pub const AMOUNT_SCALE: u32 = 4;

/// Advisory lifetime of a swap quote
pub const QUOTE_TTL_SECS: i64 = 45;

static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^trac1[0-9a-z]{20,}$").expect("address pattern is valid")
});

/// Swap fee charged on the gross amount (0.3%)
pub fn swap_fee_rate() -> Decimal {
    Decimal::new(3, 3)
}

/// Supported assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    #[serde(rename = "TNK")]
    Tnk,
    #[serde(rename = "TRK")]
    Trk,
}

impl Asset {
    pub const ALL: [Asset; 2] = [Asset::Tnk, Asset::Trk];

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Tnk => "TNK",
            Asset::Trk => "TRK",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        Asset::ALL
            .into_iter()
            .find(|asset| asset.symbol() == s)
            .ok_or_else(|| WalletError::Validation("Asset must be TNK or TRK".to_string()))
    }
}

/// Round to four fractional digits, half away from zero, with a fixed scale
pub fn round_amount(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(AMOUNT_SCALE);
    rounded
}

/// Parse a user-supplied amount into a positive, rounded decimal
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let invalid = || WalletError::Validation("Amount must be greater than zero".to_string());
    let too_large = || WalletError::Validation("Amount is too large".to_string());

    let trimmed = input.trim();
    let value = match Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)) {
        Ok(value) => value,
        Err(_) if overflows_decimal(trimmed) => return Err(too_large()),
        Err(_) => return Err(invalid()),
    };

    let rounded = round_amount(value);
    if rounded <= Decimal::ZERO {
        return Err(invalid());
    }
    // rescale leaves the scale short when the mantissa has no room left
    if rounded.scale() != AMOUNT_SCALE {
        return Err(too_large());
    }
    Ok(rounded)
}

/// A numeric string at least one in magnitude that `Decimal` cannot hold
fn overflows_decimal(input: &str) -> bool {
    input.chars().any(|c| c.is_ascii_digit())
        && matches!(input.parse::<f64>(), Ok(value) if value >= 1.0)
}

/// Check a destination address against the `trac1...` format
pub fn validate_address(address: &str) -> Result<()> {
    if ADDRESS_PATTERN.is_match(address) {
        Ok(())
    } else {
        Err(WalletError::Validation("Invalid TRAC address format".to_string()))
    }
}

/// Short random reference such as `tx-1a2b3c4d`
pub fn reference(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..8])
}

/// One side of a ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Debit { asset: Asset, amount: Decimal },
    Credit { asset: Asset, amount: Decimal },
}

/// Per-asset balances, each non-negative with four fractional digits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<Asset, Decimal>);

impl Balances {
    /// Balance of `asset`, zero when absent
    pub fn get(&self, asset: Asset) -> Decimal {
        self.0.get(&asset).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Asset, Decimal)> + '_ {
        self.0.iter().map(|(asset, amount)| (*asset, *amount))
    }

    /// Apply every leg to a copy of these balances.
    ///
    /// Returns the fully resolved next state, or the first failure; `self`
    /// is never modified either way.
    pub fn apply(&self, legs: &[Leg]) -> Result<Balances> {
        let mut next = self.clone();
        for leg in legs {
            match *leg {
                Leg::Debit { asset, amount } => {
                    let current = next.get(asset);
                    if current < amount {
                        return Err(WalletError::InsufficientBalance(asset));
                    }
                    next.0.insert(asset, round_amount(current - amount));
                }
                Leg::Credit { asset, amount } => {
                    let credited = next.get(asset).checked_add(amount).ok_or_else(|| {
                        WalletError::Validation(format!("{} balance overflow", asset))
                    })?;
                    next.0.insert(asset, round_amount(credited));
                }
            }
        }
        Ok(next)
    }

    pub fn has_negative(&self) -> bool {
        self.0.values().any(|amount| amount.is_sign_negative() && !amount.is_zero())
    }
}

impl FromIterator<(Asset, Decimal)> for Balances {
    fn from_iter<I: IntoIterator<Item = (Asset, Decimal)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(asset, amount)| (asset, round_amount(amount)))
                .collect(),
        )
    }
}

/// Fixed conversion rates keyed by ordered asset pair
///
/// Serialized as `{"TNK_TRK": 0.52, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Decimal>", into = "BTreeMap<String, Decimal>")]
pub struct SwapRates {
    rates: BTreeMap<(Asset, Asset), Decimal>,
}

impl Default for SwapRates {
    fn default() -> Self {
        let mut rates = Self::empty();
        rates.insert(Asset::Tnk, Asset::Trk, Decimal::new(52, 2));
        rates.insert(Asset::Trk, Asset::Tnk, Decimal::new(19, 1));
        rates
    }
}

impl SwapRates {
    pub fn empty() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, from: Asset, to: Asset, rate: Decimal) {
        self.rates.insert((from, to), rate);
    }

    /// Positive rate for the ordered pair, if one is configured
    pub fn rate(&self, from: Asset, to: Asset) -> Option<Decimal> {
        self.rates
            .get(&(from, to))
            .copied()
            .filter(|rate| *rate > Decimal::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Asset, Asset, Decimal)> + '_ {
        self.rates.iter().map(|((from, to), rate)| (*from, *to, *rate))
    }
}

impl TryFrom<BTreeMap<String, Decimal>> for SwapRates {
    type Error = String;

    fn try_from(raw: BTreeMap<String, Decimal>) -> std::result::Result<Self, Self::Error> {
        let mut rates = SwapRates::empty();
        for (key, rate) in raw {
            let (from, to) = key
                .split_once('_')
                .ok_or_else(|| format!("swap pair key must look like FROM_TO, got {}", key))?;
            let from = from.parse::<Asset>().map_err(|e| e.to_string())?;
            let to = to.parse::<Asset>().map_err(|e| e.to_string())?;
            rates.insert(from, to, rate);
        }
        Ok(rates)
    }
}

impl From<SwapRates> for BTreeMap<String, Decimal> {
    fn from(rates: SwapRates) -> Self {
        rates
            .rates
            .into_iter()
            .map(|((from, to), rate)| (format!("{}_{}", from, to), rate))
            .collect()
    }
}

/// Preview of a conversion at the current rate table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    pub from_asset: Asset,
    pub to_asset: Asset,
    pub amount: Decimal,
    pub rate: Decimal,
    pub fee: Decimal,
    pub receive: Decimal,
    /// Advisory only; execution always reprices
    pub expires_at: DateTime<Utc>,
}

impl SwapQuote {
    /// Debit the source, credit the destination
    pub fn legs(&self) -> [Leg; 2] {
        [
            Leg::Debit {
                asset: self.from_asset,
                amount: self.amount,
            },
            Leg::Credit {
                asset: self.to_asset,
                amount: self.receive,
            },
        ]
    }
}

/// Price `amount` of `from` in `to` using the rate table
pub fn quote_swap(
    rates: &SwapRates,
    from: Asset,
    to: Asset,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<SwapQuote> {
    if from == to {
        return Err(WalletError::SamePairRejected);
    }
    let rate = rates
        .rate(from, to)
        .ok_or(WalletError::UnsupportedPair { from, to })?;

    let too_large = || WalletError::Validation("Amount is too large".to_string());
    let gross = amount.checked_mul(rate).ok_or_else(too_large)?;
    let fee = gross.checked_mul(swap_fee_rate()).ok_or_else(too_large)?;
    let receive = (gross - fee).max(Decimal::ZERO);

    Ok(SwapQuote {
        from_asset: from,
        to_asset: to,
        amount,
        rate: round_amount(rate),
        fee: round_amount(fee),
        receive: round_amount(receive),
        expires_at: now + Duration::seconds(QUOTE_TTL_SECS),
    })
}
