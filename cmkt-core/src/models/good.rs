use crate::{Error, Result};

/// A kind of good (an impression pool) with a finite, integral supply.
///
/// The supply is fixed at creation. The remaining supply during a run is
/// tracked by the allocation engine, never by the good itself.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "GoodDto", into = "GoodDto")
)]
pub struct Good {
    supply: u32,
    reserve_price: f64,
}

impl Good {
    /// Creates a good with the given supply and no reserve price
    pub fn new(supply: u32) -> Self {
        Self {
            supply,
            reserve_price: 0.0,
        }
    }

    /// Creates a good with the given supply and per-unit reserve price
    pub fn with_reserve(supply: u32, reserve_price: f64) -> Result<Self> {
        GoodDto {
            supply,
            reserve_price: Some(reserve_price),
        }
        .try_into()
    }

    /// The number of units this good supplies
    pub fn supply(&self) -> u32 {
        self.supply
    }

    /// The per-unit price below which this good is not sold
    pub fn reserve_price(&self) -> f64 {
        self.reserve_price
    }
}

/// A DTO to ensure that we always validate when we deserialize from an untrusted source
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug)]
pub struct GoodDto {
    /// The number of units supplied
    pub supply: u32,
    /// The per-unit reserve price, defaulting to zero
    #[cfg_attr(feature = "serde", serde(default))]
    pub reserve_price: Option<f64>,
}

impl TryFrom<GoodDto> for Good {
    type Error = Error;

    fn try_from(value: GoodDto) -> Result<Self> {
        let reserve_price = value.reserve_price.unwrap_or(0.0);
        if !reserve_price.is_finite() || reserve_price < 0.0 {
            return Err(Error::InvalidGood { reserve_price });
        }
        Ok(Self {
            supply: value.supply,
            reserve_price,
        })
    }
}

impl From<Good> for GoodDto {
    fn from(value: Good) -> Self {
        Self {
            supply: value.supply,
            reserve_price: if value.reserve_price == 0.0 {
                None
            } else {
                Some(value.reserve_price)
            },
        }
    }
}
