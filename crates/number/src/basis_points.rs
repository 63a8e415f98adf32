use {
    std::fmt::{self, Display, Formatter},
    thiserror::Error,
};

/// A fraction expressed in 1/100 of a percent. Always within `[0, 10000]`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BasisPoints(u16);

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("{0} basis points is more than 100%")]
pub struct OutOfRange(pub u16);

impl BasisPoints {
    pub const MAX: Self = Self(10_000);

    pub fn get(self) -> u16 {
        self.0
    }

    /// Whether the value can be represented by an unsigned integer of `bits`
    /// width, e.g. a Solidity `uint8`.
    pub fn fits_in_bits(self, bits: usize) -> bool {
        bits >= 16 || u32::from(self.0) < (1u32 << bits)
    }
}

impl TryFrom<u16> for BasisPoints {
    type Error = OutOfRange;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value > Self::MAX.0 {
            return Err(OutOfRange(value));
        }
        Ok(Self(value))
    }
}

impl Display for BasisPoints {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps ({}.{:02}%)", self.0, self.0 / 100, self.0 % 100)
    }
}
