use std::fmt;

use apebase_store::schema::PAGE_SIZE;

use super::ValidationError;

/// Zero-based index of a fixed-size listing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Page(u64);

impl Page {
    pub const FIRST: Self = Self(0);

    #[must_use]
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    /// Parses page text supplied by a caller. Missing or blank text is page 0.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidPage` for anything but a non-negative
    /// integer.
    pub fn parse(text: Option<&str>) -> Result<Self, ValidationError> {
        let Some(text) = text.map(str::trim).filter(|text| !text.is_empty()) else {
            return Ok(Self::FIRST);
        };
        text.parse::<u64>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidPage(text.to_string()))
    }

    #[must_use]
    pub const fn index(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_first(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Number of records skipped before this page.
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.0.saturating_mul(PAGE_SIZE)
    }

    #[must_use]
    pub const fn limit(self) -> u64 {
        PAGE_SIZE
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
