//! The running memory [Budget] for a pass.

/// Tracks usage against a fixed maximum.
///
/// Usage only ever grows, and [Budget::charge] refuses to push it past the maximum.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Budget {
    current_usage: u64,
    max_bytes: u64,
}

/// Returned by [Budget::charge] when the charge would exceed the maximum.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("charging {requested} bytes at {current_usage} of {max_bytes} would exceed the budget")]
pub struct BudgetExceeded {
    pub current_usage: u64,
    pub requested: u64,
    pub max_bytes: u64,
}

impl Budget {
    pub fn new(current_usage: u64, max_bytes: u64) -> Budget {
        Budget {
            current_usage,
            max_bytes,
        }
    }

    pub fn current_usage(&self) -> u64 {
        self.current_usage
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Bytes left before the maximum.  Zero if the baseline already exceeds it.
    pub fn headroom(&self) -> u64 {
        self.max_bytes.saturating_sub(self.current_usage)
    }

    /// Would adding `size` bytes keep usage within the maximum?
    pub fn fits(&self, size: u64) -> bool {
        match self.current_usage.checked_add(size) {
            Some(projected) => projected <= self.max_bytes,
            None => false,
        }
    }

    /// Like [Budget::fits], but says why not.
    pub fn check(&self, size: u64) -> Result<(), BudgetExceeded> {
        if self.fits(size) {
            Ok(())
        } else {
            Err(BudgetExceeded {
                current_usage: self.current_usage,
                requested: size,
                max_bytes: self.max_bytes,
            })
        }
    }

    pub fn charge(&mut self, size: u64) -> Result<(), BudgetExceeded> {
        self.check(size)?;
        self.current_usage += size;
        Ok(())
    }

    /// The same maximum with `used` more bytes already in use.
    pub fn with_usage(&self, used: u64) -> Budget {
        Budget::new(self.current_usage.saturating_add(used), self.max_bytes)
    }
}
