//! Reader options configuration.

/// Options for opening a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// When the workbook has no relationship table, locate each sheet at
    /// `xl/worksheets/sheet{sheetId}.xml` instead of failing.
    pub positional_fallback: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            positional_fallback: true,
        }
    }
}

impl ReaderOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that require every sheet to be resolved through the
    /// workbook relationship table.
    pub fn strict() -> Self {
        Self {
            positional_fallback: false,
        }
    }

    /// Enable or disable positional sheet resolution.
    pub fn with_positional_fallback(mut self, enabled: bool) -> Self {
        self.positional_fallback = enabled;
        self
    }
}
