// tapcard-rs/libtapcard/src/config.rs

//! Reader configuration.
//!
//! The EMV defaults below are what the reader puts in GET PROCESSING
//! OPTIONS when a card's PDOL asks for them. They are placeholders for a
//! read-only terminal and carry no risk-management meaning.

use crate::utils::DEFAULT_READ_TIMEOUT_MS;

/// Country and currency code sent for 9F1A / 5F2A (ISO 3166 / 4217: 554).
pub const DEFAULT_COUNTRY_CODE: [u8; 2] = [0x05, 0x54];

/// Terminal transaction qualifiers sent for 9F66.
pub const DEFAULT_TTQ: [u8; 4] = [0x30, 0x00, 0x00, 0x00];

/// Upper bound on InListPassiveTarget re-issues per select.
pub const DEFAULT_MAX_SELECT_RETRIES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReaderConfig {
    /// Try EMV selection before the stored-value schemes.
    pub enable_emv: bool,
    pub receive_timeout_ms: u64,
    pub terminal_country_code: [u8; 2],
    pub transaction_currency_code: [u8; 2],
    pub terminal_transaction_qualifiers: [u8; 4],
    pub max_select_retries: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            enable_emv: true,
            receive_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            terminal_country_code: DEFAULT_COUNTRY_CODE,
            transaction_currency_code: DEFAULT_COUNTRY_CODE,
            terminal_transaction_qualifiers: DEFAULT_TTQ,
            max_select_retries: DEFAULT_MAX_SELECT_RETRIES,
        }
    }
}

impl ReaderConfig {
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder::default()
    }
}

/// Consuming builder for [`ReaderConfig`].
#[derive(Debug, Default)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    pub fn enable_emv(mut self, on: bool) -> Self {
        self.config.enable_emv = on;
        self
    }

    pub fn receive_timeout_ms(mut self, ms: u64) -> Self {
        self.config.receive_timeout_ms = ms;
        self
    }

    pub fn terminal_country_code(mut self, code: [u8; 2]) -> Self {
        self.config.terminal_country_code = code;
        self
    }

    pub fn transaction_currency_code(mut self, code: [u8; 2]) -> Self {
        self.config.transaction_currency_code = code;
        self
    }

    pub fn terminal_transaction_qualifiers(mut self, ttq: [u8; 4]) -> Self {
        self.config.terminal_transaction_qualifiers = ttq;
        self
    }

    pub fn max_select_retries(mut self, n: usize) -> Self {
        self.config.max_select_retries = n;
        self
    }

    pub fn build(self) -> ReaderConfig {
        self.config
    }
}
