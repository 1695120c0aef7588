// tapcard-rs/libtapcard/src/card/profile.rs

use derive_more::Display;

use crate::card::calypso::CalypsoCard;
use crate::card::emv::EmvCard;
use crate::card::snapper::SnapperCard;
use crate::utils::{card_number_with_space, pci_obscure};

/// Card family a profile belongs to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scheme {
    #[display(fmt = "EMV")]
    Emv,
    #[display(fmt = "Calypso")]
    Calypso,
    #[display(fmt = "Snapper")]
    Snapper,
    #[display(fmt = "unknown")]
    Unknown,
}

/// What identification learned about a card.
#[derive(Debug, Clone)]
pub enum CardProfile {
    Emv(EmvCard),
    Calypso(CalypsoCard),
    Snapper(SnapperCard),
    Unknown,
}

impl CardProfile {
    pub fn scheme(&self) -> Scheme {
        match self {
            CardProfile::Emv(_) => Scheme::Emv,
            CardProfile::Calypso(_) => Scheme::Calypso,
            CardProfile::Snapper(_) => Scheme::Snapper,
            CardProfile::Unknown => Scheme::Unknown,
        }
    }

    pub fn issuer_name(&self) -> String {
        match self {
            CardProfile::Emv(c) => c.issuer_name().unwrap_or_default().to_string(),
            CardProfile::Calypso(c) => c.issuer_name().to_string(),
            CardProfile::Snapper(c) => c.issuer_name(),
            CardProfile::Unknown => "unknown".to_string(),
        }
    }

    /// Card number for display; empty when the scheme has none.
    pub fn pan(&self) -> String {
        match self {
            CardProfile::Emv(c) => c.pan().unwrap_or_default().to_string(),
            CardProfile::Calypso(c) => c.pan().unwrap_or_default(),
            CardProfile::Snapper(c) => c.pan(),
            CardProfile::Unknown => String::new(),
        }
    }

    /// Expiry in the scheme's own format: `MM/YY` for EMV, `DD/MM/YYYY`
    /// for the stored-value schemes.
    pub fn expiry(&self) -> String {
        match self {
            CardProfile::Emv(c) => c.expiry().unwrap_or_default(),
            CardProfile::Calypso(c) => c.expiry().unwrap_or_default(),
            CardProfile::Snapper(c) => c.expiry(),
            CardProfile::Unknown => String::new(),
        }
    }

    /// Stored value in cents.
    pub fn balance(&self) -> Option<u32> {
        match self {
            CardProfile::Calypso(c) => c.balance(),
            CardProfile::Snapper(c) => c.balance(),
            _ => None,
        }
    }

    /// Balance formatted for display, currency symbol included. `None` when
    /// the card has no balance to show.
    pub fn balance_text(&self) -> Option<String> {
        match self {
            CardProfile::Calypso(c) => c.balance_text(),
            CardProfile::Snapper(c) => c.balance_text(),
            _ => None,
        }
    }

    /// Same scheme and same identity bytes. `Unknown` matches nothing,
    /// not even another `Unknown`.
    pub fn is_same_card(&self, other: &CardProfile) -> bool {
        match (self, other) {
            (CardProfile::Emv(a), CardProfile::Emv(b)) => a.is_same_card(b),
            (CardProfile::Calypso(a), CardProfile::Calypso(b)) => a.is_same_card(b),
            (CardProfile::Snapper(a), CardProfile::Snapper(b)) => a.is_same_card(b),
            _ => false,
        }
    }
}

impl PartialEq for CardProfile {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_card(other)
    }
}

/// Plain summary of a profile for display or serialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardSummary {
    pub scheme: Scheme,
    pub issuer: String,
    pub pan: String,
    pub expiry: String,
    pub balance: Option<u32>,
    pub balance_text: Option<String>,
}

impl From<&CardProfile> for CardSummary {
    fn from(p: &CardProfile) -> Self {
        Self {
            scheme: p.scheme(),
            issuer: p.issuer_name(),
            pan: p.pan(),
            expiry: p.expiry(),
            balance: p.balance(),
            balance_text: p.balance_text(),
        }
    }
}

impl CardSummary {
    /// PAN masked and grouped for a receipt or a log line.
    pub fn masked_pan(&self) -> String {
        card_number_with_space(&pci_obscure(&self.pan))
    }
}
