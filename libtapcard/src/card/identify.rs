// tapcard-rs/libtapcard/src/card/identify.rs

//! Card identification.
//!
//! Schemes are tried in a fixed order: EMV (when enabled), then Snapper,
//! then Calypso. A scheme whose selection or read fails is skipped; only
//! a driver that completes its read produces a profile. Framing errors
//! are not swallowed since the channel behind them is dead.

use log::{debug, info};

use crate::card::calypso::CalypsoCard;
use crate::card::emv::EmvCard;
use crate::card::profile::{CardProfile, Scheme};
use crate::card::snapper::SnapperCard;
use crate::card::{apdu, retry};
use crate::channel::CardChannel;
use crate::config::ReaderConfig;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyState {
    NotStarted,
    TryingEmv,
    TryingSnapper,
    TryingCalypso,
    Identified(Scheme),
    NoneMatched,
}

/// Outcome of one scheme attempt.
enum Attempt {
    Found(CardProfile),
    NotThisScheme,
    /// The card went away; later schemes would fail the same way.
    CardGone,
}

pub struct Identifier<'a> {
    ch: &'a dyn CardChannel,
    config: &'a ReaderConfig,
    state: IdentifyState,
}

impl<'a> Identifier<'a> {
    pub fn new(ch: &'a dyn CardChannel, config: &'a ReaderConfig) -> Self {
        Self {
            ch,
            config,
            state: IdentifyState::NotStarted,
        }
    }

    pub fn state(&self) -> IdentifyState {
        self.state
    }

    fn enter(&mut self, state: IdentifyState) {
        debug!("identify: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Identify the card on a channel whose transaction the caller holds.
    /// Returns `CardProfile::Unknown` when no scheme matched.
    pub fn identify(&mut self) -> Result<CardProfile> {
        let mut steps: Vec<(IdentifyState, fn(&Self) -> Result<Option<CardProfile>>)> =
            Vec::with_capacity(3);
        if self.config.enable_emv && !self.ch.is_uicc() {
            steps.push((IdentifyState::TryingEmv, Self::try_emv));
        }
        steps.push((IdentifyState::TryingSnapper, Self::try_snapper));
        steps.push((IdentifyState::TryingCalypso, Self::try_calypso));

        for (state, step) in steps {
            self.enter(state);
            match Self::classify(step(self))? {
                Attempt::Found(profile) => {
                    info!("card identified as {}", profile.scheme());
                    self.enter(IdentifyState::Identified(profile.scheme()));
                    return Ok(profile);
                }
                Attempt::NotThisScheme => {}
                Attempt::CardGone => break,
            }
        }
        self.enter(IdentifyState::NoneMatched);
        Ok(CardProfile::Unknown)
    }

    fn classify(result: Result<Option<CardProfile>>) -> Result<Attempt> {
        match result {
            Ok(Some(profile)) => Ok(Attempt::Found(profile)),
            Ok(None) => Ok(Attempt::NotThisScheme),
            Err(e) if e.is_framing() => Err(e),
            Err(e @ (Error::NoCard | Error::TransactionLost)) => {
                debug!("card lost during identification: {}", e);
                Ok(Attempt::CardGone)
            }
            Err(e) => {
                debug!("not this scheme: {}", e);
                Ok(Attempt::NotThisScheme)
            }
        }
    }

    fn try_emv(&self) -> Result<Option<CardProfile>> {
        let contactless = self.ch.is_contactless();
        // Contact cards are treated as T=0: no Le on a case-4 select
        let cmd = apdu::select(apdu::PPSE_NAME, contactless);
        let adf = self.ch.transmit(&cmd)?;
        let mut adf = retry::handle_67_6c(self.ch, &cmd, adf)?;

        if adf.len() == 2 && !contactless {
            adf = self.ch.transmit(&apdu::select(apdu::PSE_NAME, false))?;
        }
        if adf.len() <= 2 {
            return Ok(None);
        }

        let mut card = EmvCard::new(adf);
        if card.read(self.ch, self.config)? {
            Ok(Some(CardProfile::Emv(card)))
        } else {
            Ok(None)
        }
    }

    fn try_snapper(&self) -> Result<Option<CardProfile>> {
        let adf = self.ch.transmit(&apdu::select(&apdu::SNAPPER_AID, false))?;
        if adf.len() <= 2 {
            return Ok(None);
        }
        let mut card = SnapperCard::new(adf);
        if card.read(self.ch)? {
            Ok(Some(CardProfile::Snapper(card)))
        } else {
            Ok(None)
        }
    }

    fn try_calypso(&self) -> Result<Option<CardProfile>> {
        let adf = self.ch.transmit(&apdu::select(apdu::CALYPSO_AID, false))?;
        match adf.len().checked_sub(2).and_then(|i| adf.get(i)) {
            Some(0x90) => {}
            _ => return Ok(None),
        }
        let mut card = CalypsoCard::new(adf);
        if card.read(self.ch)? {
            Ok(Some(CardProfile::Calypso(card)))
        } else {
            Ok(None)
        }
    }
}

/// One complete card read: open a transaction, identify, and close it.
///
/// `keep` sees the identified profile and decides whether the connection
/// stays open after the transaction. `Ok(None)` when no card could be
/// connected.
pub fn read_card<F>(ch: &dyn CardChannel, config: &ReaderConfig, keep: F) -> Result<Option<CardProfile>>
where
    F: FnOnce(&CardProfile) -> bool,
{
    if !ch.begin_transaction()? {
        debug!("no card to connect");
        return Ok(None);
    }
    let result = Identifier::new(ch, config).identify();
    let keep_open = match &result {
        Ok(CardProfile::Unknown) | Err(_) => false,
        Ok(profile) => keep(profile),
    };
    ch.end_transaction(keep_open)?;
    result.map(Some)
}
