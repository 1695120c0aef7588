// tapcard-rs/libtapcard/src/card/emv/mod.rs

//! EMV payment application reader.
//!
//! Starting from the PPSE/PSE answer, the reader walks the directory to
//! each application template, selects the application, runs GET PROCESSING
//! OPTIONS and reads the records the AFL names. It stops issuing commands
//! as soon as PAN, expiry and issuer are all known; the first value found
//! for each wins.

pub mod pdol;
pub mod track2;

use log::{debug, trace};
use rand::RngCore;

use crate::card::{apdu, retry};
use crate::channel::CardChannel;
use crate::config::ReaderConfig;
use crate::tlv::{TlvCursor, TlvNode};
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

pub const TAG_FCI_TEMPLATE: u32 = 0x6F;
pub const TAG_RECORD_TEMPLATE: u32 = 0x70;
pub const TAG_GPO_FORMAT2: u32 = 0x77;
pub const TAG_GPO_FORMAT1: u32 = 0x80;
pub const TAG_FCI_PROPRIETARY: u32 = 0xA5;
pub const TAG_FCI_DISCRETIONARY: u32 = 0xBF0C;
pub const TAG_SFI: u32 = 0x88;
pub const TAG_APPLICATION_TEMPLATE: u32 = 0x61;
pub const TAG_AID: u32 = 0x4F;
pub const TAG_LABEL: u32 = 0x50;
pub const TAG_PDOL: u32 = 0x9F38;
pub const TAG_AFL: u32 = 0x94;
pub const TAG_TRACK2: u32 = 0x57;
pub const TAG_TRACK2_ALT: u32 = 0x9F6B;
pub const TAG_PAN: u32 = 0x5A;
pub const TAG_EXPIRY: u32 = 0x5F24;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CardInfo {
    pan: Option<String>,
    issuer: Option<String>,
    year: Option<u8>,
    month: Option<u8>,
}

impl CardInfo {
    fn complete(&self) -> bool {
        self.year.is_some() && self.month.is_some() && self.pan.is_some() && self.issuer.is_some()
    }
}

/// A card that answered the payment system directory selection.
#[derive(Debug, Clone)]
pub struct EmvCard {
    adf: Vec<u8>,
    info: CardInfo,
}

impl EmvCard {
    /// `adf` is the PPSE or PSE select response, status word included.
    pub fn new(adf: Vec<u8>) -> Self {
        Self {
            adf,
            info: CardInfo::default(),
        }
    }

    pub fn adf(&self) -> &[u8] {
        &self.adf
    }

    /// Run the application read; `Ok(true)` once PAN, expiry and issuer
    /// are all known.
    pub fn read(&mut self, ch: &dyn CardChannel, config: &ReaderConfig) -> Result<bool> {
        self.read_with_rng(ch, config, &mut rand::rng())
    }

    /// As [`EmvCard::read`], drawing the unpredictable number from `rng`.
    pub fn read_with_rng<R: RngCore + ?Sized>(
        &mut self,
        ch: &dyn CardChannel,
        config: &ReaderConfig,
        rng: &mut R,
    ) -> Result<bool> {
        let mut walker = Walker {
            ch,
            config,
            rng,
            contactless: ch.is_contactless(),
            info: CardInfo::default(),
            aid: None,
        };
        let result = walker.directory(TlvCursor::over_response(&self.adf)?);
        self.info = walker.info;
        result?;
        Ok(self.has_card_info())
    }

    pub fn has_card_info(&self) -> bool {
        self.info.complete()
    }

    pub fn pan(&self) -> Option<&str> {
        self.info.pan.as_deref()
    }

    /// Application label of the application that was read.
    pub fn issuer_name(&self) -> Option<&str> {
        self.info.issuer.as_deref()
    }

    pub fn expiry_year(&self) -> Option<u8> {
        self.info.year
    }

    pub fn expiry_month(&self) -> Option<u8> {
        self.info.month
    }

    /// Expiry as `MM/YY`.
    pub fn expiry(&self) -> Option<String> {
        match (self.info.month, self.info.year) {
            (Some(m), Some(y)) => Some(format!("{:02}/{:02}", m, y)),
            _ => None,
        }
    }

    /// Same PAN. A card whose PAN is unknown matches nothing.
    pub fn is_same_card(&self, other: &EmvCard) -> bool {
        matches!((self.pan(), other.pan()), (Some(a), Some(b)) if a == b)
    }
}

struct Walker<'c, R: ?Sized> {
    ch: &'c dyn CardChannel,
    config: &'c ReaderConfig,
    rng: &'c mut R,
    contactless: bool,
    info: CardInfo,
    aid: Option<Vec<u8>>,
}

impl<R: RngCore + ?Sized> Walker<'_, R> {
    /// Next sibling, or `None` once the card info is complete.
    fn next<'b>(&self, cur: &mut TlvCursor<'b>) -> Result<Option<TlvNode<'b>>> {
        if self.info.complete() {
            return Ok(None);
        }
        cur.next_node()
    }

    fn directory(&mut self, mut cur: TlvCursor<'_>) -> Result<()> {
        while let Some(node) = self.next(&mut cur)? {
            if node.tag() == TAG_FCI_TEMPLATE {
                let mut fci = node.child_cursor();
                while let Some(n) = self.next(&mut fci)? {
                    if n.tag() == TAG_FCI_PROPRIETARY {
                        self.proprietary_template(n.child_cursor())?;
                    }
                }
            }
        }
        Ok(())
    }

    fn proprietary_template(&mut self, mut cur: TlvCursor<'_>) -> Result<()> {
        while let Some(node) = self.next(&mut cur)? {
            match node.tag() {
                TAG_FCI_DISCRETIONARY => self.discretionary_data(node.child_cursor())?,
                TAG_SFI if node.data_length() == 1 => {
                    self.pse_record(node.data_bytes()[0])?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Contact PSE: the directory lives in record 1 of `sfi`.
    fn pse_record(&mut self, sfi: u8) -> Result<()> {
        let resp = retry::transmit_read(self.ch, &apdu::read_record(1, sfi))?;
        if resp.len() <= 2 {
            return Ok(());
        }
        let mut cur = TlvCursor::over_response(&resp)?;
        while let Some(node) = self.next(&mut cur)? {
            if node.tag() == TAG_RECORD_TEMPLATE {
                self.discretionary_data(node.child_cursor())?;
            }
        }
        Ok(())
    }

    fn discretionary_data(&mut self, mut cur: TlvCursor<'_>) -> Result<()> {
        while let Some(node) = self.next(&mut cur)? {
            if node.tag() == TAG_APPLICATION_TEMPLATE {
                self.aid = None;
                self.info.issuer = None;
                self.application_template(node.child_cursor())?;
                self.select_application()?;
            }
        }
        Ok(())
    }

    fn application_template(&mut self, mut cur: TlvCursor<'_>) -> Result<()> {
        while let Some(node) = self.next(&mut cur)? {
            match node.tag() {
                TAG_FCI_TEMPLATE | TAG_RECORD_TEMPLATE => {
                    self.application_template(node.child_cursor())?
                }
                TAG_AID => self.aid = Some(node.data_bytes().to_vec()),
                TAG_LABEL => self.info.issuer = Some(node.data_as_latin1_string()),
                _ => {}
            }
        }
        Ok(())
    }

    fn select_application(&mut self) -> Result<()> {
        let Some(aid) = self.aid.take() else {
            return Ok(());
        };
        if self.info.complete() {
            return Ok(());
        }
        if aid.len() > 16 {
            return Err(Error::MalformedRecord {
                offset: 0,
                reason: "AID longer than 16 bytes",
            });
        }
        debug!("selecting application {}", bytes_to_hex(&aid));
        let cmd = apdu::select(&aid, self.contactless);
        let resp = self.ch.transmit(&cmd)?;
        let resp = retry::handle_67_6c(self.ch, &cmd, resp)?;
        if resp.len() <= 2 {
            return Ok(());
        }
        let mut cur = TlvCursor::over_response(&resp)?;
        while let Some(node) = self.next(&mut cur)? {
            if matches!(node.tag(), TAG_FCI_TEMPLATE | TAG_RECORD_TEMPLATE) {
                self.application_file(node.child_cursor())?;
            }
        }
        Ok(())
    }

    fn application_file(&mut self, mut cur: TlvCursor<'_>) -> Result<()> {
        while let Some(node) = self.next(&mut cur)? {
            match node.tag() {
                TAG_FCI_TEMPLATE | TAG_RECORD_TEMPLATE => {
                    self.application_file(node.child_cursor())?
                }
                TAG_FCI_PROPRIETARY => self.application_fci(node.child_cursor())?,
                _ => {}
            }
        }
        Ok(())
    }

    fn collect_fci(&mut self, mut cur: TlvCursor<'_>, pdol: &mut Option<Vec<u8>>) -> Result<()> {
        while let Some(node) = self.next(&mut cur)? {
            match node.tag() {
                TAG_FCI_TEMPLATE | TAG_RECORD_TEMPLATE => {
                    self.collect_fci(node.child_cursor(), pdol)?
                }
                TAG_LABEL => self.info.issuer = Some(node.data_as_latin1_string()),
                TAG_PDOL => *pdol = Some(node.data_bytes().to_vec()),
                _ => {}
            }
        }
        Ok(())
    }

    fn application_fci(&mut self, cur: TlvCursor<'_>) -> Result<()> {
        let mut pdol = None;
        self.collect_fci(cur, &mut pdol)?;
        if self.info.complete() {
            return Ok(());
        }

        let data = pdol::gpo_data(pdol.as_deref(), self.config, &mut *self.rng)?;
        let mut cmd = Vec::with_capacity(6 + data.len());
        cmd.extend_from_slice(&[0x80, 0xA8, 0x00, 0x00, data.len() as u8]);
        cmd.extend_from_slice(&data);
        if self.contactless {
            cmd.push(0x00);
        }
        trace!("GPO {}", bytes_to_hex(&cmd));

        let resp = self.ch.transmit(&cmd)?;
        let resp = retry::handle_67_6c(self.ch, &cmd, resp)?;
        if resp.len() <= 2 {
            // 6984 and friends: this interface is not allowed
            return Ok(());
        }
        self.processing_options(&resp)
    }

    fn processing_options(&mut self, resp: &[u8]) -> Result<()> {
        let mut cur = TlvCursor::over_response(resp)?;
        while let Some(node) = self.next(&mut cur)? {
            match node.tag() {
                TAG_RECORD_TEMPLATE | TAG_GPO_FORMAT2 => {
                    let mut inner = node.child_cursor();
                    while let Some(n) = self.next(&mut inner)? {
                        match n.tag() {
                            TAG_TRACK2 => self.track2(&n.data_as_hex_string())?,
                            TAG_AFL => self.read_afl(n.data_bytes())?,
                            _ => {}
                        }
                    }
                }
                // AIP (2 bytes) then the AFL
                TAG_GPO_FORMAT1 => {
                    if let Some(afl) = node.data_bytes().get(2..) {
                        self.read_afl(afl)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// AFL entries are `SFI<<3, first, last, authenticated count`.
    fn read_afl(&mut self, afl: &[u8]) -> Result<()> {
        for entry in afl.chunks_exact(4) {
            let (sfi, first, last) = (entry[0] >> 3, entry[1], entry[2]);
            for record in first..=last {
                if self.info.complete() {
                    return Ok(());
                }
                let resp = retry::transmit_read(self.ch, &apdu::read_record(record, sfi))?;
                if resp.len() > 2 {
                    self.record(&resp)?;
                }
            }
        }
        Ok(())
    }

    fn record(&mut self, resp: &[u8]) -> Result<()> {
        let mut cur = TlvCursor::over_response(resp)?;
        while let Some(node) = self.next(&mut cur)? {
            if node.tag() != TAG_RECORD_TEMPLATE {
                continue;
            }
            let mut inner = node.child_cursor();
            while let Some(n) = self.next(&mut inner)? {
                match n.tag() {
                    TAG_TRACK2 | TAG_TRACK2_ALT => self.track2(&n.data_as_hex_string())?,
                    TAG_PAN => self.info.pan = Some(n.data_as_hex_string()),
                    TAG_EXPIRY => self.expiry_date(n)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn track2(&mut self, hex: &str) -> Result<()> {
        if let Some(t) = track2::decode(hex)? {
            debug!("track 2 expiry {:02}/{:02}", t.month, t.year);
            self.info.pan = Some(t.pan);
            self.info.year = Some(t.year);
            self.info.month = Some(t.month);
        }
        Ok(())
    }

    /// `5F24` is `YY MM DD` in BCD.
    fn expiry_date(&mut self, node: TlvNode<'_>) -> Result<()> {
        let bcd = |b: u8| -> Result<u8> {
            format!("{:02X}", b).parse().map_err(|_| Error::MalformedRecord {
                offset: node.data_offset(),
                reason: "expiry date is not BCD",
            })
        };
        match node.data_bytes() {
            [yy, mm, ..] => {
                self.info.year = Some(bcd(*yy)?);
                self.info.month = Some(bcd(*mm)?);
                Ok(())
            }
            _ => Err(Error::MalformedRecord {
                offset: node.data_offset(),
                reason: "expiry date too short",
            }),
        }
    }
}
