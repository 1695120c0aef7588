// tapcard-rs/libtapcard/src/card/calypso.rs

//! Calypso transit cards.

use derive_more::Display;
use log::debug;

use crate::card::apdu;
use crate::channel::CardChannel;
use crate::tlv::find_path;
use crate::types::{StatusWord, is_status_only};
use crate::utils::{BitReader, bytes_to_hex, read_be, to_money};
use crate::{Error, Result};

/// Issuer shown when the environment names none.
pub const DEFAULT_ISSUER: &str = "Calypso";

/// Path of the card serial number in the select answer.
const CSN_PATH: [u32; 4] = [0x6F, 0xA5, 0xBF0C, 0xC7];

const ENV_NETWORK: u64 = 0x01;
const ENV_ISSUER: u64 = 0x02;
const ENV_END_DATE: u64 = 0x04;

/// Days from 1970-01-01 to 1997-01-01, day zero of Calypso date fields.
const EPOCH_UNIX_DAYS: i64 = 9862;

/// A calendar day in the proleptic Gregorian calendar.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display(fmt = "{:02}/{:02}/{:04}", day, month, year)]
pub struct Date {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl Date {
    pub const EPOCH: Date = Date {
        year: 1997,
        month: 1,
        day: 1,
    };

    pub const fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// The day `days` after [`Date::EPOCH`].
    pub fn from_epoch_days(days: u32) -> Self {
        civil_from_unix_days(EPOCH_UNIX_DAYS + i64::from(days))
    }
}

/// Days since 1970-01-01 to a calendar date, counting in 400-year eras
/// that start on March 1st.
fn civil_from_unix_days(z: i64) -> Date {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    Date::new(year as i32, month, day)
}

/// Decoded environment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub version: u8,
    /// Network id as 6 hex digits, or the issuer id as 2 when the
    /// network is absent.
    pub issuer: Option<String>,
    pub end_date: Option<Date>,
}

/// Decode the bit-packed environment: 6-bit version, 7-bit presence
/// bitmap, then the present fields in bitmap order.
pub fn decode_environment(env: &[u8]) -> Result<Environment> {
    let mut bits = BitReader::new(env);
    let version = bits.read(6)? as u8;
    let bitmap = bits.read(7)?;

    let mut issuer = None;
    if bitmap & ENV_NETWORK != 0 {
        issuer = Some(format!("{:06X}", bits.read(24)?));
    }
    if bitmap & ENV_ISSUER != 0 {
        let id = bits.read(8)?;
        if issuer.is_none() {
            issuer = Some(format!("{:02X}", id));
        }
    }

    let mut end_date = None;
    if bitmap & ENV_END_DATE != 0 {
        end_date = Some(Date::from_epoch_days(bits.read(14)? as u32));
    }

    Ok(Environment {
        version,
        issuer,
        end_date,
    })
}

#[derive(Debug, Clone)]
pub struct CalypsoCard {
    adf: Vec<u8>,
    csn: Option<Vec<u8>>,
    environment: Option<Environment>,
    load: Option<Vec<u8>>,
}

impl CalypsoCard {
    pub fn new(adf: Vec<u8>) -> Self {
        Self {
            adf,
            csn: None,
            environment: None,
            load: None,
        }
    }

    pub fn adf(&self) -> &[u8] {
        &self.adf
    }

    /// Fetch the full select answer if needed, then the environment and
    /// the last stored-value load. `Ok(false)` when the answer carries no
    /// serial number.
    pub fn read(&mut self, ch: &dyn CardChannel) -> Result<bool> {
        if self.adf.len() == 2 {
            let mut resp = ch.transmit(&apdu::GET_RESPONSE)?;
            if let [0x6C, le] = resp[..] {
                resp = ch.transmit(&apdu::get_response(le))?;
            }
            self.adf = resp;
        }

        if self.adf.len() > 2 {
            let body = &self.adf[..self.adf.len() - 2];
            self.csn = find_path(body, &CSN_PATH)?.map(<[u8]>::to_vec);
        }
        let Some(csn) = &self.csn else {
            return Ok(false);
        };
        debug!("calypso serial {}", bytes_to_hex(csn));
        if csn.len() > 8 {
            return Err(Error::MalformedRecord {
                offset: 0,
                reason: "serial number wider than 64 bits",
            });
        }

        let env = ch.transmit(&apdu::CALYPSO_READ_ENVIRONMENT)?;
        if env.len() > 2 {
            self.environment = Some(decode_environment(&env)?);
        }

        let mut load = ch.transmit(&apdu::CALYPSO_SV_GET_LOAD)?;
        let not_here = is_status_only(&load)
            && StatusWord::from_response(&load).is_some_and(|sw| sw.is_not_available());
        if not_here {
            debug!("stored value not at class 00, trying FA");
            load = ch.transmit(&apdu::CALYPSO_SV_GET_LOAD_ALT)?;
        }
        self.load = Some(load);
        Ok(true)
    }

    pub fn csn(&self) -> Option<&[u8]> {
        self.csn.as_deref()
    }

    pub fn issuer_name(&self) -> &str {
        self.environment
            .as_ref()
            .and_then(|e| e.issuer.as_deref())
            .unwrap_or(DEFAULT_ISSUER)
    }

    /// Serial number in decimal, zero padded to at least 10 digits.
    pub fn pan(&self) -> Option<String> {
        let csn = self.csn.as_ref()?;
        read_be(csn, 0, csn.len()).ok().map(|n| format!("{:010}", n))
    }

    pub fn end_date(&self) -> Option<Date> {
        self.environment.as_ref().and_then(|e| e.end_date)
    }

    /// Expiry as `DD/MM/YYYY`.
    pub fn expiry(&self) -> Option<String> {
        self.end_date().map(|d| d.to_string())
    }

    /// Balance in cents from the last load record, when it is long enough
    /// to carry one.
    pub fn balance(&self) -> Option<u32> {
        match &self.load {
            Some(load) if load.len() > 11 => read_be(load, 8, 3).ok().map(|v| v as u32),
            _ => None,
        }
    }

    /// Balance in euros, when the load record carries one.
    pub fn balance_text(&self) -> Option<String> {
        self.balance()
            .map(|c| format!("\u{20AC}{}", to_money(i64::from(c))))
    }

    /// Byte-identical select answers.
    pub fn is_same_card(&self, other: &CalypsoCard) -> bool {
        self.adf == other.adf
    }
}
