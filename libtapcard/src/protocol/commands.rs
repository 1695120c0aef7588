// tapcard-rs/libtapcard/src/protocol/commands.rs

use crate::constants::*;

/// RF configuration items understood by `RFConfiguration` (D4 32).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfOption {
    /// Item 0x01: switch the RF field on or off.
    ActivateField,
    /// Item 0x05: retry counts for ATR, PSL and passive activation.
    /// Enabled means retry forever (0xFF each).
    InfiniteSelect,
}

/// Commands the driver sends to the PN533. New commands should be added
/// here together with their response code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetFirmwareVersion,
    ReadRegister { address: u16 },
    WriteRegister { address: u16, value: u8 },
    RfConfiguration { option: RfOption, enable: bool },
    /// One ISO 14443-A target at 106 kbps.
    InListPassiveTarget,
    /// Card exchange through the chip's ISO-DEP engine.
    InDataExchange { apdu: Vec<u8> },
    /// Raw exchange; the leading `02` is the I-block PCB.
    InCommunicateThru { apdu: Vec<u8> },
}

impl Command {
    /// PN533 command code (the byte after `D4`)
    pub fn command_code(&self) -> u8 {
        match self {
            Self::GetFirmwareVersion => PN533_CMD_GET_FIRMWARE_VERSION,
            Self::ReadRegister { .. } => PN533_CMD_READ_REGISTER,
            Self::WriteRegister { .. } => PN533_CMD_WRITE_REGISTER,
            Self::RfConfiguration { .. } => PN533_CMD_RF_CONFIGURATION,
            Self::InListPassiveTarget => PN533_CMD_IN_LIST_PASSIVE_TARGET,
            Self::InDataExchange { .. } => PN533_CMD_IN_DATA_EXCHANGE,
            Self::InCommunicateThru { .. } => PN533_CMD_IN_COMMUNICATE_THRU,
        }
    }

    /// Code the chip answers with.
    pub fn response_code(&self) -> u8 {
        self.command_code().wrapping_add(1)
    }

    /// Frame payload: `D4 <code> <params>`
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![PN533_CMD_PREFIX_HOST, self.command_code()];
        match self {
            Self::GetFirmwareVersion => {}
            Self::ReadRegister { address } => out.extend_from_slice(&address.to_be_bytes()),
            Self::WriteRegister { address, value } => {
                out.extend_from_slice(&address.to_be_bytes());
                out.push(*value);
            }
            Self::RfConfiguration { option, enable } => match option {
                RfOption::ActivateField => out.extend_from_slice(&[0x01, u8::from(*enable)]),
                RfOption::InfiniteSelect => {
                    let retry = if *enable { 0xFF } else { 0x00 };
                    out.extend_from_slice(&[0x05, retry, retry, retry]);
                }
            },
            Self::InListPassiveTarget => out.extend_from_slice(&[0x01, 0x00]),
            Self::InDataExchange { apdu } => {
                out.push(0x01);
                out.extend_from_slice(apdu);
            }
            Self::InCommunicateThru { apdu } => {
                out.push(0x02);
                out.extend_from_slice(apdu);
            }
        }
        out
    }
}

/// True when `resp` answers `req`: both header bytes are one above the
/// request's (`D4 xx` is answered by `D5 xx+1`).
pub fn is_response(req: &[u8], resp: &[u8]) -> bool {
    match (req, resp) {
        ([q0, q1, ..], [r0, r1, ..]) => q0.wrapping_add(1) == *r0 && q1.wrapping_add(1) == *r1,
        _ => false,
    }
}
