// tapcard-rs/libtapcard/src/device/config.rs

//! PN533 CIU register setup applied during initialisation

pub const REG_CIU_BIT_FRAMING: u16 = 0x633D;
pub const REG_CIU_TX_MODE: u16 = 0x6302;
pub const REG_CIU_RX_MODE: u16 = 0x6303;
pub const REG_CIU_MANUAL_RCV: u16 = 0x630D;
pub const REG_CIU_STATUS2: u16 = 0x6338;
pub const REG_CIU_TX_AUTO: u16 = 0x6305;
pub const REG_CIU_CONTROL: u16 = 0x633C;

pub const SYMBOL_TX_LAST_BITS: u8 = 0x07;
pub const SYMBOL_TX_CRC_ENABLE: u8 = 0x80;
pub const SYMBOL_RX_CRC_ENABLE: u8 = 0x80;
pub const SYMBOL_PARITY_DISABLE: u8 = 0x10;
pub const SYMBOL_MF_CRYPTO1_ON: u8 = 0x08;
pub const SYMBOL_FORCE_100_ASK: u8 = 0x40;
pub const SYMBOL_INITIATOR: u8 = 0x10;

/// One masked register write: `new = value | (current & !mask)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSetting {
    pub address: u16,
    pub mask: u8,
    pub value: u8,
}

const fn setting(address: u16, mask: u8, value: u8) -> RegisterSetting {
    RegisterSetting {
        address,
        mask,
        value,
    }
}

/// Applied in this order after GetFirmwareVersion.
pub const INIT_REGISTERS: [RegisterSetting; 7] = [
    setting(REG_CIU_BIT_FRAMING, SYMBOL_TX_LAST_BITS, 0x00),
    // CRC on both directions
    setting(REG_CIU_TX_MODE, SYMBOL_TX_CRC_ENABLE, SYMBOL_TX_CRC_ENABLE),
    setting(REG_CIU_RX_MODE, SYMBOL_RX_CRC_ENABLE, SYMBOL_RX_CRC_ENABLE),
    // parity on
    setting(REG_CIU_MANUAL_RCV, SYMBOL_PARITY_DISABLE, 0x00),
    setting(REG_CIU_STATUS2, SYMBOL_MF_CRYPTO1_ON, 0x00),
    // initiator, 100% ASK
    setting(REG_CIU_TX_AUTO, SYMBOL_FORCE_100_ASK, SYMBOL_FORCE_100_ASK),
    setting(REG_CIU_CONTROL, SYMBOL_INITIATOR, SYMBOL_INITIATOR),
];
