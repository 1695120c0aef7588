// tapcard-rs/libtapcard/src/constants.rs
//! Common protocol constants used across the crate

/// Reader-chip wire frame preamble: 0x00 0x00 0xFF
pub const FRAME_PREAMBLE: [u8; 3] = [0x00, 0x00, 0xFF];

/// Reader-chip wire frame postamble: 0x00
pub const FRAME_POSTAMBLE: u8 = 0x00;

/// Minimal data frame length in bytes (empty payload)
pub const MIN_FRAME_LEN: usize = 7;

/// Maximum payload length for a normal information frame
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Fixed ACK frame exchanged in both directions
pub const ACK_FRAME: [u8; 6] = [0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00];

/// PN533 host->device prefix (D4) and device->host prefix (D5)
pub const PN533_CMD_PREFIX_HOST: u8 = 0xD4;
pub const PN533_CMD_PREFIX_DEVICE: u8 = 0xD5;

/// PN533 command codes used by the driver
pub const PN533_CMD_GET_FIRMWARE_VERSION: u8 = 0x02;
pub const PN533_CMD_READ_REGISTER: u8 = 0x06;
pub const PN533_CMD_WRITE_REGISTER: u8 = 0x08;
pub const PN533_CMD_RF_CONFIGURATION: u8 = 0x32;
pub const PN533_CMD_IN_DATA_EXCHANGE: u8 = 0x40;
pub const PN533_CMD_IN_COMMUNICATE_THRU: u8 = 0x42;
pub const PN533_CMD_IN_LIST_PASSIVE_TARGET: u8 = 0x4A;

/// NXP PN533 USB identifiers
pub const NXP_VENDOR_ID: u16 = 0x04CC;
pub const NXP_PN533_PRODUCT_ID: u16 = 0x0531;
