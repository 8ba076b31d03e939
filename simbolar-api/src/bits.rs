//! Bitfield encoding shared by the server and the node firmware.
//!
//! The control byte carries relay 1..4 in bit 0..3 and the LCD flag in bit 4.
//! The input byte carries button 1..4 in bit 0..3; upper bits are ignored.

/// Number of relays driven by the control byte.
pub const RELAY_COUNT: usize = 4;

/// Number of buttons decoded from the input byte.
pub const BUTTON_COUNT: usize = 4;

/// Bit position of the LCD flag in the control byte.
pub const LCD_BIT: u8 = 4;

/// Returns whether bit `index` of `byte` is set.
pub const fn bit(byte: u8, index: u8) -> bool {
    (byte >> index) & 1 != 0
}

/// Packs relay and LCD states into the control byte.
pub fn pack_control(relays: [bool; RELAY_COUNT], lcd_on: bool) -> u8 {
    let relay_bits = relays
        .iter()
        .enumerate()
        .fold(0u8, |byte, (index, &on)| byte | (u8::from(on) << index));

    relay_bits | (u8::from(lcd_on) << LCD_BIT)
}

/// Splits a control byte back into relay and LCD states.
pub fn unpack_control(byte: u8) -> ([bool; RELAY_COUNT], bool) {
    let mut relays = [false; RELAY_COUNT];
    for (index, relay) in relays.iter_mut().enumerate() {
        *relay = bit(byte, index as u8);
    }

    (relays, bit(byte, LCD_BIT))
}

/// Decodes the button states from the raw input byte.
pub fn unpack_buttons(byte: u8) -> [bool; BUTTON_COUNT] {
    let mut buttons = [false; BUTTON_COUNT];
    for (index, button) in buttons.iter_mut().enumerate() {
        *button = bit(byte, index as u8);
    }

    buttons
}
