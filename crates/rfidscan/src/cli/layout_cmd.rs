//! `layout` subcommand: keyboard layout used to type badge numbers.

use rfidscan_lib::layout;

use super::{HidHandle, HidTransport, KeyboardLayout, Result};

pub(super) fn cmd_layout<T: HidTransport>(
    transport: &T,
    handle: HidHandle,
    wanted: KeyboardLayout,
) -> Result<()> {
    let current = layout::read_layout(transport, handle)?;
    if current == Some(wanted) {
        msg!("Keyboard layout already set to {wanted}");
        return Ok(());
    }
    layout::write_layout(transport, handle, wanted)?;
    log::debug!("layout {current:?} -> {wanted}");
    msg!("Keyboard layout set to {wanted}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfidscan_lib::protocol::REG_KEYBOARD_LAYOUT;
    use rfidscan_lib::transport::mock::MockTransport;

    #[test]
    fn writes_only_when_different() {
        let mut t = MockTransport::with_device("1A2B3C4D");
        let h = t.open_path("mock://1A2B3C4D").unwrap();

        cmd_layout(&t, h, KeyboardLayout::AzertyLaptop).unwrap();
        assert_eq!(t.register(REG_KEYBOARD_LAYOUT), Some(vec![0x03]));
        assert_eq!(t.request_count(), 2);

        cmd_layout(&t, h, KeyboardLayout::AzertyLaptop).unwrap();
        assert_eq!(t.request_count(), 3);
    }
}
