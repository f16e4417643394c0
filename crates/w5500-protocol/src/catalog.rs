//! W5500 register catalog
//!
//! Two fixed tables map a register address to its name and width in bytes:
//!
//! - **Common registers** live in the 5-bit address space reachable from a
//!   register command byte (`0x00..=0x1F`).
//! - **Socket registers** are laid out identically for every socket. Their
//!   names carry a `{}` placeholder that [`RegisterEntry::socket_name`] fills
//!   with the socket number.
//!
//! Multi-byte registers are transferred least significant byte first.

/// Placeholder in socket register names replaced by the socket number
const SOCKET_PLACEHOLDER: &str = "{}";

/// Name of the status register returned as the first MISO byte of every transaction
pub const STATUS_REGISTER: &str = "STATUS";

/// A named register and its width in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterEntry {
    /// Register name (socket registers contain a `{}` placeholder)
    pub name: &'static str,
    /// Width in bytes
    pub width: usize,
}

impl RegisterEntry {
    const fn new(name: &'static str, width: usize) -> Self {
        Self { name, width }
    }

    /// Render the name for a given socket, substituting the placeholder
    ///
    /// Names without a placeholder are returned unchanged.
    pub fn socket_name(&self, socket: u8) -> String {
        self.name
            .replacen(SOCKET_PLACEHOLDER, &socket.to_string(), 1)
    }
}

static COMMON_REGISTERS: [(u8, RegisterEntry); 6] = [
    (0x00, RegisterEntry::new("MODE", 1)),
    (0x01, RegisterEntry::new("GATEWAY_ADDR", 4)),
    (0x05, RegisterEntry::new("SUBMASK_ADDR", 4)),
    (0x09, RegisterEntry::new("SOURCE_HW_ADDR", 4)),
    (0x0F, RegisterEntry::new("SOURCE_IP_ADDR", 4)),
    (0x13, RegisterEntry::new("INTERRUPT_LOW_LEVEL_TIMER", 2)),
];

static SOCKET_REGISTERS: [(u16, RegisterEntry); 21] = [
    (0x0000, RegisterEntry::new("SOCKET {} MODE", 1)),
    (0x0001, RegisterEntry::new("SOCKET {} COMMAND", 1)),
    (0x0002, RegisterEntry::new("SOCKET {} INTERRUPT", 1)),
    (0x0003, RegisterEntry::new("SOCKET {} STATUS", 1)),
    (0x0004, RegisterEntry::new("SOCKET {} SOURCE PORT", 2)),
    (0x0006, RegisterEntry::new("SOCKET {} DESTINATION HW ADDR", 4)),
    (0x000C, RegisterEntry::new("SOCKET {} DESTINATION IP ADDR", 4)),
    (0x0012, RegisterEntry::new("SOCKET {} MAXIMUM SEGMENT SIZE", 2)),
    (0x0015, RegisterEntry::new("SOCKET {} IP TOS", 1)),
    (0x0016, RegisterEntry::new("SOCKET {} IP TTL", 1)),
    (0x001E, RegisterEntry::new("SOCKET {} RECEIVE BUFFER SIZE", 1)),
    (0x001F, RegisterEntry::new("SOCKET {} TRANSMIT BUFFER SIZE", 1)),
    (0x0020, RegisterEntry::new("SOCKET {} TX FREE SIZE", 2)),
    (0x0022, RegisterEntry::new("SOCKET {} TX READ POINTER", 2)),
    (0x0024, RegisterEntry::new("SOCKET {} TX WRITE POINTER", 2)),
    (0x0026, RegisterEntry::new("SOCKET {} RX RECEIVED SIZE", 2)),
    (0x0028, RegisterEntry::new("SOCKET {} RX READ POINTER", 2)),
    (0x002A, RegisterEntry::new("SOCKET {} RX WRITE POINTER", 2)),
    (0x002C, RegisterEntry::new("SOCKET {} INTERRUPT MASK", 1)),
    (0x002D, RegisterEntry::new("SOCKET {} FRAGMENT OFFSET IN IP HEADER", 2)),
    (0x002F, RegisterEntry::new("SOCKET {} KEEP ALIVE TIMER", 1)),
];

/// Look up a chip-wide register by its 5-bit address
pub fn common_register(address: u8) -> Option<&'static RegisterEntry> {
    COMMON_REGISTERS
        .iter()
        .find(|(addr, _)| *addr == address)
        .map(|(_, entry)| entry)
}

/// Look up a per-socket register by its offset within the socket block
pub fn socket_register(offset: u16) -> Option<&'static RegisterEntry> {
    SOCKET_REGISTERS
        .iter()
        .find(|(addr, _)| *addr == offset)
        .map(|(_, entry)| entry)
}

/// All chip-wide registers in address order
pub fn common_registers() -> impl Iterator<Item = (u8, &'static RegisterEntry)> {
    COMMON_REGISTERS.iter().map(|(addr, entry)| (*addr, entry))
}

/// All per-socket registers in offset order
pub fn socket_registers() -> impl Iterator<Item = (u16, &'static RegisterEntry)> {
    SOCKET_REGISTERS.iter().map(|(addr, entry)| (*addr, entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_lookup() {
        let entry = common_register(0x09).unwrap();
        assert_eq!(entry.name, "SOURCE_HW_ADDR");
        assert_eq!(entry.width, 4);

        assert_eq!(common_register(0x13).unwrap().width, 2);
        assert!(common_register(0x02).is_none());
        assert!(common_register(0x1F).is_none());
    }

    #[test]
    fn test_socket_lookup_and_name() {
        let entry = socket_register(0x0004).unwrap();
        assert_eq!(entry.width, 2);
        assert_eq!(entry.socket_name(3), "SOCKET 3 SOURCE PORT");

        assert!(socket_register(0x0005).is_none());
    }

    #[test]
    fn test_socket_name_without_placeholder() {
        let entry = common_register(0x00).unwrap();
        assert_eq!(entry.socket_name(1), "MODE");
    }

    #[test]
    fn test_tables_sorted_and_addressable() {
        let common: Vec<u8> = common_registers().map(|(addr, _)| addr).collect();
        assert!(common.windows(2).all(|w| w[0] < w[1]));
        assert!(common.iter().all(|&addr| addr <= 0x1F));

        let sockets: Vec<u16> = socket_registers().map(|(addr, _)| addr).collect();
        assert!(sockets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_widths_nonzero() {
        assert!(common_registers().all(|(_, e)| e.width > 0));
        assert!(socket_registers().all(|(_, e)| e.width > 0 && e.name.contains("{}")));
    }
}
