//! Static code → name lookup tables for the HCI opcode spaces
//!
//! Each HCI command group and the event space has its own small, independent
//! ordinal numbering; the tables below are indexed directly by code. Lookups
//! are bounds-checked once, here, instead of at every call site, and an
//! out-of-range code yields the generic [`UNKNOWN`] marker rather than a
//! failure: unrecognized codes are expected input, not errors.

// ----------------------------------------------------------------------------
// Code Table
// ----------------------------------------------------------------------------

/// Marker returned for codes outside a table's declared range
pub const UNKNOWN: &str = "Unknown";

/// A fixed (code, name) table for one opcode space
#[derive(Debug, Clone, Copy)]
pub struct CodeTable {
    names: &'static [&'static str],
}

impl CodeTable {
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    /// Name for `code`, or [`UNKNOWN`] if out of range
    pub fn lookup(&self, code: u16) -> &'static str {
        self.names.get(code as usize).copied().unwrap_or(UNKNOWN)
    }

    /// Check whether `code` is inside the table's declared range
    pub fn contains(&self, code: u16) -> bool {
        (code as usize) < self.names.len()
    }
}

// ----------------------------------------------------------------------------
// Packet Types and Opcode Constants
// ----------------------------------------------------------------------------

pub const HCI_COMMAND_PKT: u8 = 0x01;
pub const HCI_ACLDATA_PKT: u8 = 0x02;
pub const HCI_SCODATA_PKT: u8 = 0x03;
pub const HCI_EVENT_PKT: u8 = 0x04;
pub const HCI_VENDOR_PKT: u8 = 0xff;

pub const OGF_LINK_CTL: u16 = 0x01;
pub const OGF_LINK_POLICY: u16 = 0x02;
pub const OGF_HOST_CTL: u16 = 0x03;
pub const OGF_INFO_PARAM: u16 = 0x04;
pub const OGF_STATUS_PARAM: u16 = 0x05;
pub const OGF_TESTING_CMD: u16 = 0x3e;
pub const OGF_VENDOR_CMD: u16 = 0x3f;

pub const OCF_READ_LOCAL_VERSION: u16 = 0x0001;

pub const EVT_CMD_COMPLETE: u8 = 0x0e;
pub const EVT_TESTING: u8 = 0xfe;
pub const EVT_VENDOR: u8 = 0xff;

/// Pack a 6-bit OGF and 10-bit OCF into a 16-bit opcode
pub const fn cmd_opcode_pack(ogf: u16, ocf: u16) -> u16 {
    (ogf << 10) | (ocf & 0x03ff)
}

pub const fn cmd_opcode_ogf(opcode: u16) -> u16 {
    opcode >> 10
}

pub const fn cmd_opcode_ocf(opcode: u16) -> u16 {
    opcode & 0x03ff
}

// ----------------------------------------------------------------------------
// Event Names
// ----------------------------------------------------------------------------

pub static EVENTS: CodeTable = CodeTable::new(&[
    "Unknown",
    "Inquiry Complete",
    "Inquiry Result",
    "Connect Complete",
    "Connect Request",
    "Disconn Complete",
    "Auth Complete",
    "Remote Name Req Complete",
    "Encrypt Change",
    "Change Connection Link Key Complete",
    "Master Link Key Complete",
    "Read Remote Supported Features",
    "Read Remote Ver Info Complete",
    "QoS Setup Complete",
    "Command Complete",
    "Command Status",
    "Hardware Error",
    "Flush Occurred",
    "Role Change",
    "Number of Completed Packets",
    "Mode Change",
    "Return Link Keys",
    "PIN Code Request",
    "Link Key Request",
    "Link Key Notification",
    "Loopback Command",
    "Data Buffer Overflow",
    "Max Slots Change",
    "Read Clock Offset Complete",
    "Connection Packet Type Changed",
    "QoS Violation",
    "Page Scan Mode Change",
    "Page Scan Repetition Mode Change",
    "Flow Specification Complete",
    "Inquiry Result with RSSI",
    "Read Remote Extended Features",
    "Unknown",
    "Unknown",
    "Unknown",
    "Unknown",
    "Unknown",
    "Unknown",
    "Unknown",
    "Unknown",
    "Synchronous Connect Complete",
    "Synchronous Connect Changed",
]);

// ----------------------------------------------------------------------------
// Command Names, one table per opcode group
// ----------------------------------------------------------------------------

pub static CMD_LINKCTL: CodeTable = CodeTable::new(&[
    "Unknown",
    "Inquiry",
    "Inquiry Cancel",
    "Periodic Inquiry Mode",
    "Exit Periodic Inquiry Mode",
    "Create Connection",
    "Disconnect",
    "Add SCO Connection",
    "Create Connection Cancel",
    "Accept Connection Request",
    "Reject Connection Request",
    "Link Key Request Reply",
    "Link Key Request Negative Reply",
    "PIN Code Request Reply",
    "PIN Code Request Negative Reply",
    "Change Connection Packet Type",
    "Unknown",
    "Authentication Requested",
    "Unknown",
    "Set Connection Encryption",
    "Unknown",
    "Change Connection Link Key",
    "Unknown",
    "Master Link Key",
    "Unknown",
    "Remote Name Request",
    "Remote Name Request Cancel",
    "Read Remote Supported Features",
    "Read Remote Extended Features",
    "Read Remote Version Information",
    "Unknown",
    "Read Clock Offset",
    "Read LMP Handle",
    "Unknown",
    "Unknown",
    "Unknown",
    "Unknown",
    "Unknown",
    "Unknown",
    "Unknown",
    "Setup Synchronous Connection",
    "Accept Synchronous Connection",
    "Reject Synchronous Connection",
]);

pub static CMD_LINKPOL: CodeTable = CodeTable::new(&[
    "Unknown",
    "Hold Mode",
    "Unknown",
    "Sniff Mode",
    "Exit Sniff Mode",
    "Park State",
    "Exit Park State",
    "QoS Setup",
    "Unknown",
    "Role Discovery",
    "Unknown",
    "Switch Role",
    "Read Link Policy Settings",
    "Write Link Policy Settings",
    "Read Default Link Policy Settings",
    "Write Default Link Policy Settings",
    "Flow Specification",
]);

pub static CMD_HOSTCTL: CodeTable = CodeTable::new(&[
    "Unknown",
    "Set Event Mask",
    "Unknown",
    "Reset",
    "Unknown",
    "Set Event Filter",
    "Unknown",
    "Unknown",
    "Flush",
    "Read PIN Type ",
    "Write PIN Type",
    "Create New Unit Key",
    "Unknown",
    "Read Stored Link Key",
    "Unknown",
    "Unknown",
    "Unknown",
    "Write Stored Link Key",
    "Delete Stored Link Key",
    "Write Local Name",
    "Read Local Name",
    "Read Connection Accept Timeout",
    "Write Connection Accept Timeout",
    "Read Page Timeout",
    "Write Page Timeout",
    "Read Scan Enable",
    "Write Scan Enable",
    "Read Page Scan Activity",
    "Write Page Scan Activity",
    "Read Inquiry Scan Activity",
    "Write Inquiry Scan Activity",
    "Read Authentication Enable",
    "Write Authentication Enable",
    "Read Encryption Mode",
    "Write Encryption Mode",
    "Read Class of Device",
    "Write Class of Device",
    "Read Voice Setting",
    "Write Voice Setting",
    "Read Automatic Flush Timeout",
    "Write Automatic Flush Timeout",
    "Read Num Broadcast Retransmissions",
    "Write Num Broadcast Retransmissions",
    "Read Hold Mode Activity ",
    "Write Hold Mode Activity",
    "Read Transmit Power Level",
    "Read Synchronous Flow Control Enable",
    "Write Synchronous Flow Control Enable",
    "Unknown",
    "Set Host Controller To Host Flow Control",
    "Unknown",
    "Host Buffer Size",
    "Unknown",
    "Host Number of Completed Packets",
    "Read Link Supervision Timeout",
    "Write Link Supervision Timeout",
    "Read Number of Supported IAC",
    "Read Current IAC LAP",
    "Write Current IAC LAP",
    "Read Page Scan Period Mode",
    "Write Page Scan Period Mode",
    "Read Page Scan Mode",
    "Write Page Scan Mode",
    "Set AFH Host Channel Classification",
    "Unknown",
    "Unknown",
    "Read Inquiry Scan Type",
    "Write Inquiry Scan Type",
    "Read Inquiry Mode",
    "Write Inquiry Mode",
    "Read Page Scan Type",
    "Write Page Scan Type",
    "Read AFH Channel Assessment Mode",
    "Write AFH Channel Assessment Mode",
]);

pub static CMD_INFO: CodeTable = CodeTable::new(&[
    "Unknown",
    "Read Local Version Information",
    "Read Local Supported Commands",
    "Read Local Supported Features",
    "Read Local Extended Features",
    "Read Buffer Size",
    "Unknown",
    "Read Country Code",
    "Unknown",
    "Read BD ADDR",
]);

pub static CMD_STATUS: CodeTable = CodeTable::new(&[
    "Unknown",
    "Read Failed Contact Counter",
    "Reset Failed Contact Counter",
    "Read Link Quality",
    "Unknown",
    "Read RSSI",
    "Read AFH Channel Map",
    "Read Clock",
]);

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
