// Address types as carried in `sockaddr_l2.l2_bdaddr_type`
pub const BDADDR_BREDR: u8 = 0x00;
pub const BDADDR_LE_PUBLIC: u8 = 0x01;
pub const BDADDR_LE_RANDOM: u8 = 0x02;

// Length of a device address in bytes
pub const BDADDR_LEN: usize = 6;
