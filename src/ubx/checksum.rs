// UBX checksum
//
// 8-bit Fletcher over class, id, length and payload.

/// Calculate UBX checksum (CK_A, CK_B)
pub fn ubx_checksum(data: &[u8]) -> (u8, u8) {
    let mut ck_a: u8 = 0;
    let mut ck_b: u8 = 0;

    for &byte in data {
        ck_a = ck_a.wrapping_add(byte);
        ck_b = ck_b.wrapping_add(ck_a);
    }

    (ck_a, ck_b)
}
