//! IFC GlobalId generation (the 22 character base-64 compression of a UUID).

use uuid::Uuid;

const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// Fresh random GlobalId.
pub fn new_global_id() -> String {
    compress(Uuid::new_v4())
}

/// 128 bits as one leading 2-bit digit followed by twenty-one 6-bit digits.
pub fn compress(uuid: Uuid) -> String {
    let n = uuid.as_u128();
    let mut out = String::with_capacity(22);
    out.push(ALPHABET[(n >> 126) as usize & 0x3] as char);
    for i in 1..22 {
        let shift = 126 - 6 * i;
        out.push(ALPHABET[(n >> shift) as usize & 0x3f] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compresses_known_values() {
        assert_eq!(compress(Uuid::nil()), "0000000000000000000000");
        assert_eq!(compress(Uuid::max()), "3$$$$$$$$$$$$$$$$$$$$$");
    }

    #[test]
    fn generated_ids_are_distinct_and_well_formed() {
        let a = new_global_id();
        let b = new_global_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 22);
        assert!(a.bytes().all(|c| ALPHABET.contains(&c)));
        assert!(matches!(a.as_bytes()[0], b'0'..=b'3'));
    }
}
