//! Flag predicates shared by the arithmetic and branch families.

use crate::state::Flags;

/// Applies the sign-transition post-condition used by ADD, ADC and SUB.
///
/// S and Z follow `new`. PV is set when the sign changed between `previous`
/// and `new`. C is set when the two have opposite signs and neither is zero.
/// Other flags are left untouched.
pub fn evaluate(flags: &mut Flags, previous: i8, new: i8) {
    flags.set(Flags::S, new < 0);
    flags.set(Flags::Z, new == 0);
    flags.set(Flags::PV, (previous < 0) != (new < 0));
    flags.set(
        Flags::C,
        previous != 0 && new != 0 && (previous < 0) != (new < 0),
    );
}

/// Even-parity test used by the logic, rotate and DAA families.
#[must_use]
pub const fn parity_even(value: u8) -> bool {
    value.count_ones() % 2 == 0
}

/// Sets S, Z and PV (as parity) from `value`.
pub fn set_sz_parity(flags: &mut Flags, value: u8) {
    flags.set(Flags::S, value & 0x80 != 0);
    flags.set(Flags::Z, value == 0);
    flags.set(Flags::PV, parity_even(value));
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{evaluate, parity_even};
    use crate::state::Flags;

    #[test]
    fn positive_result_clears_everything() {
        let mut flags = Flags::all();
        evaluate(&mut flags, 1, 101);
        assert!(!flags.intersects(Flags::S | Flags::Z | Flags::PV | Flags::C));
        assert!(flags.contains(Flags::H | Flags::N));
    }

    #[test]
    fn sign_flip_sets_overflow_and_carry() {
        let mut flags = Flags::empty();
        evaluate(&mut flags, 127, -128);
        assert!(flags.contains(Flags::S | Flags::PV | Flags::C));
        assert!(!flags.contains(Flags::Z));
    }

    #[test]
    fn zero_result_sets_zero_only() {
        let mut flags = Flags::empty();
        evaluate(&mut flags, 5, 0);
        assert_eq!(flags, Flags::Z);
    }

    #[test]
    fn negative_to_zero_flags_overflow_without_carry() {
        let mut flags = Flags::empty();
        evaluate(&mut flags, -1, 0);
        assert_eq!(flags, Flags::Z | Flags::PV);
    }

    #[test]
    fn parity_counts_set_bits() {
        assert!(parity_even(0));
        assert!(parity_even(0b1010_0000));
        assert!(!parity_even(0b0000_0111));
    }

    proptest! {
        #[test]
        fn evaluate_only_touches_szpvc(bits in any::<u8>(), previous in any::<i8>(), new in any::<i8>()) {
            let mut flags = Flags::from_bits_retain(bits);
            evaluate(&mut flags, previous, new);
            let untouched = !(Flags::S | Flags::Z | Flags::PV | Flags::C);
            prop_assert_eq!(flags & untouched, Flags::from_bits_retain(bits) & untouched);
        }
    }
}
