//! Floor-modulo index arithmetic over cyclic index spaces.
//!
//! Both the slot ring and the logical frame sequence wrap, and every
//! position moves by single steps, so these helpers never produce a
//! negative or out-of-range index. An empty space (`n == 0`) maps
//! everything to 0.

/// `(i + 1) mod n`.
pub fn wrap_add(i: usize, n: usize) -> usize {
    if n == 0 { 0 } else { (i % n + 1) % n }
}

/// `(i - 1) mod n`, floor convention: `0` wraps to `n - 1`.
pub fn wrap_sub(i: usize, n: usize) -> usize {
    if n == 0 { 0 } else { (i % n + n - 1) % n }
}

/// `(i + delta) mod n` for a signed offset of any size.
pub fn wrap_offset(i: usize, delta: isize, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let n = n as isize;
    ((i as isize % n) + delta % n).rem_euclid(n) as usize
}

/// Forward distance from `from` to `to` in an `n`-sized ring.
pub fn forward_distance(from: usize, to: usize, n: usize) -> usize {
    if n == 0 { 0 } else { (to % n + n - from % n) % n }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_N: usize = 16;

    #[test]
    fn wrap_add_all_small_rings() {
        for n in 1..=MAX_N {
            for i in 0..n {
                let expected = if i == n - 1 { 0 } else { i + 1 };
                assert_eq!(wrap_add(i, n), expected, "i={i} n={n}");
            }
        }
    }

    #[test]
    fn wrap_sub_all_small_rings() {
        for n in 1..=MAX_N {
            for i in 0..n {
                let expected = if i == 0 { n - 1 } else { i - 1 };
                assert_eq!(wrap_sub(i, n), expected, "i={i} n={n}");
            }
        }
    }

    #[test]
    fn add_then_sub_is_identity() {
        for n in 1..=MAX_N {
            for i in 0..n {
                assert_eq!(wrap_sub(wrap_add(i, n), n), i);
                assert_eq!(wrap_add(wrap_sub(i, n), n), i);
            }
        }
    }

    #[test]
    fn n_steps_return_to_start() {
        for n in 1..=MAX_N {
            for i in 0..n {
                let mut fwd = i;
                let mut back = i;
                for _ in 0..n {
                    fwd = wrap_add(fwd, n);
                    back = wrap_sub(back, n);
                    assert!(fwd < n && back < n);
                }
                assert_eq!(fwd, i);
                assert_eq!(back, i);
            }
        }
    }

    #[test]
    fn single_slot_ring_is_fixed_point() {
        assert_eq!(wrap_add(0, 1), 0);
        assert_eq!(wrap_sub(0, 1), 0);
    }

    #[test]
    fn empty_ring_maps_to_zero() {
        assert_eq!(wrap_add(3, 0), 0);
        assert_eq!(wrap_sub(0, 0), 0);
        assert_eq!(wrap_offset(5, -2, 0), 0);
        assert_eq!(forward_distance(1, 2, 0), 0);
    }

    #[test]
    fn wrap_offset_matches_repeated_steps() {
        for n in 1..=MAX_N {
            for i in 0..n {
                for delta in -(2 * n as isize)..=(2 * n as isize) {
                    let mut stepped = i;
                    for _ in 0..delta.unsigned_abs() {
                        stepped = if delta < 0 {
                            wrap_sub(stepped, n)
                        } else {
                            wrap_add(stepped, n)
                        };
                    }
                    assert_eq!(wrap_offset(i, delta, n), stepped, "i={i} d={delta} n={n}");
                }
            }
        }
    }

    #[test]
    fn forward_distance_inverts_offset() {
        for n in 1..=MAX_N {
            for from in 0..n {
                for d in 0..n {
                    let to = wrap_offset(from, d as isize, n);
                    assert_eq!(forward_distance(from, to, n), d);
                }
            }
        }
    }
}
