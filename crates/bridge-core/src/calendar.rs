//! # Room-Night Calendar Math
//!
//! A stay occupies every night from check-in up to but excluding check-out:
//! a booking 2025-10-01 → 2025-10-03 consumes the nights of the 1st and the
//! 2nd, and the room is sellable again on the 3rd.

use chrono::NaiveDate;

/// Iterator over the nights of a stay, `[checkin, checkout)`.
///
/// Empty when `checkout <= checkin` (zero-length or inverted ranges produce
/// no inventory movement).
pub fn nights(checkin: NaiveDate, checkout: NaiveDate) -> Nights {
    Nights {
        next: checkin,
        end: checkout,
    }
}

/// See [`nights`].
#[derive(Debug, Clone)]
pub struct Nights {
    next: NaiveDate,
    end: NaiveDate,
}

impl Iterator for Nights {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.next >= self.end {
            return None;
        }
        let current = self.next;
        self.next = current.succ_opt()?;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_two_night_stay_excludes_checkout() {
        let got: Vec<NaiveDate> = nights(d("2025-10-01"), d("2025-10-03")).collect();
        assert_eq!(got, vec![d("2025-10-01"), d("2025-10-02")]);
    }

    #[test]
    fn test_single_night() {
        let got: Vec<NaiveDate> = nights(d("2025-10-01"), d("2025-10-02")).collect();
        assert_eq!(got, vec![d("2025-10-01")]);
    }

    #[test]
    fn test_empty_when_checkout_not_after_checkin() {
        assert_eq!(nights(d("2025-10-01"), d("2025-10-01")).count(), 0);
        assert_eq!(nights(d("2025-10-03"), d("2025-10-01")).count(), 0);
    }

    #[test]
    fn test_crosses_month_boundary() {
        let got: Vec<NaiveDate> = nights(d("2025-01-31"), d("2025-02-02")).collect();
        assert_eq!(got, vec![d("2025-01-31"), d("2025-02-01")]);
    }
}
