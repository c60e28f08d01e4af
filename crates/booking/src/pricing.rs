//! Reservation pricing.

use chrono::Duration;
use common::Money;

const NANOS_PER_HOUR: i64 = 60 * 60 * 1_000_000_000;
const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;

/// Quotes the total price for a stay of `duration` at the given rates.
///
/// Stays under 24 hours bill whole hours at `hourly_rate`, rounding any
/// fractional hour up: exactly N hours bills N, N hours plus any remainder
/// bills N + 1. Stays of 24 hours or more bill whole days at `daily_rate`
/// with the same round-up rule. The 24-hour boundary belongs to the day
/// branch, so exactly 24h bills one day, not 24 hours.
///
/// Pure function over exact integer cents; the caller guarantees a
/// positive duration.
pub fn quote(hourly_rate: Money, daily_rate: Money, duration: Duration) -> Money {
    // Nanosecond granularity so even a sub-millisecond remainder rounds
    // up; a duration too long for i64 nanoseconds (centuries) saturates.
    let nanos = duration.num_nanoseconds().unwrap_or(i64::MAX);

    if nanos < NANOS_PER_DAY {
        let billed_hours = div_ceil(nanos, NANOS_PER_HOUR);
        hourly_rate.multiply(billed_hours)
    } else {
        let billed_days = div_ceil(nanos, NANOS_PER_DAY);
        daily_rate.multiply(billed_days)
    }
}

// `i64::div_ceil` is unstable (`int_roundings`); this matches its behavior
// for the positive divisors used here, without overflow near i64::MAX.
fn div_ceil(n: i64, d: i64) -> i64 {
    let q = n / d;
    let r = n % d;
    if r > 0 { q + 1 } else { q }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOURLY: Money = Money::from_cents(1000); // $10
    const DAILY: Money = Money::from_cents(8000); // $80

    #[test]
    fn whole_hours_bill_exactly() {
        assert_eq!(quote(HOURLY, DAILY, Duration::hours(1)), Money::from_dollars(10));
        assert_eq!(quote(HOURLY, DAILY, Duration::hours(3)), Money::from_dollars(30));
        assert_eq!(quote(HOURLY, DAILY, Duration::hours(23)), Money::from_dollars(230));
    }

    #[test]
    fn fractional_hour_rounds_up() {
        assert_eq!(
            quote(HOURLY, DAILY, Duration::hours(1) + Duration::seconds(1)),
            Money::from_dollars(20)
        );
        assert_eq!(
            quote(HOURLY, DAILY, Duration::minutes(90)),
            Money::from_dollars(20)
        );
        assert_eq!(
            quote(HOURLY, DAILY, Duration::minutes(1)),
            Money::from_dollars(10)
        );
    }

    #[test]
    fn exactly_one_day_bills_the_day_rate() {
        // The 24h boundary selects the day branch: one day, not 24 hours.
        assert_eq!(quote(HOURLY, DAILY, Duration::hours(24)), Money::from_dollars(80));
    }

    #[test]
    fn fractional_day_rounds_up() {
        assert_eq!(
            quote(HOURLY, DAILY, Duration::hours(24) + Duration::seconds(1)),
            Money::from_dollars(160)
        );
        assert_eq!(
            quote(HOURLY, DAILY, Duration::hours(25)),
            Money::from_dollars(160)
        );
        assert_eq!(quote(HOURLY, DAILY, Duration::hours(48)), Money::from_dollars(160));
        assert_eq!(quote(HOURLY, DAILY, Duration::hours(49)), Money::from_dollars(240));
    }

    #[test]
    fn sub_millisecond_remainder_still_rounds_up() {
        assert_eq!(
            quote(HOURLY, DAILY, Duration::hours(1) + Duration::nanoseconds(1)),
            Money::from_dollars(20)
        );
        assert_eq!(
            quote(HOURLY, DAILY, Duration::hours(24) + Duration::nanoseconds(1)),
            Money::from_dollars(160)
        );
    }

    #[test]
    fn quoting_is_pure() {
        let duration = Duration::hours(7) + Duration::minutes(30);
        assert_eq!(
            quote(HOURLY, DAILY, duration),
            quote(HOURLY, DAILY, duration)
        );
    }

    #[test]
    fn cents_stay_exact() {
        // $12.50/h for 3h is $37.50, no float rounding anywhere.
        let rate = Money::from_cents(1250);
        assert_eq!(quote(rate, DAILY, Duration::hours(3)), Money::from_cents(3750));
    }
}
