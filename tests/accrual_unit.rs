use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use hashvest_backend::accrual::{daily_rate, earnings_for, period_length_days};
use hashvest_backend::models::Period;

#[test]
fn period_lengths_use_fixed_approximations() {
    assert_eq!(period_length_days(Period::Daily), 1);
    assert_eq!(period_length_days(Period::Weekly), 7);
    assert_eq!(period_length_days(Period::Fortnightly), 14);
    assert_eq!(period_length_days(Period::Monthly), 30);
}

#[test]
fn weekly_seven_percent_is_one_percent_per_day() {
    assert_eq!(daily_rate(dec!(7), Period::Weekly), dec!(1));
}

#[test]
fn one_tick_on_a_thousand_at_weekly_seven_percent_yields_ten() {
    // 1000 * (1/100) * 1 = 10
    assert_eq!(earnings_for(dec!(1000), dec!(7), Period::Weekly, 1), dec!(10));
}

#[test]
fn monthly_rate_spreads_over_thirty_days() {
    assert_eq!(earnings_for(dec!(3000), dec!(30), Period::Monthly, 1), dec!(30));
}

#[test]
fn zero_or_negative_principal_earns_nothing() {
    assert_eq!(earnings_for(Decimal::ZERO, dec!(7), Period::Weekly, 5), Decimal::ZERO);
    assert_eq!(earnings_for(dec!(-100), dec!(7), Period::Weekly, 5), Decimal::ZERO);
}

#[test]
fn zero_or_negative_days_earn_nothing() {
    assert_eq!(earnings_for(dec!(1000), dec!(7), Period::Weekly, 0), Decimal::ZERO);
    assert_eq!(earnings_for(dec!(1000), dec!(7), Period::Weekly, -3), Decimal::ZERO);
}

#[test]
fn earnings_are_linear_in_elapsed_days() {
    let one_day = earnings_for(dec!(1234.56), dec!(4.2), Period::Fortnightly, 1);
    for days in 0..=30i64 {
        let expected = Decimal::from(days) * one_day;
        assert_eq!(
            earnings_for(dec!(1234.56), dec!(4.2), Period::Fortnightly, days),
            expected,
            "linearity broken at {days} days"
        );
    }
}

#[test]
fn earnings_are_never_negative() {
    for period in [Period::Daily, Period::Weekly, Period::Fortnightly, Period::Monthly] {
        let e = earnings_for(dec!(0.01), dec!(0.001), period, 1);
        assert!(e >= Decimal::ZERO);
    }
}

#[test]
fn calculator_is_deterministic() {
    let a = earnings_for(dec!(987.65), dec!(9.9), Period::Monthly, 17);
    let b = earnings_for(dec!(987.65), dec!(9.9), Period::Monthly, 17);
    assert_eq!(a, b);
}
