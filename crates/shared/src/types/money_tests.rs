use super::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

#[rstest]
#[case("100", "100.00")]
#[case("100.5", "100.50")]
#[case("  42.10 ", "42.10")]
#[case("0", "0.00")]
#[case("-3.25", "-3.25")]
fn test_money_from_str(#[case] input: &str, #[case] expected: &str) {
    let money = Money::from_str(input).unwrap();
    assert_eq!(money.to_string(), expected);
}

#[rstest]
#[case("abc")]
#[case("")]
#[case("12,50")]
fn test_money_from_str_invalid(#[case] input: &str) {
    assert!(matches!(Money::from_str(input), Err(MoneyError::Invalid(_))));
}

#[test]
fn test_money_from_str_sub_cent() {
    assert!(matches!(
        Money::from_str("10.005"),
        Err(MoneyError::TooManyDecimals(_))
    ));
}

#[test]
fn test_money_try_from_decimal() {
    let money = Money::try_from(Decimal::new(100, 2)).unwrap();
    assert_eq!(money.amount(), dec!(1.00));
    assert_eq!(Decimal::from(money), dec!(1.00));
}

#[test]
fn test_money_floor_truncates() {
    assert_eq!(Money::floor(dec!(33.339)), Some(Money::from_cents(3_333)));
    assert_eq!(Money::floor(dec!(-33.339)), Some(Money::from_cents(-3_333)));
}

#[test]
fn test_money_serde_round_trips_as_string() {
    let money = Money::from_cents(3_334);
    let json = serde_json::to_string(&money).unwrap();
    assert_eq!(json, "\"33.34\"");

    let back: Money = serde_json::from_str(&json).unwrap();
    assert_eq!(back, money);
}

#[test]
fn test_money_serde_rejects_sub_cent() {
    let result: Result<Money, _> = serde_json::from_str("\"1.234\"");
    assert!(result.is_err());
}

#[test]
fn test_money_times_is_exact() {
    assert_eq!(Money::from_cents(3_333).times(3), Money::from_cents(9_999));
}

#[test]
fn test_money_from_str_out_of_range() {
    assert!(matches!(
        Money::from_str("79228162514264337593543950335"),
        Err(MoneyError::OutOfRange(_))
    ));
}

#[test]
fn test_money_max_keeps_two_decimals() {
    assert_eq!(Money::MAX.amount().scale(), Money::SCALE);
    assert!(Money::new(Money::MAX.amount()).is_ok());
}
