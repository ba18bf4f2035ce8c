// crates/kebab-store-core/tests/proptest_row_codec.rs
// ============================================================================
// Module: Row Codec Property-Based Tests
// Description: Entities survive encode, delimited text, and decode unchanged.
// Purpose: Detect lossy encodings across numbers, booleans, dates, and text.
// ============================================================================

//! Property-based tests for the flat-file row codec.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use bigdecimal::BigDecimal;
use kebab_store_core::Client;
use kebab_store_core::Entity;
use kebab_store_core::FoodClass;
use kebab_store_core::FoodItem;
use kebab_store_core::Order;
use kebab_store_core::OrderStatus;
use kebab_store_core::Row;
use kebab_store_core::Voucher;
use kebab_store_core::encode_records;
use kebab_store_core::parse_records;
use proptest::prelude::*;
use time::Date;
use time::Month;
use time::PrimitiveDateTime;
use time::Time;

fn through_text<E: Entity>(entity: &E) -> E {
    let rows = vec![Row::from_values(&entity.encode())];
    let text = encode_records(&rows);
    let parsed = parse_records(&text).unwrap();
    assert_eq!(parsed.len(), 1);
    E::decode(&parsed[0]).unwrap()
}

fn date_strategy() -> impl Strategy<Value = Date> {
    (1970_i32 .. 2100, 1_u8 ..= 12, 1_u8 ..= 28).prop_map(|(year, month, day)| {
        Date::from_calendar_date(year, Month::try_from(month).unwrap(), day).unwrap()
    })
}

fn timestamp_strategy() -> impl Strategy<Value = PrimitiveDateTime> {
    (date_strategy(), 0_u8 .. 24, 0_u8 .. 60, 0_u8 .. 60).prop_map(|(date, h, m, s)| {
        PrimitiveDateTime::new(date, Time::from_hms(h, m, s).unwrap())
    })
}

fn decimal_strategy() -> impl Strategy<Value = BigDecimal> {
    (any::<i64>(), 0_i64 .. 6).prop_map(|(digits, scale)| BigDecimal::new(digits.into(), scale))
}

fn class_strategy() -> impl Strategy<Value = FoodClass> {
    prop_oneof![
        Just(FoodClass::PaninoDonerKebab),
        Just(FoodClass::PiadinaKebab),
        Just(FoodClass::KebabBox),
        Just(FoodClass::Falafel),
        Just(FoodClass::Patatine),
        Just(FoodClass::Bevanda),
        Just(FoodClass::SalsaYogurt),
        Just(FoodClass::SalsaPiccante),
        Just(FoodClass::Formaggio),
        Just(FoodClass::Cipolla),
    ]
}

fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Pending),
        Just(OrderStatus::Preparing),
        Just(OrderStatus::Ready),
        Just(OrderStatus::Delivered),
        Just(OrderStatus::Cancelled),
    ]
}

proptest! {
    #[test]
    fn client_text_fields_round_trip(
        id in "CLI[0-9]{3}",
        first in ".*",
        last in "[ -~]*",
        email in "[a-z]{1,8}@[a-z]{1,8}\\.it",
        phone in proptest::option::of("[+0-9 ,\"]{0,12}"),
    ) {
        let client = Client { id, first_name: first, last_name: last, email, phone };
        prop_assert_eq!(through_text(&client), client);
    }

    #[test]
    fn voucher_numbers_booleans_and_dates_round_trip(
        code in "[A-Z0-9]{4,10}",
        percent in 0_u8 ..= 100,
        expires_on in date_strategy(),
        redeemed in any::<bool>(),
    ) {
        let voucher = Voucher { code, percent, expires_on, redeemed };
        prop_assert_eq!(through_text(&voucher), voucher);
    }

    #[test]
    fn food_item_decimals_and_discriminators_round_trip(
        id in "[0-9]{1,4}",
        description in ".*",
        cost in decimal_strategy(),
        prep_minutes in any::<u32>(),
        class in class_strategy(),
    ) {
        let item = FoodItem { id, description, tier: class.tier(), cost, prep_minutes, class };
        prop_assert_eq!(through_text(&item), item);
    }

    #[test]
    fn order_timestamps_and_optional_voucher_round_trip(
        id in "ORD[0-9]{4}",
        client_id in "CLI[0-9]{3}",
        placed_at in timestamp_strategy(),
        status in status_strategy(),
        total in decimal_strategy(),
        voucher_code in proptest::option::of("[A-Z0-9]{4,10}"),
    ) {
        let order = Order { id, client_id, placed_at, status, total, voucher_code };
        prop_assert_eq!(through_text(&order), order);
    }
}
