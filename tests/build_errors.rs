use std::cell::Cell;

use piecemeal::piecemeal;

#[piecemeal]
#[derive(Debug, PartialEq)]
pub struct Test {
    pub nullable_value: Option<String>,
    pub non_null_value: String,
    pub primitive_value: i32,
}

#[test]
fn nullable_value_fails_first() {
    let err = Test::build(|_| {}).unwrap_err();
    assert_eq!(err.name(), "nullable_value");
    assert_eq!(err.to_string(), "Uninitialized property 'nullable_value'.");
}

#[test]
fn non_null_value_fails_second() {
    let err = Test::build(|test| {
        test.nullable_value(None);
    })
    .unwrap_err();
    assert_eq!(err.name(), "non_null_value");
}

#[test]
fn primitive_value_fails_third() {
    let err = Test::build(|test| {
        test.nullable_value(None).non_null_value(String::new());
    })
    .unwrap_err();
    assert_eq!(err.name(), "primitive_value");
}

#[test]
fn zero_counts_as_set() {
    let test = Test::build(|test| {
        test.nullable_value(None)
            .non_null_value(String::new())
            .primitive_value(0);
    });

    assert_eq!(
        test,
        Ok(Test {
            nullable_value: None,
            non_null_value: String::new(),
            primitive_value: 0,
        })
    );
}

thread_local! {
    static EVALUATED: Cell<u32> = const { Cell::new(0) };
}

fn counted(value: u32) -> u32 {
    EVALUATED.with(|evaluated| evaluated.set(evaluated.get() + 1));
    value
}

#[piecemeal]
#[derive(Debug)]
pub struct Ordered {
    #[piecemeal(default = counted(1))]
    pub first: u32,
    pub second: u32,
    #[piecemeal(default = counted(first + second))]
    pub third: u32,
}

#[test]
fn fails_before_later_defaults() {
    EVALUATED.with(|evaluated| evaluated.set(0));

    let err = Ordered::build(|_| {}).unwrap_err();
    assert_eq!(err.name(), "second");
    assert_eq!(EVALUATED.with(Cell::get), 1);

    let ordered = Ordered::build(|ordered| {
        ordered.second(2);
    })
    .unwrap();
    assert_eq!((ordered.first, ordered.second, ordered.third), (1, 2, 3));
    assert_eq!(EVALUATED.with(Cell::get), 3);
}
