use movex::abi::ExposedFunction;
use movex::router::DEFAULT_VERSION_THRESHOLD;
use movex::util_text::{format_fixed_point, format_gas_cost, parse_entry_function_id};
use movex::{classify_search_input, Route, SearchKind};

#[test]
fn search_box_examples() {
    let zero = format!("0x{}", "0".repeat(64));
    assert_eq!(
        classify_search_input(&zero, DEFAULT_VERSION_THRESHOLD),
        SearchKind::Address(zero.clone())
    );
    assert_eq!(
        classify_search_input("1000001", DEFAULT_VERSION_THRESHOLD),
        SearchKind::Version(1_000_001)
    );
    assert_eq!(
        classify_search_input("999999", DEFAULT_VERSION_THRESHOLD),
        SearchKind::Block(999_999)
    );
    assert_eq!(
        classify_search_input("abc", DEFAULT_VERSION_THRESHOLD),
        SearchKind::Invalid
    );
}

#[test]
fn search_and_query_agree() {
    let addr = format!("0x{}", "ab".repeat(32));
    for input in [addr.as_str(), "123", "5000000"] {
        let route = Route::from_search(input, DEFAULT_VERSION_THRESHOLD).unwrap();
        assert_eq!(Route::from_query(&route.to_query()), route);
    }
}

#[test]
fn signer_params_are_implicit() {
    let f: ExposedFunction = serde_json::from_value(serde_json::json!({
        "name": "transfer",
        "visibility": "public",
        "is_entry": true,
        "is_view": false,
        "generic_type_params": [],
        "params": ["&signer", "u64", "address"],
        "return": []
    }))
    .unwrap();
    assert_eq!(f.value_params(), vec!["u64", "address"]);
    assert_eq!(f.value_params().len(), 2);
}

#[test]
fn amounts_and_ids() {
    assert_eq!(format_fixed_point("123456789", 8).unwrap(), "1.2345");
    assert_eq!(format_fixed_point("100000000", 8).unwrap(), "1");
    assert_eq!(format_gas_cost(1000, 100), "0.001");

    let id = parse_entry_function_id(Some("0x1::coin::transfer")).unwrap();
    assert_eq!(id.module, "0x1::coin");
    assert_eq!(id.function, "transfer");
    assert!(parse_entry_function_id(Some("bad")).is_none());
}
