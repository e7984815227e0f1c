#![cfg(feature = "serde")]

use url::Url;

#[test]
fn json_round_trip_preserves_url() {
    let original = Url::parse("https://example.com/a/b?x=1#frag").unwrap();
    let json = serde_json::to_string(&original).unwrap();
    assert_eq!(json, "\"https://example.com/a/b?x=1#frag\"");

    let recovered: Url = serde_json::from_str(&json).unwrap();
    assert_eq!(original, recovered);
}

#[test]
fn deserializing_invalid_url_fails() {
    let result: Result<Url, _> = serde_json::from_str("\"not a url\"");
    assert!(result.is_err());
}
