use super::*;

#[test]
fn hub_id_url_uses_the_given_port() {
    assert_eq!(hub_id_url("127.0.0.1", VBUS_PORT), vec!["nats://127.0.0.1:21400"]);
    assert_eq!(hub_id_url("127.0.0.1", VBUS_CREDS_PORT), vec!["nats://127.0.0.1:8421"]);
}

#[test]
fn truthy_treats_null_and_false_as_falsy() {
    assert!(!truthy(&Value::Null));
    assert!(!truthy(&json!(false)));
    assert!(truthy(&json!(true)));
    assert!(truthy(&json!(0)));
    assert!(truthy(&json!("")));
}
