//! IR serialization, lookup and rendering through the public API only.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use idlbridge_ir::{
    Annotation, ConstantValue, Definition, Field, File, Function, IdlSchema, Import, Message,
    Namespace, Requiredness, Service, Type, WriterOptions, generate, renumber_fields,
};
use pretty_assertions::assert_eq;

fn sample() -> IdlSchema {
    let mut user = File::new("shop/user.thrift");
    user.definitions.messages.push(Message {
        name: "User".into(),
        fqn: "shop/user.thrift#User".into(),
        fields: vec![Field {
            id: 1,
            ..Field::new("name", Type::string(), Requiredness::Required)
        }],
        ..Message::default()
    });

    let mut main = File::new("shop/shop.thrift");
    main.namespaces.push(Namespace {
        scope: "go".into(),
        name: "shop".into(),
        ..Namespace::default()
    });
    main.imports.push(Import {
        path: "shop/user.thrift".into(),
        value: "\"user.thrift\"".into(),
        ..Import::default()
    });
    let mut fields = vec![
        Field::new(
            "owner",
            Type::named("user.User", Some("shop/user.thrift#User".into())),
            Requiredness::Optional,
        ),
        Field::new("Order", Type::named("Order", Some("shop/shop.thrift#Order".into())), Requiredness::Optional),
    ];
    renumber_fields(&mut fields);
    main.definitions.messages.push(Message {
        name: "Cart".into(),
        fqn: "shop/shop.thrift#Cart".into(),
        fields,
        ..Message::default()
    });
    main.definitions.messages.push(Message {
        name: "Order".into(),
        fqn: "shop/shop.thrift#Order".into(),
        ..Message::default()
    });
    main.definitions.services.push(Service {
        name: "Shop".into(),
        fqn: "shop/shop.thrift#Shop".into(),
        functions: vec![Function {
            name: "GetCart".into(),
            fqn: "shop/shop.thrift#Shop.GetCart".into(),
            return_type: Type::named("Cart", Some("shop/shop.thrift#Cart".into())),
            annotations: vec![Annotation::quoted("api.get", "/cart")],
            ..Function::default()
        }],
        ..Service::default()
    });
    IdlSchema::new("thrift", vec![main, user])
}

#[test]
fn test_json_shape_is_camel_case_and_tagged() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_eq!(json["schemaVersion"], "1.0");
    assert_eq!(json["idlType"], "thrift");
    let owner = &json["files"][0]["definitions"]["messages"][0]["fields"][0];
    assert_eq!(owner["type"]["kind"], "named");
    assert_eq!(owner["type"]["fqn"], "shop/user.thrift#User");
    assert_eq!(owner["requiredness"], "optional");
    let annotation = &json["files"][0]["definitions"]["services"][0]["functions"][0]["annotations"][0];
    assert_eq!(annotation["value"], "\"/cart\"");
}

#[test]
fn test_json_read_back_supports_lookup() {
    let text = serde_json::to_string(&sample()).unwrap();
    let schema: IdlSchema = serde_json::from_str(&text).unwrap();
    assert_eq!(schema.files().len(), 2);
    let found = schema.find_by_fqn("Shop.GetCart");
    assert!(matches!(found.as_slice(), [Definition::Function(f)] if f.name == "GetCart"));
    assert_eq!(schema.find_messages("User")[0].fields[0].name, "name");
    assert_eq!(
        schema.find_functions("Shop.GetCart")[0].annotations[0].value,
        Some(ConstantValue::quoted("/cart"))
    );
}

#[test]
fn test_sort_then_render() {
    let mut schema = sample();
    schema.sort_definitions();
    let out = generate(&schema, WriterOptions::default()).unwrap();
    let main = String::from_utf8(out["shop/shop.thrift"].clone()).unwrap();
    assert_eq!(
        main,
        r#"namespace go shop

include "user.thrift"

struct Order {
}

struct Cart {
    1: optional user.User owner,
    2: optional Order Order,
}

service Shop {
    Cart GetCart() (api.get = "/cart")
}

"#
    );
    assert_eq!(
        String::from_utf8(out["shop/user.thrift"].clone()).unwrap(),
        "struct User {\n    1: required string name,\n}\n\n"
    );
}
