//! Integration tests for entity declaration, validation and keyification.

use std::sync::Arc;

use entities_core::{
    Entity, EntityType, Error, Field, Group, Key, List, ValidationReason, Value,
};

struct BankModel {
    account: Arc<EntityType>,
    name: Arc<EntityType>,
    customer: Arc<EntityType>,
}

fn bank_model() -> BankModel {
    let account = EntityType::builder("Account")
        .field("id", Field::integer().with_group(Group::PRIMARY))
        .field("iban", Field::integer().with_group(Group::SECONDARY))
        .field("balance", Field::float().with_default(0.0))
        .build()
        .unwrap();

    let name = EntityType::builder("Name")
        .field("first_name", Field::string().with_group(Group::SECONDARY))
        .field("last_name", Field::string().with_group(Group::SECONDARY))
        .build()
        .unwrap();

    let customer = EntityType::builder("Customer")
        .field("id", Field::integer().with_group(Group::PRIMARY))
        .field("name", Field::entity(&name).with_group(Group::SECONDARY))
        .field(
            "accounts",
            Field::list_of(Field::reference(&account)).with_default(List::new()),
        )
        .build()
        .unwrap();

    BankModel {
        account,
        name,
        customer,
    }
}

#[test]
fn test_bank_scenario() {
    let model = bank_model();

    let a_1 = Entity::builder(&model.account)
        .arg(1)
        .arg(111)
        .arg(10.0)
        .build()
        .unwrap();
    let a_2 = Entity::builder(&model.account)
        .named("id", 2)
        .named("iban", 222)
        .named("balance", 20.0)
        .build()
        .unwrap();

    assert_eq!(a_1.primary_key().unwrap(), Key::tuple([1]));
    assert_eq!(a_2.keyify(&Group::SECONDARY).unwrap(), Key::tuple([222]));

    let name = Entity::builder(&model.name).arg("eser").arg("aygun").build().unwrap();
    let c = Entity::builder(&model.customer).arg(1).arg(name).build().unwrap();

    assert_eq!(c.primary_key().unwrap(), Key::tuple([1]));
    assert_eq!(
        c.keyify(&Group::SECONDARY).unwrap(),
        Key::tuple([Key::tuple(["eser", "aygun"])])
    );

    c.get("accounts").unwrap().as_list().unwrap().push(123);
    let error = c.validate().unwrap_err();
    let error = error.as_validation().unwrap();
    assert_eq!(error.field_name(), Some("accounts.<item>"));
    assert_eq!(error.reason(), ValidationReason::InvalidType);

    c.set("accounts", Value::list([a_1, a_2])).unwrap();
    c.validate().unwrap();
}

#[test]
fn test_declaration_order_is_visible_everywhere() {
    let ty = EntityType::builder("Ordered")
        .field("z", Field::integer().with_group(Group::PRIMARY).with_default(1))
        .field("a", Field::integer().with_group(Group::PRIMARY).with_default(2))
        .field("m", Field::integer().with_group(Group::PRIMARY).with_default(3))
        .build()
        .unwrap();

    assert_eq!(ty.field_names(), vec!["z", "a", "m"]);

    let entity = Entity::new(&ty);
    assert_eq!(entity.primary_key().unwrap(), Key::tuple([1, 2, 3]));
    assert_eq!(format!("{entity:?}"), "Ordered(z=1, a=2, m=3)");

    entity.set("z", "x").unwrap();
    entity.set("m", "y").unwrap();
    let error = entity.validate().unwrap_err();
    let names: Vec<_> = error
        .as_validation()
        .unwrap()
        .errors()
        .iter()
        .map(|e| e.field_name().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["z", "m"]);
}

#[test]
fn test_construction_misuse_fails() {
    let model = bank_model();

    let result = Entity::builder(&model.account)
        .arg(1)
        .arg(2)
        .arg(3.0)
        .arg(4)
        .build();
    assert!(matches!(result, Err(Error::TooManyArguments { .. })));

    let result = Entity::builder(&model.account).named("owner", "x").build();
    let error = result.unwrap_err();
    assert!(matches!(error, Error::UnknownArgument { .. }));
    assert!(error.as_validation().is_none());
}

#[test]
fn test_unset_reads_are_stable() {
    let model = bank_model();
    let customer = Entity::new(&model.customer);

    let first = customer.get("accounts").unwrap();
    let second = customer.get("accounts").unwrap();
    assert!(first.same(&second));

    assert!(customer.get("name").unwrap().is_null());

    let profile = EntityType::builder("Profile")
        .field("name", Field::entity(&model.name).not_null())
        .build()
        .unwrap();
    let entity = Entity::new(&profile);
    let name_1 = entity.get("name").unwrap();
    let name_2 = entity.get("name").unwrap();
    assert!(name_1.same(&name_2));
    assert!(name_1.as_entity().unwrap().entity_type().is_a(&model.name));
}

#[test]
fn test_unset_group_keys_are_nulls() {
    let ty = EntityType::builder("Pair")
        .field("id", Field::integer().with_group(Group::PRIMARY))
        .field("name", Field::string().with_group(Group::PRIMARY))
        .build()
        .unwrap();

    let empty = Entity::new(&ty);
    assert_eq!(
        empty.primary_key().unwrap(),
        Key::tuple([Key::Null, Key::Null])
    );

    let filled = Entity::builder(&ty).arg(1).arg("x").build().unwrap();
    assert_eq!(
        filled.keyify(&Group::PRIMARY).unwrap(),
        Key::tuple([Key::from(1), Key::from("x")])
    );
}

#[test]
fn test_collection_keys() {
    let nested = Field::list_of(Field::integer()).recursive();
    let value = Value::list([Value::list([1]), Value::list([2, 3])]);
    assert_eq!(
        nested.keyify(&value, &Group::PRIMARY).unwrap(),
        Key::tuple([Key::tuple([1]), Key::tuple([2, 3])])
    );

    let map = Field::map();
    let forward = Value::map([("a", 1), ("b", 2), ("c", 3)]);
    let backward = Value::map([("c", 3), ("b", 2), ("a", 1)]);
    assert_eq!(
        map.keyify(&forward, &Group::PRIMARY).unwrap(),
        map.keyify(&backward, &Group::PRIMARY).unwrap()
    );

    let set = Field::set();
    let left = set.keyify(&Value::set(["x", "y", "z"]), &Group::PRIMARY).unwrap();
    let right = set.keyify(&Value::set(["z", "x", "y"]), &Group::PRIMARY).unwrap();
    assert_eq!(left, right);
    assert_eq!(left.fingerprint(), right.fingerprint());
}

#[test]
fn test_non_nullable_defaults() {
    let ty = EntityType::builder("Strict")
        .field("count", Field::integer().not_null())
        .field("label", Field::string().not_null())
        .field("tags", Field::set().not_null())
        .field("target", Field::reference(&bank_model().account).not_null())
        .build()
        .unwrap();

    let entity = Entity::new(&ty);
    assert_eq!(entity.get("count").unwrap(), Value::from(0));
    assert_eq!(entity.get("label").unwrap(), Value::from(""));
    assert!(entity.get("tags").unwrap().as_set().unwrap().is_empty());
    assert!(matches!(
        entity.get("target"),
        Err(Error::NullDefault { .. })
    ));
}

#[test]
fn test_keys_are_usable_as_map_keys() {
    let model = bank_model();
    let mut index = std::collections::HashMap::new();

    for id in 0..10 {
        let account = Entity::builder(&model.account).arg(id).arg(id * 100).build().unwrap();
        index.insert(account.primary_key().unwrap(), account);
    }

    let probe = Entity::builder(&model.account).arg(7).build().unwrap();
    let found = index.get(&probe.primary_key().unwrap()).unwrap();
    assert_eq!(found.get("iban").unwrap(), Value::from(700));
}

#[test]
fn test_key_json() {
    let model = bank_model();
    let name = Entity::builder(&model.name).arg("eser").arg("aygun").build().unwrap();
    let customer = Entity::builder(&model.customer).arg(1).arg(name).build().unwrap();

    let key = customer.keyify(&Group::SECONDARY).unwrap();
    assert_eq!(
        serde_json::to_string(&key).unwrap(),
        r#"[["eser","aygun"]]"#
    );
}
