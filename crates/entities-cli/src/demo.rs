//! The bank model and the scenario run against it.

use std::sync::Arc;

use entities_core::{Entity, EntityType, Error, Field, Group, Key, List, Result, Value};
use tracing::debug;

const NAMES: &[(&str, &str)] = &[
    ("eser", "aygun"),
    ("ada", "lovelace"),
    ("alan", "turing"),
    ("grace", "hopper"),
];

/// Entity types of the demo.
pub struct BankModel {
    pub account: Arc<EntityType>,
    pub name: Arc<EntityType>,
    pub customer: Arc<EntityType>,
}

impl BankModel {
    /// Declare `Account`, `Name` and `Customer`.
    pub fn declare() -> Result<Self> {
        let account = EntityType::builder("Account")
            .field("id", Field::integer().with_group(Group::PRIMARY))
            .field("iban", Field::integer().with_group(Group::SECONDARY))
            .field("balance", Field::float().with_default(0.0))
            .build()?;

        let name = EntityType::builder("Name")
            .field("first_name", Field::string().with_group(Group::SECONDARY))
            .field("last_name", Field::string().with_group(Group::SECONDARY))
            .build()?;

        let customer = EntityType::builder("Customer")
            .field("id", Field::integer().with_group(Group::PRIMARY))
            .field("name", Field::entity(&name).with_group(Group::SECONDARY))
            .field(
                "accounts",
                Field::list_of(Field::reference(&account)).with_default(List::new()),
            )
            .build()?;

        Ok(Self {
            account,
            name,
            customer,
        })
    }
}

/// One printed key.
#[derive(Debug)]
pub struct KeyRow {
    pub entity: String,
    pub group: Group,
    pub key: Key,
    pub fingerprint: Option<String>,
}

/// One validation outcome.
#[derive(Debug)]
pub struct CheckRow {
    pub label: String,
    /// `None` when the entity is valid, else the rendered validation error.
    pub failure: Option<String>,
}

/// Everything the demo prints.
#[derive(Debug, Default)]
pub struct Report {
    pub keys: Vec<KeyRow>,
    pub checks: Vec<CheckRow>,
}

impl Report {
    fn key(&mut self, entity: &Entity, group: &Group, fingerprint: bool) -> Result<()> {
        let key = entity.keyify(group)?;
        self.keys.push(KeyRow {
            entity: format!("{entity:?}"),
            group: group.clone(),
            fingerprint: fingerprint.then(|| key.fingerprint()),
            key,
        });
        Ok(())
    }

    fn check(&mut self, label: String, entity: &Entity) -> Result<()> {
        let failure = match entity.validate() {
            Ok(()) => None,
            Err(Error::Validation(e)) => Some(e.to_string()),
            Err(e) => return Err(e),
        };
        self.checks.push(CheckRow { label, failure });
        Ok(())
    }
}

/// Build `customers` customers with two accounts each and report their keys
/// and validation outcomes.
pub fn run(model: &BankModel, customers: usize, fingerprint: bool) -> Result<Report> {
    let mut report = Report::default();

    for n in 1..=customers {
        let id = n as i64;
        let first_account = 2 * id - 1;
        let second_account = 2 * id;

        let a_1 = Entity::builder(&model.account)
            .arg(first_account)
            .arg(first_account * 111)
            .arg(10.0 * first_account as f64)
            .build()?;
        let a_2 = Entity::builder(&model.account)
            .named("id", second_account)
            .named("iban", second_account * 111)
            .named("balance", 10.0 * second_account as f64)
            .build()?;

        report.key(&a_1, &Group::PRIMARY, fingerprint)?;
        report.key(&a_2, &Group::SECONDARY, fingerprint)?;

        let (first, last) = NAMES[(n - 1) % NAMES.len()];
        let name = Entity::builder(&model.name).arg(first).arg(last).build()?;
        let customer = Entity::builder(&model.customer).arg(id).arg(name).build()?;

        report.key(&customer, &Group::PRIMARY, fingerprint)?;
        report.key(&customer, &Group::SECONDARY, fingerprint)?;

        let accounts = customer.get("accounts")?;
        if let Some(accounts) = accounts.as_list() {
            accounts.push(123);
        }
        report.check(format!("customer {id} with a non-account item"), &customer)?;

        customer.set("accounts", Value::list([a_1, a_2]))?;
        report.check(format!("customer {id} with two accounts"), &customer)?;

        debug!(customer = id, "scenario complete");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_customer_scenario() {
        let model = BankModel::declare().unwrap();
        let report = run(&model, 1, false).unwrap();

        let keys: Vec<String> = report.keys.iter().map(|row| row.key.to_string()).collect();
        assert_eq!(keys, vec!["(1,)", "(222,)", "(1,)", r#"(("eser", "aygun"),)"#]);
        assert!(report.keys.iter().all(|row| row.fingerprint.is_none()));

        assert_eq!(report.checks.len(), 2);
        assert!(report.checks[0].failure.is_some());
        assert!(report.checks[1].failure.is_none());
    }

    #[test]
    fn test_generated_customers() {
        let model = BankModel::declare().unwrap();
        let report = run(&model, 5, true).unwrap();

        assert_eq!(report.keys.len(), 20);
        assert_eq!(report.checks.len(), 10);
        assert!(report.keys.iter().all(|row| row.fingerprint.is_some()));
        assert_eq!(report.keys[18].key.to_string(), "(5,)");
    }
}
