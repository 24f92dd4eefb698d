//! Test data generation for benchmarks.
//!
//! Generators are seeded so every run keyifies and validates the same graph.

use std::sync::Arc;

use entities_core::{Entity, EntityType, Field, Group, List, Result, Set, Value};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug, Default)]
pub enum Scale {
    /// 10 customers; quick iteration.
    Tiny,
    /// 100 customers.
    Small,
    /// 1,000 customers.
    #[default]
    Medium,
    /// 10,000 customers.
    Large,
}

impl Scale {
    /// Number of customers at this scale.
    pub fn count(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 100,
            Scale::Medium => 1_000,
            Scale::Large => 10_000,
        }
    }

    /// Upper bound of accounts per customer.
    pub fn max_accounts(&self) -> usize {
        match self {
            Scale::Tiny => 2,
            Scale::Small | Scale::Medium => 5,
            Scale::Large => 10,
        }
    }
}

/// Entity types used by the benchmarks.
pub struct BankSchema {
    pub account: Arc<EntityType>,
    pub name: Arc<EntityType>,
    pub customer: Arc<EntityType>,
}

impl BankSchema {
    /// Declare the benchmark schema.
    pub fn declare() -> Result<Self> {
        let account = EntityType::builder("Account")
            .field("id", Field::integer().with_group(Group::PRIMARY))
            .field("iban", Field::string().with_group(Group::SECONDARY))
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
                Field::list_of(Field::reference_by(&account, Group::SECONDARY))
                    .with_group("portfolio")
                    .with_default(List::new()),
            )
            .field(
                "tags",
                Field::set_of(Field::string())
                    .with_group("portfolio")
                    .with_default_fn(|| Value::Set(Set::new())),
            )
            .field("scores", Field::map_of(Field::integer()).with_group("portfolio"))
            .build()?;

        Ok(Self {
            account,
            name,
            customer,
        })
    }
}

/// Generate a random string of specified length.
fn random_string(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Generate customers with their accounts, tags and scores.
pub fn generate_customers(schema: &BankSchema, scale: Scale) -> Result<Vec<Entity>> {
    const SEED: u64 = 12345;
    let mut rng = StdRng::seed_from_u64(SEED);
    let tags = ["gold", "silver", "retail", "business", "dormant", "flagged"];

    let mut next_account = 0i64;
    (0..scale.count())
        .map(|i| {
            let name = Entity::builder(&schema.name)
                .arg(random_string(&mut rng, 8))
                .arg(random_string(&mut rng, 12))
                .build()?;

            let accounts = List::new();
            for _ in 0..rng.gen_range(1..=scale.max_accounts()) {
                next_account += 1;
                let account = Entity::builder(&schema.account)
                    .arg(next_account)
                    .arg(format!("TR{:024}", rng.gen::<u64>()))
                    .arg(rng.gen_range(0.0f64..10_000.0))
                    .build()?;
                accounts.push(account);
            }

            let customer_tags = Set::new();
            for _ in 0..rng.gen_range(0..=3) {
                customer_tags.insert(tags[rng.gen_range(0..tags.len())]);
            }

            let scores = Value::map(
                (0..rng.gen_range(0..=4)).map(|k| (format!("s{k}"), rng.gen_range(0i64..100))),
            );

            Entity::builder(&schema.customer)
                .arg(i as i64)
                .arg(name)
                .arg(accounts)
                .arg(customer_tags)
                .arg(scores)
                .build()
        })
        .collect()
}
