//! End-to-end filter scenarios: config files through compiled plans to
//! admission decisions on real entities.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use recflow_core::{Entity, Item, Properties, User, Value};
use recflow_filter::loader::compile_file;
use recflow_filter::{Domain, FilterLoader, FilterParamConfig, FilterPlan, LoadStatus};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn props(pairs: &[(&str, Value)]) -> Properties {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn plan(name: &str) -> Arc<FilterPlan> {
    compile_file(&fixture(name)).expect("fixture compiles").plan
}

#[test]
fn budget_and_rating() {
    let plan = plan("budget.yml");
    let user = props(&[("budget", Value::Float(100.0))]);

    let item = props(&[("price", Value::Float(80.0)), ("rating", Value::Float(4.5))]);
    assert!(plan.evaluate(&user, &item).unwrap());

    let item = props(&[("price", Value::Float(120.0)), ("rating", Value::Float(4.5))]);
    assert!(!plan.evaluate(&user, &item).unwrap());
}

#[test]
fn category_or_rating() {
    let plan = plan("category-or-rating.json");
    let user = Properties::new();

    let item = props(&[("category", Value::from("books")), ("rating", Value::Float(4.8))]);
    assert!(plan.evaluate(&user, &item).unwrap());

    let item = props(&[("category", Value::from("books")), ("rating", Value::Float(4.0))]);
    assert!(!plan.evaluate(&user, &item).unwrap());

    let item = props(&[("category", Value::from("electronics"))]);
    assert!(plan.evaluate(&user, &item).unwrap());
}

#[test]
fn audience_mixes_domains() {
    let plan = plan("audience.yaml");
    assert_eq!(plan.user_ops().len(), 1);
    assert_eq!(plan.item_ops().len(), 3);

    let user = props(&[
        ("age", Value::Int(30)),
        ("interests", Value::from(vec!["music", "tech"])),
    ]);
    let item = props(&[
        ("tags", Value::from(vec!["tech", "sports"])),
        ("brand", Value::from("acme")),
    ]);
    assert!(plan.evaluate(&user, &item).unwrap());

    let banned = props(&[
        ("tags", Value::from(vec!["tech"])),
        ("brand", Value::from("acme")),
        ("banned", Value::Bool(false)),
    ]);
    assert!(!plan.evaluate(&user, &banned).unwrap());

    let blocked = props(&[
        ("tags", Value::from(vec!["tech"])),
        ("brand", Value::from("spam-inc")),
    ]);
    assert!(!plan.evaluate(&user, &blocked).unwrap());

    let minor = props(&[("age", Value::Int(16)), ("interests", Value::from("tech"))]);
    assert!(!plan.evaluate(&minor, &item).unwrap());
}

#[test]
fn tags_stored_as_comma_separated_strings_still_intersect() {
    let plan = plan("audience.yaml");
    let user = props(&[("age", Value::Int(30)), ("interests", Value::from("music,tech"))]);
    let item = props(&[("tags", Value::from("tech, sports")), ("brand", Value::from("acme"))]);
    assert!(plan.evaluate(&user, &item).unwrap());
}

#[test]
fn loader_installs_every_fixture() {
    let loader = FilterLoader::new(fixture(""));
    let results = loader.load_all().unwrap();
    assert!(results
        .iter()
        .all(|r| matches!(r.status, LoadStatus::Loaded { .. })));
    assert_eq!(
        loader.plan_ids(),
        vec!["audience", "budget", "category-or-rating"]
    );
}

#[test]
fn retain_on_entities_uses_promoted_features() {
    let plan = plan("budget.yml");
    let user = User::new("u1");
    user.add_cache_features("profile", props(&[("budget", Value::Float(100.0))]));
    user.load_cache_features("profile");

    let candidates: Vec<Arc<Item>> = [("a", 80.0, 4.5), ("b", 120.0, 4.9), ("c", 100.0, 4.0)]
        .iter()
        .map(|(id, price, rating)| {
            let item = Item::new(*id);
            item.set_many(props(&[
                ("price", Value::Float(*price)),
                ("rating", Value::Float(*rating)),
            ]));
            Arc::new(item)
        })
        .collect();

    let kept = plan.retain(&user, candidates);
    let ids: Vec<_> = kept.iter().map(|i| i.id().to_string()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[test]
fn compiled_plan_is_shared_across_threads() {
    let plan = Arc::new(
        FilterPlan::compile(&[FilterParamConfig::leaf(
            Domain::Item,
            "price",
            "lessThan",
            "int",
            "user.budget",
        )])
        .unwrap(),
    );
    let user = Arc::new(props(&[("budget", Value::Int(50))]));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let plan = Arc::clone(&plan);
            let user = Arc::clone(&user);
            thread::spawn(move || {
                (0..100)
                    .filter(|i| {
                        let item = props(&[("price", Value::Int(t * 100 + i))]);
                        plan.evaluate(&user, &item).unwrap()
                    })
                    .count()
            })
        })
        .collect();

    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    // Only thread 0 produces prices below 50.
    assert_eq!(admitted, 50);
}
