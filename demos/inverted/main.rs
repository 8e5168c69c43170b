//! FacetDB demo - derived indexes over a mutable document store.
//!
//! Demonstrates:
//! - Building a store and registering map functions
//! - An inverted index (value -> record key)
//! - A fan-out index (one record emitting many entries)
//! - Incremental recompute on set / push / delete
//!
//! Run with: RUST_LOG=facetdb_core=debug cargo run -p inverted_demo

use facetdb_core::{CoreResult, Emission, Store, Value};
use serde_json::json;

fn main() -> CoreResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut store = Store::new();
    store.set(
        "#38972",
        Value::from(json!({
            "name": "almoço",
            "comidas": [
                {"id": "#84572", "nome": "pizza", "subtipo": "marinara"}
            ]
        })),
    )?;
    store.set(
        "#43987",
        Value::from(json!({
            "name": "janta",
            "comidas": [
                {"id": "#03813", "nome": "água"},
                {"id": "#69472", "nome": "pão", "subtipo": "sovado"}
            ]
        })),
    )?;

    // Inverted index: meal name -> record key.
    store.derived("by_name", |k, v, _emit| {
        Ok(match v.get("name") {
            Some(name) => Emission::Pair(name.clone(), Value::from(k)),
            None => Emission::Skip,
        })
    })?;

    // Fan-out index: every dish, keyed by its id.
    store.derived("dishes", |_k, v, emit| {
        for dish in v.get("comidas").and_then(Value::as_array).unwrap_or(&[]) {
            if let Some(id) = dish.get("id") {
                emit.emit(id.clone(), dish.clone())?;
            }
        }
        Ok(Emission::Skip)
    })?;

    let by_name = store.index("by_name").expect("registered above");
    println!("record for 'janta': {:?}", by_name.get(&Value::from("janta"))?);

    let dishes = store.index("dishes").expect("registered above");
    println!("dish ids: {:?}", dishes.keys()?);

    // Mutations recompute only the touched record's contribution.
    store.push(
        "#43987.comidas",
        Value::from(json!({"id": "#98725", "nome": "queijo", "subtipo": "canastra"})),
    )?;
    store.delete("#43987.comidas[0]")?;

    let dishes = store.index("dishes").expect("registered above");
    println!("dish ids after mutation: {:?}", dishes.keys()?);
    println!(
        "dish #98725: {:?}",
        dishes.get(&Value::from("#98725"))?
    );

    store.delete("#43987")?;
    let dishes = store.index("dishes").expect("registered above");
    println!("dish ids after removing the record: {:?}", dishes.keys()?);

    Ok(())
}
