//! The counter store: one base field, one derived value, one action.

use canister::{create_store, Patch, StoreDef, Value};

fn main() {
    println!("=== Counter Store ===\n");

    let store = create_store(
        StoreDef::new()
            .base("count", 0)
            .derived("double", |view| {
                Value::Int(view.get("count").as_int().unwrap() * 2)
            })
            .action("increment", |txn, args| {
                let n = args.first().and_then(Value::as_int).unwrap_or(1);
                let count = txn.get("count").as_int().unwrap();
                Ok(Patch::new().with("count", count + n))
            }),
    );

    println!("1. Initial state");
    println!("   count = {:?}", store.get("count"));
    println!("   double = {:?}", store.get("double"));

    println!("\n2. Subscribing to `double`");
    let _watch = store.watch("double", |value| {
        println!("   [double changed] {value:?}");
    });

    println!("\n3. Dispatching increment()");
    store.dispatch("increment", &[]).unwrap();

    println!("\n4. Dispatching increment(5)");
    store.dispatch("increment", &[Value::Int(5)]).unwrap();

    println!("\n5. Final state");
    println!("   count = {:?}", store.get("count"));
    println!("   double = {:?}", store.get("double"));

    println!("\n✓ Demo complete!");
}
