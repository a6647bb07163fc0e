//! A small settings panel: mixed value types, a derived summary line, and an
//! action whose patch updates several base fields in one transition.

use canister::{create_store, Patch, StoreDef, Value};

fn main() {
    println!("=== Settings Store ===\n");

    let store = create_store(
        StoreDef::new()
            .base("username", "guest")
            .base("volume", 50)
            .base("muted", false)
            .derived("summary", |view| {
                let name = view.get("username");
                let line = if view.get("muted").as_bool().unwrap() {
                    format!("{} (muted)", name.as_str().unwrap())
                } else {
                    format!(
                        "{} (volume {})",
                        name.as_str().unwrap(),
                        view.get("volume").as_int().unwrap()
                    )
                };
                Value::String(line)
            })
            .action("sign_in", |_txn, args| {
                let name = args.first().and_then(Value::as_str).unwrap_or("guest");
                Ok(Patch::new().with("username", name).with("muted", false))
            })
            .action("toggle_mute", |txn, _args| {
                let muted = txn.get("muted").as_bool().unwrap();
                Ok(Patch::new().with("muted", !muted))
            }),
    );

    let _watch = store.watch("summary", |value| {
        println!("   [summary] {}", value.as_str().unwrap());
    });

    println!("\n1. Signing in as `ada`");
    store.dispatch("sign_in", &[Value::from("ada")]).unwrap();

    println!("\n2. Turning the volume up");
    store.set("volume", 80).unwrap();

    println!("\n3. Muting");
    store.dispatch("toggle_mute", &[]).unwrap();

    println!("\n4. Trying to assign the derived summary directly");
    match store.set("summary", "hand-written") {
        Ok(()) => unreachable!(),
        Err(err) => println!("   rejected: {err}"),
    }

    println!("\n✓ Demo complete!");
}
