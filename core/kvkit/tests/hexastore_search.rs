//! Scenario 5: conjunctive hexastore search with a shared variable.

use kvkit::{cond, Hexastore, MemoryBackend};
use std::collections::HashSet;

#[test]
fn conjunctive_search_over_likes_and_is() {
    let backend = MemoryBackend::new();
    let hx = Hexastore::new(&backend);
    hx.store_many([
        kvkit::Triple::new("charlie", "likes", "huey"),
        kvkit::Triple::new("charlie", "likes", "mickey"),
        kvkit::Triple::new("charlie", "likes", "zaizee"),
        kvkit::Triple::new("huey", "is", "cat"),
        kvkit::Triple::new("mickey", "is", "dog"),
        kvkit::Triple::new("zaizee", "is", "cat"),
    ])
    .unwrap();

    let x = Hexastore::var("X");
    let result = hx
        .search(&[cond("charlie", "likes", x.clone()), cond(x, "is", "cat")])
        .unwrap();

    assert_eq!(
        result.get("X").cloned().unwrap_or_default(),
        HashSet::from(["huey".to_string(), "zaizee".to_string()])
    );
}
