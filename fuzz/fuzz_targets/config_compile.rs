//! Fuzz target for configuration compilation.
//!
//! This fuzzer feeds arbitrary text to the configuration compiler and, when
//! it compiles, to the tag-tree builder and the configuration validator,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelcore::config::compile;
use labelcore::registry::TagRegistry;
use labelcore::tags::TagTree;
use labelcore::validation::validate_config;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let task = json!({"items": [1, 2, 3], "image": "a.jpg"});
    let Ok(root) = compile(text, &task) else {
        return;
    };
    let registry = TagRegistry::standard();
    let _ = validate_config(&root, &registry);
    let _ = TagTree::instantiate(&registry, root);
});
