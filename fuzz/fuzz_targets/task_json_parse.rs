//! Fuzz target for task JSON parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the task parser and loads
//! whatever parses into a store, checking for panics, crashes, or hangs.

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use labelcore::config::compile;
use labelcore::io::from_task_slice;
use labelcore::registry::TagRegistry;
use labelcore::store::{AnnotationStore, StoreOptions};

const CONFIG: &str = r#"<View>
  <Image name="img" value="$image"/>
  <RectangleLabels name="label" toName="img">
    <Label value="Cat"/>
    <Label value="Dog"/>
  </RectangleLabels>
  <Choices name="quality" toName="img">
    <Choice value="Good"/>
  </Choices>
  <TextArea name="note" toName="img"/>
</View>"#;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(task) = from_task_slice(data) else {
        return;
    };
    let Ok(root) = compile(CONFIG, &task.data) else {
        return;
    };
    let Ok(mut store) = AnnotationStore::new(
        Arc::new(TagRegistry::standard()),
        root,
        task.data.clone(),
        StoreOptions::default(),
    ) else {
        return;
    };
    task.load_into(&mut store);
    for annotation in store.annotations() {
        let _ = annotation.serialize(store.tree());
    }
});
