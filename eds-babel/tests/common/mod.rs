//! Helpers shared by the integration tests.

use eds_babel::TypeDefaults;
use std::path::PathBuf;

pub fn schema() -> TypeDefaults {
    TypeDefaults::builtin().expect("builtin schema parses")
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"))
}
