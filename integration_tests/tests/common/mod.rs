#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Once;

use ops_core::{ActionBoard, AgentProfile, DeskSnapshot, OrganizationMetadata};

static INIT: Once = Once::new();

pub const CATALOG_SEED: u64 = 0x5eed_0f_0b5;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("missing fixture {}: {err}", path.display()))
}

/// Point the constants loader at the test override file.
pub fn ensure_test_constants() {
    INIT.call_once(|| {
        let path = fixture_path("test_resolver_constants.json");
        debug_assert!(
            path.exists(),
            "missing test resolver constants at {}",
            path.display()
        );
        std::env::set_var(ops_core::RESOLVER_CONSTANTS_ENV, &path);
    });
}

pub fn board() -> ActionBoard {
    ActionBoard::from_catalog_str(&read_fixture("action_catalog.json"), CATALOG_SEED)
        .expect("fixture catalog builds")
}

pub fn desk() -> DeskSnapshot {
    DeskSnapshot::from_json_str(&read_fixture("desk.json")).expect("fixture desk parses")
}

pub fn agent() -> AgentProfile {
    AgentProfile::from_json_str(&read_fixture("agent.json")).expect("fixture agent parses")
}

pub fn organizations() -> Vec<OrganizationMetadata> {
    OrganizationMetadata::list_from_json_str(&read_fixture("organizations.json"))
        .expect("fixture organizations parse")
}
