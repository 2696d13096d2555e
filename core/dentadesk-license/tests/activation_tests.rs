mod common;

use chrono::Utc;
use common::{device_id_for, standard_global, test_secret, validator_for};
use dentadesk_license::{
    activate, derive_key_with_secret, ActivationRecord, ActivationStore, Collector, Entitlement,
    HardwareProbe, LicenseError, LicenseKey, Region, Tier, Validator,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const MACHINE: &str = "clinic-reception-pc";

fn store_in(dir: &TempDir) -> ActivationStore {
    ActivationStore::open(dir.path().join("DentaDesk").join("license.json"))
}

fn key_for(machine: &str, ent: &Entitlement) -> LicenseKey {
    derive_key_with_secret(&device_id_for(machine), ent, &test_secret())
}

#[test]
fn fresh_store_is_first_run() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    assert!(store.is_first_run());
    assert!(store.load().unwrap().is_none());
}

#[test]
fn activate_stores_normalized_record() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let v = validator_for(MACHINE);
    let ent = Entitlement::new(Tier::Enterprise, Region::Uae);
    let key = key_for(MACHINE, &ent);

    let typed = key.as_str().to_lowercase();
    let record = activate(&v, &store, &typed, &ent).unwrap();

    assert_eq!(record.key, key);
    assert_eq!(record.entitlement, ent);
    assert_eq!(record.device_id, device_id_for(MACHINE));
    assert!(!store.is_first_run());
    assert_eq!(store.load().unwrap(), Some(record));
}

#[test]
fn failed_activation_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let v = validator_for(MACHINE);
    let ent = standard_global();
    let key = key_for("some-other-pc", &ent);

    let result = activate(&v, &store, key.as_str(), &ent);
    assert!(matches!(result, Err(LicenseError::InvalidKey)));
    assert!(store.is_first_run());
}

#[test]
fn check_stored_revalidates() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let ent = standard_global();
    let key = key_for(MACHINE, &ent);
    activate(&validator_for(MACHINE), &store, key.as_str(), &ent).unwrap();

    assert_eq!(validator_for(MACHINE).check_stored(&store).unwrap(), ent);
}

#[test]
fn check_stored_on_moved_record_fails() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let ent = standard_global();
    let key = key_for(MACHINE, &ent);
    activate(&validator_for(MACHINE), &store, key.as_str(), &ent).unwrap();

    // Same file read on a different machine.
    let result = validator_for("copied-to-laptop").check_stored(&store);
    assert!(matches!(result, Err(LicenseError::InvalidKey)));
}

#[test]
fn check_stored_ignores_cached_device_id() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let ent = standard_global();

    // Record claims the laptop's device id but holds a key for another machine.
    store
        .save(&ActivationRecord {
            key: key_for("copied-to-laptop", &ent),
            entitlement: ent,
            device_id: device_id_for(MACHINE),
            activated_at: Utc::now(),
        })
        .unwrap();

    let result = validator_for(MACHINE).check_stored(&store);
    assert!(matches!(result, Err(LicenseError::InvalidKey)));
}

#[test]
fn check_stored_without_record_is_not_activated() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let result = validator_for(MACHINE).check_stored(&store);
    assert!(matches!(result, Err(LicenseError::NotActivated)));
}

#[test]
fn corrupt_record_is_serialization_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("license.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = ActivationStore::open(&path);
    assert!(matches!(store.load(), Err(LicenseError::Serialization(_))));
}

#[test]
fn clear_removes_record() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let ent = standard_global();
    let key = key_for(MACHINE, &ent);
    activate(&validator_for(MACHINE), &store, key.as_str(), &ent).unwrap();

    store.clear().unwrap();
    assert!(store.is_first_run());
    store.clear().unwrap();
}

#[test]
fn reactivation_replaces_record() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let v = validator_for(MACHINE);

    let standard = standard_global();
    activate(&v, &store, key_for(MACHINE, &standard).as_str(), &standard).unwrap();

    let upgraded = Entitlement::new(Tier::Ultimate, Region::Global);
    activate(&v, &store, key_for(MACHINE, &upgraded).as_str(), &upgraded).unwrap();

    let record = store.load().unwrap().unwrap();
    assert_eq!(record.entitlement, upgraded);
}

#[test]
fn store_path_accessor() {
    let store = ActivationStore::open("/tmp/dentadesk/license.json");
    assert!(store.path().ends_with("license.json"));
}

/// Reports `first` on the first read and `later` on every read after it.
struct ChangingProbe {
    reads: AtomicUsize,
    first: &'static str,
    later: &'static str,
}

impl HardwareProbe for ChangingProbe {
    fn platform_uuid(&self) -> Option<String> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        Some(if n == 0 { self.first } else { self.later }.to_string())
    }

    fn mac_address(&self) -> Option<String> {
        None
    }

    fn platform_string(&self) -> Option<String> {
        None
    }
}

#[test]
fn activation_records_the_device_it_validated() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let probe = ChangingProbe {
        reads: AtomicUsize::new(0),
        first: MACHINE,
        later: "swapped-network-card",
    };
    let v = Validator::with_parts(Collector::with_probe(probe), test_secret());
    let ent = standard_global();
    let key = key_for(MACHINE, &ent);

    let record = activate(&v, &store, key.as_str(), &ent).unwrap();
    assert_eq!(record.device_id, device_id_for(MACHINE));
    assert_eq!(store.load().unwrap().unwrap().device_id, device_id_for(MACHINE));
}
