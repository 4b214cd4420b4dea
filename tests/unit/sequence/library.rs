use super::*;
use crate::assets::store::MemoryBlobStore;

#[test]
fn memory_library_returns_registered_sequences() {
    let lib = MemorySequenceLibrary::new().with("pop_in", PosableCharacterSequence::idle("pop_in", 0.5));
    assert_eq!(lib.get_sequence("pop_in").unwrap().duration_sec, 0.5);
    assert!(matches!(
        lib.get_sequence("missing"),
        Err(PosereelError::Asset(_))
    ));
}

#[test]
fn memory_library_validates_on_lookup() {
    let lib = MemorySequenceLibrary::new().with("broken", PosableCharacterSequence::idle("broken", 0.0));
    assert!(matches!(
        lib.get_sequence("broken"),
        Err(PosereelError::Validation(_))
    ));
}

#[test]
fn blob_library_reads_prefixed_json() {
    let store = Arc::new(MemoryBlobStore::new());
    store
        .put_bytes(
            "sequences/puck_giggle1.json",
            br#"{"id": "puck_giggle1", "duration_sec": 1.25}"#,
        )
        .unwrap();
    let lib = BlobSequenceLibrary::new(store, "sequences/");
    let seq = lib.get_sequence("puck_giggle1").unwrap();
    assert_eq!(seq.duration_sec, 1.25);
    assert!(lib.get_sequence("../etc").is_err());
}

#[test]
fn blob_library_reports_bad_json_as_serde_error() {
    let store = Arc::new(MemoryBlobStore::new());
    store.put_bytes("seq/x.json", b"{not json").unwrap();
    let lib = BlobSequenceLibrary::new(store, "seq");
    assert!(matches!(lib.get_sequence("x"), Err(PosereelError::Serde(_))));
}
