use super::*;

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
}

#[test]
fn file_scheme_is_stripped_and_others_rejected() {
    assert_eq!(normalize_uri("file://img/a.png").unwrap(), "img/a.png");
    assert!(normalize_uri("gs://bucket/a.png").is_err());
}

#[test]
fn memory_store_roundtrips_under_normalized_keys() {
    let store = MemoryBlobStore::new();
    store.put_bytes("./clips/a.wav", b"abc").unwrap();
    assert_eq!(store.get_bytes("clips/a.wav").unwrap(), b"abc");
    assert!(store.contains("file://clips/a.wav"));
    assert!(matches!(
        store.get_bytes("clips/missing.wav"),
        Err(PosereelError::Asset(_))
    ));
}

#[test]
fn fs_store_creates_parent_directories() {
    let root = std::env::temp_dir().join(format!("posereel_store_test_{}", std::process::id()));
    let store = FsBlobStore::new(&root);
    store.put_bytes("out/nested/video.mp4", b"mp4").unwrap();
    assert_eq!(store.get_bytes("out/nested/video.mp4").unwrap(), b"mp4");
    assert!(store.get_bytes("out/none.mp4").is_err());
    let _ = std::fs::remove_dir_all(root);
}
