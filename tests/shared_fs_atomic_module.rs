use std::fs;
use vre_runner::shared::fs_atomic::atomic_write_file;

#[test]
fn shared_fs_atomic_creates_parents_and_replaces_content() {
    let temp = tempfile::tempdir().expect("tempdir");
    let target = temp.path().join("runs/run001/out_metadata.json");

    atomic_write_file(&target, b"first").expect("write first");
    assert_eq!(fs::read_to_string(&target).expect("read first"), "first");

    atomic_write_file(&target, b"second").expect("write second");
    assert_eq!(fs::read_to_string(&target).expect("read second"), "second");

    let leftovers: Vec<_> = fs::read_dir(target.parent().expect("parent"))
        .expect("read dir")
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(".tmp-"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
}
