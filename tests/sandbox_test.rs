mod common;

use common::Harness;
use coreutils::core::FileSystem;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_reading_outside_preopens_is_denied() {
    let h = Harness::new();
    let outside = TempDir::new().unwrap();
    let secret = outside.path().join("secret.txt");
    std::fs::write(&secret, b"top secret").unwrap();

    let out = h.run(&["cat", secret.to_str().unwrap()]);

    assert_eq!(out.code, 1);
    assert!(out.stdout.is_empty());
    assert_eq!(
        out.stderr_str(),
        format!("cat: {}: Capabilities insufficient\n", secret.display())
    );
}

#[test]
fn test_dot_dot_cannot_climb_out_of_a_preopen() {
    let h = Harness::new();

    let out = h.run(&["ls", "../.."]);

    assert_eq!(out.code, 2);
    assert!(out.stderr_str().contains("Capabilities insufficient"));
}

#[test]
fn test_mutations_outside_preopens_leave_host_untouched() {
    let h = Harness::new();
    h.write("inside.txt", b"inside");
    let outside = TempDir::new().unwrap();
    let victim = outside.path().join("victim.txt");
    std::fs::write(&victim, b"keep me").unwrap();
    let victim_arg = victim.to_str().unwrap();

    assert_eq!(h.run(&["rm", "-f", victim_arg]).code, 1);
    assert_eq!(h.run(&["cp", "inside.txt", victim_arg]).code, 1);
    assert_eq!(h.run(&["mv", "inside.txt", victim_arg]).code, 1);

    assert_eq!(std::fs::read(&victim).unwrap(), b"keep me");
    assert!(h.exists("inside.txt"));
}

#[test]
fn test_read_only_sandbox_refuses_writes() {
    let h = Harness::with_read_only(true);
    h.write("existing.txt", b"data");

    let out = h.run(&["touch", "new.txt"]);
    assert_eq!(out.code, 1);
    assert_eq!(out.stderr_str(), "touch: cannot touch 'new.txt': Read-only file system\n");
    assert!(!h.exists("new.txt"));

    let out = h.run(&["rm", "existing.txt"]);
    assert_eq!(out.code, 1);
    assert!(h.exists("existing.txt"));

    let out = h.run(&["mkdir", "d"]);
    assert_eq!(out.code, 1);
    assert!(!h.exists("d"));

    // Reads still work.
    assert_eq!(h.run(&["cat", "existing.txt"]).stdout, b"data");
}

#[test]
fn test_nested_preopen_maps_to_its_own_host_directory() {
    let h = Harness::new();
    let shared = TempDir::new().unwrap();
    std::fs::write(shared.path().join("note.txt"), b"shared note").unwrap();

    let guest = h.root().join("mnt");
    let sandbox = h
        .sandbox
        .clone()
        .with_preopen(coreutils::Preopen::new(&guest, shared.path()));

    let host = sandbox.resolve(Path::new("mnt/note.txt")).unwrap();
    assert_eq!(host, shared.path().join("note.txt"));
    assert!(sandbox.metadata(Path::new("mnt/note.txt")).is_ok());
}
