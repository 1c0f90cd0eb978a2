//! End-to-end tests driven through the public `Repository` facade against
//! real temp directories, rather than the in-module mocks used by unit
//! tests.

use std::fs;

use rsgit::object::{Blob, Object};
use rsgit::{GitError, Repository};

fn init_repo() -> (tempfile::TempDir, Repository) {
    let dir = tempfile::tempdir().unwrap();
    rsgit::repo::init(dir.path()).unwrap();
    fs::write(
        dir.path().join(".git").join("config"),
        "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = false\n[user]\n\tname = Jane Doe\n\temail = jane@example.com\n",
    )
    .unwrap();
    let repo = Repository::open(dir.path()).unwrap();
    (dir, repo)
}

#[test]
fn s1_blob_identity_through_add() {
    let (dir, mut repo) = init_repo();
    fs::write(dir.path().join("hello.txt"), "hello").unwrap();
    let report = repo.add(&[std::path::PathBuf::from("hello.txt")]).unwrap();
    assert!(report.failed.is_empty());
    assert_eq!(report.staged.len(), 1);
}

#[test]
fn init_creates_unborn_main_branch() {
    let (_dir, repo) = init_repo();
    assert_eq!(repo.current_branch().unwrap(), Some("main".to_string()));
    assert_eq!(repo.current_head().unwrap(), None);
}

#[test]
fn commit_then_status_reports_clean_tree() {
    let (dir, mut repo) = init_repo();
    fs::write(dir.path().join("a.txt"), "content-a").unwrap();
    repo.add(&[std::path::PathBuf::from("a.txt")]).unwrap();
    let commit_hash = repo.commit("first commit").unwrap();

    // Re-open to make sure the on-disk state (index + refs + objects) is
    // everything `commit` needs; no hidden in-memory state survives.
    let repo = Repository::open(dir.path()).unwrap();
    assert_eq!(repo.current_head().unwrap(), Some(commit_hash));

    let status = repo.status().unwrap();
    assert!(status.is_clean(), "expected clean status, got {status:?}");
}

#[test]
fn s7_status_classification_through_real_filesystem() {
    let (dir, mut repo) = init_repo();
    fs::write(dir.path().join("b.txt"), "content-1").unwrap();
    fs::write(dir.path().join("c.txt"), "content-2").unwrap();
    fs::write(dir.path().join("d.txt"), "content-3").unwrap();
    repo.add(&[
        std::path::PathBuf::from("b.txt"),
        std::path::PathBuf::from("c.txt"),
        std::path::PathBuf::from("d.txt"),
    ])
    .unwrap();
    repo.commit("base").unwrap();

    let mut repo = Repository::open(dir.path()).unwrap();
    fs::remove_file(dir.path().join("c.txt")).unwrap();
    repo.remove(&["c.txt".to_string()], false).unwrap();

    fs::write(dir.path().join("a.txt"), "content-a").unwrap();
    repo.add(&[std::path::PathBuf::from("a.txt")]).unwrap();

    fs::write(dir.path().join("b.txt"), "content-1-modified").unwrap();
    fs::remove_file(dir.path().join("d.txt")).unwrap();
    fs::write(dir.path().join("u.txt"), "u").unwrap();
    fs::write(dir.path().join(".gitignore"), "ignored.txt\n").unwrap();
    fs::write(dir.path().join("ignored.txt"), "ig").unwrap();

    let repo = Repository::open(dir.path()).unwrap();
    let report = repo.status().unwrap();

    assert_eq!(report.staged_added, vec!["a.txt"]);
    assert_eq!(report.staged_deleted, vec!["c.txt"]);
    assert_eq!(report.unstaged_modified, vec!["b.txt"]);
    assert_eq!(report.unstaged_deleted, vec!["d.txt"]);
    assert_eq!(report.untracked, vec![".gitignore", "u.txt"]);
    assert_eq!(report.ignored, vec!["ignored.txt"]);
}

#[test]
fn commit_without_identity_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    rsgit::repo::init(dir.path()).unwrap();
    let mut repo = Repository::open(dir.path()).unwrap();
    let err = repo.commit("no identity set").unwrap_err();
    assert!(matches!(err, GitError::Validation { .. }));
}

#[test]
fn branch_and_checkout_repoint_head() {
    let (dir, mut repo) = init_repo();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    repo.add(&[std::path::PathBuf::from("a.txt")]).unwrap();
    let first = repo.commit("first").unwrap();

    repo.create_branch("feature", first).unwrap();
    repo.checkout_branch("feature").unwrap();
    assert_eq!(repo.current_branch().unwrap(), Some("feature".to_string()));
    assert_eq!(repo.current_head().unwrap(), Some(first));
}

#[test]
fn discover_finds_repository_from_a_nested_subdirectory() {
    let dir = tempfile::tempdir().unwrap();
    rsgit::repo::init(dir.path()).unwrap();
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    let found = rsgit::repo::discover(&nested).unwrap();
    assert_eq!(found, dir.path());
}

#[test]
fn store_write_is_idempotent_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    rsgit::repo::init(dir.path()).unwrap();
    let store = rsgit::store::ObjectStore::open(dir.path().join(".git"));
    let object = Object::Blob(Blob::new(b"hello".to_vec()));
    let first = store.write(&object).unwrap();
    let second = store.write(&object).unwrap();
    assert_eq!(first, second);
}
