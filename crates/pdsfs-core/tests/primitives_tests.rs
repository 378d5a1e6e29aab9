//! Laws every primitives backend must uphold, checked against each one.

use pdsfs_core::vfs::{LocalFs, MemoryFs, Node, NodeKind, OpenMode, Primitives};
use pdsfs_core::VfsError;
use rstest::rstest;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Debug, Clone, Copy)]
enum Backend {
    Memory,
    Local,
}

/// A backend plus whatever keeps it alive.
fn open(backend: Backend) -> (Box<dyn Primitives>, Option<tempfile::TempDir>) {
    match backend {
        Backend::Memory => (Box::new(MemoryFs::new()), None),
        Backend::Local => {
            let dir = tempfile::tempdir().unwrap();
            (Box::new(LocalFs::new(dir.path())), Some(dir))
        }
    }
}

// ============================================================================
// Root
// ============================================================================

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn root_is_empty_dir(#[case] backend: Backend) {
    let (fs, _keep) = open(backend);
    let root = fs.root();
    assert!(fs.is_dir(&root));
    assert!(!fs.is_file(&root));
    assert!(fs.children(&root).await.unwrap().is_empty());
}

// ============================================================================
// Add / fetch / remove
// ============================================================================

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn added_child_is_fetched(#[case] backend: Backend) {
    let (fs, _keep) = open(backend);
    let root = fs.root();

    let dir = fs.add_child_dir(&root, "bundle").await.unwrap();
    let file = fs.add_child_file(&dir, "bundle.xml").await.unwrap();

    assert_eq!(fs.child(&root, "bundle").await.unwrap(), dir);
    assert_eq!(fs.child(&dir, "bundle.xml").await.unwrap(), file);
    assert_eq!(fs.child(&dir, "bundle.xml").await.unwrap().kind(), NodeKind::File);
    assert_eq!(
        fs.children(&dir).await.unwrap().keys().collect::<Vec<_>>(),
        ["bundle.xml"]
    );
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn removed_child_is_gone(#[case] backend: Backend) {
    let (fs, _keep) = open(backend);
    let root = fs.root();
    let dir = fs.add_child_dir(&root, "d").await.unwrap();
    fs.add_child_file(&dir, "f").await.unwrap();

    fs.remove_child(&root, "d").await.unwrap();
    assert!(fs.child(&root, "d").await.unwrap_err().is_not_found());
    assert!(fs.remove_child(&root, "d").await.unwrap_err().is_not_found());
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn duplicate_names_rejected(#[case] backend: Backend) {
    let (fs, _keep) = open(backend);
    let root = fs.root();
    fs.add_child_dir(&root, "x").await.unwrap();
    assert!(matches!(
        fs.add_child_file(&root, "x").await,
        Err(VfsError::AlreadyExists(_))
    ));
    assert!(matches!(
        fs.add_child_dir(&root, "x").await,
        Err(VfsError::AlreadyExists(_))
    ));
}

#[rstest]
#[case::memory_empty(Backend::Memory, "")]
#[case::memory_dot(Backend::Memory, ".")]
#[case::memory_dotdot(Backend::Memory, "..")]
#[case::memory_slash(Backend::Memory, "a/b")]
#[case::local_empty(Backend::Local, "")]
#[case::local_dot(Backend::Local, ".")]
#[case::local_dotdot(Backend::Local, "..")]
#[case::local_slash(Backend::Local, "a/b")]
#[tokio::test]
async fn invalid_names_rejected(#[case] backend: Backend, #[case] name: &str) {
    let (fs, _keep) = open(backend);
    let root = fs.root();
    fs.add_child_file(&root, "keep.txt").await.unwrap();

    assert!(matches!(
        fs.add_child_dir(&root, name).await,
        Err(VfsError::InvalidName(_))
    ));
    assert!(matches!(
        fs.remove_child(&root, name).await,
        Err(VfsError::InvalidName(_))
    ));

    // The root and its contents are untouched
    assert!(fs.is_dir(&root));
    assert_eq!(
        fs.children(&root).await.unwrap().keys().collect::<Vec<_>>(),
        ["keep.txt"]
    );
}

// ============================================================================
// Kind misuse
// ============================================================================

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn children_of_file_fails(#[case] backend: Backend) {
    let (fs, _keep) = open(backend);
    let file = fs.add_child_file(&fs.root(), "f").await.unwrap();
    assert!(matches!(fs.children(&file).await, Err(VfsError::NotADirectory(_))));
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn open_dir_fails(#[case] backend: Backend) {
    let (fs, _keep) = open(backend);
    let dir = fs.add_child_dir(&fs.root(), "d").await.unwrap();
    assert!(matches!(
        fs.open(&dir, OpenMode::Read).await,
        Err(VfsError::IsADirectory(_))
    ));
}

// ============================================================================
// Handles
// ============================================================================

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn handle_modes(#[case] backend: Backend) {
    let (fs, _keep) = open(backend);
    let file = fs.add_child_file(&fs.root(), "log.txt").await.unwrap();

    let mut w = fs.open(&file, OpenMode::Write).await.unwrap();
    w.write_all(b"one\n").await.unwrap();
    w.close().await.unwrap();

    let mut a = fs.open(&file, OpenMode::Append).await.unwrap();
    a.write_all(b"two\n").await.unwrap();
    a.close().await.unwrap();

    // Dropped without close: discarded.
    {
        let mut lost = fs.open(&file, OpenMode::Write).await.unwrap();
        lost.write_all(b"lost").await.unwrap();
    }

    let mut r = fs.open(&file, OpenMode::Read).await.unwrap();
    let mut text = String::new();
    r.read_to_string(&mut text).await.unwrap();
    assert_eq!(text, "one\ntwo\n");
    assert!(r.write_all(b"x").await.is_err());
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn node_equality_is_by_path(#[case] backend: Backend) {
    let (fs, _keep) = open(backend);
    let made = fs.add_child_dir(&fs.root(), "same").await.unwrap();
    assert_eq!(made, Node::dir("same"));
    assert_eq!(made, Node::file("same"));
    assert_ne!(made, Node::dir("other"));
}
