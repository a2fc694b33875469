//! Integration tests comparing the local and in-memory collaborators.

use scriptstash_core::{FileLister, FileStore, ListOptions, LocalFileStore, MemoryFileStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TREE: &[(&str, &str)] = &[
    ("users.sql", "SELECT *\nFROM USERS"),
    ("phones.sql", "SELECT PHONE\nFROM USERS"),
    ("mail.vbs", "Set mail = CreateObject(\"CDO.Message\")"),
    ("nested/monthly.sql", "SELECT 1"),
    ("nested/deeper/yearly.sql", "SELECT 2"),
];

fn local_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in TREE {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn memory_tree(root: &Path) -> MemoryFileStore {
    let store = MemoryFileStore::new();
    for (name, content) in TREE {
        store.insert(root.join(name), *content);
    }
    store
}

fn relative(root: &Path, paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

#[test]
fn local_and_memory_listings_agree() {
    let dir = local_tree();
    let memory = memory_tree(dir.path());
    let local = LocalFileStore::new();

    for options in [
        ListOptions::default(),
        ListOptions::new().recursive(false),
        ListOptions::new().max_depth(2),
    ] {
        for pattern in ["*.sql", "*", "m*.*", "?????.sql"] {
            let from_disk = relative(dir.path(), local.list_files(dir.path(), pattern, &options).unwrap());
            let from_memory =
                relative(dir.path(), memory.list_files(dir.path(), pattern, &options).unwrap());
            assert_eq!(from_disk, from_memory, "pattern {pattern} with {options:?}");
        }
    }
}

#[test]
fn stores_are_usable_as_trait_objects() {
    let dir = local_tree();
    let stores: Vec<Box<dyn FileStore>> = vec![
        Box::new(LocalFileStore::new()),
        Box::new(memory_tree(dir.path())),
    ];

    for store in &stores {
        let path = dir.path().join("users.sql");
        assert_eq!(
            store.read_lines(&path).unwrap(),
            vec!["SELECT *".to_string(), "FROM USERS".to_string()]
        );
        assert!(store.is_dir(&dir.path().join("nested")));
        assert!(!store.exists(&dir.path().join("missing.sql")));
    }
}
