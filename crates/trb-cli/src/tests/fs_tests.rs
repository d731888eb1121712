use crate::fs::discover_files;
use std::path::PathBuf;
use trb::config::TrbConfig;

fn touch(path: &std::path::Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, "def x\nend\n").unwrap();
}

#[test]
fn discovers_trb_files_recursively() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("a.trb"));
    touch(&dir.path().join("nested/b.trb"));
    touch(&dir.path().join("nested/skip.rb"));

    let config = TrbConfig::default();
    let files = discover_files(&config, &[dir.path().to_path_buf()]).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.to_string_lossy().ends_with(".trb")));
}

#[test]
fn results_are_sorted_and_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("b.trb"));
    touch(&dir.path().join("a.trb"));

    let config = TrbConfig::default();
    let root = dir.path().to_path_buf();
    let files = discover_files(&config, &[root.clone(), root]).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0] < files[1]);
}

#[test]
fn exclude_globs_are_honored() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("keep.trb"));
    touch(&dir.path().join("fixtures/drop.trb"));

    let mut config = TrbConfig::default();
    config.source.exclude = vec!["**/fixtures/**".to_string()];
    let files = discover_files(&config, &[dir.path().to_path_buf()]).unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].to_string_lossy().contains("keep"));
}

#[test]
fn explicit_file_inputs_pass_through() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("one.trb");
    touch(&file);

    let config = TrbConfig::default();
    let files = discover_files(&config, std::slice::from_ref(&file)).unwrap();
    assert_eq!(files, vec![file]);
}

#[test]
fn custom_extensions() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("a.trb"));
    touch(&dir.path().join("b.tr"));

    let mut config = TrbConfig::default();
    config.source.extensions = vec![".tr".to_string()];
    let files = discover_files(&config, &[dir.path().to_path_buf()]).unwrap();
    let names: Vec<PathBuf> = files
        .iter()
        .map(|f| PathBuf::from(f.file_name().unwrap()))
        .collect();
    assert_eq!(names, vec![PathBuf::from("b.tr")]);
}
