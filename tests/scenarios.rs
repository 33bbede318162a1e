//! End-to-end build scenarios against the library API.

use std::path::{Path, PathBuf};

use tempfile::tempdir;

use rbgen::{
    BuildConfig, Builder, ChangeEvent, ChangeKind, ClassBindingTranslator, LocalFileSystem,
};

fn write_script(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn builder(root: &Path) -> Builder<ClassBindingTranslator, LocalFileSystem> {
    Builder::new(root, BuildConfig::default(), ClassBindingTranslator::new())
}

#[test]
fn test_two_class_script_mirrors_package() {
    let dir = tempdir().unwrap();
    write_script(
        dir.path(),
        "src/pkg/thing.rb",
        "module Pkg\n  class A\n  end\n\n  class B\n  end\nend\n",
    );

    let mut b = builder(dir.path());
    let report = b.full_build().unwrap();

    assert!(report.is_success());
    assert!(dir.path().join("build/pkg").is_dir());
    assert!(dir.path().join("build/pkg/A.java").is_file());
    assert!(dir.path().join("build/pkg/B.java").is_file());
    assert!(b.sink().for_file(Path::new("src/pkg/thing.rb")).is_empty());
}

#[test]
fn test_incremental_change_overwrites_in_place() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "src/a.rb", "class A\nend\n");

    let mut b = builder(dir.path());
    b.full_build().unwrap();
    let before = std::fs::read_to_string(dir.path().join("build/A.java")).unwrap();

    // Change the script body; the generated file is fully replaced
    write_script(dir.path(), "src/a.rb", "class A\n  def hi\n  end\nend\n");
    let report = b.incremental_build(&[ChangeEvent::new(ChangeKind::Changed, "src/a.rb")]);

    assert!(report.is_success());
    let after = std::fs::read_to_string(dir.path().join("build/A.java")).unwrap();
    assert_ne!(before, after);
    assert!(after.contains("def hi"));
}

#[test]
fn test_removing_script_leaves_generated_output() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "src/a.rb", "class A\nend\n");

    let mut b = builder(dir.path());
    b.full_build().unwrap();
    assert!(dir.path().join("build/A.java").is_file());

    std::fs::remove_file(dir.path().join("src/a.rb")).unwrap();
    let report = b.incremental_build(&[ChangeEvent::new(ChangeKind::Removed, "src/a.rb")]);

    // Documented behavior: no deletion side effect, stale artifact stays
    assert!(report.compiled.is_empty());
    assert!(report.written.is_empty());
    assert!(dir.path().join("build/A.java").is_file());
}

#[test]
fn test_failing_then_fixed_script_clears_diagnostics() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "src/bad.rb", "module Broken\n  class\nend\n");

    let mut b = builder(dir.path());
    let report = b.full_build().unwrap();
    assert_eq!(report.failed, vec![PathBuf::from("src/bad.rb")]);

    let diags = b.sink().for_file(Path::new("src/bad.rb"));
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].line, 2);

    write_script(
        dir.path(),
        "src/bad.rb",
        "module Broken\n  class Fixed\n  end\nend\n",
    );
    let report = b.incremental_build(&[ChangeEvent::new(ChangeKind::Changed, "src/bad.rb")]);

    assert!(report.is_success());
    assert!(b.sink().for_file(Path::new("src/bad.rb")).is_empty());
    assert!(dir.path().join("build/broken/Fixed.java").is_file());
}

#[test]
fn test_mixed_batch_builds_valid_siblings() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "src/bad.rb", "class nope\nend\n");
    write_script(
        dir.path(),
        "src/pkg/good.rb",
        "module Pkg\n  class Good\n  end\nend\n",
    );

    let mut b = builder(dir.path());
    let report = b.full_build().unwrap();

    assert_eq!(report.failed, vec![PathBuf::from("src/bad.rb")]);
    assert_eq!(report.compiled, vec![PathBuf::from("src/pkg/good.rb")]);
    assert!(dir.path().join("build/pkg/Good.java").is_file());
}

#[test]
fn test_repeated_full_builds_are_stable() {
    let dir = tempdir().unwrap();
    write_script(
        dir.path(),
        "src/deep/widget.rb",
        "module Deep\n  class Widget\n  end\nend\n",
    );

    let mut b = builder(dir.path());
    b.full_build().unwrap();
    let first = std::fs::read_to_string(dir.path().join("build/deep/Widget.java")).unwrap();

    for _ in 0..3 {
        let report = b.full_build().unwrap();
        assert!(report.is_success());
    }

    let last = std::fs::read_to_string(dir.path().join("build/deep/Widget.java")).unwrap();
    assert_eq!(first, last);
}

#[test]
fn test_scripts_outside_source_root_are_ignored() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "src/a.rb", "class A\nend\n");
    write_script(dir.path(), "tools/b.rb", "class B\nend\n");
    write_script(dir.path(), "src/readme.txt", "class NotRuby\nend\n");

    let mut b = builder(dir.path());
    let report = b.full_build().unwrap();

    assert_eq!(report.compiled, vec![PathBuf::from("src/a.rb")]);
    assert!(dir.path().join("build/A.java").is_file());
    assert!(!dir.path().join("build/B.java").exists());
}
