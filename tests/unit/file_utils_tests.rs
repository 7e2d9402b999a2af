/*!
 * Tests for scratch directories and atomic output files
 */

use anyhow::Result;
use std::fs;
use vttspeak::file_utils::{FileManager, ScratchDir};
use crate::common;

/// Test that scratch directories are unique and removed on close
#[test]
fn test_scratch_dir_close_withFiles_shouldRemoveDirectory() -> Result<()> {
    let parent = common::create_temp_dir()?;

    let first = ScratchDir::create_in(parent.path(), "run1")?;
    let second = ScratchDir::create_in(parent.path(), "run1")?;
    assert_ne!(first.path(), second.path());

    let first_path = first.path().to_path_buf();
    fs::write(first.join("clip_00000.mp3"), b"data")?;
    assert!(FileManager::dir_exists(&first_path));

    first.close();
    assert!(!first_path.exists());
    assert!(second.path().exists());
    Ok(())
}

/// Test that dropping a scratch directory also removes it
#[test]
fn test_scratch_dir_drop_withoutClose_shouldRemoveDirectory() -> Result<()> {
    let parent = common::create_temp_dir()?;
    let path = {
        let scratch = ScratchDir::create_in(parent.path(), "dropped")?;
        let name = scratch
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert!(name.starts_with("vttspeak_dropped_"));
        scratch.path().to_path_buf()
    };
    assert!(!path.exists());
    Ok(())
}

/// Test atomic writes create the file with the exact content
#[test]
fn test_write_atomically_withNewDestination_shouldWriteContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let destination = temp_dir.path().join("sub").join("out.mp3");

    FileManager::write_atomically(&destination, b"audio-bytes")?;

    assert_eq!(fs::read(&destination)?, b"audio-bytes");
    // No staging leftovers
    let leftovers = fs::read_dir(temp_dir.path().join("sub"))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".vttspeak-"))
        .count();
    assert_eq!(leftovers, 0);
    Ok(())
}

/// Test atomic writes replace an existing file
#[test]
fn test_write_atomically_withExistingDestination_shouldReplace() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let destination = common::create_test_file(temp_dir.path(), "out.mp3", "old")?;

    FileManager::write_atomically(&destination, b"new")?;

    assert_eq!(fs::read_to_string(&destination)?, "new");
    Ok(())
}

/// Test that an unpersisted staging file disappears
#[test]
fn test_staging_file_for_withoutPersist_shouldLeaveNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let destination = temp_dir.path().join("Video.MP4");

    let staged_path = {
        let staged = FileManager::staging_file_for(&destination)?;
        let path = staged.path().to_path_buf();
        assert_eq!(path.parent(), Some(temp_dir.path()));
        assert_eq!(FileManager::extension_lowercase(&path).as_deref(), Some("mp4"));
        path
    };

    assert!(!staged_path.exists());
    assert!(!destination.exists());
    Ok(())
}

/// Test that atomically written files get the same mode as a plain create
#[cfg(unix)]
#[test]
fn test_write_atomically_withDefaultUmask_shouldMatchPlainCreateMode() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = common::create_temp_dir()?;
    let plain = temp_dir.path().join("plain.mp3");
    fs::write(&plain, b"data")?;

    let atomic = temp_dir.path().join("atomic.mp3");
    FileManager::write_atomically(&atomic, b"data")?;

    let plain_mode = fs::metadata(&plain)?.permissions().mode() & 0o777;
    let atomic_mode = fs::metadata(&atomic)?.permissions().mode() & 0o777;
    assert_eq!(atomic_mode, plain_mode);
    Ok(())
}

/// Test path helpers
#[test]
fn test_path_helpers_withRelativePaths_shouldResolve() {
    assert_eq!(FileManager::parent_dir("out.mp3"), std::path::PathBuf::from("."));
    assert_eq!(FileManager::parent_dir("a/b/out.mp3"), std::path::PathBuf::from("a/b"));
    assert_eq!(FileManager::extension_lowercase("clip.WAV").as_deref(), Some("wav"));
    assert_eq!(FileManager::extension_lowercase("noext"), None);
    assert!(!FileManager::file_exists("/definitely/not/here"));
}
