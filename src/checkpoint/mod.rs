//! Post-training checkpoint promotion
//!
//! The framework trains into a scratch directory and leaves the final
//! parameters in a `step_<N>` subdirectory, together with optimizer moment
//! tensors that serving never reads. Promotion prunes the moment files and
//! moves the checkpoint to the directory name the serving config points
//! at.

use anyhow::{bail, Context, Result};
use glob::glob;
use std::fs;
use std::path::{Path, PathBuf};

/// Locate the `step_*` checkpoint directory left by a training run.
///
/// When the run saved more than one checkpoint, the first match in name
/// order is taken.
pub fn find_step_dir(scratch_dir: &Path) -> Result<PathBuf> {
    let pattern = scratch_dir.join("step_*").to_string_lossy().into_owned();
    let first = glob(&pattern)
        .with_context(|| format!("Invalid checkpoint pattern: {}", pattern))?
        .filter_map(|entry| entry.ok())
        .find(|path| path.is_dir());
    match first {
        Some(dir) => Ok(dir),
        None => bail!(
            "No step_* checkpoint found under {:?}; the training run left nothing to promote",
            scratch_dir
        ),
    }
}

/// Delete optimizer moment files inside a checkpoint directory.
///
/// Returns the number of files removed.
pub fn prune_moment_files(checkpoint_dir: &Path) -> Result<usize> {
    let pattern = checkpoint_dir.join("*moment*").to_string_lossy().into_owned();
    let mut removed = 0;
    for entry in glob(&pattern).with_context(|| format!("Invalid moment pattern: {}", pattern))? {
        let path = entry?;
        if path.is_file() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
            removed += 1;
        }
    }
    tracing::debug!("Removed {} optimizer moment file(s)", removed);
    Ok(removed)
}

/// Move a checkpoint directory to its serving location.
///
/// A rename is attempted first; across filesystems the directory is copied
/// and the source removed.
pub fn move_dir(src: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        bail!("Checkpoint destination already exists: {:?}", dest);
    }
    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    copy_dir(src, dest)?;
    fs::remove_dir_all(src).with_context(|| format!("Failed to remove {:?}", src))
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("Failed to create {:?}", dest))?;
    for entry in fs::read_dir(src).with_context(|| format!("Failed to read {:?}", src))? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {:?}", entry.path()))?;
        }
    }
    Ok(())
}

/// Promote the training run under `scratch_dir` to `dest`.
///
/// Finds the `step_*` checkpoint, prunes its moment files, moves it to
/// `dest` and removes the scratch directory, which must be empty by then.
pub fn promote(scratch_dir: &Path, dest: &Path) -> Result<PathBuf> {
    let step_dir = find_step_dir(scratch_dir)?;
    tracing::info!("Promoting checkpoint {:?} to {:?}", step_dir, dest);

    prune_moment_files(&step_dir)?;
    move_dir(&step_dir, dest)?;
    fs::remove_dir(scratch_dir)
        .with_context(|| format!("Failed to remove scratch directory {:?}", scratch_dir))?;

    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_training_run(scratch: &Path, step: &str) {
        let step_dir = scratch.join(step);
        fs::create_dir_all(&step_dir).unwrap();
        fs::write(step_dir.join("encoder_layer_0_w"), b"w").unwrap();
        fs::write(step_dir.join("encoder_layer_0_b"), b"b").unwrap();
        fs::write(step_dir.join("encoder_layer_0_w_moment1_0"), b"m1").unwrap();
        fs::write(step_dir.join("encoder_layer_0_w_moment2_0"), b"m2").unwrap();
    }

    #[test]
    fn test_find_step_dir() {
        let temp = tempfile::tempdir().unwrap();
        fake_training_run(temp.path(), "step_4000");

        let found = find_step_dir(temp.path()).unwrap();
        assert!(found.ends_with("step_4000"));
    }

    #[test]
    fn test_find_step_dir_missing() {
        let temp = tempfile::tempdir().unwrap();
        assert!(find_step_dir(temp.path()).is_err());
    }

    #[test]
    fn test_prune_moment_files() {
        let temp = tempfile::tempdir().unwrap();
        fake_training_run(temp.path(), "step_100");
        let step_dir = temp.path().join("step_100");

        let removed = prune_moment_files(&step_dir).unwrap();
        assert_eq!(removed, 2);
        assert!(step_dir.join("encoder_layer_0_w").exists());
        assert!(!step_dir.join("encoder_layer_0_w_moment1_0").exists());
    }

    #[test]
    fn test_promote() {
        let temp = tempfile::tempdir().unwrap();
        let scratch = temp.path().join("temp");
        fake_training_run(&scratch, "step_2000");
        let dest = temp.path().join("dual_params");

        let promoted = promote(&scratch, &dest).unwrap();
        assert_eq!(promoted, dest);
        assert!(dest.join("encoder_layer_0_w").exists());
        assert!(dest.join("encoder_layer_0_b").exists());
        assert!(!dest.join("encoder_layer_0_w_moment1_0").exists());
        assert!(!scratch.exists());
    }

    #[test]
    fn test_move_dir_refuses_existing_dest() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();

        assert!(move_dir(&src, &dest).is_err());
    }
}
