//! Numbered save slots.
//!
//! Every save goes to a fresh slot `<base>_s<n>.*` and then repoints the
//! alias `<base>.*` at it, so the alias always names the latest complete
//! save and earlier slots are never overwritten.
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct SaveTarget {
    base: PathBuf,
    next: usize,
}

/// Paths written by one save.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SavedFiles {
    pub slot: usize,
    pub grid: PathBuf,
    pub txt: Option<PathBuf>,
    pub dat: Vec<PathBuf>,
}

impl SaveTarget {
    /// Save next to the source image: `dir/rom.png` → base `dir/rom`.
    pub fn for_image(image: &Path) -> Self {
        Self::with_base(image.with_extension(""))
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            next: 0,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn suffixed(&self, suffix: &str) -> PathBuf {
        let mut name = self.base.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    pub fn grid_path(&self, slot: usize) -> PathBuf {
        self.suffixed(&format!("_s{slot}.grid"))
    }

    pub fn txt_path(&self, slot: usize) -> PathBuf {
        self.suffixed(&format!("_s{slot}.txt"))
    }

    pub fn dat_path(&self, slot: usize, group: usize) -> PathBuf {
        self.suffixed(&format!("_s{slot}-{group}.dat"))
    }

    pub fn grid_alias(&self) -> PathBuf {
        self.suffixed(".grid")
    }

    pub fn txt_alias(&self) -> PathBuf {
        self.suffixed(".txt")
    }

    pub fn dat_alias(&self, group: usize) -> PathBuf {
        self.suffixed(&format!("_{group}.dat"))
    }

    /// Claim the first unused slot at or after the last one handed out.
    pub fn next_slot(&mut self) -> usize {
        while self.grid_path(self.next).exists() {
            self.next += 1;
        }
        self.next
    }
}

/// Point `alias` at `target` by building the link at `<alias>_` and renaming
/// it over `alias`. Both paths are expected in the same directory; the link
/// stores only the target's file name.
pub fn link_alias(target: &Path, alias: &Path) -> Result<()> {
    let mut tmp = alias.as_os_str().to_os_string();
    tmp.push("_");
    let tmp = PathBuf::from(tmp);
    if fs::symlink_metadata(&tmp).is_ok() {
        fs::remove_file(&tmp)?;
    }
    make_link(target, &tmp)?;
    fs::rename(&tmp, alias)?;
    Ok(())
}

#[cfg(unix)]
fn make_link(target: &Path, link: &Path) -> Result<()> {
    let name = target.file_name().map(Path::new).unwrap_or(target);
    std::os::unix::fs::symlink(name, link)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_link(target: &Path, link: &Path) -> Result<()> {
    fs::copy(target, link)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_base_name() {
        let t = SaveTarget::for_image(Path::new("dies/rom.png"));
        assert_eq!(t.base(), Path::new("dies/rom"));
        assert_eq!(t.grid_path(3), Path::new("dies/rom_s3.grid"));
        assert_eq!(t.dat_path(0, 2), Path::new("dies/rom_s0-2.dat"));
        assert_eq!(t.dat_alias(2), Path::new("dies/rom_2.dat"));
        assert_eq!(t.txt_alias(), Path::new("dies/rom.txt"));
    }

    #[test]
    fn next_slot_skips_existing_grids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut t = SaveTarget::with_base(dir.path().join("rom"));
        assert_eq!(t.next_slot(), 0);
        fs::write(t.grid_path(0), "{}").expect("write");
        fs::write(t.grid_path(1), "{}").expect("write");
        assert_eq!(t.next_slot(), 2);
    }

    #[test]
    fn alias_follows_latest_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("rom_s0.grid");
        let b = dir.path().join("rom_s1.grid");
        let alias = dir.path().join("rom.grid");
        fs::write(&a, "first").expect("write");
        fs::write(&b, "second").expect("write");
        link_alias(&a, &alias).expect("link");
        assert_eq!(fs::read_to_string(&alias).expect("read"), "first");
        link_alias(&b, &alias).expect("relink");
        assert_eq!(fs::read_to_string(&alias).expect("read"), "second");
        assert!(fs::symlink_metadata(dir.path().join("rom.grid_")).is_err());
    }
}
