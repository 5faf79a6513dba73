//! Local file inventory: which media are already present under the
//! destination root.
//!
//! The inventory is built once per run, before any remote query, and is not
//! refreshed afterwards. A file downloaded for an earlier date in the same
//! run is therefore not seen when a later date reports an item with the same
//! name, and that item is downloaded again (overwriting the first one when
//! both land in the same month folder).

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::error::SyncResult;
use crate::media::MediaRecord;

/// How a remote item is matched against local files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Identity {
    /// Bare basename, wherever the file sits under the root.
    #[default]
    Filename,
    /// `(year, month, basename)`, taken from the `<root>/<year>/<month>/`
    /// prefix of the local path.
    Dated,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FileKey {
    folder: Option<(i32, u32)>,
    filename: String,
}

/// Set of media already present locally. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSet {
    identity: Identity,
    keys: HashSet<FileKey>,
}

impl LocalFileSet {
    /// Walk `root` and collect every file found at any depth.
    ///
    /// With `years`, only the `<root>/<year>` subtrees for those years are
    /// walked; a year without a folder contributes nothing.
    pub fn build(
        root: &Path,
        years: Option<&BTreeSet<i32>>,
        identity: Identity,
    ) -> SyncResult<Self> {
        let mut set = LocalFileSet {
            identity,
            keys: HashSet::new(),
        };

        let starts: Vec<PathBuf> = match years {
            None => vec![root.to_path_buf()],
            Some(years) => years
                .iter()
                .map(|year| root.join(year.to_string()))
                .filter(|path| path.is_dir())
                .collect(),
        };

        for start in starts {
            set.walk(root, &start)?;
        }

        tracing::debug!(
            root = %root.display(),
            files = set.len(),
            "Built local file inventory"
        );

        Ok(set)
    }

    /// Inventory from bare filenames, matched by [`Identity::Filename`].
    pub fn from_filenames<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LocalFileSet {
            identity: Identity::Filename,
            keys: names
                .into_iter()
                .map(|name| FileKey {
                    folder: None,
                    filename: name.into(),
                })
                .collect(),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether `record`, queried for `date`, already exists locally.
    pub fn contains(&self, record: &MediaRecord, date: NaiveDate) -> bool {
        let folder = match self.identity {
            Identity::Filename => None,
            Identity::Dated => Some((date.year(), date.month())),
        };
        self.keys.contains(&FileKey {
            folder,
            filename: record.filename.clone(),
        })
    }

    fn walk(&mut self, root: &Path, start: &Path) -> SyncResult<()> {
        let mut pending = vec![start.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                // Unreadable subfolders are skipped; an unreadable root is fatal.
                Err(e) if dir != start => {
                    tracing::warn!(path = %dir.display(), error = %e, "Skipping unreadable folder");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            for entry in entries.filter_map(|entry| entry.ok()) {
                let path = entry.path();
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };

                // Symlinks count when they point at a file; linked folders are not walked.
                let is_file = if file_type.is_symlink() {
                    std::fs::metadata(&path).is_ok_and(|meta| meta.is_file())
                } else {
                    file_type.is_file()
                };

                if file_type.is_dir() {
                    pending.push(path);
                } else if !is_file {
                    continue;
                } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    let folder = match self.identity {
                        Identity::Filename => None,
                        Identity::Dated => dated_folder(root, &path),
                    };
                    self.keys.insert(FileKey {
                        folder,
                        filename: name.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// `(year, month)` when `path` sits under `<root>/<YYYY>/<MM>/`.
fn dated_folder(root: &Path, path: &Path) -> Option<(i32, u32)> {
    let mut components = path.strip_prefix(root).ok()?.components();
    let year = components.next()?.as_os_str().to_str()?.parse::<i32>().ok()?;
    let month = components.next()?.as_os_str().to_str()?.parse::<u32>().ok()?;
    // The file itself must come after the month folder.
    components.next()?;
    (1..=12).contains(&month).then_some((year, month))
}
