//! Collaborators backed by a root directory: [DirectoryCatalog] lists the files in it, and [DirectoryLoader] reads them
//! into memory.
use std::collections::HashMap;
use std::fs::File;
use std::io::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ahash::RandomState;

use crate::*;

fn conv_path(path: impl AsRef<Path>) -> Result<relative_path::RelativePathBuf> {
    relative_path::RelativePathBuf::from_path(path)
        .map_err(|_| Error::new(ErrorKind::Other, "Invalid path"))
}

/// Resolve a resource name under `root`, refusing names which would escape it.
///
/// Names look like `b/c`.  On Windows, canonicalize is very broken when relative path segments appear in the middle of
/// a path, so this goes via `RelativePathBuf` instead.
fn resolve(root: &Path, name: &str) -> Result<PathBuf> {
    let absolute = conv_path(name)?.to_logical_path(root);
    if !absolute.starts_with(root) {
        return Err(Error::new(
            ErrorKind::Other,
            "path is outside the root directory",
        ));
    }
    Ok(absolute)
}

/// Lists the regular files directly under a root directory, sorted by name.
#[derive(Debug)]
pub struct DirectoryCatalog {
    root_path: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root_path: &Path) -> DirectoryCatalog {
        DirectoryCatalog {
            root_path: root_path.to_path_buf(),
        }
    }
}

impl ResourceCatalog for DirectoryCatalog {
    fn candidates(&self) -> Result<Vec<Resource>> {
        let mut out = vec![];
        for dirent in std::fs::read_dir(&self.root_path)? {
            let dirent = dirent?;
            let meta = dirent.metadata()?;
            if !meta.is_file() {
                continue;
            }

            match dirent.file_name().into_string() {
                Ok(name) => out.push(Resource::new(name, meta.len())),
                Err(name) => log::debug!("Skipping non-UTF-8 file name {:?}", name),
            }
        }

        out.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(out)
    }
}

/// Reads resources from under a root directory and keeps their bytes resident.
#[derive(Debug)]
pub struct DirectoryLoader {
    root_path: PathBuf,
    resident: Mutex<HashMap<Arc<str>, Arc<Vec<u8>>, RandomState>>,
}

impl DirectoryLoader {
    pub fn new(root_path: &Path) -> DirectoryLoader {
        DirectoryLoader {
            root_path: root_path.to_path_buf(),
            resident: Default::default(),
        }
    }

    /// Bytes of a previously loaded resource.
    pub fn resident(&self, name: &str) -> Option<Arc<Vec<u8>>> {
        self.resident.lock().unwrap().get(name).cloned()
    }

    pub fn resident_count(&self) -> usize {
        self.resident.lock().unwrap().len()
    }
}

impl ResourceLoader for DirectoryLoader {
    type Error = Error;

    fn load(&self, resource: &Resource) -> Result<()> {
        let path = resolve(&self.root_path, resource.name())?;
        let mut dest = vec![];
        File::open(path)?.read_to_end(&mut dest)?;

        // Admission was decided on the catalog's size; if the file changed since, the budget would be wrong.
        if dest.len() as u64 != resource.size_bytes() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "{} is {} bytes, expected {}",
                    resource.name(),
                    dest.len(),
                    resource.size_bytes()
                ),
            ));
        }

        self.resident
            .lock()
            .unwrap()
            .insert(resource.shared_name(), Arc::new(dest));
        Ok(())
    }
}
