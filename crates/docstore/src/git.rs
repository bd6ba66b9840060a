use std::fs;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, Index, IndexEntry, IndexTime, Oid, Repository, RepositoryOpenFlags, Signature};
use tracing::debug;

use crate::{Backend, Blob, Result, StoreError};

/// Documents committed to a local git repository.
///
/// Reads come from the tree at HEAD, so uncommitted edits in the working
/// directory are invisible. The version token is the blob id.
pub struct GitBackend {
    repo: Repository,
    location: String,
}

/// Open a git repo at exactly `path`, without searching parent directories.
fn open_exact(path: &Path) -> std::result::Result<Repository, git2::Error> {
    Repository::open_ext(
        path,
        RepositoryOpenFlags::NO_SEARCH,
        &[] as &[&std::ffi::OsStr],
    )
}

impl GitBackend {
    /// Opens the repository at `path`, initializing one (and the directory)
    /// when there is none.
    pub fn open_or_init(path: &Path) -> Result<Self> {
        let repo = match open_exact(path) {
            Ok(repo) => repo,
            Err(_) => {
                fs::create_dir_all(path)?;
                debug!(path = %path.display(), "initializing document repository");
                Repository::init(path)?
            }
        };
        Ok(Self {
            repo,
            location: path.display().to_string(),
        })
    }

    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| StoreError::Io(std::io::Error::other("repository has no working directory")))
    }

    fn head_version(&self, path: &str) -> Result<Option<Oid>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let tree = head.peel_to_tree()?;
        match tree.get_path(Path::new(path)) {
            Ok(entry) => Ok(Some(entry.id())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn signature(&self) -> Result<Signature<'static>> {
        // Try repo config first, fall back to defaults
        let sig = match self.repo.signature() {
            Ok(sig) => Signature::now(
                sig.name().unwrap_or("newsroom"),
                sig.email().unwrap_or("newsroom@localhost"),
            )?,
            Err(_) => Signature::now("newsroom", "newsroom@localhost")?,
        };
        Ok(sig)
    }

    /// Commits `content` at `path` on top of HEAD. The tree is built from
    /// HEAD's tree in memory, so whatever else is staged stays out of it.
    fn commit_file(&self, path: &str, content: &str, message: &str) -> Result<String> {
        let blob = self.repo.blob(content.as_bytes())?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let mut index = Index::new()?;
        if let Some(parent) = &parent {
            index.read_tree(&parent.tree()?)?;
        }
        index.add(&IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            file_size: content.len() as u32,
            id: blob,
            flags: path.len().min(0xfff) as u16,
            flags_extended: 0,
            path: path.as_bytes().to_vec(),
        })?;
        let tree = self.repo.find_tree(index.write_tree_to(&self.repo)?)?;

        let sig = self.signature()?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;

        self.sync_workdir(path, content)?;
        Ok(blob.to_string())
    }

    /// Mirrors a committed document into the working directory and the
    /// repository index, touching only that path.
    fn sync_workdir(&self, path: &str, content: &str) -> Result<()> {
        let file = self.workdir()?.join(path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file, content)?;

        let mut shared = self.repo.index()?;
        shared.read(false)?;
        shared.add_path(Path::new(path))?;
        shared.write()?;
        Ok(())
    }
}

impl Backend for GitBackend {
    fn location(&self) -> &str {
        &self.location
    }

    fn fetch(&self, path: &str) -> Result<Option<Blob>> {
        let Some(oid) = self.head_version(path)? else {
            return Ok(None);
        };
        let blob = self.repo.find_blob(oid)?;
        let content = String::from_utf8(blob.content().to_vec())?;
        Ok(Some(Blob {
            content,
            version: oid.to_string(),
        }))
    }

    fn create(&self, path: &str, content: &str, message: &str) -> Result<String> {
        if self.head_version(path)?.is_some() {
            return Err(StoreError::Conflict(path.to_string()));
        }
        self.commit_file(path, content, message)
    }

    fn update(&self, path: &str, content: &str, message: &str, version: &str) -> Result<String> {
        match self.head_version(path)? {
            None => Err(StoreError::NotFound(path.to_string())),
            Some(current) if current.to_string() != version => {
                Err(StoreError::Conflict(path.to_string()))
            }
            Some(_) => self.commit_file(path, content, message),
        }
    }
}
