use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use super::table::render_page;

/// The region the setup view draws into.
///
/// Every call replaces the whole table body; implementations never append.
pub trait RenderTarget: Send + Sync {
    fn replace(&self, table_body: &str) -> Result<()>;

    /// Whether `replace` may block on I/O. The poller runs blocking targets
    /// on the blocking pool.
    fn blocks(&self) -> bool {
        true
    }
}

/// Keeps the latest table body in memory.
///
/// Cloning shares the same buffer, so a server or test can read what the
/// poller last wrote.
#[derive(Debug, Clone, Default)]
pub struct SharedTarget {
    inner: Arc<RwLock<SharedInner>>,
}

#[derive(Debug, Default)]
struct SharedInner {
    body: String,
    renders: u64,
}

impl SharedTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self) -> String {
        self.inner.read().body.clone()
    }

    /// How many times the region has been replaced.
    pub fn renders(&self) -> u64 {
        self.inner.read().renders
    }
}

impl RenderTarget for SharedTarget {
    fn replace(&self, table_body: &str) -> Result<()> {
        let mut inner = self.inner.write();
        inner.body.clear();
        inner.body.push_str(table_body);
        inner.renders += 1;
        Ok(())
    }

    fn blocks(&self) -> bool {
        false
    }
}

/// Rewrites a standalone HTML page on every render.
#[derive(Debug, Clone)]
pub struct FileTarget {
    path: PathBuf,
    refresh_secs: Option<u64>,
}

impl FileTarget {
    pub fn new(path: impl Into<PathBuf>, refresh_secs: Option<u64>) -> Self {
        Self {
            path: path.into(),
            refresh_secs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderTarget for FileTarget {
    fn replace(&self, table_body: &str) -> Result<()> {
        let page = render_page(table_body, self.refresh_secs);
        // Write beside the target and rename so readers never see a half page.
        let tmp = self.path.with_extension("html.tmp");
        std::fs::write(&tmp, page)
            .map_err(|err| anyhow!("Failed to write {}: {err}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|err| anyhow!("Failed to replace {}: {err}", self.path.display()))?;
        Ok(())
    }
}

/// Prints each table body as one line on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutTarget;

impl RenderTarget for StdoutTarget {
    fn replace(&self, table_body: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{table_body}")
            .and_then(|_| stdout.flush())
            .map_err(|err| anyhow!("Failed to write to stdout: {err}"))
    }
}

/// Fan a render out to several targets; the first failure is reported after
/// all targets have been tried.
pub struct MultiTarget {
    targets: Vec<Arc<dyn RenderTarget>>,
}

impl MultiTarget {
    pub fn new(targets: Vec<Arc<dyn RenderTarget>>) -> Self {
        Self { targets }
    }
}

impl RenderTarget for MultiTarget {
    fn replace(&self, table_body: &str) -> Result<()> {
        let mut first_err = None;
        for target in &self.targets {
            if let Err(err) = target.replace(table_body) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn blocks(&self) -> bool {
        self.targets.iter().any(|target| target.blocks())
    }
}
