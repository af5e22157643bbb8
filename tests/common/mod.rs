#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Path for a file the test expects a command to create.
    pub fn target(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

/// A small but representative sales extract: two categories, a missing
/// quantity, a malformed price, and a quantity spike in Office.
pub const SAMPLE_SALES: &str = "\
transaction_id,date,category,product,quantity,price
t1,2024-01-01,Toys,Blocks,2,10.00
t2,2024-01-02,Toys,Doll,,12.00
t3,2024-01-03,Toys,Kite,4,invalid
t4,2024-01-04,Office,Pen,5,1.50
t5,2024-01-05,Office,Pen,6,1.50
t6,2024-01-06,Office,Pen,5,1.50
t7,2024-01-07,Office,Pen,4,1.50
t8,2024-01-08,Office,Pen,6,1.50
t9,2024-01-09,Office,Pen,5,1.50
t10,2024-01-10,Office,Stapler,200,8.00
";
