//! Binary classpath layers: class directories and jar archives

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::trace;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::Result;

/// One layer of the class pool's lookup chain
pub trait ClassPath {
    /// Class file bytes for a qualified (dotted) class name, if this layer has it
    fn open_class(&mut self, name: &str) -> Result<Option<Vec<u8>>>;

    fn describe(&self) -> String;

    /// Whether this layer hands out declaration stubs instead of compiled classes
    fn provides_stubs(&self) -> bool {
        false
    }
}

/// `a.b.C$D` -> `a/b/C$D.class`
pub fn class_file_path(name: &str) -> String {
    format!("{}.class", name.replace('.', "/"))
}

/// Split a classpath string on the platform separator (`:` on Unix, `;` on Windows)
pub fn parse_class_path(class_path: &str) -> Vec<PathBuf> {
    let separator = if cfg!(windows) { ';' } else { ':' };
    class_path
        .split(separator)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Join entries back into a classpath string
pub fn join_class_path(entries: &[PathBuf]) -> String {
    let separator = if cfg!(windows) { ";" } else { ":" };
    entries.iter().map(|e| e.display().to_string()).collect::<Vec<_>>().join(separator)
}

/// Layers for the given entries; `.jar`/`.zip` files become archives, everything else a directory
pub fn open_entries(entries: &[PathBuf]) -> Vec<Box<dyn ClassPath>> {
    entries
        .iter()
        .map(|entry| -> Box<dyn ClassPath> {
            let is_archive = entry
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"))
                .unwrap_or(false);
            if is_archive {
                Box::new(JarClassPath::new(entry))
            } else {
                Box::new(DirClassPath::new(entry))
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct DirClassPath {
    root: PathBuf,
}

impl DirClassPath {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
}

impl ClassPath for DirClassPath {
    fn open_class(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(class_file_path(name));
        if !path.is_file() {
            return Ok(None);
        }
        trace!(class = name, path = %path.display(), "loading class from directory");
        Ok(Some(std::fs::read(path)?))
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }
}

/// Jar archive, opened on first lookup
pub struct JarClassPath {
    path: PathBuf,
    archive: Option<ZipArchive<File>>,
}

impl JarClassPath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), archive: None }
    }

    fn archive(&mut self) -> Result<Option<&mut ZipArchive<File>>> {
        if self.archive.is_none() {
            if !self.path.is_file() {
                return Ok(None);
            }
            self.archive = Some(ZipArchive::new(File::open(&self.path)?)?);
        }
        Ok(self.archive.as_mut())
    }
}

impl ClassPath for JarClassPath {
    fn open_class(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let entry_name = class_file_path(name);
        let path = self.path.clone();
        let Some(archive) = self.archive()? else {
            return Ok(None);
        };
        let mut entry = match archive.by_name(&entry_name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        trace!(class = name, jar = %path.display(), "loading class from jar");
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    fn describe(&self) -> String {
        format!("jar:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    #[test]
    fn test_class_file_path() {
        assert_eq!(class_file_path("demo.Outer$Inner"), "demo/Outer$Inner.class");
    }

    #[test]
    fn test_parse_class_path() {
        let separator = if cfg!(windows) { ";" } else { ":" };
        let raw = format!("lib/a.jar{separator} {separator}classes");
        let entries = parse_class_path(&raw);
        assert_eq!(entries, vec![PathBuf::from("lib/a.jar"), PathBuf::from("classes")]);
        assert_eq!(parse_class_path(&join_class_path(&entries)), entries);
    }

    #[test]
    fn test_directory_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("demo")).unwrap();
        std::fs::write(dir.path().join("demo/Person.class"), [0xCA, 0xFE]).unwrap();
        let mut layer = DirClassPath::new(dir.path());
        assert_eq!(layer.open_class("demo.Person").unwrap(), Some(vec![0xCA, 0xFE]));
        assert_eq!(layer.open_class("demo.Missing").unwrap(), None);
    }

    #[test]
    fn test_jar_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("lib.jar");
        {
            let mut writer = zip::ZipWriter::new(File::create(&jar).unwrap());
            writer.start_file("demo/Person.class", FileOptions::default()).unwrap();
            writer.write_all(&[1, 2, 3]).unwrap();
            writer.finish().unwrap();
        }
        let mut layers = open_entries(&[jar, dir.path().join("missing.jar")]);
        assert_eq!(layers[0].open_class("demo.Person").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(layers[0].open_class("demo.Other").unwrap(), None);
        assert_eq!(layers[1].open_class("demo.Person").unwrap(), None);
    }
}
