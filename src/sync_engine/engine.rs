use crate::error::{Result, SyncError};
use crate::sync_engine::filesystem::FileSystem;
use crate::sync_engine::types::{ProgressEvent, SyncConfiguration, SyncDefinition, SyncResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Mirrors configured source directories into their destinations.
pub struct SyncEngine<F> {
    fs: F,
}

impl<F: FileSystem> SyncEngine<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Process every definition in order, expanding sub-folders depth-first.
    ///
    /// An empty definition slot aborts before any filesystem work or sink
    /// call. Per-pair problems are recorded in that pair's result instead.
    pub async fn run<S>(
        &self,
        configuration: &SyncConfiguration,
        mut sink: S,
    ) -> Result<Vec<SyncResult>>
    where
        S: FnMut(&ProgressEvent),
    {
        let definitions = configuration
            .definitions
            .iter()
            .enumerate()
            .map(|(index, slot)| slot.as_ref().ok_or(SyncError::MissingDefinition { index }))
            .collect::<Result<Vec<_>>>()?;

        let mut results = Vec::new();
        for definition in definitions {
            // Every pair synthesized from this definition lands under this root.
            let root_destination = definition.destination_directory.as_deref().map(PathBuf::from);

            let mut pending = vec![definition.clone()];
            while let Some(next) = pending.pop() {
                let children = self
                    .sync_definition(&next, root_destination.as_deref(), &mut sink, &mut results)
                    .await;
                // Reversed so the first child is expanded next (pre-order).
                pending.extend(children.into_iter().rev());
            }
        }
        Ok(results)
    }

    /// Sync one pair, record its result, and return the child pairs to expand.
    async fn sync_definition<S>(
        &self,
        definition: &SyncDefinition,
        root_destination: Option<&Path>,
        sink: &mut S,
        results: &mut Vec<SyncResult>,
    ) -> Vec<SyncDefinition>
    where
        S: FnMut(&ProgressEvent),
    {
        let source = match definition.source_directory.as_deref() {
            Some(source) if self.fs.exists(Path::new(source)).await => source,
            _ => {
                results.push(SyncResult::source_not_found(
                    definition.source_directory.as_deref().unwrap_or_default(),
                    definition.destination_directory.as_deref().unwrap_or_default(),
                ));
                return Vec::new();
            }
        };

        let (Some(destination), Some(root_destination)) =
            (definition.destination_directory.as_deref(), root_destination)
        else {
            let err = SyncError::NullArgument("destinationDirectory");
            results.push(SyncResult::failed(source, "", 0, err.to_string()));
            return Vec::new();
        };

        let mut synced_count = 0;
        let sub_directories = match self
            .mirror(definition, source, destination, root_destination, sink, &mut synced_count)
            .await
        {
            Ok(sub_directories) => {
                results.push(SyncResult::completed(source, destination, synced_count));
                sub_directories
            }
            Err(err) => {
                results.push(SyncResult::failed(
                    source,
                    destination,
                    synced_count,
                    err.to_string(),
                ));
                return Vec::new();
            }
        };

        sub_directories
            .iter()
            .filter_map(|dir| dir.file_name())
            .map(|name| definition.child(source, destination, &name.to_string_lossy()))
            .collect()
    }

    /// Copy pass, then the optional delete pass, for one pair.
    ///
    /// Returns the source sub-directories to recurse into; empty unless the
    /// definition includes sub-folders.
    async fn mirror<S>(
        &self,
        definition: &SyncDefinition,
        source: &str,
        destination: &str,
        root_destination: &Path,
        sink: &mut S,
        synced_count: &mut usize,
    ) -> Result<Vec<PathBuf>>
    where
        S: FnMut(&ProgressEvent),
    {
        let source_dir = Path::new(source);
        let destination_dir = Path::new(destination);

        if !self.fs.exists(destination_dir).await {
            self.fs.create_directory(destination_dir).await?;
        }

        let source_files = self.fs.list_files(source_dir)?;
        let existing_names = self.fs.list_file_names_recursive(destination_dir)?;

        for file in &source_files {
            let Some(name) = file.file_name() else {
                continue;
            };
            if existing_names.contains(&*name.to_string_lossy()) {
                continue;
            }

            let target = destination_dir.join(name);
            if self.fs.copy_file(file, &target).await? {
                sink(&ProgressEvent::Copied {
                    source: file.clone(),
                    destination: target,
                });
                *synced_count += 1;
            }
        }

        if definition.delete_assets_not_in_source {
            let source_names: HashSet<_> = source_files
                .iter()
                .filter_map(|file| file.file_name())
                .collect();

            for file in self.fs.list_files(destination_dir)? {
                let orphaned = file
                    .file_name()
                    .is_some_and(|name| !source_names.contains(name));
                if orphaned {
                    self.fs.delete_file(&file).await?;
                    sink(&ProgressEvent::Deleted { path: file });
                    *synced_count += 1;
                }
            }
        }

        if !definition.include_sub_folders {
            return Ok(Vec::new());
        }

        // A source folder that holds the destination would be mirrored into itself.
        Ok(self
            .fs
            .list_directories(source_dir)?
            .into_iter()
            .filter(|dir| !root_destination.starts_with(dir))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync_engine::filesystem::LocalFileSystem;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    fn write_files(dir: &Path, names: &[&str]) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        for name in names {
            fs::write(dir.join(name), name.as_bytes())?;
        }
        Ok(())
    }

    async fn run_collect(
        engine: &SyncEngine<LocalFileSystem>,
        config: &SyncConfiguration,
    ) -> (Result<Vec<SyncResult>>, Vec<String>) {
        let mut events = Vec::new();
        let results = engine
            .run(config, |event| events.push(event.to_string()))
            .await;
        (results, events)
    }

    #[tokio::test]
    async fn test_copies_all_files_into_empty_destination() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let destination = TempDir::new()?;
        write_files(source.path(), &["1.jpg", "2.jpg", "3.jpg", "4.jpg"])?;

        let src = path_str(source.path());
        let dst = path_str(destination.path());
        let config = SyncConfiguration::from(vec![SyncDefinition::new(&src, &dst)]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, events) = run_collect(&engine, &config).await;
        let results = results?;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].synced_count, 4);
        assert_eq!(
            results[0].message,
            format!("4 images synced from '{src}' to '{dst}'.")
        );

        let expected: Vec<String> = ["1.jpg", "2.jpg", "3.jpg", "4.jpg"]
            .iter()
            .map(|name| {
                format!(
                    "'{}' => '{}'",
                    source.path().join(name).display(),
                    destination.path().join(name).display()
                )
            })
            .collect();
        assert_eq!(events, expected);
        assert!(destination.path().join("4.jpg").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_copies_precede_deletions() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let destination = TempDir::new()?;
        write_files(source.path(), &["new1.jpg", "new2.jpg", "new3.jpg", "new4.jpg"])?;
        write_files(destination.path(), &["old1.jpg", "old2.jpg", "old3.jpg", "old4.jpg"])?;

        let config = SyncConfiguration::from(vec![SyncDefinition::new(
            path_str(source.path()),
            path_str(destination.path()),
        )
        .delete_assets_not_in_source(true)]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, events) = run_collect(&engine, &config).await;
        let results = results?;

        assert_eq!(results[0].synced_count, 8);
        assert_eq!(events.len(), 8);
        assert!(events[..4].iter().all(|e| e.contains("' => '")));
        assert!(events[4..].iter().all(|e| e.starts_with("Deleted '")));
        assert!(!destination.path().join("old1.jpg").exists());
        assert!(destination.path().join("new1.jpg").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_skips_names_present_anywhere_in_destination_tree() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let destination = TempDir::new()?;
        write_files(source.path(), &["a.jpg", "b.jpg", "c.jpg"])?;
        write_files(destination.path(), &["a.jpg"])?;
        write_files(&destination.path().join("2024/summer"), &["b.jpg"])?;

        let config = SyncConfiguration::from(vec![SyncDefinition::new(
            path_str(source.path()),
            path_str(destination.path()),
        )]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, events) = run_collect(&engine, &config).await;
        let results = results?;

        assert_eq!(results[0].synced_count, 1);
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("c.jpg"));
        assert!(!destination.path().join("b.jpg").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_recursion_is_depth_first_pre_order() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let source = root.path().join("A");
        let destination = root.path().join("dest");
        write_files(&source, &["a1.jpg"])?;
        write_files(&source.join("B"), &["b1.jpg"])?;
        write_files(&source.join("B").join("C"), &["c1.jpg"])?;
        write_files(&source.join("D"), &["d1.jpg"])?;

        let config = SyncConfiguration::from(vec![SyncDefinition::new(
            path_str(&source),
            path_str(&destination),
        )
        .include_sub_folders(true)]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, events) = run_collect(&engine, &config).await;
        let results = results?;

        let pairs: Vec<_> = results
            .iter()
            .map(|r| (r.source_directory.clone(), r.destination_directory.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (path_str(&source), path_str(&destination)),
                (path_str(&source.join("B")), path_str(&destination.join("B"))),
                (
                    path_str(&source.join("B").join("C")),
                    path_str(&destination.join("B").join("C"))
                ),
                (path_str(&source.join("D")), path_str(&destination.join("D"))),
            ]
        );
        assert!(results.iter().all(|r| r.synced_count == 1));

        let order: Vec<_> = ["a1.jpg", "b1.jpg", "c1.jpg", "d1.jpg"]
            .iter()
            .map(|name| events.iter().position(|e| e.contains(name)).unwrap())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert!(destination.join("B").join("C").join("c1.jpg").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_sub_folders_ignored_without_flag() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let source = root.path().join("src");
        write_files(&source.join("nested"), &["n.jpg"])?;

        let config = SyncConfiguration::from(vec![SyncDefinition::new(
            path_str(&source),
            path_str(&root.path().join("dst")),
        )]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, events) = run_collect(&engine, &config).await;
        let results = results?;

        assert_eq!(results.len(), 1);
        assert!(results[0].message.starts_with("No images synced"));
        assert!(events.is_empty());
        assert!(root.path().join("dst").is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_source_is_recorded() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let missing = path_str(&root.path().join("nope"));
        let config = SyncConfiguration::from(vec![
            SyncDefinition::new(&missing, path_str(&root.path().join("dst"))),
            SyncDefinition {
                source_directory: None,
                destination_directory: Some(path_str(root.path())),
                ..Default::default()
            },
        ]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, events) = run_collect(&engine, &config).await;
        let results = results?;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].synced_count, 0);
        assert_eq!(
            results[0].message,
            format!("Source directory '{missing}' not found.")
        );
        assert_eq!(results[1].message, "Source directory '' not found.");
        assert!(events.is_empty());
        assert!(!root.path().join("dst").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_null_destination_is_soft_failure() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        write_files(source.path(), &["x.jpg"])?;
        let other = TempDir::new()?;
        write_files(other.path(), &["y.jpg"])?;
        let target = TempDir::new()?;

        let config = SyncConfiguration::from(vec![
            SyncDefinition {
                source_directory: Some(path_str(source.path())),
                destination_directory: None,
                ..Default::default()
            },
            SyncDefinition::new(path_str(other.path()), path_str(target.path())),
        ]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, events) = run_collect(&engine, &config).await;
        let results = results?;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].synced_count, 0);
        assert_eq!(
            results[0].message,
            SyncError::NullArgument("destinationDirectory").to_string()
        );
        assert_eq!(results[1].synced_count, 1);
        assert_eq!(events.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_slot_aborts_run() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let destination = TempDir::new()?;
        write_files(source.path(), &["x.jpg"])?;

        let mut config = SyncConfiguration::from(vec![SyncDefinition::new(
            path_str(source.path()),
            path_str(destination.path()),
        )]);
        config.definitions.push(None);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, events) = run_collect(&engine, &config).await;

        assert!(matches!(
            results,
            Err(SyncError::MissingDefinition { index: 1 })
        ));
        assert!(events.is_empty());
        assert!(!destination.path().join("x.jpg").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_destination_inside_source_is_not_recursed() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        write_files(source.path(), &["p.jpg"])?;
        let destination = source.path().join("backup");

        let config = SyncConfiguration::from(vec![SyncDefinition::new(
            path_str(source.path()),
            path_str(&destination),
        )
        .include_sub_folders(true)]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, _) = run_collect(&engine, &config).await;
        let results = results?;

        assert_eq!(results.len(), 1);
        assert!(destination.join("p.jpg").exists());
        assert!(!destination.join("backup").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_destination_nested_below_source_is_not_recursed() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        write_files(source.path(), &["p.jpg"])?;
        write_files(&source.path().join("other"), &["o.jpg"])?;
        let destination = source.path().join("backup").join("inner");

        let config = SyncConfiguration::from(vec![SyncDefinition::new(
            path_str(source.path()),
            path_str(&destination),
        )
        .include_sub_folders(true)]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, _) = run_collect(&engine, &config).await;
        let results = results?;

        let pairs: Vec<_> = results
            .iter()
            .map(|r| (r.source_directory.clone(), r.destination_directory.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (path_str(source.path()), path_str(&destination)),
                (
                    path_str(&source.path().join("other")),
                    path_str(&destination.join("other"))
                ),
            ]
        );
        assert!(destination.join("other").join("o.jpg").exists());
        assert!(!destination.join("backup").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_pass_only_touches_destination_root() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let destination = TempDir::new()?;
        write_files(source.path(), &["a.jpg"])?;
        write_files(destination.path(), &["stale.jpg"])?;
        write_files(&destination.path().join("sub"), &["orphan.jpg"])?;

        let config = SyncConfiguration::from(vec![SyncDefinition::new(
            path_str(source.path()),
            path_str(destination.path()),
        )
        .delete_assets_not_in_source(true)]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, events) = run_collect(&engine, &config).await;
        let results = results?;

        assert_eq!(results[0].synced_count, 2);
        assert_eq!(
            events.last().map(String::as_str),
            Some(format!("Deleted '{}'", destination.path().join("stale.jpg").display()).as_str())
        );
        assert!(destination.path().join("a.jpg").exists());
        assert!(!destination.path().join("stale.jpg").exists());
        assert!(destination.path().join("sub").join("orphan.jpg").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_child_pairs_inherit_delete_flag() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let destination = TempDir::new()?;
        write_files(source.path(), &["top.jpg"])?;
        write_files(&source.path().join("sub"), &["child.jpg"])?;
        write_files(&destination.path().join("sub"), &["stale.jpg"])?;

        let config = SyncConfiguration::from(vec![SyncDefinition::new(
            path_str(source.path()),
            path_str(destination.path()),
        )
        .include_sub_folders(true)
        .delete_assets_not_in_source(true)]);

        let engine = SyncEngine::new(LocalFileSystem::new());
        let (results, events) = run_collect(&engine, &config).await;
        let results = results?;

        let copied = |dir: &Path, name: &str| {
            format!(
                "'{}' => '{}'",
                source.path().join(dir).join(name).display(),
                destination.path().join(dir).join(name).display()
            )
        };
        assert_eq!(
            events,
            vec![
                copied(Path::new(""), "top.jpg"),
                copied(Path::new("sub"), "child.jpg"),
                format!(
                    "Deleted '{}'",
                    destination.path().join("sub").join("stale.jpg").display()
                ),
            ]
        );
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].synced_count, 1);
        assert_eq!(results[1].synced_count, 2);
        assert!(!destination.path().join("sub").join("stale.jpg").exists());
        Ok(())
    }

    /// In-memory filesystem whose copies of configured names fail.
    #[derive(Default)]
    struct ScriptedFileSystem {
        dirs: Mutex<HashMap<PathBuf, Vec<String>>>,
        failing_copies: HashSet<String>,
    }

    impl ScriptedFileSystem {
        fn with_dir(self, dir: &str, files: &[&str]) -> Self {
            self.dirs.lock().unwrap().insert(
                PathBuf::from(dir),
                files.iter().map(|f| f.to_string()).collect(),
            );
            self
        }
    }

    impl FileSystem for ScriptedFileSystem {
        async fn exists(&self, path: &Path) -> bool {
            self.dirs.lock().unwrap().contains_key(path)
        }

        fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
            Ok(self
                .dirs
                .lock()
                .unwrap()
                .get(dir)
                .map(|files| files.iter().map(|f| dir.join(f)).collect())
                .unwrap_or_default())
        }

        fn list_directories(&self, _dir: &Path) -> io::Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }

        fn list_file_names_recursive(&self, dir: &Path) -> io::Result<HashSet<String>> {
            Ok(self
                .dirs
                .lock()
                .unwrap()
                .get(dir)
                .map(|files| files.iter().cloned().collect())
                .unwrap_or_default())
        }

        async fn create_directory(&self, path: &Path) -> io::Result<()> {
            self.dirs
                .lock()
                .unwrap()
                .entry(path.to_path_buf())
                .or_default();
            Ok(())
        }

        async fn copy_file(&self, source: &Path, destination: &Path) -> io::Result<bool> {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.failing_copies.contains(&name) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"));
            }
            if let (Some(parent), Some(name)) = (destination.parent(), destination.file_name()) {
                self.dirs
                    .lock()
                    .unwrap()
                    .entry(parent.to_path_buf())
                    .or_default()
                    .push(name.to_string_lossy().into_owned());
            }
            Ok(true)
        }

        async fn delete_file(&self, path: &Path) -> io::Result<()> {
            if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
                let name = name.to_string_lossy().into_owned();
                if let Some(files) = self.dirs.lock().unwrap().get_mut(parent) {
                    files.retain(|f| *f != name);
                }
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_filesystem_error_is_recorded_and_run_continues() {
        let fs = ScriptedFileSystem {
            failing_copies: ["bad.jpg".to_string()].into_iter().collect(),
            ..Default::default()
        }
        .with_dir("/src1", &["good.jpg", "bad.jpg", "later.jpg"])
        .with_dir("/src2", &["other.jpg"]);

        let config = SyncConfiguration::from(vec![
            SyncDefinition::new("/src1", "/dst1"),
            SyncDefinition::new("/src2", "/dst2"),
        ]);

        let engine = SyncEngine::new(fs);
        let mut events = Vec::new();
        let results = engine
            .run(&config, |event| events.push(event.to_string()))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].synced_count, 1);
        assert!(results[0].message.contains("access denied"));
        assert_eq!(results[1].synced_count, 1);
        assert_eq!(events.len(), 2);
    }
}
