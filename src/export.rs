use std::{
    fs::{File, OpenOptions},
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use crate::error::{Error, Result};

/// How a source path maps to a file under the destination directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportLayout {
    /// `dest/<file name>`. Sources sharing a file name collide.
    #[default]
    Flat,
    /// `dest/<source path without root or parent components>`.
    Mirrored,
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub dest: PathBuf,
    /// Overwrite files already present at the destination.
    pub force: bool,
    pub layout: ExportLayout,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    /// Destination paths written.
    pub exported: Vec<PathBuf>,
    /// Sources that could not be exported.
    pub failed: Vec<PathBuf>,
}

/// Create the destination directory (and parents) if needed.
///
/// An existing path that is not a directory is rejected.
pub fn prepare_destination(dest: &Path) -> Result<()> {
    if dest.exists() && !dest.is_dir() {
        return Err(Error::NotADirectory(dest.to_path_buf()));
    }
    std::fs::create_dir_all(dest)?;
    if !dest.is_dir() {
        return Err(Error::NotADirectory(dest.to_path_buf()));
    }
    Ok(())
}

/// Compute where `source` lands under `dest`.
pub fn destination_for(
    source: &Path,
    dest: &Path,
    layout: ExportLayout,
) -> Result<PathBuf> {
    match layout {
        ExportLayout::Flat => source
            .file_name()
            .map(|name| dest.join(name))
            .ok_or_else(|| Error::NoFileName(source.to_path_buf())),
        ExportLayout::Mirrored => {
            let relative: PathBuf = source
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part),
                    _ => None,
                })
                .collect();
            if relative.as_os_str().is_empty() {
                return Err(Error::NoFileName(source.to_path_buf()));
            }
            Ok(dest.join(relative))
        }
    }
}

/// Copy `source` to `target` and sync it to disk.
///
/// Without `force` an existing target is left untouched and reported as
/// [`Error::DestinationExists`]. With `force` it is truncated and rewritten.
/// The source is only ever read.
pub fn export_file(source: &Path, target: &Path, force: bool) -> Result<()> {
    if !force && target.symlink_metadata().is_ok() {
        return Err(Error::DestinationExists(target.to_path_buf()));
    }

    let mut src = File::open(source)?;

    if let (Ok(a), Ok(b)) = (source.canonicalize(), target.canonicalize())
        && a == b
    {
        return Err(Error::SameFile(target.to_path_buf()));
    }

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        // Also guards against a file appearing after the check above.
        options.create_new(true);
    }
    let mut dst = options.open(target).map_err(|e| {
        if e.kind() == ErrorKind::AlreadyExists {
            Error::DestinationExists(target.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;

    std::io::copy(&mut src, &mut dst)?;
    dst.sync_all()?;
    Ok(())
}

/// Export every source into the requested destination.
///
/// Only destination problems abort the batch; a failing item is logged and
/// the rest still run.
pub fn export_all<S: AsRef<Path>>(
    sources: &[S],
    request: &ExportRequest,
) -> Result<ExportReport> {
    prepare_destination(&request.dest)?;

    let mut report = ExportReport::default();
    for source in sources {
        let source = source.as_ref();
        let outcome = destination_for(source, &request.dest, request.layout)
            .and_then(|target| {
                export_file(source, &target, request.force).map(|()| target)
            });
        match outcome {
            Ok(target) => {
                tracing::debug!(
                    from = %source.display(),
                    to = %target.display(),
                    "exported"
                );
                report.exported.push(target);
            }
            Err(e) => {
                tracing::warn!("Export error: {e}");
                report.failed.push(source.to_path_buf());
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(
        dest: &Path,
        force: bool,
        layout: ExportLayout,
    ) -> ExportRequest {
        ExportRequest {
            dest: dest.to_path_buf(),
            force,
            layout,
        }
    }

    #[test]
    fn copies_into_new_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.yaml");
        std::fs::write(&src, "name: alpha\n").unwrap();
        let dest = tmp.path().join("out").join("nested");

        let report =
            export_all(&[&src], &request(&dest, false, ExportLayout::Flat))
                .unwrap();

        assert_eq!(report.exported, vec![dest.join("a.yaml")]);
        assert!(report.failed.is_empty());
        assert_eq!(
            std::fs::read(dest.join("a.yaml")).unwrap(),
            b"name: alpha\n"
        );
    }

    #[test]
    fn existing_file_is_kept_without_force() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.yaml");
        std::fs::write(&src, "new").unwrap();
        let dest = tmp.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("a.yaml"), "old").unwrap();

        let err = export_file(&src, &dest.join("a.yaml"), false).unwrap_err();
        assert!(matches!(err, Error::DestinationExists(_)));
        let kept = || std::fs::read_to_string(dest.join("a.yaml")).unwrap();
        assert_eq!(kept(), "old");

        let report =
            export_all(&[&src], &request(&dest, false, ExportLayout::Flat))
                .unwrap();
        assert!(report.exported.is_empty());
        assert_eq!(report.failed, vec![src.clone()]);
        assert_eq!(kept(), "old");
    }

    #[test]
    fn force_overwrites_with_source_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.yaml");
        std::fs::write(&src, "short").unwrap();
        let dest = tmp.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("a.yaml"), "a much longer old body").unwrap();

        let report =
            export_all(&[&src], &request(&dest, true, ExportLayout::Flat))
                .unwrap();

        assert_eq!(report.exported.len(), 1);
        assert_eq!(
            std::fs::read(dest.join("a.yaml")).unwrap(),
            std::fs::read(&src).unwrap()
        );
    }

    #[test]
    fn destination_that_is_a_file_aborts() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.yaml");
        std::fs::write(&src, "a: 1").unwrap();
        let dest = tmp.path().join("out");
        std::fs::write(&dest, "i am a file").unwrap();

        let err = export_all(&[&src], &request(&dest, true, ExportLayout::Flat))
            .unwrap_err();
        assert!(matches!(err, Error::NotADirectory(_)));
    }

    #[test]
    fn missing_source_fails_item_and_batch_continues() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.yaml");
        let present = tmp.path().join("present.yaml");
        std::fs::write(&present, "p: 1").unwrap();
        let dest = tmp.path().join("out");

        let report = export_all(
            &[&missing, &present],
            &request(&dest, false, ExportLayout::Flat),
        )
        .unwrap();

        assert_eq!(report.failed, vec![missing]);
        assert_eq!(report.exported, vec![dest.join("present.yaml")]);
        assert!(!dest.join("missing.yaml").exists());
    }

    #[test]
    fn flat_layout_collides_on_shared_names() {
        let tmp = tempfile::tempdir().unwrap();
        let one = tmp.path().join("one").join("app.yaml");
        let two = tmp.path().join("two").join("app.yaml");
        std::fs::create_dir_all(one.parent().unwrap()).unwrap();
        std::fs::create_dir_all(two.parent().unwrap()).unwrap();
        std::fs::write(&one, "from: one").unwrap();
        std::fs::write(&two, "from: two").unwrap();
        let dest = tmp.path().join("out");

        let report = export_all(
            &[&one, &two],
            &request(&dest, false, ExportLayout::Flat),
        )
        .unwrap();
        assert_eq!(report.exported.len(), 1);
        assert_eq!(report.failed, vec![two.clone()]);
        assert_eq!(
            std::fs::read_to_string(dest.join("app.yaml")).unwrap(),
            "from: one"
        );

        let report =
            export_all(&[&one, &two], &request(&dest, true, ExportLayout::Flat))
                .unwrap();
        assert_eq!(report.exported.len(), 2);
        assert_eq!(
            std::fs::read_to_string(dest.join("app.yaml")).unwrap(),
            "from: two"
        );
    }

    #[test]
    fn mirrored_layout_keeps_both() {
        let one = Path::new("data/one/app.yaml");
        let two = Path::new("/abs/data/two/app.yaml");
        let up = Path::new("../x/app.yaml");
        let dest = Path::new("out");

        assert_eq!(
            destination_for(one, dest, ExportLayout::Mirrored).unwrap(),
            Path::new("out/data/one/app.yaml")
        );
        assert_eq!(
            destination_for(two, dest, ExportLayout::Mirrored).unwrap(),
            Path::new("out/abs/data/two/app.yaml")
        );
        assert_eq!(
            destination_for(up, dest, ExportLayout::Mirrored).unwrap(),
            Path::new("out/x/app.yaml")
        );
        assert_eq!(
            destination_for(one, dest, ExportLayout::Flat).unwrap(),
            Path::new("out/app.yaml")
        );
    }

    #[test]
    fn mirrored_export_writes_nested_files() {
        let tmp = tempfile::tempdir().unwrap();
        let one = tmp.path().join("one").join("app.yaml");
        let two = tmp.path().join("two").join("app.yaml");
        std::fs::create_dir_all(one.parent().unwrap()).unwrap();
        std::fs::create_dir_all(two.parent().unwrap()).unwrap();
        std::fs::write(&one, "from: one").unwrap();
        std::fs::write(&two, "from: two").unwrap();
        let dest = tmp.path().join("out");

        let report = export_all(
            &[&one, &two],
            &request(&dest, false, ExportLayout::Mirrored),
        )
        .unwrap();

        assert_eq!(report.exported.len(), 2);
        assert!(report.failed.is_empty());
        for target in &report.exported {
            assert!(target.starts_with(&dest));
            assert!(target.is_file());
        }
    }

    #[test]
    fn source_without_file_name_is_rejected() {
        let dest = Path::new("out");

        let err = destination_for(Path::new(".."), dest, ExportLayout::Flat)
            .unwrap_err();
        assert!(matches!(err, Error::NoFileName(_)));

        let err = destination_for(Path::new("/"), dest, ExportLayout::Mirrored)
            .unwrap_err();
        assert!(matches!(err, Error::NoFileName(_)));
    }

    #[test]
    fn force_refuses_to_overwrite_source() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.yaml");
        std::fs::write(&src, "keep me").unwrap();

        let err = export_file(&src, &src, true).unwrap_err();
        assert!(matches!(err, Error::SameFile(_)));
        assert_eq!(std::fs::read_to_string(&src).unwrap(), "keep me");
    }
}
