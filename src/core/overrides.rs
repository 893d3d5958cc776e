// ─── Override applier ───
// Files the pack bundles directly instead of fetching. Everything under the
// manifest's overrides root is extracted verbatim into the output tree;
// entries landing in a category folder are recorded for the report, the
// rest are extracted without being recorded.

use std::path::{Component, Path};

use tracing::{info, warn};

use crate::core::error::{FetchError, FetchResult};
use crate::core::modpack::{Category, PackArchive, Summary};

/// Extract every entry under `root` into `output`, overwriting existing
/// files. A single bad entry is logged and skipped, never fatal.
pub fn apply_overrides(
    archive: &mut PackArchive,
    root: &str,
    output: &Path,
) -> FetchResult<Summary> {
    let prefix = format!("{root}/");
    let mut summary = Summary::new();
    let mut extracted = 0usize;

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("override entry {index}: unreadable ({err})");
                continue;
            }
        };

        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let Some(relative) = name.strip_prefix(&prefix) else {
            continue;
        };
        if relative.is_empty() {
            continue;
        }

        if entry.enclosed_name().is_none() {
            warn!("{name}: refusing to extract outside the output tree");
            continue;
        }
        // The destination is joined from the stripped name, so the stripped
        // name is what must stay inside the tree. `overrides/../x` encloses
        // itself while its stripped `../x` escapes.
        if Path::new(relative)
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            warn!("{name}: refusing to extract outside the output tree");
            continue;
        }

        let dest = output.join(relative);
        let Some(file_name) = dest.file_name().map(|n| n.to_string_lossy().to_string()) else {
            warn!("{name}: no file name, skipping");
            continue;
        };

        if let Err(err) = extract_entry(&mut entry, &dest) {
            warn!("{name}: extraction failed ({err}), skipping");
            continue;
        }
        extracted += 1;
        info!("Extracted {name}");

        // Recorded only after the bytes actually landed.
        let category = Category::from_path(relative);
        if category != Category::Unknown {
            summary.entry(category).or_default().insert(file_name);
        }
    }

    info!("Applied {extracted} overrides");
    Ok(summary)
}

fn extract_entry<R: std::io::Read>(entry: &mut R, dest: &Path) -> FetchResult<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|source| FetchError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut out = std::fs::File::create(dest).map_err(|source| FetchError::Io {
        path: dest.to_path_buf(),
        source,
    })?;
    std::io::copy(entry, &mut out).map_err(|source| FetchError::Io {
        path: dest.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::modpack::open_archive;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn archive_of(entries: &[(&str, &str)]) -> PackArchive {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        let cursor = writer.finish().unwrap();
        open_archive(cursor.into_inner()).unwrap()
    }

    #[test]
    fn extracts_under_the_output_tree_and_records_known_categories() {
        let mut archive = archive_of(&[
            ("overrides/mods/foo.jar", "jar bytes"),
            ("overrides/config/x.toml", "x = 1"),
            ("overrides/options.txt", "fov:90"),
            ("manifest.json", "{}"),
        ]);
        let temp = tempfile::tempdir().unwrap();

        let summary = apply_overrides(&mut archive, "overrides", temp.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(temp.path().join("mods/foo.jar")).unwrap(),
            "jar bytes"
        );
        assert_eq!(
            std::fs::read_to_string(temp.path().join("config/x.toml")).unwrap(),
            "x = 1"
        );
        assert!(temp.path().join("options.txt").exists());
        // Entries outside the overrides root stay in the archive.
        assert!(!temp.path().join("manifest.json").exists());

        // Only the category folder entry is recorded.
        assert_eq!(summary.len(), 1);
        let mods = summary.get(&Category::Mod).unwrap();
        assert!(mods.contains("foo.jar"));
        assert!(!summary.contains_key(&Category::Unknown));
    }

    #[test]
    fn overwrites_existing_files() {
        let mut archive = archive_of(&[("overrides/mods/foo.jar", "new bytes")]);
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("mods")).unwrap();
        std::fs::write(temp.path().join("mods/foo.jar"), "old bytes").unwrap();

        apply_overrides(&mut archive, "overrides", temp.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(temp.path().join("mods/foo.jar")).unwrap(),
            "new bytes"
        );
    }

    #[test]
    fn traversal_entries_are_skipped() {
        let mut archive = archive_of(&[
            ("overrides/../evil.txt", "nope"),
            ("overrides/cfg/../../evil2.txt", "nope"),
            ("overrides/mods/good.jar", "ok"),
        ]);
        let temp = tempfile::tempdir().unwrap();
        let output = temp.path().join("out");
        std::fs::create_dir_all(&output).unwrap();

        let summary = apply_overrides(&mut archive, "overrides", &output).unwrap();

        // Neither escape lands next to the output directory, or inside it.
        assert!(!temp.path().join("evil.txt").exists());
        assert!(!temp.path().join("evil2.txt").exists());
        assert!(!output.join("evil.txt").exists());
        assert!(output.join("mods/good.jar").exists());
        assert_eq!(summary.get(&Category::Mod).unwrap().len(), 1);
    }

    #[test]
    fn directory_entries_are_ignored() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.add_directory("overrides/mods", options).unwrap();
        writer.start_file("overrides/mods/a.jar", options).unwrap();
        writer.write_all(b"a").unwrap();
        let mut archive = open_archive(writer.finish().unwrap().into_inner()).unwrap();

        let temp = tempfile::tempdir().unwrap();
        let summary = apply_overrides(&mut archive, "overrides", temp.path()).unwrap();

        assert_eq!(summary.get(&Category::Mod).unwrap().len(), 1);
    }

    #[test]
    fn respects_a_custom_overrides_root() {
        let mut archive = archive_of(&[
            ("Overrides2/mods/a.jar", "a"),
            ("overrides/mods/b.jar", "b"),
        ]);
        let temp = tempfile::tempdir().unwrap();

        let summary = apply_overrides(&mut archive, "Overrides2", temp.path()).unwrap();

        assert!(temp.path().join("mods/a.jar").exists());
        assert!(!temp.path().join("mods/b.jar").exists());
        assert_eq!(summary.get(&Category::Mod).unwrap().len(), 1);
    }
}
