// ─── Report ───
// Renders the README.md dropped next to the downloaded files. Pure string
// building; the caller writes it to disk.

use std::fmt::Write;

use crate::core::modpack::{ModpackInfo, Summary};

/// Fold the override summary into the download summary. Per-category union,
/// deduplicated by file name.
pub fn merge_summaries(mut downloads: Summary, overrides: Summary) -> Summary {
    for (category, files) in overrides {
        downloads.entry(category).or_default().extend(files);
    }
    downloads
}

/// Render the final report. Categories and file lists come out sorted, so
/// the same run always produces the same text.
pub fn build_report(info: &ModpackInfo, summary: &Summary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Modpack");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Format: {}", info.format);
    let _ = writeln!(out, "- Name: {}", info.name);
    if let Some(description) = &info.description {
        let _ = writeln!(out, "- Description: {description}");
    }
    if let Some(author) = &info.author {
        let _ = writeln!(out, "- Author: {author}");
    }
    if let Some(version) = &info.version {
        let _ = writeln!(out, "- Version: {version}");
    }

    if !info.dependencies.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Dependencies");
        let _ = writeln!(out);
        for dependency in &info.dependencies {
            let _ = writeln!(out, "- {dependency}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Files");
    let _ = writeln!(out);
    for (category, files) in summary {
        if files.is_empty() {
            continue;
        }
        let _ = writeln!(out, "- {category}: {}", files.len());
    }

    for (category, files) in summary {
        if files.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "### {category} ({})", files.len());
        let _ = writeln!(out);
        let _ = writeln!(out, "<details>");
        let _ = writeln!(out, "<summary>Show list</summary>");
        let _ = writeln!(out);
        for file in files {
            let _ = writeln!(out, "- {file}");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "</details>");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::modpack::Category;

    fn sample_info() -> ModpackInfo {
        ModpackInfo {
            format: "CurseForge",
            name: "Example Pack".to_string(),
            author: Some("someone".to_string()),
            version: Some("2.1.0".to_string()),
            description: None,
            dependencies: vec!["minecraft 1.20.1".to_string(), "forge-47.2.0".to_string()],
        }
    }

    fn summary_of(entries: &[(Category, &[&str])]) -> Summary {
        let mut summary = Summary::new();
        for (category, files) in entries {
            summary
                .entry(*category)
                .or_default()
                .extend(files.iter().map(|f| f.to_string()));
        }
        summary
    }

    #[test]
    fn merge_deduplicates_by_file_name() {
        let downloads = summary_of(&[(Category::Mod, &["a.jar"])]);
        let overrides = summary_of(&[(Category::Mod, &["a.jar", "b.jar"])]);

        let merged = merge_summaries(downloads.clone(), overrides.clone());
        assert_eq!(merged.get(&Category::Mod).unwrap().len(), 2);

        // Merging the other way round gives the same result.
        let flipped = merge_summaries(overrides, downloads);
        assert_eq!(merged, flipped);
    }

    #[test]
    fn merge_keeps_categories_from_both_sides() {
        let downloads = summary_of(&[(Category::Mod, &["a.jar"])]);
        let overrides = summary_of(&[(Category::ResourcePack, &["pack.zip"])]);

        let merged = merge_summaries(downloads, overrides);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn report_lists_sorted_files_per_category() {
        let summary = summary_of(&[
            (Category::Mod, &["zeta.jar", "alpha.jar"]),
            (Category::ShaderPack, &["shader.zip"]),
        ]);

        let report = build_report(&sample_info(), &summary);

        assert!(report.starts_with("# Modpack\n"));
        assert!(report.contains("- Format: CurseForge"));
        assert!(report.contains("- Name: Example Pack"));
        // Omitted metadata leaves no empty line behind.
        assert!(!report.contains("- Description:"));
        assert!(report.contains("## Dependencies\n\n- minecraft 1.20.1\n- forge-47.2.0"));
        assert!(report.contains("- Mod: 2"));
        assert!(report.contains("### Mod (2)"));
        assert!(report.contains("<summary>Show list</summary>\n\n- alpha.jar\n- zeta.jar"));
        assert!(report.contains("### ShaderPack (1)"));

        let mod_section = report.find("### Mod").unwrap();
        let shader_section = report.find("### ShaderPack").unwrap();
        assert!(mod_section < shader_section);
    }

    #[test]
    fn report_is_deterministic() {
        let summary = summary_of(&[(Category::Mod, &["b.jar", "a.jar", "c.jar"])]);
        let info = sample_info();
        assert_eq!(build_report(&info, &summary), build_report(&info, &summary));
    }

    #[test]
    fn empty_categories_are_not_rendered() {
        let mut summary = summary_of(&[(Category::Mod, &["a.jar"])]);
        summary.entry(Category::ResourcePack).or_default();

        let report = build_report(&sample_info(), &summary);
        assert!(!report.contains("ResourcePack"));
    }
}
