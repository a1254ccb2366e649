use std::path::Path;

use crate::domain::Source;
use crate::error::{Result, SfDocsError};

/// Read a source list: one URL or path per line. Blank lines and lines
/// starting with `#` are ignored.
pub fn load_source_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SfDocsError::InvalidSource(format!("cannot read source list {}: {e}", path.display()))
    })?;
    Ok(parse_source_list(&content))
}

pub fn parse_source_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Parse every input, dropping duplicates while keeping first-seen order.
/// The first invalid input fails the whole batch.
pub fn resolve_sources<I, T>(inputs: I) -> Result<Vec<Source>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut sources: Vec<Source> = Vec::new();
    for input in inputs {
        let source = Source::parse(input.as_ref())?;
        if !sources.iter().any(|s| s.locator == source.locator) {
            sources.push(source);
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_source_list() {
        let content = "# Apex\nhttps://developer.salesforce.com/docs/a.htm\n\n   \n  # indented comment\n  https://example.com/guide.pdf  \n";
        assert_eq!(
            parse_source_list(content),
            vec![
                "https://developer.salesforce.com/docs/a.htm".to_string(),
                "https://example.com/guide.pdf".to_string(),
            ]
        );
    }

    #[test]
    fn test_load_source_list_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.txt");
        std::fs::write(&path, "https://example.com/a\n#skip\n").unwrap();

        assert_eq!(load_source_list(&path).unwrap(), vec!["https://example.com/a"]);
        assert!(matches!(
            load_source_list(&dir.path().join("missing.txt")),
            Err(SfDocsError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_resolve_sources_dedupes() {
        let sources = resolve_sources([
            "https://example.com/a",
            "https://example.com/guide.pdf",
            "https://example.com/a",
        ])
        .unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].kind, SourceKind::Pdf);
    }

    #[test]
    fn test_resolve_sources_rejects_invalid() {
        assert!(resolve_sources(["https://example.com/a", "/no/such/file.md"]).is_err());
    }
}
