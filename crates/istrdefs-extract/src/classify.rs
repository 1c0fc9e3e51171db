//! Source Classifier
//!
//! Partitions a file list into C and C++ groups so each gets its own flags.

use istrdefs_core::{Language, LanguageGroup, PreprocessorConfig, SourceFile};
use std::path::PathBuf;
use tracing::trace;

/// Sources partitioned by language, order preserved within each group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceGroups {
    pub c: Vec<PathBuf>,
    pub cxx: Vec<PathBuf>,
}

impl SourceGroups {
    pub fn is_empty(&self) -> bool {
        self.c.is_empty() && self.cxx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.c.len() + self.cxx.len()
    }

    /// Attach flag sets, C group first
    pub fn into_language_groups(self, config: &PreprocessorConfig) -> Vec<(Language, LanguageGroup)> {
        vec![
            (
                Language::C,
                LanguageGroup {
                    files: self.c,
                    flags: config.cflags.clone(),
                },
            ),
            (
                Language::Cxx,
                LanguageGroup {
                    files: self.cxx,
                    flags: config.cxxflags.clone(),
                },
            ),
        ]
    }
}

/// Classify paths by extension; anything that is not C or C++ is dropped
pub fn classify<I, P>(paths: I) -> SourceGroups
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut groups = SourceGroups::default();

    for path in paths {
        let path = path.into();
        match SourceFile::classify(path.clone()) {
            Some(SourceFile { path, language: Language::C }) => groups.c.push(path),
            Some(SourceFile { path, language: Language::Cxx }) => groups.cxx.push(path),
            None => trace!("Skipping non-C/C++ source {:?}", path),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_mixed() {
        let groups = classify(["main.c", "a.cpp", "b.h", "c.cc", "d.c", "README", "e.C"]);

        assert_eq!(groups.c, vec![PathBuf::from("main.c"), PathBuf::from("d.c")]);
        assert_eq!(
            groups.cxx,
            vec![PathBuf::from("a.cpp"), PathBuf::from("c.cc"), PathBuf::from("e.C")]
        );
        assert_eq!(groups.len(), 5);
    }

    #[test]
    fn test_classify_empty() {
        let groups = classify(Vec::<PathBuf>::new());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_language_groups_order_and_flags() {
        let config = PreprocessorConfig {
            cflags: vec!["-std=c99".into()],
            cxxflags: vec!["-std=c++17".into()],
            ..Default::default()
        };
        let groups = classify(["x.cpp", "y.c"]).into_language_groups(&config);

        assert_eq!(groups[0].0, Language::C);
        assert_eq!(groups[0].1.files, vec![PathBuf::from("y.c")]);
        assert_eq!(groups[0].1.flags, vec!["-std=c99".to_string()]);
        assert_eq!(groups[1].0, Language::Cxx);
        assert_eq!(groups[1].1.flags, vec!["-std=c++17".to_string()]);
    }
}
