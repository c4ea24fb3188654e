use std::path::{Path, PathBuf};

use config::{Config, FileFormat};
use serde::Deserialize;
use thiserror::Error;

const HOST_SUFFIX: &str = "netlify.app";
const PAGE_DIR: &str = "students";

#[derive(Debug, Error)]
pub enum SectionTableError {
    #[error("failed to read sections table {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },
    #[error("sections table has no entries")]
    Empty,
    #[error("section {section:?}: start {start} is greater than end {end}")]
    Inverted { section: String, start: i64, end: i64 },
    #[error("section {section:?} has an empty label or prefix")]
    Blank { section: String },
    #[error("sections {first:?} and {second:?} overlap")]
    Overlap { first: String, second: String },
}

/// One inclusive roll range and where its pages are published.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionRule {
    pub start: i64,
    pub end: i64,
    pub section: String,
    pub prefix: String,
}

impl SectionRule {
    fn new(start: i64, end: i64, section: &str, prefix: &str) -> Self {
        SectionRule {
            start,
            end,
            section: section.to_string(),
            prefix: prefix.to_string(),
        }
    }

    pub fn contains(&self, roll: i64) -> bool {
        (self.start..=self.end).contains(&roll)
    }

    /// Public URL of a profile page, e.g. `https://ulabhsc26bsec.netlify.app/students/119.html`.
    pub fn page_url(&self, file_name: &str) -> String {
        format!("https://{}.{}/{}/{}", self.prefix, HOST_SUFFIX, PAGE_DIR, file_name)
    }
}

/// Ordered range table mapping a roll number to its section.
///
/// On disk the table is TOML:
///
/// ```toml
/// [[section]]
/// start = 1
/// end = 99
/// section = "Section A"
/// prefix = "ulabhsc26asec"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionTable {
    #[serde(rename = "section")]
    rules: Vec<SectionRule>,
}

impl Default for SectionTable {
    fn default() -> Self {
        SectionTable {
            rules: vec![
                SectionRule::new(1, 99, "Section A", "ulabhsc26asec"),
                SectionRule::new(101, 199, "Section B", "ulabhsc26bsec"),
                SectionRule::new(301, 399, "Section H", "ulabhsc26hsec"),
            ],
        }
    }
}

impl SectionTable {
    pub fn new(rules: Vec<SectionRule>) -> Result<Self, SectionTableError> {
        let table = SectionTable { rules };
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, SectionTableError> {
        let load_err = |source| SectionTableError::Load {
            path: path.to_path_buf(),
            source,
        };
        let table: SectionTable = Config::builder()
            .add_source(config::File::from(path).format(FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(load_err)?;
        Self::new(table.rules)
    }

    /// First rule whose range holds `roll`, or `None` for gaps and out-of-range values.
    pub fn classify(&self, roll: i64) -> Option<&SectionRule> {
        self.rules.iter().find(|r| r.contains(roll))
    }

    pub fn rules(&self) -> &[SectionRule] {
        &self.rules
    }

    fn validate(&self) -> Result<(), SectionTableError> {
        if self.rules.is_empty() {
            return Err(SectionTableError::Empty);
        }
        for rule in &self.rules {
            if rule.start > rule.end {
                return Err(SectionTableError::Inverted {
                    section: rule.section.clone(),
                    start: rule.start,
                    end: rule.end,
                });
            }
            if rule.section.trim().is_empty() || rule.prefix.trim().is_empty() {
                return Err(SectionTableError::Blank {
                    section: rule.section.clone(),
                });
            }
        }

        let mut sorted: Vec<&SectionRule> = self.rules.iter().collect();
        sorted.sort_by_key(|r| r.start);
        for pair in sorted.windows(2) {
            if pair[1].start <= pair[0].end {
                return Err(SectionTableError::Overlap {
                    first: pair[0].section.clone(),
                    second: pair[1].section.clone(),
                });
            }
        }
        Ok(())
    }
}
