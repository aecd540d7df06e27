//! Command-line interface definition using clap

use clap::Parser;

/// Terminal monitor for containers
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "icm")]
#[command(version, about, long_about = None)]
pub struct Options {
    /// Filter containers
    #[arg(short = 'f', long, value_name = "FILTER")]
    pub filter: Option<String>,

    /// Show active containers only
    #[arg(short = 'a', long)]
    pub active_only: bool,

    /// Select container sort field
    #[arg(short = 's', long, value_name = "FIELD")]
    pub sort_field: Option<String>,

    /// Reverse container sort order
    #[arg(short = 'r', long)]
    pub reverse_sort: bool,

    /// Invert default colors
    #[arg(short = 'i', long)]
    pub invert: bool,

    /// Container connector to use
    #[arg(long, default_value = "docker")]
    pub connector: String,
}

impl Options {
    /// One-line description of the active options, for the header and the log
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("connector={}", self.connector)];
        if let Some(filter) = &self.filter {
            parts.push(format!("filter={}", filter));
        }
        if let Some(field) = &self.sort_field {
            parts.push(format!("sort={}", field));
        }
        if self.reverse_sort {
            parts.push("reverse".to_string());
        }
        if self.active_only {
            parts.push("active-only".to_string());
        }
        if self.invert {
            parts.push("inverted".to_string());
        }
        parts.join(" ")
    }
}
